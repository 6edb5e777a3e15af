use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::rules::compiler::{CompilerPolicy, RuleCompiler};
use crate::rules::directory::{DirectoryError, RuleDirectory, RuleStore, StoreError};
use crate::rules::domain::{
    AttributeOption, Condition, ConditionId, JoinType, OutcomeOption, OutcomeSelection, RuleDraft,
};
use crate::rules::listing::{RuleFilter, RuleSummary, SummaryCondition};
use crate::rules::mapping::RuleRecord;
use crate::rules::payload::RulePayload;
use crate::rules::service::RuleAuthoringService;
use crate::session::SessionContext;

pub(super) fn session() -> SessionContext {
    SessionContext::new("token-abc", "7", 44)
}

pub(super) fn compiler() -> RuleCompiler {
    RuleCompiler::new(session(), CompilerPolicy::default())
}

pub(super) fn condition(
    id: u32,
    master_attribute: &str,
    sub_attribute: &str,
    master_operator: &str,
    sub_operator: &str,
    value: &str,
) -> Condition {
    Condition {
        id: ConditionId(id),
        backend_id: None,
        master_attribute_id: master_attribute.to_string(),
        sub_attribute_key: sub_attribute.to_string(),
        master_operator_name: master_operator.to_string(),
        sub_operator_value: sub_operator.to_string(),
        join_type: JoinType::And,
        compare_value: value.to_string(),
    }
}

/// "Tier Upgrade": points greater than 1000 upgrades the member tier.
pub(super) fn tier_upgrade() -> RuleDraft {
    RuleDraft {
        rule_id: None,
        name: "Tier Upgrade".to_string(),
        display_name: "Upgrade to Gold".to_string(),
        conditions: vec![condition(1, "1", "points", "Numeric", "greater_than", "1000")],
        outcome: OutcomeSelection {
            action_id: None,
            master_outcome_id: "2".to_string(),
            master_outcome_name: "Tier".to_string(),
            sub_outcome_id: "5".to_string(),
            parameter_value: "1".to_string(),
        },
    }
}

pub(super) fn attribute(id: u64, attribute_name: &str, display_name: &str) -> AttributeOption {
    AttributeOption {
        id,
        attribute_name: attribute_name.to_string(),
        display_name: display_name.to_string(),
    }
}

pub(super) fn outcome(id: u64, display_name: &str, lock_model_name: &str) -> OutcomeOption {
    OutcomeOption {
        id,
        display_name: display_name.to_string(),
        lock_model_name: lock_model_name.to_string(),
    }
}

pub(super) fn build_service() -> (Arc<RuleAuthoringService<MemoryStore>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let service = Arc::new(RuleAuthoringService::new(compiler(), store.clone()));
    (service, store)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StoreFailure {
    Rejected,
    Transport,
}

/// Rule store echoing submissions back with assigned ids.
#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<BTreeMap<u64, RuleRecord>>,
    submissions: Mutex<Vec<RulePayload>>,
    failure: Mutex<Option<StoreFailure>>,
}

impl MemoryStore {
    pub(super) fn fail_with(&self, failure: StoreFailure) {
        *self.failure.lock().expect("store mutex poisoned") = Some(failure);
    }

    pub(super) fn submissions(&self) -> Vec<RulePayload> {
        self.submissions.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn seed(&self, record: RuleRecord) {
        let id = record.id.expect("seeded record has an id");
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(id, record);
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match *self.failure.lock().expect("store mutex poisoned") {
            Some(StoreFailure::Rejected) => Err(StoreError::Rejected {
                status: 422,
                body: "{\"message\":\"invalid action\"}".to_string(),
            }),
            Some(StoreFailure::Transport) => {
                Err(StoreError::Transport("connection reset".to_string()))
            }
            None => Ok(()),
        }
    }

    fn persist(&self, payload: &RulePayload, rule_id: u64) -> RuleRecord {
        let mut record = RuleRecord::echo(payload);
        record.id = Some(rule_id);
        for (index, condition) in record.conditions.iter_mut().enumerate() {
            condition.id.get_or_insert(rule_id * 100 + index as u64 + 1);
        }
        for action in &mut record.actions {
            action.id.get_or_insert(rule_id * 100 + 99);
        }
        self.records
            .lock()
            .expect("store mutex poisoned")
            .insert(rule_id, record.clone());
        record
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn fetch_rule(&self, rule_id: u64) -> Result<RuleRecord, StoreError> {
        self.records
            .lock()
            .expect("store mutex poisoned")
            .get(&rule_id)
            .cloned()
            .ok_or(StoreError::NotFound(rule_id))
    }

    async fn create_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        self.check_failure()?;
        self.submissions
            .lock()
            .expect("store mutex poisoned")
            .push(payload.clone());
        let next_id = self
            .records
            .lock()
            .expect("store mutex poisoned")
            .keys()
            .max()
            .copied()
            .unwrap_or(0)
            + 1;
        Ok(self.persist(payload, next_id))
    }

    async fn update_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        self.check_failure()?;
        self.submissions
            .lock()
            .expect("store mutex poisoned")
            .push(payload.clone());
        let rule_id = payload.rule_id().ok_or(StoreError::NotFound(0))?;
        if !self
            .records
            .lock()
            .expect("store mutex poisoned")
            .contains_key(&rule_id)
        {
            return Err(StoreError::NotFound(rule_id));
        }
        Ok(self.persist(payload, rule_id))
    }

    async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleSummary>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .map(|record| RuleSummary {
                id: record.id.unwrap_or_default(),
                name: record.name.clone(),
                display_rule_name: record.display_rule_name.clone(),
                description: record.description.clone(),
                active: record.active,
                conditions: record
                    .conditions
                    .iter()
                    .map(|condition| SummaryCondition {
                        id: condition.id,
                        model_name: condition.model_name.clone(),
                        condition_attribute: condition.condition_attribute.clone(),
                        condition_attribute_display_name: None,
                    })
                    .collect(),
                created_at: None,
            })
            .filter(|summary| filter.matches(summary))
            .collect())
    }

    async fn set_active(&self, rule_id: u64, active: bool) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        let record = guard.get_mut(&rule_id).ok_or(StoreError::NotFound(rule_id))?;
        record.active = active;
        Ok(())
    }
}

/// Directory serving a fixed attribute and outcome tree.
pub(super) struct MemoryDirectory {
    attributes: Vec<(AttributeOption, Vec<AttributeOption>)>,
    outcomes: Vec<(OutcomeOption, Vec<OutcomeOption>)>,
    failing: AtomicBool,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self {
            attributes: vec![
                (
                    attribute(1, "points_earned", "Points Earned"),
                    vec![
                        attribute(11, "points", "Points"),
                        attribute(12, "bonus_points", "Bonus Points"),
                    ],
                ),
                (
                    attribute(2, "member_tier", "Member Tier"),
                    vec![attribute(21, "tier_name", "Tier Name")],
                ),
            ],
            outcomes: vec![
                (
                    outcome(2, "Tier", "Tier"),
                    vec![outcome(5, "Upgrade Tier", "Tier")],
                ),
                (
                    outcome(3, "Points", "Points"),
                    vec![outcome(6, "Award Points", "Points")],
                ),
            ],
            failing: AtomicBool::new(false),
        }
    }
}

impl MemoryDirectory {
    pub(super) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(DirectoryError::Transport("directory offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RuleDirectory for MemoryDirectory {
    async fn master_attributes(&self) -> Result<Vec<AttributeOption>, DirectoryError> {
        self.check()?;
        Ok(self.attributes.iter().map(|(master, _)| master.clone()).collect())
    }

    async fn sub_attributes(&self, master_attribute_id: u64) -> Result<Vec<AttributeOption>, DirectoryError> {
        self.check()?;
        self.attributes
            .iter()
            .find(|(master, _)| master.id == master_attribute_id)
            .map(|(_, subs)| subs.clone())
            .ok_or(DirectoryError::UnknownMaster(master_attribute_id))
    }

    async fn master_outcomes(&self) -> Result<Vec<OutcomeOption>, DirectoryError> {
        self.check()?;
        Ok(self.outcomes.iter().map(|(master, _)| master.clone()).collect())
    }

    async fn sub_outcomes(&self, master_outcome_id: u64) -> Result<Vec<OutcomeOption>, DirectoryError> {
        self.check()?;
        self.outcomes
            .iter()
            .find(|(master, _)| master.id == master_outcome_id)
            .map(|(_, subs)| subs.clone())
            .ok_or(DirectoryError::UnknownMaster(master_outcome_id))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

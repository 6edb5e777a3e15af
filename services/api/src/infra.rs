use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loyalty_rules::rules::{
    AttributeOption, DirectoryError, OutcomeOption, RuleDirectory, RuleFilter, RuleRecord,
    RulePayload, RuleStore, RuleSummary, StoreError,
};
use loyalty_rules::rules::listing::SummaryCondition;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Debug, Clone)]
struct StoredRule {
    record: RuleRecord,
    created_at: DateTime<Utc>,
}

/// Rule store used when no rule engine is configured.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRuleStore {
    rules: Arc<Mutex<RuleMap>>,
}

type RuleMap = BTreeMap<u64, StoredRule>;

impl InMemoryRuleStore {
    fn save(rules: &mut RuleMap, payload: &RulePayload, rule_id: u64) -> RuleRecord {
        let mut record = RuleRecord::echo(payload);
        record.id = Some(rule_id);
        let created_at = rules
            .get(&rule_id)
            .map(|stored| stored.created_at)
            .unwrap_or_else(Utc::now);
        rules.insert(
            rule_id,
            StoredRule {
                record: record.clone(),
                created_at,
            },
        );
        record
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn fetch_rule(&self, rule_id: u64) -> Result<RuleRecord, StoreError> {
        let guard = self.rules.lock().expect("rule store mutex poisoned");
        guard
            .get(&rule_id)
            .map(|stored| stored.record.clone())
            .ok_or(StoreError::NotFound(rule_id))
    }

    async fn create_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        let mut guard = self.rules.lock().expect("rule store mutex poisoned");
        let rule_id = guard.keys().next_back().copied().unwrap_or(0) + 1;
        Ok(Self::save(&mut guard, payload, rule_id))
    }

    async fn update_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError> {
        let rule_id = payload.rule_id().ok_or(StoreError::NotFound(0))?;
        let mut guard = self.rules.lock().expect("rule store mutex poisoned");
        if !guard.contains_key(&rule_id) {
            return Err(StoreError::NotFound(rule_id));
        }
        Ok(Self::save(&mut guard, payload, rule_id))
    }

    async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleSummary>, StoreError> {
        let guard = self.rules.lock().expect("rule store mutex poisoned");
        Ok(guard
            .iter()
            .map(|(id, stored)| summarize(*id, stored))
            .filter(|summary| filter.matches(summary))
            .collect())
    }

    async fn set_active(&self, rule_id: u64, active: bool) -> Result<(), StoreError> {
        let mut guard = self.rules.lock().expect("rule store mutex poisoned");
        let stored = guard.get_mut(&rule_id).ok_or(StoreError::NotFound(rule_id))?;
        stored.record.active = active;
        Ok(())
    }
}

fn summarize(id: u64, stored: &StoredRule) -> RuleSummary {
    let record = &stored.record;
    RuleSummary {
        id,
        name: record.name.clone(),
        display_rule_name: record.display_rule_name.clone(),
        description: record.description.clone(),
        active: record.active,
        conditions: record
            .conditions
            .iter()
            .map(|condition| SummaryCondition {
                id: condition.id,
                model_name: condition
                    .condition_selected_model
                    .map(|model| model.to_string()),
                condition_attribute: condition.condition_attribute.clone(),
                condition_attribute_display_name: None,
            })
            .collect(),
        created_at: Some(stored.created_at),
    }
}

/// Fixed attribute and outcome tree served when no rule engine is configured.
pub(crate) struct StaticRuleDirectory {
    attributes: Vec<(AttributeOption, Vec<AttributeOption>)>,
    outcomes: Vec<(OutcomeOption, Vec<OutcomeOption>)>,
}

impl StaticRuleDirectory {
    pub(crate) fn sample() -> Self {
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
                (
                    attribute(3, "transaction", "Transaction"),
                    vec![
                        attribute(31, "amount", "Amount"),
                        attribute(32, "store_code", "Store Code"),
                    ],
                ),
            ],
            outcomes: vec![
                (
                    outcome(1, "Points", "Points"),
                    vec![outcome(4, "Award Points", "Points")],
                ),
                (
                    outcome(2, "Tier", "Tier"),
                    vec![outcome(5, "Upgrade Tier", "Tier")],
                ),
            ],
        }
    }
}

fn attribute(id: u64, attribute_name: &str, display_name: &str) -> AttributeOption {
    AttributeOption {
        id,
        attribute_name: attribute_name.to_string(),
        display_name: display_name.to_string(),
    }
}

fn outcome(id: u64, display_name: &str, lock_model_name: &str) -> OutcomeOption {
    OutcomeOption {
        id,
        display_name: display_name.to_string(),
        lock_model_name: lock_model_name.to_string(),
    }
}

#[async_trait]
impl RuleDirectory for StaticRuleDirectory {
    async fn master_attributes(&self) -> Result<Vec<AttributeOption>, DirectoryError> {
        Ok(self.attributes.iter().map(|(master, _)| master.clone()).collect())
    }

    async fn sub_attributes(
        &self,
        master_attribute_id: u64,
    ) -> Result<Vec<AttributeOption>, DirectoryError> {
        self.attributes
            .iter()
            .find(|(master, _)| master.id == master_attribute_id)
            .map(|(_, subs)| subs.clone())
            .ok_or(DirectoryError::UnknownMaster(master_attribute_id))
    }

    async fn master_outcomes(&self) -> Result<Vec<OutcomeOption>, DirectoryError> {
        Ok(self.outcomes.iter().map(|(master, _)| master.clone()).collect())
    }

    async fn sub_outcomes(&self, master_outcome_id: u64) -> Result<Vec<OutcomeOption>, DirectoryError> {
        self.outcomes
            .iter()
            .find(|(master, _)| master.id == master_outcome_id)
            .map(|(_, subs)| subs.clone())
            .ok_or(DirectoryError::UnknownMaster(master_outcome_id))
    }
}

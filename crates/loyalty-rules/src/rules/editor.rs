use std::sync::Arc;

use tracing::{debug, warn};

use super::cascade::{invalidate_dependent, CascadeResolver, CascadeSlot, CascadeTarget, CascadeTicket, Lookup};
use super::conditions::{ConditionList, ConditionListError, FieldUpdate};
use super::directory::{RuleDirectory, RuleStore};
use super::domain::{
    AttributeOption, Condition, ConditionField, ConditionId, JoinType, Notice, OutcomeOption,
    OutcomeSelection, RuleDraft,
};
use super::service::{RuleAuthoringService, RuleServiceError, SubmitReceipt};

/// Whether the editor started from scratch or from a persisted rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { rule_id: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Editing,
    /// Terminal: the rule was accepted by the rule engine.
    Submitted,
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("rule already submitted; open it again to make further changes")]
    Closed,
    #[error(transparent)]
    Conditions(#[from] ConditionListError),
    #[error(transparent)]
    Service(#[from] RuleServiceError),
    #[error("'{0}' is not a sub reward outcome of the selected master outcome")]
    UnknownSubOutcome(String),
}

/// In-memory state of one rule being edited.
pub struct RuleEditor<D, S> {
    service: Arc<RuleAuthoringService<S>>,
    resolver: CascadeResolver<D>,
    mode: EditorMode,
    state: EditorState,
    rule_id: Option<u64>,
    name: String,
    display_name: String,
    conditions: ConditionList,
    outcome: OutcomeSelection,
    master_attributes: Vec<AttributeOption>,
    master_outcomes: Vec<OutcomeOption>,
    sub_outcomes: CascadeSlot<OutcomeOption>,
    notices: Vec<Notice>,
}

impl<D, S> RuleEditor<D, S>
where
    D: RuleDirectory + 'static,
    S: RuleStore + 'static,
{
    /// Blank rule with a single empty condition.
    pub fn create(service: Arc<RuleAuthoringService<S>>, directory: Arc<D>) -> Self {
        Self {
            service,
            resolver: CascadeResolver::new(directory),
            mode: EditorMode::Create,
            state: EditorState::Editing,
            rule_id: None,
            name: String::new(),
            display_name: String::new(),
            conditions: ConditionList::default(),
            outcome: OutcomeSelection::default(),
            master_attributes: Vec::new(),
            master_outcomes: Vec::new(),
            sub_outcomes: CascadeSlot::default(),
            notices: Vec::new(),
        }
    }

    /// Load a persisted rule and its dependent option sets.
    pub async fn open(
        service: Arc<RuleAuthoringService<S>>,
        directory: Arc<D>,
        rule_id: u64,
    ) -> Result<Self, EditorError> {
        let draft = service.load_draft(rule_id).await?;
        let mut editor = Self::create(service, directory);
        editor.mode = EditorMode::Edit { rule_id };
        editor.install(draft);
        editor.refresh_dependent_options().await;
        Ok(editor)
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn conditions(&self) -> &ConditionList {
        &self.conditions
    }

    pub fn outcome(&self) -> &OutcomeSelection {
        &self.outcome
    }

    pub fn master_attributes(&self) -> &[AttributeOption] {
        &self.master_attributes
    }

    pub fn master_outcomes(&self) -> &[OutcomeOption] {
        &self.master_outcomes
    }

    pub fn sub_outcome_options(&self) -> &[OutcomeOption] {
        self.sub_outcomes.options()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Snapshot handed to the compiler.
    pub fn draft(&self) -> RuleDraft {
        RuleDraft {
            rule_id: self.rule_id,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            conditions: self.conditions.conditions().to_vec(),
            outcome: self.outcome.clone(),
        }
    }

    /// Fetch the master attribute and master outcome lists. Failures become notices.
    pub async fn load_directories(&mut self) {
        let directory = self.resolver.directory().clone();
        match directory.master_attributes().await {
            Ok(attributes) => self.master_attributes = attributes,
            Err(err) => {
                warn!(error = %err, "master attribute directory unavailable");
                self.notices
                    .push(Notice::new(format!("Unable to load master attributes: {err}")));
            }
        }
        match directory.master_outcomes().await {
            Ok(outcomes) => self.master_outcomes = outcomes,
            Err(err) => {
                warn!(error = %err, "master outcome directory unavailable");
                self.notices.push(Notice::new(format!(
                    "Unable to load master reward outcomes: {err}"
                )));
            }
        }
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), EditorError> {
        self.ensure_editing()?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn set_display_name(&mut self, display_name: &str) -> Result<(), EditorError> {
        self.ensure_editing()?;
        self.display_name = display_name.to_string();
        Ok(())
    }

    pub fn set_parameter(&mut self, parameter: &str) -> Result<(), EditorError> {
        self.ensure_editing()?;
        self.outcome.parameter_value = parameter.to_string();
        Ok(())
    }

    pub fn add_condition(&mut self) -> Result<ConditionId, EditorError> {
        self.ensure_editing()?;
        Ok(self.conditions.add_condition())
    }

    pub fn remove_condition(&mut self, id: ConditionId) -> Result<Condition, EditorError> {
        self.ensure_editing()?;
        Ok(self.conditions.remove_condition(id)?)
    }

    pub fn set_join_type(&mut self, id: ConditionId, join_type: JoinType) -> Result<(), EditorError> {
        self.ensure_editing()?;
        Ok(self.conditions.set_join_type(id, join_type)?)
    }

    /// Apply one field edit. A master attribute edit hands back a ticket that must be
    /// completed with [`Self::complete_sub_attributes`].
    pub fn update_field(
        &mut self,
        id: ConditionId,
        field: ConditionField,
        value: &str,
    ) -> Result<FieldUpdate, EditorError> {
        self.ensure_editing()?;
        Ok(self.conditions.update_field(id, field, value)?)
    }

    /// Select a master attribute and load its sub attributes.
    ///
    /// Returns whether the fetched set was installed; `false` means a newer selection won.
    pub async fn select_master_attribute(&mut self, id: ConditionId, master_attribute_id: &str) -> Result<bool, EditorError> {
        let update = self.update_field(id, ConditionField::MasterAttribute, master_attribute_id)?;
        let FieldUpdate::ParentSelected {
            ticket: Some(ticket),
            ..
        } = update
        else {
            return Ok(false);
        };
        let lookup = self.resolver.resolve_sub_attributes(&ticket.parent).await;
        Ok(self.complete_sub_attributes(&ticket, lookup))
    }

    pub async fn resolve_sub_attributes(&self, ticket: &CascadeTicket) -> Lookup<AttributeOption> {
        self.resolver.resolve_sub_attributes(&ticket.parent).await
    }

    pub fn complete_sub_attributes(&mut self, ticket: &CascadeTicket, lookup: Lookup<AttributeOption>) -> bool {
        let applied = self.conditions.apply_sub_attributes(ticket, lookup.options);
        if applied {
            self.notices.extend(lookup.notice);
        }
        applied
    }

    /// Record a master outcome selection; clears the sub outcome when the family changes.
    pub fn begin_master_outcome(&mut self, master_outcome_id: &str, master_outcome_name: &str) -> Result<CascadeTicket, EditorError> {
        self.ensure_editing()?;
        let previous = std::mem::replace(
            &mut self.outcome.master_outcome_id,
            master_outcome_id.to_string(),
        );
        invalidate_dependent(&previous, master_outcome_id, &mut self.outcome.sub_outcome_id);
        self.outcome.master_outcome_name = master_outcome_name.to_string();
        Ok(self
            .sub_outcomes
            .select_parent(CascadeTarget::SubOutcomes, master_outcome_id))
    }

    pub async fn select_master_outcome(&mut self, master_outcome_id: &str, master_outcome_name: &str) -> Result<bool, EditorError> {
        let ticket = self.begin_master_outcome(master_outcome_id, master_outcome_name)?;
        let lookup = self.resolver.resolve_sub_outcomes(&ticket.parent).await;
        Ok(self.complete_sub_outcomes(&ticket, lookup))
    }

    pub async fn resolve_sub_outcomes(&self, ticket: &CascadeTicket) -> Lookup<OutcomeOption> {
        self.resolver.resolve_sub_outcomes(&ticket.parent).await
    }

    pub fn complete_sub_outcomes(&mut self, ticket: &CascadeTicket, lookup: Lookup<OutcomeOption>) -> bool {
        if ticket.target != CascadeTarget::SubOutcomes {
            return false;
        }
        let applied = self.sub_outcomes.accept(ticket, lookup.options);
        if applied {
            self.notices.extend(lookup.notice);
        }
        applied
    }

    pub fn select_sub_outcome(&mut self, sub_outcome_id: &str) -> Result<(), EditorError> {
        self.ensure_editing()?;
        let known = self
            .sub_outcomes
            .options()
            .iter()
            .any(|option| option.id.to_string() == sub_outcome_id);
        let loaded_for_master = self.sub_outcomes.is_loaded()
            && self.sub_outcomes.parent() == self.outcome.master_outcome_id;
        let selectable =
            sub_outcome_id.trim().parse::<u64>().is_ok() && (known || !loaded_for_master);
        if !sub_outcome_id.is_empty() && !selectable {
            return Err(EditorError::UnknownSubOutcome(sub_outcome_id.to_string()));
        }
        self.outcome.sub_outcome_id = sub_outcome_id.to_string();
        Ok(())
    }

    /// Discard local edits: reload the persisted rule, or start over in create mode.
    pub async fn revert(&mut self) -> Result<(), EditorError> {
        self.ensure_editing()?;
        match self.mode {
            EditorMode::Edit { rule_id } => {
                let draft = self.service.load_draft(rule_id).await?;
                self.install(draft);
                self.refresh_dependent_options().await;
            }
            EditorMode::Create => self.install(RuleDraft::blank()),
        }
        Ok(())
    }

    /// Validate, compile and persist. Success closes the editor; failure keeps every edit.
    pub async fn submit(&mut self) -> Result<SubmitReceipt, EditorError> {
        self.ensure_editing()?;
        let draft = self.draft();
        let receipt = self.service.submit(&draft).await?;
        self.state = EditorState::Submitted;
        debug!(rule_id = ?receipt.record.id, "rule editor closed after submission");
        Ok(receipt)
    }

    fn ensure_editing(&self) -> Result<(), EditorError> {
        match self.state {
            EditorState::Editing => Ok(()),
            EditorState::Submitted => Err(EditorError::Closed),
        }
    }

    fn install(&mut self, draft: RuleDraft) {
        self.rule_id = draft.rule_id;
        self.name = draft.name;
        self.display_name = draft.display_name;
        self.conditions = ConditionList::from_conditions(draft.conditions);
        self.outcome = draft.outcome;
        self.sub_outcomes = CascadeSlot::default();
    }

    async fn refresh_dependent_options(&mut self) {
        let ids: Vec<ConditionId> = self
            .conditions
            .conditions()
            .iter()
            .filter(|condition| !condition.master_attribute_id.is_empty())
            .map(|condition| condition.id)
            .collect();

        for id in ids {
            if let Ok(ticket) = self.conditions.request_sub_attributes(id) {
                let lookup = self.resolver.resolve_sub_attributes(&ticket.parent).await;
                self.complete_sub_attributes(&ticket, lookup);
            }
        }

        if !self.outcome.master_outcome_id.is_empty() {
            let ticket = self
                .sub_outcomes
                .select_parent(CascadeTarget::SubOutcomes, &self.outcome.master_outcome_id);
            let lookup = self.resolver.resolve_sub_outcomes(&ticket.parent).await;
            self.complete_sub_outcomes(&ticket, lookup);
        }
    }
}

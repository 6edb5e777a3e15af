mod policy;
mod validation;

pub use policy::{CompilerPolicy, DuplicatePolicy};
pub use validation::{RuleValidationError, ValidationReport};

use tracing::debug;

use super::domain::{Condition, OutcomeSelection, RuleDraft};
use super::payload::{ActionDocument, ConditionDocument, RuleDocument, RulePayload};
use crate::session::SessionContext;
use validation::{parse_outcome_id, parse_parameter, validate_draft, MASTER_OUTCOME, SUB_OUTCOME};

/// Master attribute sent when the selection is not a positive number.
const FALLBACK_SELECTED_MODEL: u64 = 1;

/// Validates drafts and turns them into the rule engine's wire document.
///
/// Compilation is pure: the same draft and session always produce the same payload.
#[derive(Debug, Clone)]
pub struct RuleCompiler {
    session: SessionContext,
    policy: CompilerPolicy,
}

impl RuleCompiler {
    pub fn new(session: SessionContext, policy: CompilerPolicy) -> Self {
        Self { session, policy }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn policy(&self) -> &CompilerPolicy {
        &self.policy
    }

    /// All validation failures for `draft`, empty when it compiles.
    pub fn validate(&self, draft: &RuleDraft) -> Vec<RuleValidationError> {
        validate_draft(draft, self.policy.duplicate_policy)
    }

    pub fn compile(&self, draft: &RuleDraft) -> Result<RulePayload, ValidationReport> {
        let errors = self.validate(draft);
        if !errors.is_empty() {
            debug!(failures = errors.len(), "rule draft rejected");
            return Err(ValidationReport { errors });
        }

        let action = compile_action(&draft.outcome).map_err(|error| ValidationReport {
            errors: vec![error],
        })?;

        Ok(RulePayload {
            rule_engine_rule: RuleDocument {
                id: draft.rule_id,
                name: draft.name.trim().to_string(),
                display_rule_name: draft.display_name.trim().to_string(),
                description: self.policy.description.clone(),
                loyalty_type_id: self.session.loyalty_type_id.clone(),
                rule_engine_conditions_attributes: draft
                    .conditions
                    .iter()
                    .enumerate()
                    .map(|(index, condition)| compile_condition(index, condition))
                    .collect(),
                rule_engine_actions_attributes: vec![action],
            },
        })
    }
}

fn compile_condition(index: usize, condition: &Condition) -> ConditionDocument {
    let condition_type = if index == 0 {
        String::new()
    } else {
        condition.join_type.as_str().to_string()
    };

    ConditionDocument {
        id: condition.backend_id,
        condition_attribute: condition.sub_attribute_key.clone(),
        operator: condition.sub_operator_value.clone(),
        compare_value: condition.compare_value.clone(),
        condition_selected_model: condition
            .master_attribute_id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|model| *model != 0)
            .unwrap_or(FALLBACK_SELECTED_MODEL),
        condition_type,
        master_operator: condition.master_operator_name.clone(),
    }
}

fn compile_action(outcome: &OutcomeSelection) -> Result<ActionDocument, RuleValidationError> {
    let parameter = parse_parameter(&outcome.parameter_value).ok_or_else(|| {
        RuleValidationError::InvalidParameter {
            value: outcome.parameter_value.clone(),
        }
    })?;
    let function_id = outcome_id(SUB_OUTCOME, &outcome.sub_outcome_id)?;
    let selected_model = outcome_id(MASTER_OUTCOME, &outcome.master_outcome_id)?;

    Ok(ActionDocument {
        id: outcome.action_id,
        lock_model_name: outcome.master_outcome_name.clone(),
        parameters: vec![parameter],
        rule_engine_available_function_id: Some(function_id),
        action_selected_model: Some(selected_model),
    })
}

fn outcome_id(field: &'static str, raw: &str) -> Result<u64, RuleValidationError> {
    parse_outcome_id(raw).ok_or_else(|| RuleValidationError::InvalidOutcomeSelection {
        field,
        value: raw.to_string(),
    })
}

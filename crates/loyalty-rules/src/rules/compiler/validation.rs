use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::policy::DuplicatePolicy;
use crate::rules::domain::{Condition, ConditionField, RuleDraft};

/// A single reason a rule cannot be compiled. Condition indexes are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleValidationError {
    #[error("Rule Name is required")]
    MissingRuleName,
    #[error("Display Rule Name is required")]
    MissingDisplayName,
    #[error("At least one condition is required")]
    NoConditions,
    #[error("Condition {index}: {field} is required")]
    MissingConditionField { index: usize, field: &'static str },
    #[error("Master Reward Outcome is required")]
    MissingMasterOutcome,
    #[error("Sub Reward Outcome is required")]
    MissingSubOutcome,
    #[error("{field} must be selected from the available outcomes")]
    InvalidOutcomeSelection { field: &'static str, value: String },
    #[error("Each condition value must be unique")]
    DuplicateCompareValue { value: String, conditions: Vec<usize> },
    #[error("Duplicate condition(s) found based on 5-field combination")]
    DuplicateConditionSignature { conditions: Vec<usize> },
    #[error("Parameter value must be a valid number")]
    InvalidParameter { value: String },
}

/// Every validation failure of one compile attempt, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<RuleValidationError>,
}

impl ValidationReport {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule is invalid: {}", self.messages().join("; "))
    }
}

impl std::error::Error for ValidationReport {}

const ROW_CHECKS: [ConditionField; 5] = [
    ConditionField::MasterAttribute,
    ConditionField::SubAttribute,
    ConditionField::MasterOperator,
    ConditionField::SubOperator,
    ConditionField::CompareValue,
];

pub(crate) fn validate_draft(draft: &RuleDraft, policy: DuplicatePolicy) -> Vec<RuleValidationError> {
    let mut errors = Vec::new();

    if draft.name.trim().is_empty() {
        errors.push(RuleValidationError::MissingRuleName);
    }
    if draft.display_name.trim().is_empty() {
        errors.push(RuleValidationError::MissingDisplayName);
    }
    if draft.conditions.is_empty() {
        errors.push(RuleValidationError::NoConditions);
    }

    // First missing field per row; later rows are still checked.
    for (index, condition) in draft.conditions.iter().enumerate() {
        if let Some(field) = ROW_CHECKS
            .into_iter()
            .find(|field| condition.field(*field).trim().is_empty())
        {
            errors.push(RuleValidationError::MissingConditionField {
                index: index + 1,
                field: field.label(),
            });
        }
    }

    let outcome = &draft.outcome;
    if outcome.master_outcome_name.trim().is_empty() {
        errors.push(RuleValidationError::MissingMasterOutcome);
    } else {
        if parse_outcome_id(&outcome.master_outcome_id).is_none() {
            errors.push(RuleValidationError::InvalidOutcomeSelection {
                field: MASTER_OUTCOME,
                value: outcome.master_outcome_id.clone(),
            });
        }
        if outcome.sub_outcome_id.trim().is_empty() {
            errors.push(RuleValidationError::MissingSubOutcome);
        } else if parse_outcome_id(&outcome.sub_outcome_id).is_none() {
            errors.push(RuleValidationError::InvalidOutcomeSelection {
                field: SUB_OUTCOME,
                value: outcome.sub_outcome_id.clone(),
            });
        }
    }

    match policy {
        DuplicatePolicy::CompareValue => {
            errors.extend(duplicate_values(&draft.conditions));
        }
        DuplicatePolicy::ConditionSignature => {
            errors.extend(duplicate_signatures(&draft.conditions));
        }
    }

    if parse_parameter(&draft.outcome.parameter_value).is_none() {
        errors.push(RuleValidationError::InvalidParameter {
            value: draft.outcome.parameter_value.clone(),
        });
    }

    errors
}

pub(crate) const MASTER_OUTCOME: &str = "Master Reward Outcome";
pub(crate) const SUB_OUTCOME: &str = "Sub Reward Outcome";

/// Outcome ids are directory ids; anything else never reaches the wire.
pub(crate) fn parse_outcome_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

/// Parse an outcome parameter, keeping integers integral.
pub(crate) fn parse_parameter(raw: &str) -> Option<serde_json::Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(serde_json::Number::from(integer));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
}

fn duplicate_values(conditions: &[Condition]) -> Vec<RuleValidationError> {
    let mut seen: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    let mut order = Vec::new();
    for (index, condition) in conditions.iter().enumerate() {
        let value = condition.compare_value.trim();
        if value.is_empty() {
            continue;
        }
        let rows = seen.entry(value).or_default();
        if rows.is_empty() {
            order.push(value);
        }
        rows.push(index + 1);
    }

    order
        .into_iter()
        .filter_map(|value| {
            let rows = &seen[value];
            (rows.len() > 1).then(|| RuleValidationError::DuplicateCompareValue {
                value: value.to_string(),
                conditions: rows.clone(),
            })
        })
        .collect()
}

fn duplicate_signatures(conditions: &[Condition]) -> Vec<RuleValidationError> {
    let mut seen: BTreeMap<[&str; 5], Vec<usize>> = BTreeMap::new();
    let mut order = Vec::new();
    for (index, condition) in conditions.iter().enumerate() {
        let key = [
            condition.sub_attribute_key.as_str(),
            condition.sub_operator_value.as_str(),
            condition.compare_value.trim(),
            condition.master_attribute_id.as_str(),
            condition.master_operator_name.as_str(),
        ];
        let rows = seen.entry(key).or_default();
        if rows.is_empty() {
            order.push(key);
        }
        rows.push(index + 1);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let rows = &seen[&key];
            (rows.len() > 1).then(|| RuleValidationError::DuplicateConditionSignature {
                conditions: rows.clone(),
            })
        })
        .collect()
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// UI identity of a condition row, stable across edits and never reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConditionId(pub u32);

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a condition chains onto the one before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl JoinType {
    pub const fn as_str(self) -> &'static str {
        match self {
            JoinType::And => "AND",
            JoinType::Or => "OR",
        }
    }

    /// Parse a backend `condition_type`; anything other than `OR` chains with `AND`.
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("or") {
            JoinType::Or
        } else {
            JoinType::And
        }
    }
}

/// One comparison clause of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    /// Persisted row id, present for rules loaded from the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_id: Option<u64>,
    #[serde(default)]
    pub master_attribute_id: String,
    #[serde(default)]
    pub sub_attribute_key: String,
    #[serde(default)]
    pub master_operator_name: String,
    #[serde(default)]
    pub sub_operator_value: String,
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub compare_value: String,
}

impl Condition {
    pub fn blank(id: ConditionId) -> Self {
        Self {
            id,
            backend_id: None,
            master_attribute_id: String::new(),
            sub_attribute_key: String::new(),
            master_operator_name: String::new(),
            sub_operator_value: String::new(),
            join_type: JoinType::And,
            compare_value: String::new(),
        }
    }

    /// Both cascades resolved and a non-blank compare value.
    pub fn is_complete(&self) -> bool {
        !self.master_attribute_id.is_empty()
            && !self.sub_attribute_key.is_empty()
            && !self.master_operator_name.is_empty()
            && !self.sub_operator_value.is_empty()
            && !self.compare_value.trim().is_empty()
    }

    pub fn field(&self, field: ConditionField) -> &str {
        match field {
            ConditionField::MasterAttribute => &self.master_attribute_id,
            ConditionField::SubAttribute => &self.sub_attribute_key,
            ConditionField::MasterOperator => &self.master_operator_name,
            ConditionField::SubOperator => &self.sub_operator_value,
            ConditionField::CompareValue => &self.compare_value,
        }
    }

    pub(crate) fn field_mut(&mut self, field: ConditionField) -> &mut String {
        match field {
            ConditionField::MasterAttribute => &mut self.master_attribute_id,
            ConditionField::SubAttribute => &mut self.sub_attribute_key,
            ConditionField::MasterOperator => &mut self.master_operator_name,
            ConditionField::SubOperator => &mut self.sub_operator_value,
            ConditionField::CompareValue => &mut self.compare_value,
        }
    }
}

/// Editable text fields of a condition row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    MasterAttribute,
    SubAttribute,
    MasterOperator,
    SubOperator,
    CompareValue,
}

impl ConditionField {
    pub const fn label(self) -> &'static str {
        match self {
            ConditionField::MasterAttribute => "Master Attribute",
            ConditionField::SubAttribute => "Sub Attribute",
            ConditionField::MasterOperator => "Master Operator",
            ConditionField::SubOperator => "Sub Operator",
            ConditionField::CompareValue => "Value",
        }
    }

    /// Field whose value depends on this one, if any.
    pub const fn dependent(self) -> Option<ConditionField> {
        match self {
            ConditionField::MasterAttribute => Some(ConditionField::SubAttribute),
            ConditionField::MasterOperator => Some(ConditionField::SubOperator),
            _ => None,
        }
    }

    /// Field this one is keyed by, if any.
    pub const fn parent(self) -> Option<ConditionField> {
        match self {
            ConditionField::SubAttribute => Some(ConditionField::MasterAttribute),
            ConditionField::SubOperator => Some(ConditionField::MasterOperator),
            _ => None,
        }
    }
}

/// The single action a rule fires, parameterized by one numeric value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSelection {
    /// Persisted action id, present for rules loaded from the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<u64>,
    #[serde(default)]
    pub master_outcome_id: String,
    #[serde(default)]
    pub master_outcome_name: String,
    #[serde(default)]
    pub sub_outcome_id: String,
    #[serde(default)]
    pub parameter_value: String,
}

/// Rule under construction, as handed to the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub outcome: OutcomeSelection,
}

impl RuleDraft {
    /// Create-mode starting point: one blank condition and no outcome.
    pub fn blank() -> Self {
        Self {
            rule_id: None,
            name: String::new(),
            display_name: String::new(),
            conditions: vec![Condition::blank(ConditionId(1))],
            outcome: OutcomeSelection::default(),
        }
    }
}

/// Top-level attribute with its optional nested field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeOption {
    pub id: u64,
    #[serde(default)]
    pub attribute_name: String,
    #[serde(default)]
    pub display_name: String,
}

/// Concrete comparison operator inside an operator family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorOption {
    pub value: String,
    pub display_name: String,
}

/// Reward outcome family or function offered by the outcome directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeOption {
    pub id: u64,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub lock_model_name: String,
}

/// Non-fatal message surfaced to the person editing a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

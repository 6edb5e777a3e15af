use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::domain::{Condition, ConditionId, JoinType, OutcomeSelection, RuleDraft};
use super::payload::{ActionDocument, ConditionDocument, RulePayload};

/// Rule as returned by `GET rule_engine/rules/{id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_rule_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub condition_selected_model: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub condition_attribute: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub operator: String,
    #[serde(default)]
    pub condition_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub compare_value: String,
    #[serde(default)]
    pub master_operator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub parameters: Vec<Value>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub rule_engine_available_function_id: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub action_selected_model: Option<u64>,
    #[serde(default)]
    pub lock_model_name: Option<String>,
    #[serde(default)]
    pub action_method: Option<String>,
}

impl RuleRecord {
    /// Map the backend shape onto an editable draft. Rows are renumbered from 1.
    pub fn into_draft(self) -> RuleDraft {
        let conditions = self
            .conditions
            .into_iter()
            .enumerate()
            .map(|(index, record)| Condition {
                id: ConditionId(index as u32 + 1),
                backend_id: record.id,
                master_attribute_id: record
                    .condition_selected_model
                    .map(|model| model.to_string())
                    .or(record.model_name)
                    .unwrap_or_default(),
                sub_attribute_key: record.condition_attribute,
                master_operator_name: record.master_operator.unwrap_or_default(),
                sub_operator_value: record.operator,
                join_type: JoinType::from_wire(record.condition_type.as_deref().unwrap_or_default()),
                compare_value: record.compare_value,
            })
            .collect();

        let outcome = self
            .actions
            .into_iter()
            .next()
            .map(ActionRecord::into_outcome)
            .unwrap_or_default();

        RuleDraft {
            rule_id: self.id,
            name: self.name,
            display_name: self.display_rule_name,
            conditions,
            outcome,
        }
    }

    /// The record the backend would hand back after persisting `payload`.
    pub fn echo(payload: &RulePayload) -> Self {
        let document = &payload.rule_engine_rule;
        Self {
            id: document.id,
            name: document.name.clone(),
            display_rule_name: document.display_rule_name.clone(),
            description: Some(document.description.clone()),
            active: true,
            conditions: document
                .rule_engine_conditions_attributes
                .iter()
                .map(ConditionRecord::from)
                .collect(),
            actions: document
                .rule_engine_actions_attributes
                .iter()
                .map(ActionRecord::from)
                .collect(),
        }
    }
}

impl ActionRecord {
    fn into_outcome(self) -> OutcomeSelection {
        let parameter_value = self
            .parameters
            .into_iter()
            .next()
            .map(|value| match value {
                Value::Number(number) => number.to_string(),
                Value::String(text) => text,
                _ => String::new(),
            })
            .unwrap_or_default();

        OutcomeSelection {
            action_id: self.id,
            master_outcome_id: self
                .action_selected_model
                .map(|model| model.to_string())
                .unwrap_or_default(),
            master_outcome_name: self.lock_model_name.unwrap_or_default(),
            sub_outcome_id: self
                .rule_engine_available_function_id
                .map(|function| function.to_string())
                .unwrap_or_default(),
            parameter_value,
        }
    }
}

impl From<&ConditionDocument> for ConditionRecord {
    fn from(document: &ConditionDocument) -> Self {
        Self {
            id: document.id,
            model_name: None,
            condition_selected_model: Some(document.condition_selected_model),
            condition_attribute: document.condition_attribute.clone(),
            operator: document.operator.clone(),
            condition_type: Some(document.condition_type.clone()),
            compare_value: document.compare_value.clone(),
            master_operator: Some(document.master_operator.clone()),
        }
    }
}

impl From<&ActionDocument> for ActionRecord {
    fn from(document: &ActionDocument) -> Self {
        Self {
            id: document.id,
            parameters: document
                .parameters
                .iter()
                .cloned()
                .map(Value::Number)
                .collect(),
            rule_engine_available_function_id: document.rule_engine_available_function_id,
            action_selected_model: document.action_selected_model,
            lock_model_name: Some(document.lock_model_name.clone()),
            action_method: None,
        }
    }
}

/// Accept ids sent as numbers, numeric strings, empty strings or null.
pub(crate) fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("id {number} is not a positive integer"))),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => text
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| serde::de::Error::custom(format!("failed to parse id '{text}' ({err})"))),
        Some(other) => Err(serde::de::Error::custom(format!("unexpected id value {other}"))),
    }
}

/// Accept free text sent as a string, number, boolean or null.
pub(crate) fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(other) => Err(serde::de::Error::custom(format!("unexpected text value {other}"))),
    }
}

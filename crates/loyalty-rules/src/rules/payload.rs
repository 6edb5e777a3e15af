use serde::{Deserialize, Serialize};

/// Compiled rule document accepted by the rule engine's create and update endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePayload {
    pub rule_engine_rule: RuleDocument,
}

impl RulePayload {
    pub fn rule_id(&self) -> Option<u64> {
        self.rule_engine_rule.id
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub display_rule_name: String,
    pub description: String,
    pub loyalty_type_id: String,
    pub rule_engine_conditions_attributes: Vec<ConditionDocument>,
    pub rule_engine_actions_attributes: Vec<ActionDocument>,
}

/// Wire form of one condition. Order within the document is evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub condition_attribute: String,
    pub operator: String,
    pub compare_value: String,
    pub condition_selected_model: u64,
    /// `AND`/`OR`, empty for the first condition.
    pub condition_type: String,
    pub master_operator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub lock_model_name: String,
    pub parameters: Vec<serde_json::Number>,
    pub rule_engine_available_function_id: Option<u64>,
    pub action_selected_model: Option<u64>,
}

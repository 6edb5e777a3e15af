use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_DESCRIPTION: &str = "This is a description of the sample rule.";

/// How repeated conditions are detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every compare value must be unique across the rule (exact match after trimming).
    #[default]
    CompareValue,
    /// Rows may share a value but not the full attribute, operator and value combination.
    ConditionSignature,
}

impl DuplicatePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compare_value" | "value" => Some(Self::CompareValue),
            "condition_signature" | "signature" => Some(Self::ConditionSignature),
            _ => None,
        }
    }
}

/// Compiler settings that are not part of the edited rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerPolicy {
    pub duplicate_policy: DuplicatePolicy,
    /// Fixed descriptive text sent with every rule.
    pub description: String,
}

impl Default for CompilerPolicy {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

impl CompilerPolicy {
    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            duplicate_policy,
            ..Self::default()
        }
    }
}

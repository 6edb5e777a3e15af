use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mapping::{deserialize_optional_id, deserialize_text};

/// Row of the rule list screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_rule_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub conditions: Vec<SummaryCondition>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCondition {
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub id: Option<u64>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub condition_attribute: String,
    #[serde(default)]
    pub condition_attribute_display_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Active,
    Inactive,
}

impl RuleStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RuleStatus::Active => "active",
            RuleStatus::Inactive => "inactive",
        }
    }
}

/// List filters. Sent to the backend as ransack-style query parameters and applied locally
/// when the filtered request fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFilter {
    /// Display name of a master attribute used by any condition.
    #[serde(default)]
    pub master_attribute: Option<String>,
    /// Display name of a sub attribute used by any condition.
    #[serde(default)]
    pub sub_attribute: Option<String>,
    #[serde(default)]
    pub status: Option<RuleStatus>,
    /// Free-text match on name, description, status or id.
    #[serde(default)]
    pub search: Option<String>,
}

impl RuleFilter {
    pub fn is_empty(&self) -> bool {
        self.master_attribute.is_none()
            && self.sub_attribute.is_none()
            && self.status.is_none()
            && self.search.is_none()
    }

    /// Query parameters understood by the rule list endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(master) = non_blank(&self.master_attribute) {
            pairs.push(("q[rule_engine_conditions_model_name_cont]", master.to_string()));
        }
        if let Some(sub) = non_blank(&self.sub_attribute) {
            pairs.push((
                "q[rule_engine_conditions_condition_attribute_display_name_cont]",
                sub.to_string(),
            ));
        }
        if let Some(status) = self.status {
            pairs.push(("q[active_eq]", (status == RuleStatus::Active).to_string()));
        }
        pairs
    }

    pub fn matches(&self, rule: &RuleSummary) -> bool {
        if let Some(master) = non_blank(&self.master_attribute) {
            let needle = master.to_lowercase();
            let found = rule.conditions.iter().any(|condition| {
                condition
                    .model_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            });
            if !found {
                return false;
            }
        }

        if let Some(sub) = non_blank(&self.sub_attribute) {
            let needle = sub.to_lowercase();
            let found = rule.conditions.iter().any(|condition| {
                condition
                    .condition_attribute_display_name
                    .as_deref()
                    .unwrap_or(&condition.condition_attribute)
                    .to_lowercase()
                    .contains(&needle)
            });
            if !found {
                return false;
            }
        }

        if let Some(status) = self.status {
            if rule.active != (status == RuleStatus::Active) {
                return false;
            }
        }

        if let Some(search) = non_blank(&self.search) {
            let needle = search.to_lowercase();
            let status = if rule.active {
                RuleStatus::Active
            } else {
                RuleStatus::Inactive
            };
            let haystacks = [
                rule.name.to_lowercase(),
                rule.description.clone().unwrap_or_default().to_lowercase(),
                status.label().to_string(),
                rule.id.to_string(),
            ];
            if !haystacks.iter().any(|text| text.contains(&needle)) {
                return false;
            }
        }

        true
    }
}

pub const DEFAULT_PER_PAGE: u32 = 15;

/// Page selection for the rule list, applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

/// One page of the filtered rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulePage {
    pub rules: Vec<RuleSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total_entries: usize,
    pub total_pages: u32,
}

impl PageRequest {
    /// Slice `rules` to the requested page. Pages outside `1..=total_pages` clamp to the
    /// nearest valid page.
    pub fn apply(self, rules: Vec<RuleSummary>) -> RulePage {
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1);
        let total_entries = rules.len();
        let total_pages = u32::try_from(total_entries.div_ceil(per_page as usize)).unwrap_or(u32::MAX);
        let page = self.page.unwrap_or(1).clamp(1, total_pages.max(1));

        let start = (page as usize - 1).saturating_mul(per_page as usize);
        let rules = rules
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        RulePage {
            rules,
            page,
            per_page,
            total_entries,
            total_pages,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

use async_trait::async_trait;

use super::domain::{AttributeOption, OutcomeOption};
use super::listing::{RuleFilter, RuleSummary};
use super::mapping::RuleRecord;
use super::payload::RulePayload;

/// Lookup service for attribute and reward-outcome option sets.
#[async_trait]
pub trait RuleDirectory: Send + Sync {
    async fn master_attributes(&self) -> Result<Vec<AttributeOption>, DirectoryError>;
    async fn sub_attributes(&self, master_attribute_id: u64)
        -> Result<Vec<AttributeOption>, DirectoryError>;
    async fn master_outcomes(&self) -> Result<Vec<OutcomeOption>, DirectoryError>;
    async fn sub_outcomes(&self, master_outcome_id: u64) -> Result<Vec<OutcomeOption>, DirectoryError>;
}

/// Rule persistence boundary.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn fetch_rule(&self, rule_id: u64) -> Result<RuleRecord, StoreError>;
    /// Create a rule and return the backend's echo of it.
    async fn create_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError>;
    async fn update_rule(&self, payload: &RulePayload) -> Result<RuleRecord, StoreError>;
    async fn list_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleSummary>, StoreError>;
    async fn set_active(&self, rule_id: u64, active: bool) -> Result<(), StoreError>;
}

/// Directory lookup failure.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Transport(String),
    #[error("directory returned status {status}")]
    Status { status: u16 },
    #[error("unknown master entry {0}")]
    UnknownMaster(u64),
    #[error("unreadable directory response: {0}")]
    Decode(String),
}

/// Rule persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("rule {0} not found")]
    NotFound(u64),
    #[error("rule engine rejected the request with status {status}")]
    Rejected { status: u16, body: String },
    #[error("rule engine unreachable: {0}")]
    Transport(String),
    #[error("unreadable rule engine response: {0}")]
    Decode(String),
}

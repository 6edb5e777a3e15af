//! Rule authoring: condition rows with cascading attribute and operator selections, a single
//! reward outcome, and the compiler producing the rule engine's create/update document.

pub mod cascade;
pub mod client;
pub mod compiler;
pub mod conditions;
pub mod directory;
pub mod domain;
pub mod editor;
pub mod labels;
pub mod listing;
pub mod mapping;
pub mod operators;
pub mod payload;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use cascade::{invalidate_dependent, CascadeResolver, CascadeSlot, CascadeTarget, CascadeTicket, Lookup};
pub use client::{ClientBuildError, HttpRuleEngineClient};
pub use compiler::{CompilerPolicy, DuplicatePolicy, RuleCompiler, RuleValidationError, ValidationReport};
pub use conditions::{ConditionList, ConditionListError, FieldUpdate};
pub use directory::{DirectoryError, RuleDirectory, RuleStore, StoreError};
pub use domain::{
    AttributeOption, Condition, ConditionField, ConditionId, JoinType, Notice, OperatorOption,
    OutcomeOption, OutcomeSelection, RuleDraft,
};
pub use editor::{EditorError, EditorMode, EditorState, RuleEditor};
pub use listing::{PageRequest, RuleFilter, RulePage, RuleStatus, RuleSummary};
pub use mapping::RuleRecord;
pub use operators::OperatorCatalog;
pub use payload::RulePayload;
pub use router::rule_router;
pub use service::{RuleAuthoringService, RuleServiceError, SubmitReceipt};

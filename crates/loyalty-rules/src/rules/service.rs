use std::sync::Arc;

use tracing::{error, info, warn};

use super::compiler::{RuleCompiler, RuleValidationError, ValidationReport};
use super::directory::{RuleStore, StoreError};
use super::domain::RuleDraft;
use super::listing::{PageRequest, RuleFilter, RulePage, RuleSummary};
use super::mapping::RuleRecord;
use super::payload::RulePayload;

pub(crate) const REJECTED_MESSAGE: &str = "Please select master and sub reward outcome";
pub(crate) const TRANSPORT_MESSAGE: &str = "Failed to create Rule Engine. Please try again";

/// Service composing the compiler with the rule store.
pub struct RuleAuthoringService<S> {
    compiler: RuleCompiler,
    store: Arc<S>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub payload: RulePayload,
    pub record: RuleRecord,
}

impl<S> RuleAuthoringService<S>
where
    S: RuleStore + 'static,
{
    pub fn new(compiler: RuleCompiler, store: Arc<S>) -> Self {
        Self { compiler, store }
    }

    pub fn compiler(&self) -> &RuleCompiler {
        &self.compiler
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn validate(&self, draft: &RuleDraft) -> Vec<RuleValidationError> {
        self.compiler.validate(draft)
    }

    pub fn compile(&self, draft: &RuleDraft) -> Result<RulePayload, ValidationReport> {
        self.compiler.compile(draft)
    }

    /// Validate, compile and persist in one step. Creates when the draft has no rule id.
    pub async fn submit(&self, draft: &RuleDraft) -> Result<SubmitReceipt, RuleServiceError> {
        let payload = self.compiler.compile(draft)?;

        let stored = match payload.rule_id() {
            Some(_) => self.store.update_rule(&payload).await,
            None => self.store.create_rule(&payload).await,
        };

        match stored {
            Ok(record) => {
                info!(rule_id = ?record.id, conditions = draft.conditions.len(), "rule submitted");
                Ok(SubmitReceipt { payload, record })
            }
            Err(StoreError::Transport(detail)) => {
                error!(%detail, "rule submission failed in transit");
                Err(RuleServiceError::Submission {
                    message: TRANSPORT_MESSAGE,
                    source: StoreError::Transport(detail),
                })
            }
            Err(other) => {
                warn!(error = %other, "rule engine refused submission");
                Err(RuleServiceError::Submission {
                    message: REJECTED_MESSAGE,
                    source: other,
                })
            }
        }
    }

    /// Load a persisted rule as an editable draft. Failures are reported, never swallowed.
    pub async fn load_draft(&self, rule_id: u64) -> Result<RuleDraft, RuleServiceError> {
        match self.store.fetch_rule(rule_id).await {
            Ok(record) => Ok(record.into_draft()),
            Err(err) => {
                error!(rule_id, error = %err, "unable to load rule for editing");
                Err(RuleServiceError::Load {
                    rule_id,
                    source: err,
                })
            }
        }
    }

    pub async fn list(&self, filter: &RuleFilter) -> Result<Vec<RuleSummary>, RuleServiceError> {
        self.store
            .list_rules(filter)
            .await
            .map_err(RuleServiceError::Store)
    }

    /// Filtered rules, sliced to the requested page.
    pub async fn list_page(
        &self,
        filter: &RuleFilter,
        page: PageRequest,
    ) -> Result<RulePage, RuleServiceError> {
        let rules = self.list(filter).await?;
        Ok(page.apply(rules))
    }

    pub async fn set_active(&self, rule_id: u64, active: bool) -> Result<(), RuleServiceError> {
        self.store
            .set_active(rule_id, active)
            .await
            .map_err(RuleServiceError::Store)?;
        info!(rule_id, active, "rule status changed");
        Ok(())
    }
}

/// Error raised by the rule authoring service.
#[derive(Debug, thiserror::Error)]
pub enum RuleServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationReport),
    /// Submission failed after validation; `message` is what the editor shows.
    #[error("{message}")]
    Submission {
        message: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("unable to load rule {rule_id}: {source}")]
    Load {
        rule_id: u64,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Store(StoreError),
}

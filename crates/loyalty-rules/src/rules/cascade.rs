//! Dependent option sets keyed by a parent selection.
//!
//! A parent change clears the dependent value and bumps a generation counter; option sets
//! fetched for an older generation are dropped on arrival.

use std::sync::Arc;

use tracing::{debug, warn};

use super::directory::RuleDirectory;
use super::domain::{AttributeOption, ConditionId, Notice, OperatorOption, OutcomeOption};
use super::operators::OperatorCatalog;

/// Clear `dependent` when the parent moves to a different value.
///
/// Re-selecting the same parent keeps the dependent selection. Returns whether the
/// dependent was cleared.
pub fn invalidate_dependent(previous_parent: &str, next_parent: &str, dependent: &mut String) -> bool {
    if previous_parent == next_parent || dependent.is_empty() {
        return false;
    }
    dependent.clear();
    true
}

/// Which cascade a ticket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeTarget {
    SubAttributes(ConditionId),
    SubOutcomes,
}

/// Proof of a parent selection, redeemed when its dependent option set arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeTicket {
    pub target: CascadeTarget,
    pub parent: String,
    generation: u64,
}

impl CascadeTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Dependent option set for one parent selection.
#[derive(Debug, Clone)]
pub struct CascadeSlot<T> {
    parent: String,
    generation: u64,
    options: Vec<T>,
    loaded: bool,
}

impl<T> Default for CascadeSlot<T> {
    fn default() -> Self {
        Self {
            parent: String::new(),
            generation: 0,
            options: Vec::new(),
            loaded: false,
        }
    }
}

impl<T> CascadeSlot<T> {
    /// Record a parent selection. The option set is always recomputed, even for the same parent.
    pub fn select_parent(&mut self, target: CascadeTarget, parent: &str) -> CascadeTicket {
        self.generation += 1;
        if self.parent != parent {
            self.options.clear();
            self.loaded = false;
            self.parent = parent.to_string();
        }
        CascadeTicket {
            target,
            parent: parent.to_string(),
            generation: self.generation,
        }
    }

    /// Install options for `ticket`; returns `false` and drops them when the ticket is stale.
    pub fn accept(&mut self, ticket: &CascadeTicket, options: Vec<T>) -> bool {
        if ticket.generation != self.generation || ticket.parent != self.parent {
            debug!(
                stale_generation = ticket.generation,
                current_generation = self.generation,
                "discarding stale cascade response"
            );
            return false;
        }
        self.options = options;
        self.loaded = true;
        true
    }

    pub fn is_current(&self, ticket: &CascadeTicket) -> bool {
        ticket.generation == self.generation && ticket.parent == self.parent
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn options(&self) -> &[T] {
        &self.options
    }

    /// Whether an option set for the current parent has arrived.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Result of a dependent lookup: never an error, at worst empty with a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup<T> {
    pub options: Vec<T>,
    pub notice: Option<Notice>,
}

impl<T> Lookup<T> {
    fn found(options: Vec<T>) -> Self {
        Self {
            options,
            notice: None,
        }
    }

    fn failed(notice: Notice) -> Self {
        Self {
            options: Vec::new(),
            notice: Some(notice),
        }
    }
}

/// Translates a parent selection into its dependent option set.
pub struct CascadeResolver<D> {
    directory: Arc<D>,
    operators: OperatorCatalog,
}

impl<D> CascadeResolver<D>
where
    D: RuleDirectory + 'static,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            operators: OperatorCatalog,
        }
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    pub async fn resolve_sub_attributes(&self, master_attribute_id: &str) -> Lookup<AttributeOption> {
        let Some(master_id) = parse_id(master_attribute_id) else {
            return Lookup::found(Vec::new());
        };
        match self.directory.sub_attributes(master_id).await {
            Ok(options) => Lookup::found(options),
            Err(err) => {
                warn!(master_attribute_id = master_id, error = %err, "sub attribute lookup failed");
                Lookup::failed(Notice::new(format!(
                    "Unable to load sub attributes: {err}"
                )))
            }
        }
    }

    pub fn resolve_sub_operators(&self, master_operator_name: &str) -> Vec<OperatorOption> {
        self.operators.sub_operators(master_operator_name)
    }

    pub async fn resolve_sub_outcomes(&self, master_outcome_id: &str) -> Lookup<OutcomeOption> {
        let Some(master_id) = parse_id(master_outcome_id) else {
            return Lookup::found(Vec::new());
        };
        match self.directory.sub_outcomes(master_id).await {
            Ok(options) => Lookup::found(options),
            Err(err) => {
                warn!(master_outcome_id = master_id, error = %err, "sub outcome lookup failed");
                Lookup::failed(Notice::new(format!(
                    "Unable to load sub reward outcomes: {err}"
                )))
            }
        }
    }
}

fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

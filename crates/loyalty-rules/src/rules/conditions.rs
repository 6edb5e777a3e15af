use std::collections::BTreeMap;

use super::cascade::{invalidate_dependent, CascadeSlot, CascadeTarget, CascadeTicket};
use super::domain::{AttributeOption, Condition, ConditionField, ConditionId, JoinType, OperatorOption};
use super::operators::OperatorCatalog;

/// Errors raised when a row edit would break the cascade invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionListError {
    #[error("condition {0} does not exist")]
    UnknownCondition(ConditionId),
    #[error("the first condition does not join onto a previous one")]
    JoinTypeOnFirstCondition,
    #[error("condition {id}: select a {parent} before its {field}")]
    MissingParent {
        id: ConditionId,
        field: &'static str,
        parent: &'static str,
    },
    #[error("condition {id}: operator '{value}' is not part of the {family} family")]
    UnknownSubOperator {
        id: ConditionId,
        family: String,
        value: String,
    },
    #[error("condition {id}: '{value}' is not a sub attribute of master attribute {master}")]
    UnknownSubAttribute {
        id: ConditionId,
        master: String,
        value: String,
    },
}

/// Effect of a single field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Applied,
    /// A master field was set. `cleared` reports whether the dependent value was reset;
    /// `ticket` is present when the dependent set has to be fetched.
    ParentSelected {
        cleared: bool,
        ticket: Option<CascadeTicket>,
    },
}

/// Ordered condition rows plus the dependent option sets of each row.
///
/// The list itself does not refuse to become empty; the compiler rejects empty rules.
#[derive(Debug, Clone)]
pub struct ConditionList {
    rows: Vec<Condition>,
    next_id: u32,
    sub_attributes: BTreeMap<ConditionId, CascadeSlot<AttributeOption>>,
    sub_operators: BTreeMap<ConditionId, Vec<OperatorOption>>,
    operators: OperatorCatalog,
}

impl Default for ConditionList {
    fn default() -> Self {
        let mut list = Self::empty();
        list.add_condition();
        list
    }
}

impl ConditionList {
    fn empty() -> Self {
        Self {
            rows: Vec::new(),
            next_id: 1,
            sub_attributes: BTreeMap::new(),
            sub_operators: BTreeMap::new(),
            operators: OperatorCatalog,
        }
    }

    /// Adopt rows loaded from the backend. Sub-operator sets are filled from the catalogue;
    /// sub-attribute sets stay unloaded until requested.
    pub fn from_conditions(conditions: Vec<Condition>) -> Self {
        let mut list = Self::empty();
        list.next_id = conditions
            .iter()
            .map(|condition| condition.id.0)
            .max()
            .unwrap_or(0)
            + 1;
        for condition in &conditions {
            list.sub_operators.insert(
                condition.id,
                list.operators.sub_operators(&condition.master_operator_name),
            );
        }
        list.rows = conditions;
        list
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.rows
    }

    pub fn into_conditions(self) -> Vec<Condition> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: ConditionId) -> Option<&Condition> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Append a blank `AND` row. There is no upper bound on the number of rows.
    pub fn add_condition(&mut self) -> ConditionId {
        let id = ConditionId(self.next_id);
        self.next_id += 1;
        self.rows.push(Condition::blank(id));
        id
    }

    pub fn remove_condition(&mut self, id: ConditionId) -> Result<Condition, ConditionListError> {
        let index = self.position(id)?;
        self.sub_attributes.remove(&id);
        self.sub_operators.remove(&id);
        Ok(self.rows.remove(index))
    }

    pub fn set_join_type(&mut self, id: ConditionId, join_type: JoinType) -> Result<(), ConditionListError> {
        let index = self.position(id)?;
        if index == 0 {
            return Err(ConditionListError::JoinTypeOnFirstCondition);
        }
        self.rows[index].join_type = join_type;
        Ok(())
    }

    pub fn update_field(
        &mut self,
        id: ConditionId,
        field: ConditionField,
        value: &str,
    ) -> Result<FieldUpdate, ConditionListError> {
        let index = self.position(id)?;

        match field {
            ConditionField::MasterAttribute => {
                let row = &mut self.rows[index];
                let previous = std::mem::replace(&mut row.master_attribute_id, value.to_string());
                let cleared = invalidate_dependent(&previous, value, &mut row.sub_attribute_key);
                let ticket = self
                    .sub_attributes
                    .entry(id)
                    .or_default()
                    .select_parent(CascadeTarget::SubAttributes(id), value);
                Ok(FieldUpdate::ParentSelected {
                    cleared,
                    ticket: Some(ticket),
                })
            }
            ConditionField::MasterOperator => {
                let row = &mut self.rows[index];
                let previous = std::mem::replace(&mut row.master_operator_name, value.to_string());
                let cleared = invalidate_dependent(&previous, value, &mut row.sub_operator_value);
                self.sub_operators
                    .insert(id, self.operators.sub_operators(value));
                Ok(FieldUpdate::ParentSelected {
                    cleared,
                    ticket: None,
                })
            }
            ConditionField::SubAttribute => {
                self.check_sub_attribute(index, value)?;
                self.rows[index].sub_attribute_key = value.to_string();
                Ok(FieldUpdate::Applied)
            }
            ConditionField::SubOperator => {
                self.check_sub_operator(index, value)?;
                self.rows[index].sub_operator_value = value.to_string();
                Ok(FieldUpdate::Applied)
            }
            ConditionField::CompareValue => {
                *self.rows[index].field_mut(field) = value.to_string();
                Ok(FieldUpdate::Applied)
            }
        }
    }

    /// Ticket to (re)load the sub-attribute set of a row without changing its selection.
    pub fn request_sub_attributes(&mut self, id: ConditionId) -> Result<CascadeTicket, ConditionListError> {
        let index = self.position(id)?;
        let master = self.rows[index].master_attribute_id.clone();
        Ok(self
            .sub_attributes
            .entry(id)
            .or_default()
            .select_parent(CascadeTarget::SubAttributes(id), &master))
    }

    /// Install a fetched sub-attribute set; stale tickets and removed rows are ignored.
    pub fn apply_sub_attributes(&mut self, ticket: &CascadeTicket, options: Vec<AttributeOption>) -> bool {
        let CascadeTarget::SubAttributes(id) = ticket.target else {
            return false;
        };
        match self.sub_attributes.get_mut(&id) {
            Some(slot) => slot.accept(ticket, options),
            None => false,
        }
    }

    pub fn sub_attribute_options(&self, id: ConditionId) -> &[AttributeOption] {
        self.sub_attributes
            .get(&id)
            .map(CascadeSlot::options)
            .unwrap_or_default()
    }

    pub fn sub_operator_options(&self, id: ConditionId) -> &[OperatorOption] {
        self.sub_operators
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn position(&self, id: ConditionId) -> Result<usize, ConditionListError> {
        self.rows
            .iter()
            .position(|row| row.id == id)
            .ok_or(ConditionListError::UnknownCondition(id))
    }

    fn check_sub_attribute(&self, index: usize, value: &str) -> Result<(), ConditionListError> {
        let row = &self.rows[index];
        if value.is_empty() {
            return Ok(());
        }
        if row.master_attribute_id.is_empty() {
            return Err(missing_parent(row.id, ConditionField::SubAttribute));
        }
        if let Some(slot) = self.sub_attributes.get(&row.id) {
            let known = slot.options().iter().any(|option| option.attribute_name == value);
            if slot.is_loaded() && slot.parent() == row.master_attribute_id && !known {
                return Err(ConditionListError::UnknownSubAttribute {
                    id: row.id,
                    master: row.master_attribute_id.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_sub_operator(&self, index: usize, value: &str) -> Result<(), ConditionListError> {
        let row = &self.rows[index];
        if value.is_empty() {
            return Ok(());
        }
        if row.master_operator_name.is_empty() {
            return Err(missing_parent(row.id, ConditionField::SubOperator));
        }
        if let Some(family) = self.operators.family(&row.master_operator_name) {
            if !family.contains(value) {
                return Err(ConditionListError::UnknownSubOperator {
                    id: row.id,
                    family: family.name.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn missing_parent(id: ConditionId, field: ConditionField) -> ConditionListError {
    let parent = field.parent().map(ConditionField::label).unwrap_or_default();
    ConditionListError::MissingParent {
        id,
        field: field.label(),
        parent,
    }
}

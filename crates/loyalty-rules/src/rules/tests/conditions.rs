use super::common::{attribute, condition};
use crate::rules::conditions::{ConditionList, ConditionListError, FieldUpdate};
use crate::rules::domain::{ConditionField, ConditionId, JoinType};

fn two_rows() -> ConditionList {
    let first = condition(1, "1", "points", "Numeric", "greater_than", "1000");
    let second = condition(2, "1", "bonus_points", "Numeric", "less_than", "50");
    ConditionList::from_conditions(vec![first, second])
}

#[test]
fn new_list_starts_with_one_blank_row() {
    let list = ConditionList::default();
    assert_eq!(list.len(), 1);
    let row = &list.conditions()[0];
    assert_eq!(row.id, ConditionId(1));
    assert_eq!(row.join_type, JoinType::And);
    assert!(!row.is_complete());
}

#[test]
fn changing_master_attribute_clears_sub_attribute_immediately() {
    let mut list = two_rows();

    let update = list
        .update_field(ConditionId(1), ConditionField::MasterAttribute, "2")
        .expect("field updates");

    let FieldUpdate::ParentSelected { cleared, ticket } = update else {
        panic!("expected a parent selection, got {update:?}");
    };
    assert!(cleared);
    let ticket = ticket.expect("sub attributes need fetching");
    assert_eq!(ticket.parent, "2");

    let row = list.get(ConditionId(1)).expect("row exists");
    assert_eq!(row.master_attribute_id, "2");
    assert_eq!(row.sub_attribute_key, "");
    assert!(list.sub_attribute_options(ConditionId(1)).is_empty());
}

#[test]
fn parent_change_only_touches_its_own_row() {
    let mut list = two_rows();
    list.update_field(ConditionId(1), ConditionField::MasterAttribute, "2")
        .expect("field updates");

    let untouched = list.get(ConditionId(2)).expect("row exists");
    assert_eq!(untouched.master_attribute_id, "1");
    assert_eq!(untouched.sub_attribute_key, "bonus_points");
}

#[test]
fn reselecting_same_master_keeps_dependent_value() {
    let mut list = two_rows();

    let update = list
        .update_field(ConditionId(1), ConditionField::MasterAttribute, "1")
        .expect("field updates");

    match update {
        FieldUpdate::ParentSelected {
            cleared: false,
            ticket: Some(_),
        } => {}
        other => panic!("expected a refresh without clearing, got {other:?}"),
    }
    assert_eq!(
        list.get(ConditionId(1)).expect("row exists").sub_attribute_key,
        "points"
    );
}

#[test]
fn stale_sub_attribute_response_is_discarded() {
    let mut list = two_rows();
    let FieldUpdate::ParentSelected {
        ticket: Some(first),
        ..
    } = list
        .update_field(ConditionId(1), ConditionField::MasterAttribute, "1")
        .expect("field updates")
    else {
        panic!("expected ticket");
    };
    let FieldUpdate::ParentSelected {
        ticket: Some(second),
        ..
    } = list
        .update_field(ConditionId(1), ConditionField::MasterAttribute, "2")
        .expect("field updates")
    else {
        panic!("expected ticket");
    };

    // the newer selection resolves first
    assert!(list.apply_sub_attributes(&second, vec![attribute(21, "tier_name", "Tier Name")]));
    assert!(!list.apply_sub_attributes(&first, vec![attribute(11, "points", "Points")]));

    let options = list.sub_attribute_options(ConditionId(1));
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].attribute_name, "tier_name");
}

#[test]
fn sub_attribute_must_belong_to_loaded_set() {
    let mut list = two_rows();
    let ticket = list
        .request_sub_attributes(ConditionId(1))
        .expect("row exists");
    list.apply_sub_attributes(
        &ticket,
        vec![
            attribute(11, "points", "Points"),
            attribute(12, "bonus_points", "Bonus Points"),
        ],
    );

    list.update_field(ConditionId(1), ConditionField::SubAttribute, "bonus_points")
        .expect("known sub attribute");

    let err = list
        .update_field(ConditionId(1), ConditionField::SubAttribute, "tier_name")
        .expect_err("unknown sub attribute");
    assert_eq!(
        err,
        ConditionListError::UnknownSubAttribute {
            id: ConditionId(1),
            master: "1".to_string(),
            value: "tier_name".to_string(),
        }
    );
}

#[test]
fn operator_family_change_clears_and_reloads_sub_operators() {
    let mut list = two_rows();
    assert!(list
        .sub_operator_options(ConditionId(1))
        .iter()
        .any(|option| option.value == "greater_than"));

    list.update_field(ConditionId(1), ConditionField::MasterOperator, "String")
        .expect("field updates");

    let row = list.get(ConditionId(1)).expect("row exists");
    assert_eq!(row.sub_operator_value, "");
    let values: Vec<&str> = list
        .sub_operator_options(ConditionId(1))
        .iter()
        .map(|option| option.value.as_str())
        .collect();
    assert!(values.contains(&"contains"));
    assert!(!values.contains(&"greater_than"));

    let err = list
        .update_field(ConditionId(1), ConditionField::SubOperator, "greater_than")
        .expect_err("operator outside family");
    assert!(matches!(err, ConditionListError::UnknownSubOperator { .. }));
}

#[test]
fn sub_fields_need_their_parent_first() {
    let mut list = ConditionList::default();
    let id = list.conditions()[0].id;

    let err = list
        .update_field(id, ConditionField::SubOperator, "equals")
        .expect_err("no master operator yet");
    assert_eq!(
        err,
        ConditionListError::MissingParent {
            id,
            field: "Sub Operator",
            parent: "Master Operator",
        }
    );

    let err = list
        .update_field(id, ConditionField::SubAttribute, "points")
        .expect_err("no master attribute yet");
    assert!(matches!(err, ConditionListError::MissingParent { .. }));
}

#[test]
fn first_row_has_no_join_type() {
    let mut list = two_rows();
    assert_eq!(
        list.set_join_type(ConditionId(1), JoinType::Or),
        Err(ConditionListError::JoinTypeOnFirstCondition)
    );

    list.set_join_type(ConditionId(2), JoinType::Or)
        .expect("second row joins");
    assert_eq!(
        list.get(ConditionId(2)).expect("row exists").join_type,
        JoinType::Or
    );
}

#[test]
fn removing_every_row_is_allowed_and_ids_are_never_reused() {
    let mut list = ConditionList::default();
    let second = list.add_condition();
    let third = list.add_condition();
    assert_eq!(second, ConditionId(2));
    assert_eq!(third, ConditionId(3));

    list.remove_condition(second).expect("row removed");
    let fourth = list.add_condition();
    assert_eq!(fourth, ConditionId(4));

    for id in [ConditionId(1), third, fourth] {
        list.remove_condition(id).expect("row removed");
    }
    assert!(list.is_empty());

    assert_eq!(
        list.remove_condition(third),
        Err(ConditionListError::UnknownCondition(third))
    );
    assert_eq!(list.add_condition(), ConditionId(5));
}

#[test]
fn response_for_removed_row_is_ignored() {
    let mut list = two_rows();
    let ticket = list
        .request_sub_attributes(ConditionId(2))
        .expect("row exists");
    list.remove_condition(ConditionId(2)).expect("row removed");

    assert!(!list.apply_sub_attributes(&ticket, vec![attribute(11, "points", "Points")]));
}

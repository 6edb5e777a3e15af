use serde_json::json;

use super::common::{compiler, condition, session, tier_upgrade};
use crate::rules::compiler::{
    CompilerPolicy, DuplicatePolicy, RuleCompiler, RuleValidationError,
};
use crate::rules::domain::JoinType;
use crate::rules::mapping::RuleRecord;

#[test]
fn tier_upgrade_compiles_into_one_condition_and_one_action() {
    let payload = compiler().compile(&tier_upgrade()).expect("rule compiles");
    let wire = serde_json::to_value(&payload).expect("serialize payload");

    assert_eq!(
        wire,
        json!({
            "rule_engine_rule": {
                "name": "Tier Upgrade",
                "display_rule_name": "Upgrade to Gold",
                "description": "This is a description of the sample rule.",
                "loyalty_type_id": "7",
                "rule_engine_conditions_attributes": [{
                    "condition_attribute": "points",
                    "operator": "greater_than",
                    "compare_value": "1000",
                    "condition_selected_model": 1,
                    "condition_type": "",
                    "master_operator": "Numeric"
                }],
                "rule_engine_actions_attributes": [{
                    "lock_model_name": "Tier",
                    "parameters": [1],
                    "rule_engine_available_function_id": 5,
                    "action_selected_model": 2
                }]
            }
        })
    );
}

#[test]
fn repeated_compare_value_is_rejected() {
    let mut draft = tier_upgrade();
    draft
        .conditions
        .push(condition(2, "2", "tier_name", "String", "equals", "1000"));

    let report = compiler().compile(&draft).expect_err("duplicate values rejected");
    assert_eq!(
        report.errors,
        vec![RuleValidationError::DuplicateCompareValue {
            value: "1000".to_string(),
            conditions: vec![1, 2],
        }]
    );
    assert_eq!(report.messages(), vec!["Each condition value must be unique"]);
}

#[test]
fn compare_values_differing_in_case_are_distinct() {
    let mut draft = tier_upgrade();
    draft.conditions[0].compare_value = "gold".to_string();
    draft
        .conditions
        .push(condition(2, "2", "tier_name", "String", "equals", "Gold"));

    assert!(compiler().validate(&draft).is_empty());
}

#[test]
fn missing_sub_operator_names_the_condition() {
    let mut draft = tier_upgrade();
    draft
        .conditions
        .push(condition(2, "2", "tier_name", "String", "", "silver"));

    let errors = compiler().validate(&draft);
    assert_eq!(
        errors,
        vec![RuleValidationError::MissingConditionField {
            index: 2,
            field: "Sub Operator",
        }]
    );
    assert_eq!(errors[0].to_string(), "Condition 2: Sub Operator is required");
}

#[test]
fn non_numeric_parameter_is_rejected() {
    let mut draft = tier_upgrade();
    draft.outcome.parameter_value = "abc".to_string();

    let report = compiler().compile(&draft).expect_err("parameter rejected");
    assert_eq!(
        report.errors,
        vec![RuleValidationError::InvalidParameter {
            value: "abc".to_string(),
        }]
    );
}

#[test]
fn every_failure_is_reported_in_check_order() {
    let mut draft = tier_upgrade();
    draft.name = "   ".to_string();
    draft.display_name.clear();
    draft.conditions[0].master_attribute_id.clear();
    draft.conditions[0].compare_value.clear();
    draft.conditions.push(condition(2, "1", "", "Numeric", "equals", "5"));
    draft.outcome.master_outcome_name.clear();
    draft.outcome.parameter_value = "1e".to_string();

    let errors = compiler().validate(&draft);
    assert_eq!(
        errors,
        vec![
            RuleValidationError::MissingRuleName,
            RuleValidationError::MissingDisplayName,
            RuleValidationError::MissingConditionField {
                index: 1,
                field: "Master Attribute",
            },
            RuleValidationError::MissingConditionField {
                index: 2,
                field: "Sub Attribute",
            },
            RuleValidationError::MissingMasterOutcome,
            RuleValidationError::InvalidParameter {
                value: "1e".to_string(),
            },
        ]
    );
}

#[test]
fn sub_outcome_is_required_once_master_is_chosen() {
    let mut draft = tier_upgrade();
    draft.outcome.sub_outcome_id.clear();

    assert_eq!(
        compiler().validate(&draft),
        vec![RuleValidationError::MissingSubOutcome]
    );
}

#[test]
fn outcome_ids_must_be_directory_ids() {
    let mut draft = tier_upgrade();
    draft.outcome.master_outcome_id = "Tier".to_string();
    draft.outcome.sub_outcome_id = "upgrade".to_string();

    let expected = vec![
        RuleValidationError::InvalidOutcomeSelection {
            field: "Master Reward Outcome",
            value: "Tier".to_string(),
        },
        RuleValidationError::InvalidOutcomeSelection {
            field: "Sub Reward Outcome",
            value: "upgrade".to_string(),
        },
    ];
    assert_eq!(compiler().validate(&draft), expected);

    let report = compiler().compile(&draft).expect_err("ids are not numeric");
    assert_eq!(report.errors, expected);
    assert_eq!(
        report.messages()[1],
        "Sub Reward Outcome must be selected from the available outcomes"
    );
}

#[test]
fn compiled_action_always_names_function_and_model() {
    let mut draft = tier_upgrade();
    draft.outcome.master_outcome_id = " 2 ".to_string();
    draft.outcome.sub_outcome_id = "5 ".to_string();

    let payload = compiler().compile(&draft).expect("rule compiles");
    let action = &payload.rule_engine_rule.rule_engine_actions_attributes[0];
    assert_eq!(action.rule_engine_available_function_id, Some(5));
    assert_eq!(action.action_selected_model, Some(2));
}

#[test]
fn rule_without_conditions_is_rejected() {
    let mut draft = tier_upgrade();
    draft.conditions.clear();

    assert_eq!(
        compiler().validate(&draft),
        vec![RuleValidationError::NoConditions]
    );
}

#[test]
fn compilation_is_deterministic() {
    let draft = tier_upgrade();
    let first = compiler().compile(&draft).expect("first compile");
    let second = compiler().compile(&draft).expect("second compile");

    assert_eq!(
        first.to_json_vec().expect("encode first"),
        second.to_json_vec().expect("encode second")
    );
}

#[test]
fn later_conditions_carry_their_join_type() {
    let mut draft = tier_upgrade();
    let mut second = condition(2, "2", "tier_name", "String", "equals", "gold");
    second.join_type = JoinType::Or;
    draft.conditions.push(second);
    draft
        .conditions
        .push(condition(3, "1", "bonus_points", "Numeric", "less_than", "50"));

    let payload = compiler().compile(&draft).expect("rule compiles");
    let types: Vec<&str> = payload
        .rule_engine_rule
        .rule_engine_conditions_attributes
        .iter()
        .map(|condition| condition.condition_type.as_str())
        .collect();
    assert_eq!(types, vec!["", "OR", "AND"]);
}

#[test]
fn unparseable_master_attribute_falls_back_to_default_model() {
    let mut draft = tier_upgrade();
    draft.conditions[0].master_attribute_id = "points_earned".to_string();

    let payload = compiler().compile(&draft).expect("rule compiles");
    assert_eq!(
        payload.rule_engine_rule.rule_engine_conditions_attributes[0].condition_selected_model,
        1
    );

    draft.conditions[0].master_attribute_id = "0".to_string();
    let payload = compiler().compile(&draft).expect("rule compiles");
    assert_eq!(
        payload.rule_engine_rule.rule_engine_conditions_attributes[0].condition_selected_model,
        1
    );
}

#[test]
fn fractional_parameter_is_sent_as_a_number() {
    let mut draft = tier_upgrade();
    draft.outcome.parameter_value = " 2.5 ".to_string();

    let payload = compiler().compile(&draft).expect("rule compiles");
    let wire = serde_json::to_value(&payload).expect("serialize payload");
    assert_eq!(
        wire["rule_engine_rule"]["rule_engine_actions_attributes"][0]["parameters"],
        json!([2.5])
    );
}

#[test]
fn names_are_trimmed_but_compare_values_are_sent_as_entered() {
    let mut draft = tier_upgrade();
    draft.name = "  Tier Upgrade ".to_string();
    draft.conditions[0].compare_value = " 1000 ".to_string();

    let payload = compiler().compile(&draft).expect("rule compiles");
    assert_eq!(payload.rule_engine_rule.name, "Tier Upgrade");
    assert_eq!(
        payload.rule_engine_rule.rule_engine_conditions_attributes[0].compare_value,
        " 1000 "
    );
}

#[test]
fn signature_policy_allows_shared_values_on_different_attributes() {
    let compiler = RuleCompiler::new(
        session(),
        CompilerPolicy::with_duplicate_policy(DuplicatePolicy::ConditionSignature),
    );
    let mut draft = tier_upgrade();
    draft
        .conditions
        .push(condition(2, "1", "bonus_points", "Numeric", "greater_than", "1000"));
    assert!(compiler.validate(&draft).is_empty());

    draft
        .conditions
        .push(condition(3, "1", "points", "Numeric", "greater_than", "1000"));
    assert_eq!(
        compiler.validate(&draft),
        vec![RuleValidationError::DuplicateConditionSignature {
            conditions: vec![1, 3],
        }]
    );
}

#[test]
fn echoed_payload_maps_back_to_the_draft() {
    let draft = tier_upgrade();
    let payload = compiler().compile(&draft).expect("rule compiles");

    assert_eq!(RuleRecord::echo(&payload).into_draft(), draft);
}

#[test]
fn edited_rule_keeps_backend_ids_through_a_round_trip() {
    let mut draft = tier_upgrade();
    draft.rule_id = Some(42);
    draft.conditions[0].backend_id = Some(420);
    draft.outcome.action_id = Some(77);

    let payload = compiler().compile(&draft).expect("rule compiles");
    assert_eq!(payload.rule_id(), Some(42));
    assert_eq!(
        payload.rule_engine_rule.rule_engine_conditions_attributes[0].id,
        Some(420)
    );
    assert_eq!(payload.rule_engine_rule.rule_engine_actions_attributes[0].id, Some(77));

    assert_eq!(RuleRecord::echo(&payload).into_draft(), draft);
}

use super::common::{build_service, tier_upgrade, StoreFailure};
use crate::rules::compiler::RuleValidationError;
use crate::rules::directory::StoreError;
use crate::rules::listing::{RuleFilter, RuleStatus};
use crate::rules::service::RuleServiceError;

#[tokio::test]
async fn submit_creates_rule_without_id() {
    let (service, store) = build_service();

    let receipt = service.submit(&tier_upgrade()).await.expect("rule created");

    assert_eq!(receipt.record.id, Some(1));
    assert_eq!(receipt.payload.rule_id(), None);
    assert_eq!(store.submissions(), vec![receipt.payload]);
}

#[tokio::test]
async fn submit_updates_rule_with_id() {
    let (service, store) = build_service();
    let created = service.submit(&tier_upgrade()).await.expect("rule created");
    let rule_id = created.record.id.expect("assigned id");

    let mut draft = service.load_draft(rule_id).await.expect("rule loads");
    draft.display_name = "Upgrade to Platinum".to_string();
    let updated = service.submit(&draft).await.expect("rule updated");

    assert_eq!(updated.record.id, Some(rule_id));
    assert_eq!(updated.payload.rule_id(), Some(rule_id));
    let reloaded = service.load_draft(rule_id).await.expect("rule reloads");
    assert_eq!(reloaded.display_name, "Upgrade to Platinum");
    assert_eq!(store.submissions().len(), 2);
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_store() {
    let (service, store) = build_service();
    let mut draft = tier_upgrade();
    draft.outcome.parameter_value = "abc".to_string();

    match service.submit(&draft).await {
        Err(RuleServiceError::Validation(report)) => {
            assert_eq!(
                report.errors,
                vec![RuleValidationError::InvalidParameter {
                    value: "abc".to_string(),
                }]
            );
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(store.submissions().is_empty());
}

#[tokio::test]
async fn refused_submission_asks_for_outcomes() {
    let (service, store) = build_service();
    store.fail_with(StoreFailure::Rejected);

    let err = service.submit(&tier_upgrade()).await.expect_err("submission refused");
    match &err {
        RuleServiceError::Submission {
            source: StoreError::Rejected { status: 422, .. },
            ..
        } => {}
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.to_string(), "Please select master and sub reward outcome");
}

#[tokio::test]
async fn transport_failure_asks_to_retry() {
    let (service, store) = build_service();
    store.fail_with(StoreFailure::Transport);

    let err = service.submit(&tier_upgrade()).await.expect_err("submission failed");
    assert_eq!(err.to_string(), "Failed to create Rule Engine. Please try again");
}

#[tokio::test]
async fn loading_missing_rule_reports_not_found() {
    let (service, _store) = build_service();

    match service.load_draft(404).await {
        Err(RuleServiceError::Load {
            rule_id: 404,
            source: StoreError::NotFound(404),
        }) => {}
        other => panic!("expected load failure, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_and_status_toggle() {
    let (service, _store) = build_service();
    service.submit(&tier_upgrade()).await.expect("rule created");
    let mut other = tier_upgrade();
    other.name = "Birthday Bonus".to_string();
    other.conditions[0].compare_value = "1".to_string();
    service.submit(&other).await.expect("rule created");

    let all = service.list(&RuleFilter::default()).await.expect("rules listed");
    assert_eq!(all.len(), 2);

    service.set_active(2, false).await.expect("rule deactivated");
    let inactive = service
        .list(&RuleFilter {
            status: Some(RuleStatus::Inactive),
            ..RuleFilter::default()
        })
        .await
        .expect("rules listed");
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].name, "Birthday Bonus");

    let searched = service
        .list(&RuleFilter {
            search: Some("tier".to_string()),
            ..RuleFilter::default()
        })
        .await
        .expect("rules listed");
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, 1);

    match service.set_active(99, true).await {
        Err(RuleServiceError::Store(StoreError::NotFound(99))) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

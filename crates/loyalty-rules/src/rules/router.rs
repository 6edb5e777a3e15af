use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::compiler::ValidationReport;
use super::directory::{RuleStore, StoreError};
use super::domain::RuleDraft;
use super::listing::{PageRequest, RuleFilter};
use super::operators::OperatorCatalog;
use super::service::{RuleAuthoringService, RuleServiceError};

/// Router builder exposing rule validation, compilation and persistence endpoints.
pub fn rule_router<S>(service: Arc<RuleAuthoringService<S>>) -> Router
where
    S: RuleStore + 'static,
{
    Router::new()
        .route("/api/v1/rules", get(list_handler::<S>).post(create_handler::<S>))
        .route("/api/v1/rules/operators", get(operators_handler))
        .route("/api/v1/rules/validate", post(validate_handler::<S>))
        .route("/api/v1/rules/compile", post(compile_handler::<S>))
        .route("/api/v1/rules/:rule_id", axum::routing::put(update_handler::<S>))
        .route("/api/v1/rules/:rule_id/draft", get(draft_handler::<S>))
        .route("/api/v1/rules/:rule_id/active", patch(active_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveToggle {
    pub(crate) active: bool,
}

pub(crate) async fn operators_handler() -> Response {
    (StatusCode::OK, Json(OperatorCatalog.families())).into_response()
}

pub(crate) async fn validate_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Json(draft): Json<RuleDraft>,
) -> Response
where
    S: RuleStore + 'static,
{
    let errors = service.validate(&draft);
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    let payload = json!({
        "valid": errors.is_empty(),
        "errors": errors,
        "messages": messages,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn compile_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Json(draft): Json<RuleDraft>,
) -> Response
where
    S: RuleStore + 'static,
{
    match service.compile(&draft) {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(report) => validation_response(&report),
    }
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Json(mut draft): Json<RuleDraft>,
) -> Response
where
    S: RuleStore + 'static,
{
    draft.rule_id = None;
    submit(&service, draft, StatusCode::CREATED).await
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Path(rule_id): Path<u64>,
    Json(mut draft): Json<RuleDraft>,
) -> Response
where
    S: RuleStore + 'static,
{
    draft.rule_id = Some(rule_id);
    submit(&service, draft, StatusCode::OK).await
}

async fn submit<S>(service: &RuleAuthoringService<S>, draft: RuleDraft, success: StatusCode) -> Response
where
    S: RuleStore + 'static,
{
    match service.submit(&draft).await {
        Ok(receipt) => {
            let payload = json!({
                "rule_id": receipt.record.id,
                "payload": receipt.payload,
            });
            (success, Json(payload)).into_response()
        }
        Err(RuleServiceError::Validation(report)) => validation_response(&report),
        Err(RuleServiceError::Submission { message, .. }) => {
            let payload = json!({ "error": message });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
        Err(other) => internal_error(&other),
    }
}

pub(crate) async fn draft_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Path(rule_id): Path<u64>,
) -> Response
where
    S: RuleStore + 'static,
{
    match service.load_draft(rule_id).await {
        Ok(draft) => (StatusCode::OK, Json(draft)).into_response(),
        Err(RuleServiceError::Load {
            source: StoreError::NotFound(_),
            ..
        }) => {
            let payload = json!({ "error": format!("rule {rule_id} not found") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Query(filter): Query<RuleFilter>,
    Query(page): Query<PageRequest>,
) -> Response
where
    S: RuleStore + 'static,
{
    match service.list_page(&filter, page).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn active_handler<S>(
    State(service): State<Arc<RuleAuthoringService<S>>>,
    Path(rule_id): Path<u64>,
    Json(toggle): Json<ActiveToggle>,
) -> Response
where
    S: RuleStore + 'static,
{
    match service.set_active(rule_id, toggle.active).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(RuleServiceError::Store(StoreError::NotFound(_))) => {
            let payload = json!({ "error": format!("rule {rule_id} not found") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

fn validation_response(report: &ValidationReport) -> Response {
    let payload = json!({
        "error": "rule is invalid",
        "errors": report.errors,
        "messages": report.messages(),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

fn internal_error(error: &RuleServiceError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use loyalty_rules::rules::{
    rule_router, DirectoryError, RuleAuthoringService, RuleDirectory, RuleStore,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

pub(crate) type SharedDirectory = Arc<dyn RuleDirectory>;

pub(crate) fn with_service_routes<S>(
    service: Arc<RuleAuthoringService<S>>,
    directory: SharedDirectory,
) -> axum::Router
where
    S: RuleStore + 'static,
{
    rule_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/directory/master_attributes",
            axum::routing::get(master_attributes_endpoint),
        )
        .route(
            "/api/v1/directory/master_attributes/:master_id/sub_attributes",
            axum::routing::get(sub_attributes_endpoint),
        )
        .route(
            "/api/v1/directory/master_outcomes",
            axum::routing::get(master_outcomes_endpoint),
        )
        .route(
            "/api/v1/directory/master_outcomes/:master_id/sub_outcomes",
            axum::routing::get(sub_outcomes_endpoint),
        )
        .layer(Extension(directory))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn master_attributes_endpoint(
    Extension(directory): Extension<SharedDirectory>,
) -> Response {
    directory_response(directory.master_attributes().await)
}

pub(crate) async fn sub_attributes_endpoint(
    Extension(directory): Extension<SharedDirectory>,
    Path(master_id): Path<u64>,
) -> Response {
    directory_response(directory.sub_attributes(master_id).await)
}

pub(crate) async fn master_outcomes_endpoint(
    Extension(directory): Extension<SharedDirectory>,
) -> Response {
    directory_response(directory.master_outcomes().await)
}

pub(crate) async fn sub_outcomes_endpoint(
    Extension(directory): Extension<SharedDirectory>,
    Path(master_id): Path<u64>,
) -> Response {
    directory_response(directory.sub_outcomes(master_id).await)
}

fn directory_response<T: Serialize>(result: Result<Vec<T>, DirectoryError>) -> Response {
    match result {
        Ok(options) => (StatusCode::OK, Json(options)).into_response(),
        Err(DirectoryError::UnknownMaster(id)) => {
            let payload = json!({ "error": format!("unknown master entry {id}") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => {
            warn!(error = %err, "directory lookup failed");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

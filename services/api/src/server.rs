use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRuleStore, StaticRuleDirectory};
use crate::routes::{with_service_routes, SharedDirectory};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loyalty_rules::config::AppConfig;
use loyalty_rules::error::AppError;
use loyalty_rules::rules::{CompilerPolicy, HttpRuleEngineClient, RuleAuthoringService, RuleCompiler};
use loyalty_rules::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let session = config.rule_engine.session();
    let compiler = RuleCompiler::new(
        session.clone(),
        CompilerPolicy::with_duplicate_policy(config.rule_engine.duplicate_policy),
    );

    let router = match config.rule_engine.base_url.as_deref() {
        Some(base_url) => {
            let client = Arc::new(HttpRuleEngineClient::new(
                base_url,
                session,
                config.rule_engine.timeout,
            )?);
            info!(base_url = client.base_url(), "using remote rule engine");
            let service = Arc::new(RuleAuthoringService::new(compiler, client.clone()));
            let directory: SharedDirectory = client;
            with_service_routes(service, directory)
        }
        None => {
            warn!("RULE_ENGINE_BASE_URL not set; rules are kept in memory");
            let store = Arc::new(InMemoryRuleStore::default());
            let service = Arc::new(RuleAuthoringService::new(compiler, store));
            let directory: SharedDirectory = Arc::new(StaticRuleDirectory::sample());
            with_service_routes(service, directory)
        }
    };

    let app = router
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loyalty rule service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::cli::ServeArgs;
use crate::infra::{build_backend, seed_demo_pets, AppState};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use furever::config::AppConfig;
use furever::error::AppError;
use furever::telemetry;
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

    if config.admin.bootstrap_emails.is_empty() {
        warn!("no APP_ADMIN_EMAILS configured; admin endpoints will be unreachable");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let backend = build_backend(&config.admin);
    if config.seed_demo_data {
        seed_demo_pets(&backend.pets)
            .await
            .map_err(|err| AppError::Io(std::io::Error::other(err.to_string())))?;
    }

    let app = with_workflow_routes(backend.workflows, backend.accounts)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "adoption workflow service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::cli::ServeArgs;
use crate::infra::{build_tracker, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use utility_tracker::config::AppConfig;
use utility_tracker::error::AppError;
use utility_tracker::telemetry;
use utility_tracker::tracker::{realtime_router, tracker_router};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let stack = build_tracker(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        broadcaster: stack.broadcaster.clone(),
    };

    let app = with_operational_routes(
        tracker_router(stack.service).merge(realtime_router(stack.broadcaster)),
    )
    .layer(Extension(app_state))
    .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_path = %config.storage.data_path.display(),
        "utility complaint tracker ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

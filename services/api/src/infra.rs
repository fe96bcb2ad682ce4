use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use utility_tracker::config::AppConfig;
use utility_tracker::error::AppError;
use utility_tracker::tracker::seed::demo_snapshot;
use utility_tracker::tracker::{EventBroadcaster, JsonFileStore, PriorityEngine, TrackerService};

pub(crate) type Tracker = TrackerService<JsonFileStore, EventBroadcaster>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) broadcaster: Arc<EventBroadcaster>,
}

/// Wired service plus the broadcaster shared with the realtime endpoint.
pub(crate) struct TrackerStack {
    pub(crate) service: Arc<Tracker>,
    pub(crate) broadcaster: Arc<EventBroadcaster>,
}

pub(crate) fn open_store(config: &AppConfig, path: Option<PathBuf>) -> JsonFileStore {
    JsonFileStore::new(path.unwrap_or_else(|| config.storage.data_path.clone()))
}

pub(crate) fn build_tracker(config: &AppConfig) -> Result<TrackerStack, AppError> {
    let store = Arc::new(open_store(config, None));
    if config.storage.seed_on_start {
        store.initialize_if_missing(&demo_snapshot(chrono::Utc::now()))?;
    }
    info!(path = %store.path().display(), "complaint store ready");

    let broadcaster = Arc::new(EventBroadcaster::new(config.realtime.subscriber_queue));
    let engine = PriorityEngine::from_config(&config.priority);
    let service = Arc::new(TrackerService::new(store, broadcaster.clone(), engine));

    Ok(TrackerStack {
        service,
        broadcaster,
    })
}

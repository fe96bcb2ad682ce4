//! End-to-end scenarios over the public router, the JSON file store, and the live broadcaster.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;
use utility_tracker::tracker::seed::demo_snapshot;
use utility_tracker::tracker::{
    tracker_router, EventBroadcaster, EventName, JsonFileStore, PriorityEngine, Room,
    SnapshotStore, TrackerService,
};

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<JsonFileStore>,
    broadcaster: Arc<EventBroadcaster>,
    router: axum::Router,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = Arc::new(JsonFileStore::new(dir.path().join("database.json")));
    store
        .initialize_if_missing(&demo_snapshot(Utc::now()))
        .expect("seed written");
    let broadcaster = Arc::new(EventBroadcaster::new(16));
    let service = Arc::new(TrackerService::new(
        store.clone(),
        broadcaster.clone(),
        PriorityEngine::default(),
    ));
    Harness {
        _dir: dir,
        store,
        broadcaster,
        router: tracker_router(service),
    }
}

async fn call(router: &axum::Router, method: Method, uri: &str, body: Value) -> Value {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

fn power_outage(area: &str) -> Value {
    json!({
        "type": "power",
        "problemType": "no_electricity",
        "description": "Whole lane has no power",
        "location": format!("{area} Sector 9"),
        "area": area,
        "userId": 2
    })
}

#[tokio::test]
async fn clustered_outages_escalate_and_persist() {
    let harness = harness();

    let mut tiers = Vec::new();
    for _ in 0..6 {
        let body = call(
            &harness.router,
            Method::POST,
            "/api/complaints",
            power_outage("Vashi"),
        )
        .await;
        tiers.push(body["complaint"]["priority"].as_str().map(str::to_string));
    }

    let tiers: Vec<_> = tiers.into_iter().flatten().collect();
    // The seeded Vashi outage is also open and recent.
    assert_eq!(tiers, ["low", "medium", "medium", "medium", "high", "high"]);

    let snapshot = harness.store.load().expect("reloads");
    assert_eq!(snapshot.complaints.len(), 8);
    let ids: Vec<u64> = snapshot.complaints.iter().map(|c| c.id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    assert_eq!(snapshot.sequences.complaints, 8);
}

#[tokio::test]
async fn area_subscribers_see_unscoped_events_but_not_other_rooms() {
    let harness = harness();
    let mut vashi = harness.broadcaster.subscribe();
    let mut admin = harness.broadcaster.subscribe();
    harness
        .broadcaster
        .join(vashi.id, Room::Area("Vashi".to_string()));
    harness.broadcaster.join(admin.id, Room::Admin);

    call(
        &harness.router,
        Method::POST,
        "/api/complaints",
        power_outage("Vashi"),
    )
    .await;

    let first = vashi.receiver.recv().await.expect("complaint event");
    let second = vashi.receiver.recv().await.expect("stats event");
    assert_eq!(first.event, EventName::NewComplaint);
    assert_eq!(second.event, EventName::StatsUpdate);
    assert_eq!(second.data["totalComplaints"], 3);

    while admin.receiver.try_recv().is_ok() {}

    call(
        &harness.router,
        Method::PUT,
        "/api/admin/complaints/2/status",
        json!({ "status": "assigned" }),
    )
    .await;

    let admin_event = admin.receiver.recv().await.expect("admin sees update");
    assert_eq!(admin_event.event, EventName::ComplaintUpdated);
    assert_eq!(admin_event.data["area"], "Nerul");

    let vashi_event = vashi.receiver.recv().await.expect("stats still unscoped");
    assert_eq!(vashi_event.event, EventName::StatsUpdate);
    assert!(vashi.receiver.try_recv().is_err());
}

#[tokio::test]
async fn registration_then_login_uses_the_same_store() {
    let harness = harness();

    let registered = call(
        &harness.router,
        Method::POST,
        "/api/register",
        json!({ "phone": "9820012345", "name": "Kavita Rao", "area": "Sanpada" }),
    )
    .await;
    assert_eq!(registered["user"]["id"], 3);

    let duplicate = call(
        &harness.router,
        Method::POST,
        "/api/register",
        json!({ "phone": "9820012345", "name": "Kavita Rao", "area": "Sanpada" }),
    )
    .await;
    assert_eq!(duplicate["success"], false);

    let login = call(
        &harness.router,
        Method::POST,
        "/api/login",
        json!({ "phone": "9820012345" }),
    )
    .await;
    assert_eq!(login["user"]["area"], "Sanpada");
    assert_eq!(
        harness
            .store
            .load()
            .expect("reloads")
            .users
            .iter()
            .filter(|user| user.phone == "9820012345")
            .count(),
        1
    );
}

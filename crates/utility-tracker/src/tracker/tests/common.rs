use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::tracker::broadcast::{EventName, EventPublisher, Room, TrackerEvent};
use crate::tracker::clock::Clock;
use crate::tracker::domain::{
    Complaint, ComplaintStatus, ComplaintSubmission, PriorityTier, ProblemType, ServiceType,
};
use crate::tracker::priority::PriorityEngine;
use crate::tracker::seed::demo_snapshot;
use crate::tracker::service::TrackerService;
use crate::tracker::store::{Snapshot, SnapshotStore, StoreError};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 14, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn complaint(
    id: u64,
    service_type: ServiceType,
    area: &str,
    status: ComplaintStatus,
    age: Duration,
) -> Complaint {
    let problem_type = match service_type {
        ServiceType::Power => ProblemType::NoElectricity,
        ServiceType::Water => ProblemType::NoWater,
    };
    let created_at = now() - age;
    Complaint {
        id,
        service_type,
        problem_type,
        description: format!("Outage report {id}"),
        location: format!("{area} Sector {id}"),
        area: area.to_string(),
        user_id: 2,
        landmark: None,
        urgency: None,
        status,
        priority: PriorityTier::Low,
        created_at,
        updated_at: created_at,
    }
}

/// `count` open power complaints in Vashi, all filed within the last hour.
pub(super) fn recent_power_complaints(count: usize) -> Vec<Complaint> {
    (1..=count as u64)
        .map(|id| {
            complaint(
                id,
                ServiceType::Power,
                "Vashi",
                ComplaintStatus::Submitted,
                Duration::minutes(id as i64),
            )
        })
        .collect()
}

pub(super) fn candidate() -> Complaint {
    complaint(
        1_000,
        ServiceType::Power,
        "Vashi",
        ComplaintStatus::Submitted,
        Duration::zero(),
    )
}

pub(super) fn submission() -> ComplaintSubmission {
    ComplaintSubmission {
        service_type: ServiceType::Power,
        problem_type: ProblemType::TransformerIssue,
        description: "Transformer sparking near the market".to_string(),
        location: "Vashi Sector 17".to_string(),
        area: "Vashi".to_string(),
        user_id: 2,
        landmark: Some("Opposite Inorbit Mall".to_string()),
        urgency: None,
    }
}

pub(super) fn seeded_snapshot() -> Snapshot {
    demo_snapshot(now() - Duration::days(1))
}

#[derive(Debug, Clone, Copy)]
pub(super) struct FixedClock(pub(super) DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
pub(super) struct MemoryStore {
    snapshot: Mutex<Snapshot>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub(super) fn with(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            saves: Mutex::new(0),
        }
    }

    pub(super) fn snapshot(&self) -> Snapshot {
        self.snapshot.lock().expect("store mutex poisoned").clone()
    }

    pub(super) fn saves(&self) -> usize {
        *self.saves.lock().expect("store mutex poisoned")
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.snapshot())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.snapshot.lock().expect("store mutex poisoned") = snapshot.clone();
        *self.saves.lock().expect("store mutex poisoned") += 1;
        Ok(())
    }
}

/// Reads succeed but every write fails, as with a read-only disk.
pub(super) struct ReadOnlyStore {
    snapshot: Snapshot,
}

impl ReadOnlyStore {
    pub(super) fn with(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

impl SnapshotStore for ReadOnlyStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: PathBuf::from("/data/database.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only file system"),
        })
    }
}

/// Store whose document never parses; saves are captured.
#[derive(Default)]
pub(super) struct CorruptStore {
    saved: Mutex<Option<Snapshot>>,
}

impl CorruptStore {
    pub(super) fn saved(&self) -> Option<Snapshot> {
        self.saved.lock().expect("store mutex poisoned").clone()
    }
}

impl SnapshotStore for CorruptStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let source = serde_json::from_str::<Snapshot>("{\"users\": [").unwrap_err();
        Err(StoreError::Corrupt {
            path: PathBuf::from("/data/database.json"),
            source,
        })
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.saved.lock().expect("store mutex poisoned") = Some(snapshot.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Published {
    pub(super) rooms: Option<Vec<Room>>,
    pub(super) event: TrackerEvent,
}

#[derive(Default)]
pub(super) struct RecordingPublisher {
    events: Mutex<Vec<Published>>,
}

impl RecordingPublisher {
    pub(super) fn events(&self) -> Vec<Published> {
        self.events.lock().expect("publisher mutex poisoned").clone()
    }

    pub(super) fn names(&self) -> Vec<EventName> {
        self.events()
            .into_iter()
            .map(|published| published.event.event)
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: TrackerEvent) -> usize {
        self.events
            .lock()
            .expect("publisher mutex poisoned")
            .push(Published { rooms: None, event });
        1
    }

    fn publish_to(&self, rooms: &[Room], event: TrackerEvent) -> usize {
        self.events
            .lock()
            .expect("publisher mutex poisoned")
            .push(Published {
                rooms: Some(rooms.to_vec()),
                event,
            });
        1
    }
}

pub(super) fn build_service_with<S: SnapshotStore + 'static>(
    store: Arc<S>,
) -> (
    TrackerService<S, RecordingPublisher>,
    Arc<RecordingPublisher>,
) {
    let publisher = Arc::new(RecordingPublisher::default());
    let service = TrackerService::with_clock(
        store,
        publisher.clone(),
        PriorityEngine::default(),
        Arc::new(FixedClock(now())),
    );
    (service, publisher)
}

pub(super) fn build_service() -> (
    TrackerService<MemoryStore, RecordingPublisher>,
    Arc<MemoryStore>,
    Arc<RecordingPublisher>,
) {
    let store = Arc::new(MemoryStore::with(seeded_snapshot()));
    let (service, publisher) = build_service_with(store.clone());
    (service, store, publisher)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::domain::UserRole;

/// Names of the events pushed over the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    NewComplaint,
    NewAnnouncement,
    StatsUpdate,
    ComplaintUpdated,
}

impl EventName {
    pub const fn as_str(self) -> &'static str {
        match self {
            EventName::NewComplaint => "new_complaint",
            EventName::NewAnnouncement => "new_announcement",
            EventName::StatsUpdate => "stats_update",
            EventName::ComplaintUpdated => "complaint_updated",
        }
    }
}

/// Wire frame delivered to subscribers: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    pub event: EventName,
    pub data: Value,
}

impl TrackerEvent {
    pub fn new<T: Serialize>(event: EventName, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event,
            data: serde_json::to_value(payload)?,
        })
    }
}

/// Broadcast scope a connection can join.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Room {
    Admin,
    Area(String),
}

impl Room {
    /// Admins land in the shared admin room; everyone else in their area's room.
    pub fn for_member(role: UserRole, area: &str) -> Self {
        match role {
            UserRole::Admin => Room::Admin,
            UserRole::User => Room::Area(area.to_string()),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        if name == "admin_room" {
            return Some(Room::Admin);
        }
        name.strip_prefix("area_")
            .filter(|area| !area.is_empty())
            .map(|area| Room::Area(area.to_string()))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Admin => write!(f, "admin_room"),
            Room::Area(area) => write!(f, "area_{area}"),
        }
    }
}

/// Outbound seam used by the service so tests can record events without sockets.
pub trait EventPublisher: Send + Sync {
    /// Deliver to every connected subscriber. Returns the number of queues that accepted it.
    fn publish(&self, event: TrackerEvent) -> usize;
    /// Deliver once to each subscriber that has joined at least one of `rooms`.
    fn publish_to(&self, rooms: &[Room], event: TrackerEvent) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle returned to a new connection. Events arrive on `receiver` until disconnect.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<TrackerEvent>,
}

struct Subscriber {
    sender: mpsc::Sender<TrackerEvent>,
    rooms: BTreeSet<Room>,
}

/// Registry of live connections with bounded per-connection queues.
///
/// Delivery is at-most-once with no replay: a subscriber that connects after a publish never
/// sees it, a full queue drops the event for that subscriber only, and a closed queue is
/// unregistered on the next publish.
#[derive(Clone)]
pub struct EventBroadcaster {
    capacity: usize,
    subscribers: Arc<Mutex<HashMap<SubscriberId, Subscriber>>>,
    sequence: Arc<AtomicU64>,
}

impl fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        info!(capacity, "event broadcaster initialized");
        Self {
            capacity: capacity.max(1),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(1)),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriberId, Subscriber>> {
        // A panic while holding the lock leaves the map itself intact.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.sequence.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.capacity);
        let mut registry = self.registry();
        registry.insert(
            id,
            Subscriber {
                sender,
                rooms: BTreeSet::new(),
            },
        );
        info!(subscriber = %id, connected = registry.len(), "subscriber connected");
        Subscription { id, receiver }
    }

    /// Returns false when the subscriber is no longer connected.
    pub fn join(&self, id: SubscriberId, room: Room) -> bool {
        match self.registry().get_mut(&id) {
            Some(subscriber) => {
                info!(subscriber = %id, room = %room, "subscriber joined room");
                subscriber.rooms.insert(room);
                true
            }
            None => false,
        }
    }

    pub fn leave(&self, id: SubscriberId, room: &Room) -> bool {
        match self.registry().get_mut(&id) {
            Some(subscriber) => {
                let removed = subscriber.rooms.remove(room);
                debug!(subscriber = %id, room = %room, removed, "subscriber left room");
                removed
            }
            None => false,
        }
    }

    pub fn disconnect(&self, id: SubscriberId) {
        let mut registry = self.registry();
        if registry.remove(&id).is_some() {
            info!(subscriber = %id, connected = registry.len(), "subscriber disconnected");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    pub fn rooms_of(&self, id: SubscriberId) -> Vec<Room> {
        self.registry()
            .get(&id)
            .map(|subscriber| subscriber.rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn deliver<F>(&self, event: &TrackerEvent, mut interested: F) -> usize
    where
        F: FnMut(&Subscriber) -> bool,
    {
        let mut registry = self.registry();
        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, subscriber) in registry.iter() {
            if !interested(subscriber) {
                continue;
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        subscriber = %id,
                        event = event.event.as_str(),
                        "subscriber queue full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            registry.remove(&id);
            debug!(subscriber = %id, "pruned closed subscriber");
        }

        debug!(event = event.event.as_str(), delivered, "event published");
        delivered
    }
}

impl EventPublisher for EventBroadcaster {
    fn publish(&self, event: TrackerEvent) -> usize {
        self.deliver(&event, |_| true)
    }

    fn publish_to(&self, rooms: &[Room], event: TrackerEvent) -> usize {
        self.deliver(&event, |subscriber| {
            rooms.iter().any(|room| subscriber.rooms.contains(room))
        })
    }
}

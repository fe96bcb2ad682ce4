//! Complaint intake, priority escalation, persistence, and realtime fan-out.

pub mod broadcast;
pub mod clock;
pub mod domain;
pub mod priority;
pub mod realtime;
pub mod router;
pub mod seed;
pub mod service;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

pub use broadcast::{
    EventBroadcaster, EventName, EventPublisher, Room, SubscriberId, Subscription, TrackerEvent,
};
pub use clock::{Clock, SystemClock};
pub use domain::{
    Announcement, AnnouncementKind, AnnouncementRequest, Area, Complaint, ComplaintFilter,
    ComplaintScope, ComplaintStatus, ComplaintSubmission, PriorityTier, ProblemType,
    RegistrationRequest, ServiceType, Technician, User, UserRole, UserView,
};
pub use priority::{compute_priority, PriorityEngine};
pub use realtime::realtime_router;
pub use router::tracker_router;
pub use service::{TrackerError, TrackerService, ValidationError};
pub use stats::{AdminStats, SystemStats};
pub use store::{JsonFileStore, Snapshot, SnapshotStore, StoreError};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::broadcast::{EventName, EventPublisher, Room, TrackerEvent};
use super::clock::{Clock, SystemClock};
use super::domain::{
    Announcement, AnnouncementRequest, Area, Complaint, ComplaintFilter, ComplaintScope,
    ComplaintStatus, ComplaintSubmission, PriorityTier, RegistrationRequest, Technician, User,
    UserRole, UserView,
};
use super::priority::PriorityEngine;
use super::stats::{AdminStats, SystemStats};
use super::store::{Snapshot, SnapshotStore, StoreError};

/// Composes the snapshot store, priority engine, and event publisher.
///
/// Every mutation runs load, modify, save, publish while holding a single writer lock, so two
/// requests can never allocate from the same snapshot. Events go out only after the save
/// succeeds, which means a client reacting to an event always reads the persisted state.
///
/// Methods block on store I/O, so async callers run them on the blocking pool.
pub struct TrackerService<S, P> {
    store: Arc<S>,
    publisher: Arc<P>,
    clock: Arc<dyn Clock>,
    engine: PriorityEngine,
    writer: Mutex<()>,
}

impl<S, P> TrackerService<S, P>
where
    S: SnapshotStore + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(store: Arc<S>, publisher: Arc<P>, engine: PriorityEngine) -> Self {
        Self::with_clock(store, publisher, engine, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        publisher: Arc<P>,
        engine: PriorityEngine,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            publisher,
            clock,
            engine,
            writer: Mutex::new(()),
        }
    }

    /// Look a user up by phone number. There is no password.
    pub fn login(&self, phone: &str) -> Result<UserView, TrackerError> {
        let snapshot = self.read_snapshot();
        match snapshot.find_user_by_phone(phone.trim()) {
            Some(user) => {
                info!(user_id = user.id, role = ?user.role, "login succeeded");
                Ok(user.view())
            }
            None => {
                info!("login for unknown phone");
                Err(TrackerError::UserNotFound)
            }
        }
    }

    pub fn register(&self, request: RegistrationRequest) -> Result<UserView, TrackerError> {
        let phone = required("phone", &request.phone)?;
        let name = required("name", &request.name)?;
        let area = required("area", &request.area)?;

        let _writer = self.lock_writer();
        let mut snapshot = self.load_for_write()?;
        if snapshot.find_user_by_phone(&phone).is_some() {
            info!("registration rejected for existing phone");
            return Err(TrackerError::UserExists);
        }

        let user = User {
            id: snapshot.next_user_id(),
            phone,
            name,
            area,
            role: UserRole::User,
            created_at: self.clock.now(),
        };
        snapshot.users.push(user.clone());
        self.persist(&snapshot)?;

        info!(user_id = user.id, area = %user.area, "user registered");
        Ok(user.view())
    }

    pub fn submit_complaint(
        &self,
        submission: ComplaintSubmission,
    ) -> Result<Complaint, TrackerError> {
        let description = required("description", &submission.description)?;
        let location = required("location", &submission.location)?;
        let area = required("area", &submission.area)?;
        let problem_service = submission.problem_type.service_type();
        if problem_service != submission.service_type {
            return Err(ValidationError::ProblemMismatch {
                problem: submission.problem_type.label(),
                service: submission.service_type.label(),
            }
            .into());
        }

        let _writer = self.lock_writer();
        let mut snapshot = self.load_for_write()?;
        let now = self.clock.now();

        let mut complaint = Complaint {
            id: snapshot.next_complaint_id(),
            service_type: submission.service_type,
            problem_type: submission.problem_type,
            description,
            location,
            area,
            user_id: submission.user_id,
            landmark: optional(submission.landmark),
            urgency: optional(submission.urgency),
            status: ComplaintStatus::Submitted,
            priority: PriorityTier::Low,
            created_at: now,
            updated_at: now,
        };
        complaint.priority = self.engine.score(&complaint, &snapshot.complaints, now);

        snapshot.complaints.push(complaint.clone());
        self.persist(&snapshot)?;

        info!(
            tracking_id = %complaint.tracking_id(),
            user_id = complaint.user_id,
            area = %complaint.area,
            service = complaint.service_type.label(),
            priority = complaint.priority.label(),
            "complaint submitted"
        );

        self.broadcast(EventName::NewComplaint, &complaint);
        self.broadcast(EventName::StatsUpdate, &SystemStats::from_snapshot(&snapshot));
        Ok(complaint)
    }

    /// `user_id` wins over `area`; with neither, every complaint is returned.
    pub fn complaints(&self, filter: &ComplaintFilter) -> Vec<Complaint> {
        let snapshot = self.read_snapshot();
        match filter.scope() {
            ComplaintScope::All => snapshot.complaints,
            ComplaintScope::User(user_id) => snapshot.complaints_for_user(user_id),
            ComplaintScope::Area(area) => snapshot.complaints_in_area(area),
            ComplaintScope::Nothing => {
                debug!(user_id = ?filter.user_id, "user filter is not a number");
                Vec::new()
            }
        }
    }

    pub fn all_complaints(&self) -> Vec<Complaint> {
        self.read_snapshot().complaints
    }

    pub fn active_announcements(&self) -> Vec<Announcement> {
        self.read_snapshot().active_announcements()
    }

    pub fn areas(&self) -> Vec<Area> {
        self.read_snapshot().areas
    }

    pub fn technicians(&self) -> Vec<Technician> {
        self.read_snapshot().technicians
    }

    pub fn stats(&self) -> SystemStats {
        SystemStats::from_snapshot(&self.read_snapshot())
    }

    pub fn admin_stats(&self) -> AdminStats {
        AdminStats::from_snapshot(&self.read_snapshot())
    }

    pub fn publish_announcement(
        &self,
        request: AnnouncementRequest,
    ) -> Result<Announcement, TrackerError> {
        let title = required("title", &request.title)?;
        let message = required("message", &request.message)?;

        let _writer = self.lock_writer();
        let mut snapshot = self.load_for_write()?;
        let announcement = Announcement {
            id: snapshot.next_announcement_id(),
            title,
            message,
            kind: request.kind,
            created_at: self.clock.now(),
            active: true,
        };
        snapshot.announcements.push(announcement.clone());
        self.persist(&snapshot)?;

        info!(announcement_id = announcement.id, kind = ?announcement.kind, "announcement published");
        self.broadcast(EventName::NewAnnouncement, &announcement);
        Ok(announcement)
    }

    /// Hide an announcement from the public listing without deleting it.
    pub fn deactivate_announcement(&self, id: u64) -> Result<Announcement, TrackerError> {
        let _writer = self.lock_writer();
        let mut snapshot = self.load_for_write()?;
        let announcement = snapshot
            .announcement_mut(id)
            .ok_or(TrackerError::AnnouncementNotFound(id))?;
        announcement.active = false;
        let announcement = announcement.clone();
        self.persist(&snapshot)?;

        info!(announcement_id = id, "announcement deactivated");
        Ok(announcement)
    }

    /// Admin status change. Priority is left as computed at submission.
    pub fn update_complaint_status(
        &self,
        id: u64,
        status: ComplaintStatus,
    ) -> Result<Complaint, TrackerError> {
        let _writer = self.lock_writer();
        let mut snapshot = self.load_for_write()?;
        let now = self.clock.now();
        let complaint = snapshot
            .complaint_mut(id)
            .ok_or(TrackerError::ComplaintNotFound(id))?;
        let previous = complaint.status;
        complaint.status = status;
        complaint.updated_at = now;
        let complaint = complaint.clone();
        self.persist(&snapshot)?;

        info!(
            tracking_id = %complaint.tracking_id(),
            from = previous.label(),
            to = status.label(),
            "complaint status updated"
        );

        let rooms = [Room::Admin, Room::Area(complaint.area.clone())];
        self.broadcast_to(&rooms, EventName::ComplaintUpdated, &complaint);
        self.broadcast(EventName::StatsUpdate, &SystemStats::from_snapshot(&snapshot));
        Ok(complaint)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads never fail: an unreadable store is reported and treated as empty.
    fn read_snapshot(&self) -> Snapshot {
        match self.store.load() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(error = %err, "failed to load snapshot, serving empty collections");
                Snapshot::default()
            }
        }
    }

    /// Corrupt state falls back to empty collections; an unreachable store fails the write.
    fn load_for_write(&self) -> Result<Snapshot, TrackerError> {
        match self.store.load() {
            Ok(snapshot) => Ok(snapshot),
            Err(err @ StoreError::Corrupt { .. }) => {
                warn!(error = %err, "snapshot corrupt, continuing from empty collections");
                Ok(Snapshot::default())
            }
            Err(err) => {
                error!(error = %err, "failed to load snapshot for write");
                Err(TrackerError::Persistence(err))
            }
        }
    }

    fn persist(&self, snapshot: &Snapshot) -> Result<(), TrackerError> {
        self.store.save(snapshot).map_err(|err| {
            error!(error = %err, "failed to persist snapshot");
            TrackerError::Persistence(err)
        })
    }

    fn broadcast<T: Serialize>(&self, name: EventName, payload: &T) {
        match TrackerEvent::new(name, payload) {
            Ok(event) => {
                self.publisher.publish(event);
            }
            Err(err) => warn!(event = name.as_str(), error = %err, "failed to encode event"),
        }
    }

    fn broadcast_to<T: Serialize>(&self, rooms: &[Room], name: EventName, payload: &T) {
        match TrackerEvent::new(name, payload) {
            Ok(event) => {
                self.publisher.publish_to(rooms, event);
            }
            Err(err) => warn!(event = name.as_str(), error = %err, "failed to encode event"),
        }
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

/// Request fields rejected before the store is touched.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("problem type '{problem}' is not a {service} problem")]
    ProblemMismatch {
        problem: &'static str,
        service: &'static str,
    },
}

/// Error raised by the tracker service.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("User not found. Please register.")]
    UserNotFound,
    #[error("User already exists")]
    UserExists,
    #[error("complaint {0} not found")]
    ComplaintNotFound(u64),
    #[error("announcement {0} not found")]
    AnnouncementNotFound(u64),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to save changes")]
    Persistence(#[source] StoreError),
}

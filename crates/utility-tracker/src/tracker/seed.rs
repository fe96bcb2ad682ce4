//! Demo dataset written on first start so the dashboards have something to show.

use chrono::{DateTime, Utc};

use super::domain::{
    Announcement, AnnouncementKind, Area, Complaint, ComplaintStatus, GeoPoint, PriorityTier,
    ProblemType, ServiceType, Specialization, Technician, TechnicianStatus, User, UserRole,
    UtilityStatus,
};
use super::store::{Sequences, Snapshot};

/// Phone number of the seeded administrator.
pub const ADMIN_PHONE: &str = "9876543210";
/// Phone number of the seeded citizen account.
pub const CITIZEN_PHONE: &str = "9876543211";

pub fn demo_snapshot(now: DateTime<Utc>) -> Snapshot {
    let users = vec![
        User {
            id: 1,
            phone: ADMIN_PHONE.to_string(),
            name: "Admin User".to_string(),
            area: "Vashi".to_string(),
            role: UserRole::Admin,
            created_at: now,
        },
        User {
            id: 2,
            phone: CITIZEN_PHONE.to_string(),
            name: "Test User".to_string(),
            area: "Nerul".to_string(),
            role: UserRole::User,
            created_at: now,
        },
    ];

    let complaints = vec![
        Complaint {
            id: 1,
            service_type: ServiceType::Power,
            problem_type: ProblemType::NoElectricity,
            description: "Complete power outage in building".to_string(),
            location: "Vashi Sector 15".to_string(),
            area: "Vashi".to_string(),
            user_id: 2,
            landmark: None,
            urgency: None,
            status: ComplaintStatus::Submitted,
            priority: PriorityTier::High,
            created_at: now,
            updated_at: now,
        },
        Complaint {
            id: 2,
            service_type: ServiceType::Water,
            problem_type: ProblemType::LowPressure,
            description: "Very low water pressure since morning".to_string(),
            location: "Nerul Sector 20".to_string(),
            area: "Nerul".to_string(),
            user_id: 2,
            landmark: None,
            urgency: None,
            status: ComplaintStatus::InProgress,
            priority: PriorityTier::Medium,
            created_at: now,
            updated_at: now,
        },
    ];

    let announcement = |id, title: &str, message: &str, kind| Announcement {
        id,
        title: title.to_string(),
        message: message.to_string(),
        kind,
        created_at: now,
        active: true,
    };
    let announcements = vec![
        announcement(
            1,
            "Welcome to Navi Mumbai Utilities",
            "Report power and water issues in real-time. Our team is here to help you 24/7.",
            AnnouncementKind::Info,
        ),
        announcement(
            2,
            "Scheduled Maintenance",
            "Power maintenance in Kharghar on Saturday 2PM-4PM. Sorry for the inconvenience.",
            AnnouncementKind::Maintenance,
        ),
        announcement(
            3,
            "Water Supply Update",
            "Water supply will be affected in Vashi tomorrow from 10AM-2PM for pipeline repair.",
            AnnouncementKind::Alert,
        ),
    ];

    let technicians = vec![
        Technician {
            id: 1,
            name: "Raj Sharma".to_string(),
            phone: "9876543211".to_string(),
            specialization: Specialization::Power,
            status: TechnicianStatus::Available,
            location: GeoPoint {
                lat: 19.0760,
                lng: 72.8777,
            },
            complaints_assigned: vec![1],
        },
        Technician {
            id: 2,
            name: "Priya Patel".to_string(),
            phone: "9876543212".to_string(),
            specialization: Specialization::Water,
            status: TechnicianStatus::Busy,
            location: GeoPoint {
                lat: 19.0330,
                lng: 73.0297,
            },
            complaints_assigned: vec![2],
        },
        Technician {
            id: 3,
            name: "Amit Kumar".to_string(),
            phone: "9876543213".to_string(),
            specialization: Specialization::Both,
            status: TechnicianStatus::Available,
            location: GeoPoint {
                lat: 19.0361,
                lng: 73.0612,
            },
            complaints_assigned: Vec::new(),
        },
    ];

    let area = |name: &str, power_status, water_status, complaints| Area {
        name: name.to_string(),
        power_status,
        water_status,
        complaints,
    };
    let areas = vec![
        area("Vashi", UtilityStatus::Normal, UtilityStatus::Normal, 5),
        area("Nerul", UtilityStatus::Normal, UtilityStatus::Low, 3),
        area("Kharghar", UtilityStatus::Outage, UtilityStatus::Normal, 8),
        area("Sanpada", UtilityStatus::Normal, UtilityStatus::Normal, 2),
        area("Seawoods", UtilityStatus::Normal, UtilityStatus::Normal, 1),
        area("Panvel", UtilityStatus::Fluctuating, UtilityStatus::Normal, 4),
        area("Kamothe", UtilityStatus::Normal, UtilityStatus::Low, 2),
    ];

    Snapshot {
        sequences: Sequences {
            users: users.len() as u64,
            complaints: complaints.len() as u64,
            announcements: announcements.len() as u64,
        },
        users,
        complaints,
        announcements,
        technicians,
        areas,
    }
}

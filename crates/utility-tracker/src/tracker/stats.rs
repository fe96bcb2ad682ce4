use serde::{Deserialize, Serialize};

use super::domain::{ComplaintStatus, ServiceType, TechnicianStatus, UtilityStatus};
use super::store::Snapshot;

/// Dashboard counters shared by citizens and admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_complaints: usize,
    pub active_complaints: usize,
    pub resolved_complaints: usize,
    pub power_complaints: usize,
    pub water_complaints: usize,
    pub avg_resolution_time: String,
    pub resolution_rate: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaStat {
    pub name: String,
    pub power_status: UtilityStatus,
    pub water_status: UtilityStatus,
    pub complaint_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(flatten)]
    pub system: SystemStats,
    pub total_users: usize,
    pub total_technicians: usize,
    pub available_technicians: usize,
    pub area_stats: Vec<AreaStat>,
}

impl SystemStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let complaints = &snapshot.complaints;
        let total = complaints.len();
        let resolved: Vec<_> = complaints
            .iter()
            .filter(|complaint| complaint.status == ComplaintStatus::Resolved)
            .collect();
        let count_type = |service: ServiceType| {
            complaints
                .iter()
                .filter(|complaint| complaint.service_type == service)
                .count()
        };

        let avg_resolution_time = if resolved.is_empty() {
            "0h".to_string()
        } else {
            let total_minutes: i64 = resolved
                .iter()
                .map(|complaint| {
                    (complaint.updated_at - complaint.created_at)
                        .num_minutes()
                        .max(0)
                })
                .sum();
            let hours = total_minutes as f64 / 60.0 / resolved.len() as f64;
            format!("{hours:.1}h")
        };

        let resolution_rate = if total == 0 {
            "0%".to_string()
        } else {
            format!("{:.1}%", resolved.len() as f64 / total as f64 * 100.0)
        };

        Self {
            total_complaints: total,
            active_complaints: total - resolved.len(),
            resolved_complaints: resolved.len(),
            power_complaints: count_type(ServiceType::Power),
            water_complaints: count_type(ServiceType::Water),
            avg_resolution_time,
            resolution_rate,
        }
    }
}

impl AdminStats {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            system: SystemStats::from_snapshot(snapshot),
            total_users: snapshot.users.len(),
            total_technicians: snapshot.technicians.len(),
            available_technicians: snapshot
                .technicians
                .iter()
                .filter(|technician| technician.status == TechnicianStatus::Available)
                .count(),
            area_stats: snapshot
                .areas
                .iter()
                .map(|area| AreaStat {
                    name: area.name.clone(),
                    power_status: area.power_status,
                    water_status: area.water_status,
                    complaint_count: area.complaints,
                })
                .collect(),
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered citizen or administrator. The phone number is the login key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub phone: String,
    pub name: String,
    pub area: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            phone: self.phone.clone(),
            name: self.name.clone(),
            area: self.area.clone(),
            role: self.role,
        }
    }
}

/// User fields exposed by the login and registration endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: u64,
    pub phone: String,
    pub name: String,
    pub area: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Utility a complaint is filed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Power,
    Water,
}

impl ServiceType {
    pub const fn label(self) -> &'static str {
        match self {
            ServiceType::Power => "power",
            ServiceType::Water => "water",
        }
    }
}

/// Catalogue of reportable faults; each belongs to exactly one utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    NoElectricity,
    VoltageFluctuation,
    MeterProblem,
    StreetLightFault,
    TransformerIssue,
    WireDamage,
    NoWater,
    LowPressure,
    DirtyWater,
    PipeLeakage,
    Overflow,
    MeterIssue,
}

impl ProblemType {
    pub const fn service_type(self) -> ServiceType {
        match self {
            ProblemType::NoElectricity
            | ProblemType::VoltageFluctuation
            | ProblemType::MeterProblem
            | ProblemType::StreetLightFault
            | ProblemType::TransformerIssue
            | ProblemType::WireDamage => ServiceType::Power,
            ProblemType::NoWater
            | ProblemType::LowPressure
            | ProblemType::DirtyWater
            | ProblemType::PipeLeakage
            | ProblemType::Overflow
            | ProblemType::MeterIssue => ServiceType::Water,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ProblemType::NoElectricity => "No Electricity",
            ProblemType::VoltageFluctuation => "Voltage Fluctuation",
            ProblemType::MeterProblem => "Meter Problem",
            ProblemType::StreetLightFault => "Street Light Fault",
            ProblemType::TransformerIssue => "Transformer Issue",
            ProblemType::WireDamage => "Wire Damage",
            ProblemType::NoWater => "No Water Supply",
            ProblemType::LowPressure => "Low Water Pressure",
            ProblemType::DirtyWater => "Dirty Water",
            ProblemType::PipeLeakage => "Pipe Leakage",
            ProblemType::Overflow => "Tank Overflow",
            ProblemType::MeterIssue => "Water Meter Issue",
        }
    }
}

/// Lifecycle of a complaint. Ordered, but transitions are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    Submitted,
    Assigned,
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::Assigned => "assigned",
            ComplaintStatus::InProgress => "in-progress",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    pub const fn is_open(self) -> bool {
        !matches!(self, ComplaintStatus::Resolved)
    }
}

/// Severity tier assigned at submission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityTier {
    pub const fn label(self) -> &'static str {
        match self {
            PriorityTier::Low => "low",
            PriorityTier::Medium => "medium",
            PriorityTier::High => "high",
            PriorityTier::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: u64,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub problem_type: ProblemType,
    pub description: String,
    pub location: String,
    pub area: String,
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    pub status: ComplaintStatus,
    pub priority: PriorityTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    /// Public tracking reference shown to citizens, e.g. `NM42`.
    pub fn tracking_id(&self) -> String {
        format!("NM{}", self.id)
    }
}

/// Citizen-provided complaint fields; the server fills in the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintSubmission {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub problem_type: ProblemType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub area: String,
    pub user_id: u64,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
}

/// Query filters for complaint listings. `user_id` takes precedence over `area`.
///
/// Both arrive as raw query text: a blank value counts as absent, and a `user_id` that is not
/// a number matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintFilter {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
}

/// Which complaints a listing should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplaintScope<'a> {
    All,
    User(u64),
    Area(&'a str),
    Nothing,
}

impl ComplaintFilter {
    pub fn scope(&self) -> ComplaintScope<'_> {
        match (present(&self.user_id), present(&self.area)) {
            (Some(user_id), _) => user_id
                .parse()
                .map(ComplaintScope::User)
                .unwrap_or(ComplaintScope::Nothing),
            (None, Some(area)) => ComplaintScope::Area(area),
            (None, None) => ComplaintScope::All,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: u64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: AnnouncementKind,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    Info,
    Alert,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default = "default_announcement_kind")]
    pub kind: AnnouncementKind,
}

fn default_announcement_kind() -> AnnouncementKind {
    AnnouncementKind::Info
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ComplaintStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: u64,
    pub name: String,
    pub phone: String,
    pub specialization: Specialization,
    pub status: TechnicianStatus,
    pub location: GeoPoint,
    pub complaints_assigned: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    Power,
    Water,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechnicianStatus {
    Available,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Display-only area summary. Counts come from seed data and are not kept in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub name: String,
    pub power_status: UtilityStatus,
    pub water_status: UtilityStatus,
    pub complaints: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilityStatus {
    Normal,
    Low,
    Outage,
    Fluctuating,
}

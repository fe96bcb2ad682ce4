use chrono::{DateTime, Duration, Utc};

use super::domain::{Complaint, PriorityTier};
use crate::config::PriorityConfig;

/// Length of the trailing window used when none is configured.
pub const DEFAULT_WINDOW_HOURS: i64 = 2;

/// Escalates complaints by counting open, same-area, same-utility reports in a trailing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityEngine {
    window: Duration,
    medium_at: usize,
    high_at: usize,
    critical_at: usize,
}

impl Default for PriorityEngine {
    fn default() -> Self {
        Self {
            window: Duration::hours(DEFAULT_WINDOW_HOURS),
            medium_at: 2,
            high_at: 5,
            critical_at: 10,
        }
    }
}

impl PriorityEngine {
    pub fn from_config(config: &PriorityConfig) -> Self {
        let window = Duration::from_std(config.window)
            .unwrap_or_else(|_| Duration::hours(DEFAULT_WINDOW_HOURS));
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of existing complaints that count toward `candidate`'s tier.
    pub fn similar_count(
        &self,
        candidate: &Complaint,
        existing: &[Complaint],
        now: DateTime<Utc>,
    ) -> usize {
        let window_start = now - self.window;
        existing
            .iter()
            .filter(|other| *other != candidate)
            .filter(|other| other.service_type == candidate.service_type)
            .filter(|other| other.area == candidate.area)
            .filter(|other| other.status.is_open())
            .filter(|other| other.created_at > window_start)
            .count()
    }

    pub fn tier_for(&self, similar: usize) -> PriorityTier {
        if similar >= self.critical_at {
            PriorityTier::Critical
        } else if similar >= self.high_at {
            PriorityTier::High
        } else if similar >= self.medium_at {
            PriorityTier::Medium
        } else {
            PriorityTier::Low
        }
    }

    pub fn score(
        &self,
        candidate: &Complaint,
        existing: &[Complaint],
        now: DateTime<Utc>,
    ) -> PriorityTier {
        self.tier_for(self.similar_count(candidate, existing, now))
    }
}

/// Tier for `candidate` under the default two-hour window.
pub fn compute_priority(
    candidate: &Complaint,
    existing: &[Complaint],
    now: DateTime<Utc>,
) -> PriorityTier {
    PriorityEngine::default().score(candidate, existing, now)
}

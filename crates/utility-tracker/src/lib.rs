//! Complaint intake and realtime status tracking for municipal power and water services.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod tracker;

//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod alert_history_repo;
pub mod alert_repo;
pub mod directory_repo;

pub use alert_history_repo::AlertHistoryRepo;
pub use alert_repo::AlertRepo;
pub use directory_repo::{DeviceRepo, PatientRepo, StaffRepo};

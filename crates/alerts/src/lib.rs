//! Alert lifecycle and escalation engine.
//!
//! [`AlertService`] drives alerts through their state machine against the
//! storage and directory ports defined in `carecall-core`.
//! [`EscalationScheduler`] periodically escalates pending alerts that
//! nobody has picked up in time.

pub mod authorization;
pub mod history;
pub mod priority;
pub mod scheduler;
pub mod service;

pub use scheduler::{EscalationScheduler, PassReport, SchedulerConfig};
pub use service::{AlertService, Collaborators, Escalation};

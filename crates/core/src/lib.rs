//! Domain types and rules for the nurse-call alert engine.
//!
//! Nothing in this crate performs I/O. Storage and directory access go
//! through the traits in [`ports`].

pub mod alert;
pub mod directory;
pub mod error;
pub mod escalation;
pub mod history;
pub mod ports;
pub mod priority;
pub mod requests;
pub mod types;

//! Row structs.
//!
//! Each submodule contains a `FromRow` struct matching the database row and
//! a conversion into the corresponding `carecall_core` domain type. Lookup
//! ids that do not map to a known enum variant surface as
//! `CoreError::Internal`.

pub mod alert;
pub mod alert_history;
pub mod directory;

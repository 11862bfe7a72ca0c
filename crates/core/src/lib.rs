//! Domain logic for the issue tracker.
//!
//! Everything in this crate is pure: no database handles, no HTTP types.
//! The `db` and `api` crates call into it for validation, timestamp
//! reconciliation, statistics math, and spreadsheet serialization.

pub mod duration;
pub mod error;
pub mod export;
pub mod issue;
pub mod listing;
pub mod reconcile;
pub mod stats;
pub mod timestamp;
pub mod types;

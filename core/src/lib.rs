//! Core library for the verve wellness companion.
//!
//! Local-first domain stores with a best-effort remote mirror, plus the
//! pure read-side engines derived from them: list merging, ranking,
//! correlation and forecast analytics, and quota enforcement. The binary
//! crate wires these to SQLite persistence and the CLI surface.

pub mod analytics;
pub mod error;
pub mod merge;
pub mod models;
pub mod quota;
pub mod rank;
pub mod remote;
pub mod storage;
pub mod stores;

pub use error::{CoreError, Result};

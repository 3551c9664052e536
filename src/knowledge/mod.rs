//! Core knowledge engine: entry store, query engine, aggregation, and contexts.
//!
//! Every operation takes the SQLite connection explicitly and returns a
//! [`Result`] whose error side is a [`KnowledgeError`].

pub mod contexts;
pub mod entries;
pub mod error;
pub mod search;
pub mod stats;
pub mod types;

pub use error::{KnowledgeError, Result};

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a timestamp the way it is stored: RFC 3339, UTC, fixed microsecond
/// precision. Fixed width keeps lexical order equal to chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The current time in storage format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

//! Time endpoint module
//!
//! Builds the `{datetime, timestamp}` payload from a single wall-clock sample
//! so the two fields can never disagree.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// JSON payload for the time endpoint
#[derive(Debug, Clone, Serialize)]
pub struct TimePayload {
    /// The sampled instant as ISO-8601 with millisecond precision and a `Z`
    /// suffix, e.g. `2026-01-28T12:00:00.000Z`
    pub datetime: String,
    /// The same instant as Unix epoch milliseconds
    pub timestamp: i64,
}

/// Sample the clock once and derive both payload fields from it.
#[must_use]
pub fn current_time() -> TimePayload {
    let now = Utc::now();
    TimePayload {
        datetime: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        timestamp: now.timestamp_millis(),
    }
}

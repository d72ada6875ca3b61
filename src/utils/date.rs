//! UTC timestamps for the event log, descriptors and the merged asset map.
//!
//! All stamps are ISO-8601 without the trailing `Z`; callers that need the
//! zone marker append it (the event log line format does).

use chrono::{SecondsFormat, Utc};

/// Current UTC time, e.g. `2025-06-15T14:30:45.123456`.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Current UTC time with zone marker, e.g. `2025-06-15T14:30:45Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

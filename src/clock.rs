//! Wall-clock helpers for reply timestamps

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC time as ISO-8601 with microsecond precision
pub fn now_iso8601() -> String {
    format_iso8601(Utc::now())
}

pub fn format_iso8601(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn unix_time() -> i64 {
    Utc::now().timestamp()
}

//! Conversion between site-local wall-clock strings and UTC epoch seconds.

use crate::error::{ChronologyError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

/// Wall-clock layouts accepted from submissions, tried in order.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Layout used when showing a stored timestamp back to an editor.
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Parse a site offset such as `+02:00`, `-0530`, `+9` or `UTC`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
        return Ok(utc());
    }
    let invalid = || ChronologyError::InvalidOffset(raw.to_string());

    let (sign, rest) = match s.as_bytes()[0] {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => (1, s),
    };
    if !rest.is_ascii() {
        return Err(invalid());
    }
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// Convert a submitted timestamp to UTC epoch seconds.
///
/// Wall-clock strings are read in `offset`. Strings that already carry an
/// offset (RFC 3339) keep it, and bare integers are taken as epoch seconds.
pub fn to_utc_epoch(raw: &str, offset: FixedOffset) -> Result<i64> {
    let s = raw.trim();
    let invalid = || ChronologyError::InvalidTimestamp(raw.to_string());

    if !s.is_empty() && s.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().map_err(|_| invalid());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp());
    }

    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.timestamp())
        .ok_or_else(invalid)
}

/// Render epoch seconds as a wall-clock string in `offset`.
pub fn format_local(timestamp: i64, offset: FixedOffset) -> String {
    match offset.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format(DISPLAY_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

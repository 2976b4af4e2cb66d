// ⏰ Temporal - lenient timestamp parsing for viewing exports
//
// Anything that doesn't parse is treated as absent, never as an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

/// Parse a timestamp in any of the formats Netflix exports use
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // RFC 3339 with offset: compare in UTC
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    // Fractional seconds ("2023-01-15 20:31:12.345")
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// True if any value parses to a moment on/after the start of `cutoff`
pub fn any_on_or_after<'a, I>(values: I, cutoff: NaiveDate) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let Some(cutoff) = cutoff.and_hms_opt(0, 0, 0) else {
        return false;
    };

    values
        .into_iter()
        .filter_map(parse_timestamp)
        .any(|ts| ts >= cutoff)
}

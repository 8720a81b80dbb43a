//! Date/time reformatting for temporal columns.
//!
//! [`reformat`] tries a permissive set of common textual layouts first, then a short list of
//! Chinese locale layouts, and renders the first match as [`CANONICAL_LAYOUT`]. Failure is never
//! an error: [`reformat_or_raw`] hands back the input unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Output layout for every reformatted value (`YYYY-MM-DD HH:MM:SS`).
pub const CANONICAL_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%Y%m%d%H%M%S",
];

const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%Y%m%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
];

const ZONED_LAYOUTS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%.f %z"];

/// Chinese layouts tried only after the permissive parser gives up.
const LOCALE_DATETIME_LAYOUTS: &[&str] = &[
    "%Y年%m月%d日%H时%M分%S秒",
    "%Y年%m月%d日 %H时%M分%S秒",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日%H:%M:%S",
];

const LOCALE_DATE_LAYOUTS: &[&str] = &["%Y年%m月%d日"];

/// Parse `raw` with the permissive parser, then the locale layouts.
pub fn parse(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_permissive(s).or_else(|| parse_locale(s))
}

/// Reformat `raw` into [`CANONICAL_LAYOUT`], or `None` if no layout matches.
pub fn reformat(raw: &str) -> Option<String> {
    parse(raw).map(|dt| dt.format(CANONICAL_LAYOUT).to_string())
}

/// Reformat `raw`, falling back to the original text.
pub fn reformat_or_raw(raw: &str) -> String {
    reformat(raw).unwrap_or_else(|| raw.to_string())
}

fn parse_permissive(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    for layout in ZONED_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(s, layout) {
            return Some(dt.naive_local());
        }
    }
    if let Some(dt) = parse_layouts(s, DATETIME_LAYOUTS, DATE_LAYOUTS) {
        return Some(dt);
    }
    parse_unix_timestamp(s)
}

fn parse_locale(s: &str) -> Option<NaiveDateTime> {
    parse_layouts(s, LOCALE_DATETIME_LAYOUTS, LOCALE_DATE_LAYOUTS)
}

fn parse_layouts(s: &str, datetime_layouts: &[&str], date_layouts: &[&str]) -> Option<NaiveDateTime> {
    datetime_layouts
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| {
            date_layouts
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// 10-digit seconds or 13-digit milliseconds since the epoch, rendered in UTC.
fn parse_unix_timestamp(s: &str) -> Option<NaiveDateTime> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = s.parse().ok()?;
    let dt = match s.len() {
        10 => DateTime::from_timestamp(n, 0)?,
        13 => DateTime::from_timestamp_millis(n)?,
        _ => return None,
    };
    Some(dt.naive_utc())
}

//! Timestamp resolution and title formatting.
//!
//! A record may carry its own `timestamp` (epoch milliseconds or a date
//! string). Strings are tried as ISO-8601 before anything else, so a bare
//! `"2024"` is a year and not an epoch offset. When it is missing or unparsable the receipt time is used
//! instead; a bad timestamp never fails an append.
//!
//! Titles are rendered as `YYYY/MM/DD HH:MM:SS` in a caller-supplied time
//! zone, zero-padded with a 24-hour clock. Production passes `chrono::Local`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use std::fmt::Display;
use tracing::debug;

/// Largest absolute epoch offset a date may have, in milliseconds (±100 000 000 days).
const MAX_EPOCH_MS: f64 = 8.64e15;

/// Output layout for titles.
pub const TITLE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Space- and slash-separated layouts without an offset; read as wall-clock
/// time in `tz`. `T`-separated forms go through [`parse_iso`].
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Pick the effective instant for a record.
pub fn resolve<Tz: TimeZone>(
    value: Option<&Value>,
    received_at: DateTime<Utc>,
    tz: &Tz,
) -> DateTime<Utc> {
    match value {
        Some(raw) => parse_timestamp(raw, tz).unwrap_or_else(|| {
            debug!(timestamp = %raw, "Unparsable record timestamp, using receipt time");
            received_at
        }),
        None => received_at,
    }
}

/// Parse a JSON `timestamp` value. Returns `None` for anything that is not a
/// valid date.
pub fn parse_timestamp<Tz: TimeZone>(value: &Value, tz: &Tz) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch_millis),
        Value::String(s) => parse_str(s.trim(), tz),
        _ => None,
    }
}

fn from_epoch_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() {
        return None;
    }
    let ms = ms.trunc();
    if ms.abs() > MAX_EPOCH_MS {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

fn parse_str<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    // ISO first: "2024" is a year, not 2024 ms.
    if let Some(dt) = parse_iso(s, tz) {
        return Some(dt);
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<f64>().ok().and_then(from_epoch_millis);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(&naive, tz);
        }
    }

    // Slash date-only forms are local midnight.
    NaiveDate::parse_from_str(s, "%Y/%m/%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| localize(&naive, tz))
}

/// ISO-8601 date or date-time:
/// `YYYY[-MM[-DD]]` optionally followed by `THH:MM[:SS[.fff]]` and `Z` or
/// `±HH[:]MM`. Date-only forms are UTC midnight; date-times without an
/// offset are wall-clock time in `tz`. Years may be `±YYYYYY`.
fn parse_iso<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = match s.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (s, None),
    };
    let date = parse_iso_date(date_part)?;
    let Some(time_part) = time_part else {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    };

    let (clock, offset) = split_offset(time_part)?;
    let naive = date.and_time(parse_iso_time(clock)?);
    match offset {
        Some(offset) => offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc)),
        None => localize(&naive, tz),
    }
}

fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let (year, rest) = match s.as_bytes().first()? {
        sign @ (b'+' | b'-') => {
            let year = fixed_digits(s.get(1..7)?, 6)? as i32;
            (if *sign == b'-' { -year } else { year }, &s[7..])
        }
        _ => (fixed_digits(s.get(..4)?, 4)? as i32, &s[4..]),
    };
    let (month, day) = if rest.is_empty() {
        (1, 1)
    } else {
        match rest.strip_prefix('-')?.split_once('-') {
            Some((month, day)) => (fixed_digits(month, 2)?, fixed_digits(day, 2)?),
            None => (fixed_digits(&rest[1..], 2)?, 1),
        }
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split a trailing `Z` / `±HH:MM` / `±HHMM` off a time of day.
fn split_offset(s: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = s.strip_suffix(['Z', 'z']) {
        return Some((clock, FixedOffset::east_opt(0)));
    }
    let Some(idx) = s.rfind(['+', '-']) else {
        return Some((s, None));
    };
    let sign = if s.as_bytes()[idx] == b'-' { -1 } else { 1 };
    let raw = &s[idx + 1..];
    let (hours, minutes) = match raw.split_once(':') {
        Some(parts) => parts,
        None if raw.len() == 4 && raw.is_char_boundary(2) => raw.split_at(2),
        None => return None,
    };
    let hours = fixed_digits(hours, 2)?;
    let minutes = fixed_digits(minutes, 2)?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60) as i32)?;
    Some((&s[..idx], Some(offset)))
}

/// `HH:MM`, `HH:MM:SS` or `HH:MM:SS.fff` (fraction up to nanoseconds).
fn parse_iso_time(s: &str) -> Option<NaiveTime> {
    let (hms, fraction) = match s.split_once('.') {
        Some((hms, fraction)) => (hms, Some(fraction)),
        None => (s, None),
    };
    let mut fields = hms.split(':');
    let hour = fixed_digits(fields.next()?, 2)?;
    let minute = fixed_digits(fields.next()?, 2)?;
    let second = fields.next().map(|f| fixed_digits(f, 2));
    if fields.next().is_some() {
        return None;
    }
    let nanos = match (second, fraction) {
        (_, None) => 0,
        (Some(_), Some(f)) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
            let f = &f[..f.len().min(9)];
            format!("{f:0<9}").parse().ok()?
        }
        _ => return None,
    };
    NaiveTime::from_hms_nano_opt(hour, minute, second.unwrap_or(Some(0))?, nanos)
}

/// Exactly `len` ASCII digits.
fn fixed_digits(s: &str, len: usize) -> Option<u32> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn localize<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Render an instant as `YYYY/MM/DD HH:MM:SS` in `tz`.
pub fn format_title_timestamp<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format(TITLE_FORMAT).to_string()
}

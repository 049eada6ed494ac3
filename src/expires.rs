//! Expiration directives
//!
//! Turns `"+5 days"`, `"-1 hour"`, an absolute date or an epoch timestamp
//! into an absolute point in time.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

/// Expiration as given by the caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Expires {
    /// Milliseconds since the UNIX epoch
    Millis(i64),

    /// Relative (`"+1 hour"`) or absolute (`"2030-01-01"`) directive
    Directive(String),

    /// Already-resolved instant
    #[serde(skip)]
    At(DateTime<Utc>),
}

impl Expires {
    /// Resolve to an absolute time, relative to `now`
    ///
    /// Returns `None` when the directive is not a valid date.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expires::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms),
            Expires::Directive(directive) => resolve_directive(directive, now),
            Expires::At(at) => Some(*at),
        }
    }

    /// An empty directive means "no expiration"
    pub fn is_empty(&self) -> bool {
        matches!(self, Expires::Directive(d) if d.trim().is_empty())
    }
}

impl From<&str> for Expires {
    fn from(s: &str) -> Self {
        Expires::Directive(s.to_string())
    }
}

impl From<String> for Expires {
    fn from(s: String) -> Self {
        Expires::Directive(s)
    }
}

impl From<DateTime<Utc>> for Expires {
    fn from(at: DateTime<Utc>) -> Self {
        Expires::At(at)
    }
}

/// Resolve a textual directive
pub fn resolve_directive(directive: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match parse_relative(directive) {
        Some((delta, unit)) => apply_offset(now, delta, unit),
        None => parse_absolute(directive),
    }
}

/// Split `"+5 days"` into (5, "days"); the sign is folded into the amount
fn parse_relative(directive: &str) -> Option<(i64, &str)> {
    let directive = directive.trim();
    let (negative, rest) = match directive.chars().next()? {
        '+' => (false, &directive[1..]),
        '-' => (true, &directive[1..]),
        _ => return None,
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let amount: i64 = rest[..digits_end].parse().ok()?;
    let unit = rest[digits_end..].split_whitespace().next()?;

    Some((if negative { -amount } else { amount }, unit))
}

/// Apply a signed offset in the given unit
///
/// Unknown units leave `now` unchanged.
fn apply_offset(now: DateTime<Utc>, delta: i64, unit: &str) -> Option<DateTime<Utc>> {
    let offset = match unit {
        "millisecond" | "milliseconds" => Duration::try_milliseconds(delta)?,
        "second" | "seconds" => Duration::try_seconds(delta)?,
        "minute" | "minutes" => Duration::try_minutes(delta)?,
        "hour" | "hours" => Duration::try_hours(delta)?,
        "day" | "days" => Duration::try_days(delta)?,
        "month" | "months" => return add_months(now, delta),
        "year" | "years" => return add_months(now, delta.checked_mul(12)?),
        _ => return Some(now),
    };

    now.checked_add_signed(offset)
}

fn add_months(now: DateTime<Utc>, delta: i64) -> Option<DateTime<Utc>> {
    let months = Months::new(u32::try_from(delta.unsigned_abs()).ok()?);
    if delta >= 0 {
        now.checked_add_months(months)
    } else {
        now.checked_sub_months(months)
    }
}

/// Parse an absolute date
///
/// Accepts RFC 3339, RFC 2822 / HTTP dates, `YYYY-MM-DDTHH:MM:SS` and
/// `YYYY-MM-DD` (both read as UTC), and epoch milliseconds.
pub(crate) fn parse_absolute(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(ms) = s.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp_millis(ms);
    }

    None
}

/// Format as an HTTP date, as used by the cookie `expires` attribute
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

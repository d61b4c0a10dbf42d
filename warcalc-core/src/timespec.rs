//! Parsing of operator-entered durations and clock times.
//!
//! Duration parsing is total: anything outside the grammar becomes zero
//! seconds. Zero is therefore both "00:00" and "could not parse", so callers
//! that care about the difference check for blank input before trusting a
//! zero (see `crate::form`).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whole seconds. Never negative.
pub type Seconds = u64;

pub const SECONDS_PER_DAY: Seconds = 86_400;

/// Optional leading day count: `"2d 04:00:00"` or `"2 04:00:00"`.
static DAY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)d?\s+(.+)$").expect("day prefix pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeSpecError {
    #[error("invalid clock time '{0}' (expected HH:MM)")]
    InvalidClockTime(String),
}

/// A time of day, minute resolution, in whatever offset the owner says.
/// Serialized as `"HH:MM"`; out-of-range values are rejected on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { hour: 0, minute: 0 };

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Built-in tables only; values are known to be in range.
    pub(crate) const fn at(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Wall-clock time of `dt` in its own timezone, seconds dropped.
    pub fn of<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = TimeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock_time(s).ok_or_else(|| TimeSpecError::InvalidClockTime(s.to_string()))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeSpecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

/// Split on `:` and parse every field as an unsigned integer.
fn numeric_fields(text: &str) -> Option<Vec<u64>> {
    text.trim()
        .split(':')
        .map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

fn split_day_prefix(text: &str) -> Option<(u64, &str)> {
    match DAY_PREFIX.captures(text) {
        Some(caps) => {
            let days = caps[1].parse::<u64>().ok()?;
            let rest = caps.get(2).map_or("", |m| m.as_str());
            Some((days, rest))
        }
        None => Some((0, text)),
    }
}

/// Parse `HH:MM`, `HH:MM:SS`, optionally prefixed by `Nd ` or `N `.
///
/// Total: blank, non-numeric, or wrongly shaped input is 0.
pub fn parse_duration(text: &str) -> Seconds {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }

    let Some((days, rest)) = split_day_prefix(trimmed) else {
        return 0;
    };
    let Some(fields) = numeric_fields(rest) else {
        return 0;
    };

    let clock = match fields.as_slice() {
        [h, m] => h
            .checked_mul(3600)
            .and_then(|h| m.checked_mul(60).and_then(|m| h.checked_add(m))),
        [h, m, s] => h
            .checked_mul(3600)
            .and_then(|h| m.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*s)),
        _ => None,
    };

    clock
        .and_then(|c| {
            days.checked_mul(SECONDS_PER_DAY)
                .and_then(|d| d.checked_add(c))
        })
        .unwrap_or(0)
}

/// Parse `HH:MM` with hour in 0..=23 and minute in 0..=59.
pub fn parse_clock_time(text: &str) -> Option<ClockTime> {
    match numeric_fields(text)?.as_slice() {
        [h, m] => ClockTime::new(u8::try_from(*h).ok()?, u8::try_from(*m).ok()?),
        _ => None,
    }
}

/// Per-unit time as plain seconds (`"125"`) or `MM:SS`. Total, like
/// [`parse_duration`].
pub fn parse_unit_time(text: &str) -> Seconds {
    match numeric_fields(text).as_deref() {
        Some([s]) => *s,
        Some([m, s]) => m.saturating_mul(60).saturating_add(*s),
        _ => 0,
    }
}

/// Strict `HH:MM:SS` with minutes and seconds below 60.
///
/// Unlike [`parse_duration`], malformed input is `None` rather than zero.
pub fn parse_hms_strict(text: &str) -> Option<Seconds> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match numeric_fields(trimmed)?.as_slice() {
        [h, m, s] if *m < 60 && *s < 60 => h.checked_mul(3600)?.checked_add(m * 60 + s),
        _ => None,
    }
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(seconds: Seconds) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Seconds from `now` until a user-entered target `"HH:MM"` or `"Nd HH:MM"`
/// in `now`'s timezone.
///
/// The target is today plus N days at that clock time, pushed forward a day
/// at a time until it is strictly after `now`. Malformed input is 0.
pub fn seconds_until<Tz: TimeZone>(target: &str, now: &DateTime<Tz>) -> Seconds {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return 0;
    }
    let Some((days, rest)) = split_day_prefix(trimmed) else {
        return 0;
    };
    let Some(clock) = parse_clock_time(rest) else {
        return 0;
    };
    let Some(mut date) = now.date_naive().checked_add_days(Days::new(days)) else {
        return 0;
    };

    let tz = now.timezone();
    // Today's slot can be in the past, and a DST gap can swallow one more day.
    for _ in 0..3 {
        if let Some(candidate) = tz
            .from_local_datetime(&date.and_time(clock.to_naive_time()))
            .earliest()
        {
            if candidate > *now {
                let delta = candidate.signed_duration_since(now);
                return delta.num_seconds().max(0) as Seconds;
            }
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => return 0,
        }
    }
    0
}

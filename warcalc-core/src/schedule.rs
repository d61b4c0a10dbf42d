//! Weekly recurring events authored in a fixed reference offset.
//!
//! Event tables are keyed by day of week (0 = Sunday). The lookup scans
//! forward from the reference-offset calendar day of `now` and returns the
//! first event strictly after `now` as a UTC instant; display conversion is
//! left to the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, Offset, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::timespec::{parse_clock_time, ClockTime, Seconds};

/// Hours added to the next event when the deadline is extended.
pub const EXTENSION_HOURS: i64 = 24;

/// Game server time.
pub const SERVER_OFFSET_HOURS: i32 = -2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("no upcoming event in the next 7 days")]
    NoUpcomingEvent,

    #[error("day {day} has no event times")]
    EmptyDay { day: u8 },

    #[error("day {day}: invalid event time '{text}'")]
    InvalidClockTime { day: u8, text: String },

    #[error("invalid UTC offset: {0} hours")]
    InvalidOffset(i32),

    #[error("invalid UTC offset: {0} seconds")]
    InvalidOffsetSeconds(i32),

    #[error("day index {0} out of range (0 = Sunday .. 6 = Saturday)")]
    InvalidDay(u8),
}

/// 0 = Sunday .. 6 = Saturday.
pub fn day_index(day: Weekday) -> u8 {
    day.num_days_from_sunday() as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScheduleTable")]
pub struct ScheduleTable {
    /// Reference offset east of UTC, in seconds.
    offset_seconds: i32,
    /// Day index -> event times, kept sorted.
    days: BTreeMap<u8, Vec<ClockTime>>,
}

/// Table as stored on disk, before day and order checks.
#[derive(Deserialize)]
struct RawScheduleTable {
    offset_seconds: i32,
    days: BTreeMap<u8, Vec<ClockTime>>,
}

impl TryFrom<RawScheduleTable> for ScheduleTable {
    type Error = ScheduleError;

    fn try_from(raw: RawScheduleTable) -> Result<Self, Self::Error> {
        let offset = FixedOffset::east_opt(raw.offset_seconds)
            .ok_or(ScheduleError::InvalidOffsetSeconds(raw.offset_seconds))?;
        let mut table = Self::new(offset);
        for (day, mut times) in raw.days {
            if day > 6 {
                return Err(ScheduleError::InvalidDay(day));
            }
            if times.is_empty() {
                return Err(ScheduleError::EmptyDay { day });
            }
            times.sort();
            times.dedup();
            table.days.insert(day, times);
        }
        Ok(table)
    }
}

impl ScheduleTable {
    pub fn new(reference_offset: FixedOffset) -> Self {
        Self {
            offset_seconds: reference_offset.local_minus_utc(),
            days: BTreeMap::new(),
        }
    }

    pub fn with_offset_hours(hours: i32) -> Result<Self, ScheduleError> {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(ScheduleError::InvalidOffset(hours))?;
        Ok(Self::new(offset))
    }

    /// Arms Race unit progression rounds, in server time.
    pub fn unit_progression() -> Self {
        Self::server_time_table(&[
            (Weekday::Mon, &[ClockTime::at(8, 0)]),
            (Weekday::Tue, &[ClockTime::at(0, 0)]),
            (Weekday::Wed, &[ClockTime::at(16, 0)]),
            (Weekday::Thu, &[ClockTime::at(4, 0)]),
            (Weekday::Fri, &[ClockTime::at(8, 0), ClockTime::at(20, 0)]),
            (Weekday::Sat, &[ClockTime::at(0, 0)]),
            (Weekday::Sun, &[ClockTime::at(16, 0)]),
        ])
    }

    /// The weekly reset: Monday 00:00 server time.
    pub fn weekly_reset() -> Self {
        Self::server_time_table(&[(Weekday::Mon, &[ClockTime::MIDNIGHT])])
    }

    fn server_time_table(entries: &[(Weekday, &[ClockTime])]) -> Self {
        let offset = FixedOffset::east_opt(SERVER_OFFSET_HOURS * 3600)
            .unwrap_or_else(|| Utc.fix());
        let mut table = Self::new(offset);
        for (day, times) in entries {
            let mut times = times.to_vec();
            times.sort();
            table.days.insert(day_index(*day), times);
        }
        table
    }

    /// Add (or replace) a day's events. Order of `times` does not matter.
    pub fn insert(&mut self, day: Weekday, mut times: Vec<ClockTime>) -> Result<(), ScheduleError> {
        if times.is_empty() {
            return Err(ScheduleError::EmptyDay {
                day: day_index(day),
            });
        }
        times.sort();
        times.dedup();
        self.days.insert(day_index(day), times);
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) taking `"HH:MM"` strings.
    pub fn with_day(mut self, day: Weekday, times: &[&str]) -> Result<Self, ScheduleError> {
        let parsed = times
            .iter()
            .map(|text| {
                parse_clock_time(text).ok_or_else(|| ScheduleError::InvalidClockTime {
                    day: day_index(day),
                    text: text.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.insert(day, parsed)?;
        Ok(self)
    }

    pub fn reference_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    /// First event strictly after `now`.
    ///
    /// Scans today plus the next seven reference-offset days, so an event
    /// that already passed today is found again one week later.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let offset = self.reference_offset();
        let local_now = now.with_timezone(&offset);
        let today = local_now.date_naive();

        for days_ahead in 0..=7u64 {
            let Some(date) = today.checked_add_days(Days::new(days_ahead)) else {
                break;
            };
            let Some(times) = self.days.get(&day_index(date.weekday())) else {
                continue;
            };
            for clock in times {
                let Some(candidate) = offset
                    .from_local_datetime(&date.and_time(clock.to_naive_time()))
                    .single()
                else {
                    continue;
                };
                if candidate > local_now {
                    debug!(%now, event = %candidate, days_ahead, "next scheduled event");
                    return Ok(candidate.with_timezone(&Utc));
                }
            }
        }

        Err(ScheduleError::NoUpcomingEvent)
    }

    /// Next event shifted by `shift`. The shift is applied to the instant
    /// found for `now`, never by re-scanning from a shifted `now`.
    pub fn next_occurrence_shifted(
        &self,
        now: DateTime<Utc>,
        shift: Duration,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        Ok(self.next_occurrence(now)? + shift)
    }
}

/// A countdown target derived from one captured `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineWindow {
    pub now: DateTime<Utc>,
    pub next_event: DateTime<Utc>,
    pub target: DateTime<Utc>,
    pub extended: bool,
}

impl DeadlineWindow {
    pub fn resolve(
        table: &ScheduleTable,
        now: DateTime<Utc>,
        extended: bool,
    ) -> Result<Self, ScheduleError> {
        let next_event = table.next_occurrence(now)?;
        let window = Self {
            now,
            next_event,
            target: next_event,
            extended: false,
        };
        Ok(window.with_extension(extended))
    }

    /// Same `now` and event, target recomputed for `extended`.
    pub fn with_extension(self, extended: bool) -> Self {
        let target = if extended {
            self.next_event + Duration::hours(EXTENSION_HOURS)
        } else {
            self.next_event
        };
        Self {
            target,
            extended,
            ..self
        }
    }

    /// Whole seconds from `now` to the target.
    pub fn budget_seconds(&self) -> Seconds {
        self.target.signed_duration_since(self.now).num_seconds().max(0) as Seconds
    }

    /// Whether the next event (not the target) is more than `hours` away.
    pub fn event_is_beyond(&self, hours: i64) -> bool {
        self.next_event - self.now > Duration::hours(hours)
    }
}

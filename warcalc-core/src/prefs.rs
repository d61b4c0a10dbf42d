//! Calculator preferences, passed in explicitly by the caller.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::{DEFAULT_GOAL_POINTS, DEFAULT_POINTS_PER_ACCELERATED_MINUTE};
use crate::units::DEFAULT_UNIT_LEVEL;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefsError {
    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub goal_points: u64,
    pub points_per_accelerated_minute: f64,
    pub unit_level: u8,
    /// IANA name used to show event times, e.g. "America/Chicago".
    pub display_timezone: String,
    /// Aim for the event after next (+24h) instead of the next one.
    pub extend_24h: bool,
    /// Use the buffed set of barracks inputs.
    pub buffed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            goal_points: DEFAULT_GOAL_POINTS as u64,
            points_per_accelerated_minute: DEFAULT_POINTS_PER_ACCELERATED_MINUTE,
            unit_level: DEFAULT_UNIT_LEVEL,
            display_timezone: "UTC".to_string(),
            extend_24h: false,
            buffed: false,
        }
    }
}

impl Preferences {
    pub fn display_tz(&self) -> Result<Tz, PrefsError> {
        self.display_timezone
            .parse::<Tz>()
            .map_err(|_| PrefsError::InvalidTimezone(self.display_timezone.clone()))
    }
}

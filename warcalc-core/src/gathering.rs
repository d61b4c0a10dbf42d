//! Sunday Gathering: pick the richest resource node each squad can finish
//! before the weekly reset, and when to send it.
//!
//! A squad's speed is calibrated from one observed gather time on a known
//! node. Higher nodes take proportionally longer, so the best node is the
//! highest level whose scaled gather time still fits before the reset.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::schedule::{ScheduleError, ScheduleTable};
use crate::timespec::{parse_hms_strict, Seconds};

pub const MAX_NODE_LEVEL: u8 = 12;

/// Base gather seconds per node level (index = level - 1): (gold, food or iron).
const GATHERING_TIMES: [(u32, u32); MAX_NODE_LEVEL as usize] = [
    (21_600, 36_000),
    (43_200, 72_000),
    (64_800, 108_000),
    (86_400, 144_000),
    (108_000, 180_000),
    (129_600, 216_000),
    (172_800, 288_000),
    (216_000, 360_000),
    (259_200, 432_000),
    (302_399, 504_000),
    (345_599, 576_000),
    (388_800, 606_666),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatheringError {
    #[error("invalid gather time '{0}' (use HH:MM:SS)")]
    InvalidTime(String),

    #[error("invalid node level {0} (expected 1-12)")]
    InvalidLevel(u8),

    #[error("unknown resource kind '{0}'")]
    UnknownResource(String),

    #[error("reset has already occurred")]
    ResetPassed,

    #[error("no suitable gathering spot found")]
    NoSuitableSpot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Gold,
    FoodOrIron,
}

impl FromStr for ResourceKind {
    type Err = GatheringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gold" => Ok(ResourceKind::Gold),
            "food" | "iron" | "food_or_iron" | "food-or-iron" | "foodoriron" => {
                Ok(ResourceKind::FoodOrIron)
            }
            _ => Err(GatheringError::UnknownResource(s.to_string())),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Gold => write!(f, "Gold"),
            ResourceKind::FoodOrIron => write!(f, "Food/Iron"),
        }
    }
}

/// Base gather seconds for a node, or `None` outside 1..=12.
pub fn base_gather_seconds(level: u8, kind: ResourceKind) -> Option<u32> {
    let (gold, food_or_iron) = *GATHERING_TIMES.get(usize::from(level).checked_sub(1)?)?;
    Some(match kind {
        ResourceKind::Gold => gold,
        ResourceKind::FoodOrIron => food_or_iron,
    })
}

/// One squad's observed gather time on a node of known level and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadObservation {
    pub observed_seconds: Seconds,
    pub level: u8,
    pub kind: ResourceKind,
}

impl SquadObservation {
    /// Build from raw input. Blank or zero time means the squad is unused.
    pub fn from_input(
        time_text: &str,
        level: u8,
        kind: ResourceKind,
    ) -> Result<Option<Self>, GatheringError> {
        if time_text.trim().is_empty() {
            return Ok(None);
        }
        let observed_seconds = parse_hms_strict(time_text)
            .ok_or_else(|| GatheringError::InvalidTime(time_text.trim().to_string()))?;
        if observed_seconds == 0 {
            return Ok(None);
        }
        Ok(Some(Self {
            observed_seconds,
            level,
            kind,
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GatheringPlan {
    pub level: u8,
    pub kind: ResourceKind,
    pub gather_seconds: f64,
    pub departure: DateTime<Utc>,
}

/// Plan one squad given the seconds left before the reset.
pub fn plan_squad(
    obs: &SquadObservation,
    seconds_until_reset: f64,
    now: DateTime<Utc>,
) -> Result<GatheringPlan, GatheringError> {
    let base = base_gather_seconds(obs.level, obs.kind)
        .ok_or(GatheringError::InvalidLevel(obs.level))?;
    if seconds_until_reset <= 0.0 {
        return Err(GatheringError::ResetPassed);
    }

    // Base seconds covered per real second for this squad.
    let rate = base as f64 / obs.observed_seconds as f64;

    let mut best: Option<(u8, f64)> = None;
    for level in 1..=MAX_NODE_LEVEL {
        let Some(node_base) = base_gather_seconds(level, obs.kind) else {
            break;
        };
        let gather = node_base as f64 / rate;
        if gather > seconds_until_reset {
            break;
        }
        best = Some((level, gather));
    }

    let (level, gather_seconds) = best.ok_or(GatheringError::NoSuitableSpot)?;
    let delay_ms = ((seconds_until_reset - gather_seconds) * 1000.0).round() as i64;
    let departure = now + Duration::milliseconds(delay_ms);

    debug!(level, gather_seconds, %departure, "gathering node chosen");

    Ok(GatheringPlan {
        level,
        kind: obs.kind,
        gather_seconds,
        departure,
    })
}

/// Plans squads against one reset instant found for one `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatheringPlanner {
    now: DateTime<Utc>,
    reset: DateTime<Utc>,
}

impl GatheringPlanner {
    pub fn new(reset_table: &ScheduleTable, now: DateTime<Utc>) -> Result<Self, ScheduleError> {
        let reset = reset_table.next_occurrence(now)?;
        Ok(Self { now, reset })
    }

    pub fn reset(&self) -> DateTime<Utc> {
        self.reset
    }

    pub fn seconds_until_reset(&self) -> f64 {
        self.reset.signed_duration_since(self.now).num_milliseconds() as f64 / 1000.0
    }

    pub fn plan(&self, obs: &SquadObservation) -> Result<GatheringPlan, GatheringError> {
        plan_squad(obs, self.seconds_until_reset(), self.now)
    }

    /// Unused squads (`None`) stay `None`; each squad is planned independently.
    pub fn plan_all(
        &self,
        squads: &[Option<SquadObservation>],
    ) -> Vec<Option<Result<GatheringPlan, GatheringError>>> {
        squads
            .iter()
            .map(|squad| squad.as_ref().map(|obs| self.plan(obs)))
            .collect()
    }
}

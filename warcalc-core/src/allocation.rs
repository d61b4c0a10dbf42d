//! Allocation optimizer: how many units each parallel slot trains in a
//! shared time window, and how much accelerant the designated slot needs to
//! close the remaining gap to the goal.
//!
//! Every slot runs for the whole window. Partial units bank nothing, so the
//! window is first rounded up to a whole number of units ("true time").
//! Slots keep training to their time/capacity limit even when the goal is
//! already covered.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::timespec::Seconds;

/// Points needed for the top Arms Race reward tier.
pub const DEFAULT_GOAL_POINTS: f64 = 75_000.0;

/// Points per minute of speed-up applied.
pub const DEFAULT_POINTS_PER_ACCELERATED_MINUTE: f64 = 10.0;

/// Barracks available to a player.
pub const DEFAULT_SLOT_COUNT: usize = 4;

/// Residual deficit below this is rounding noise.
const POINT_EPSILON: f64 = 1e-6;

/// Unit ceiling for one slot.
///
/// `Unbounded` (nothing entered) and `Capped(0)` are different: the first is
/// limited by time only, the second trains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotCapacity {
    #[default]
    Unbounded,
    Capped(u64),
}

impl SlotCapacity {
    /// Units this slot completes when time allows `time_units`.
    pub fn clamp(self, time_units: u64) -> u64 {
        match self {
            SlotCapacity::Unbounded => time_units,
            SlotCapacity::Capped(ceiling) => time_units.min(ceiling),
        }
    }

    pub fn ceiling(self) -> Option<u64> {
        match self {
            SlotCapacity::Unbounded => None,
            SlotCapacity::Capped(ceiling) => Some(ceiling),
        }
    }
}

impl From<Option<u64>> for SlotCapacity {
    fn from(value: Option<u64>) -> Self {
        value.map_or(SlotCapacity::Unbounded, SlotCapacity::Capped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub budget_seconds: Seconds,
    /// Calibration ratio, kept fractional.
    pub seconds_per_unit: f64,
    pub points_per_unit: f64,
    pub slot_capacities: Vec<SlotCapacity>,
    /// Slot allowed to take accelerant. Conventionally 0, the strongest.
    pub accelerated_slot: usize,
    pub points_per_accelerated_minute: f64,
    pub goal_points: f64,
    pub starting_points: f64,
}

impl AllocationRequest {
    pub fn new(
        budget_seconds: Seconds,
        seconds_per_unit: f64,
        points_per_unit: f64,
        slot_capacities: Vec<SlotCapacity>,
    ) -> Self {
        Self {
            budget_seconds,
            seconds_per_unit,
            points_per_unit,
            slot_capacities,
            accelerated_slot: 0,
            points_per_accelerated_minute: DEFAULT_POINTS_PER_ACCELERATED_MINUTE,
            goal_points: DEFAULT_GOAL_POINTS,
            starting_points: 0.0,
        }
    }

    pub fn with_goal(mut self, goal_points: f64) -> Self {
        self.goal_points = goal_points;
        self
    }

    pub fn with_starting_points(mut self, starting_points: f64) -> Self {
        self.starting_points = starting_points;
        self
    }

    pub fn with_accelerant_rate(mut self, points_per_minute: f64) -> Self {
        self.points_per_accelerated_minute = points_per_minute;
        self
    }

    pub fn with_accelerated_slot(mut self, index: usize) -> Self {
        self.accelerated_slot = index;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Units per slot, same order as the request's capacities.
    pub slot_units: Vec<u64>,
    /// Whole units the raw budget covers, before true-time rounding.
    pub raw_units_from_time: u64,
    pub true_time_seconds: f64,
    /// Sum of `slot_units`.
    pub normal_units: u64,
    /// Extra units squeezed into the designated slot with accelerant.
    pub accelerated_units: u64,
    pub points_from_accelerated_slot: f64,
    pub points_from_other_slots: f64,
    pub points_from_acceleration: f64,
    /// Includes starting points.
    pub total_points: f64,
    pub deficit: f64,
    pub accelerated_minutes: f64,
}

impl AllocationResult {
    fn zero(slots: usize) -> Self {
        Self {
            slot_units: vec![0; slots],
            raw_units_from_time: 0,
            true_time_seconds: 0.0,
            normal_units: 0,
            accelerated_units: 0,
            points_from_accelerated_slot: 0.0,
            points_from_other_slots: 0.0,
            points_from_acceleration: 0.0,
            total_points: 0.0,
            deficit: 0.0,
            accelerated_minutes: 0.0,
        }
    }

    /// Normal plus accelerated units.
    pub fn total_units(&self) -> u64 {
        self.normal_units.saturating_add(self.accelerated_units)
    }

    pub fn needs_acceleration(&self) -> bool {
        self.accelerated_units > 0
    }

    pub fn total_normal_points(&self) -> f64 {
        self.points_from_accelerated_slot + self.points_from_other_slots
    }
}

/// Seconds per unit from a full-capacity training time. 0 for zero capacity.
pub fn seconds_per_unit(full_training_seconds: Seconds, max_capacity: u64) -> f64 {
    if max_capacity == 0 {
        return 0.0;
    }
    full_training_seconds as f64 / max_capacity as f64
}

fn usable_rate(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Units completed once the budget is rounded up to a unit boundary.
fn time_derived_units(budget_seconds: Seconds, seconds_per_unit: f64) -> u64 {
    (budget_seconds as f64 / seconds_per_unit).ceil() as u64
}

/// Smallest multiple of `seconds_per_unit` that is >= the budget.
/// Degenerate rates leave the budget unchanged.
pub fn true_time_seconds(budget_seconds: Seconds, seconds_per_unit: f64) -> f64 {
    if !usable_rate(seconds_per_unit) {
        return budget_seconds as f64;
    }
    time_derived_units(budget_seconds, seconds_per_unit) as f64 * seconds_per_unit
}

/// Run the optimizer. Non-positive rates give the all-zero result.
pub fn compute_allocation(req: &AllocationRequest) -> AllocationResult {
    let slots = req.slot_capacities.len();
    let spu = req.seconds_per_unit;
    let ppu = req.points_per_unit;

    if !usable_rate(spu) || !usable_rate(ppu) {
        warn!(
            seconds_per_unit = spu,
            points_per_unit = ppu,
            "degenerate allocation input; returning zero result"
        );
        return AllocationResult::zero(slots);
    }

    // floor(true_time / spu) is exactly this count; computing it directly
    // avoids a float round trip through true_time.
    let time_units = time_derived_units(req.budget_seconds, spu);
    let true_time = time_units as f64 * spu;
    let raw_units_from_time = (req.budget_seconds as f64 / spu).floor() as u64;

    let slot_units: Vec<u64> = req
        .slot_capacities
        .iter()
        .map(|cap| cap.clamp(time_units))
        .collect();

    let accelerated_slot_units = slot_units.get(req.accelerated_slot).copied().unwrap_or(0);
    // A tiny seconds-per-unit saturates the per-slot count at u64::MAX.
    let normal_units = slot_units.iter().fold(0u64, |acc, &u| acc.saturating_add(u));
    let other_units = slot_units
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != req.accelerated_slot)
        .fold(0u64, |acc, (_, &u)| acc.saturating_add(u));

    let points_from_accelerated_slot = accelerated_slot_units as f64 * ppu;
    let points_from_other_slots = other_units as f64 * ppu;
    let total_normal_points = points_from_accelerated_slot + points_from_other_slots;

    let adjusted_goal = (req.goal_points - req.starting_points).max(0.0);
    let deficit = adjusted_goal - total_normal_points;

    debug!(
        time_units,
        true_time,
        normal_units,
        total_normal_points,
        deficit,
        "normal training allocated"
    );

    let mut result = AllocationResult {
        slot_units,
        raw_units_from_time,
        true_time_seconds: true_time,
        normal_units,
        accelerated_units: 0,
        points_from_accelerated_slot,
        points_from_other_slots,
        points_from_acceleration: 0.0,
        total_points: total_normal_points + req.starting_points,
        deficit: 0.0,
        accelerated_minutes: 0.0,
    };

    if deficit <= 0.0 {
        return result;
    }

    let minutes_per_unit = spu / 60.0;
    let points_per_accelerated_unit = ppu + req.points_per_accelerated_minute * minutes_per_unit;
    let accelerated_units = if usable_rate(points_per_accelerated_unit) {
        (deficit / points_per_accelerated_unit).ceil() as u64
    } else {
        0
    };

    let points_from_acceleration = accelerated_units as f64 * points_per_accelerated_unit;
    let total_points = total_normal_points + points_from_acceleration + req.starting_points;
    let residual = (req.goal_points - total_points).max(0.0);

    result.accelerated_units = accelerated_units;
    result.points_from_acceleration = points_from_acceleration;
    result.total_points = total_points;
    result.deficit = if residual <= POINT_EPSILON { 0.0 } else { residual };
    result.accelerated_minutes = accelerated_units as f64 * minutes_per_unit;

    debug!(
        accelerated_units,
        points_per_accelerated_unit,
        accelerated_minutes = result.accelerated_minutes,
        "accelerant sized to close deficit"
    );

    result
}

//! warcalc-core: time parsing, weekly event scheduling, and the Arms Race
//! training/gathering calculators.

pub mod allocation;
pub mod form;
pub mod gathering;
pub mod instructions;
pub mod prefs;
pub mod schedule;
pub mod timespec;
pub mod units;

pub use allocation::{
    compute_allocation, seconds_per_unit, true_time_seconds, AllocationRequest, AllocationResult,
    SlotCapacity,
};
pub use form::{FormError, TrainingForm};
pub use gathering::{
    plan_squad, GatheringError, GatheringPlan, GatheringPlanner, ResourceKind, SquadObservation,
};
pub use instructions::{accelerated_batches, training_instructions, AcceleratedBatch, Instruction};
pub use prefs::{Preferences, PrefsError};
pub use schedule::{DeadlineWindow, ScheduleError, ScheduleTable};
pub use timespec::{
    format_hms, parse_clock_time, parse_duration, parse_hms_strict, parse_unit_time,
    seconds_until, ClockTime, Seconds, TimeSpecError,
};
pub use units::{points_per_unit, points_per_unit_or_default, DEFAULT_UNIT_LEVEL};

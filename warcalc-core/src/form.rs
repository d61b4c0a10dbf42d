//! Raw barracks inputs as typed by the player, and their validation into an
//! [`AllocationRequest`].
//!
//! The parsers are total, so this is where "nothing was entered" is told
//! apart from a real zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::{seconds_per_unit, AllocationRequest, SlotCapacity, DEFAULT_SLOT_COUNT};
use crate::prefs::Preferences;
use crate::timespec::{parse_duration, Seconds};
use crate::units::points_per_unit_or_default;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Barracks capacity is required")]
    CapacityRequired,

    #[error("Barracks capacity must be a number")]
    CapacityNotNumber,

    #[error("Barracks capacity must be greater than 0")]
    CapacityNotPositive,

    #[error("Total training time is required")]
    TrainingTimeRequired,

    #[error("Total training time is invalid (use format HH:MM:SS or HH:MM)")]
    TrainingTimeInvalid,

    #[error("Barracks {0} capacity must be a number")]
    BarracksNotNumber(usize),

    #[error("Barracks {0} capacity cannot be negative")]
    BarracksNegative(usize),

    #[error("Starting points must be a number")]
    StartingPointsNotNumber,

    #[error("Starting points cannot be negative")]
    StartingPointsNegative,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingForm {
    /// Units the strongest barracks trains at full capacity.
    pub capacity: String,
    /// Time that full batch takes, `HH:MM[:SS]`.
    pub training_time: String,
    /// Per-barracks caps; blank is unbounded.
    pub barracks: [String; DEFAULT_SLOT_COUNT],
    /// Head start for the current round only; never persisted.
    #[serde(skip)]
    pub starting_points: String,
}

fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

impl TrainingForm {
    /// Validate and build the request for a window of `budget_seconds`.
    pub fn validate(
        &self,
        budget_seconds: Seconds,
        prefs: &Preferences,
    ) -> Result<AllocationRequest, FormError> {
        if self.capacity.trim().is_empty() {
            return Err(FormError::CapacityRequired);
        }
        if self.training_time.trim().is_empty() {
            return Err(FormError::TrainingTimeRequired);
        }

        let max_units = parse_int(&self.capacity).ok_or(FormError::CapacityNotNumber)?;
        if max_units <= 0 {
            return Err(FormError::CapacityNotPositive);
        }

        let full_time = parse_duration(&self.training_time);
        if full_time == 0 {
            return Err(FormError::TrainingTimeInvalid);
        }

        let slot_capacities = self.slot_capacities()?;

        let starting_points = if self.starting_points.trim().is_empty() {
            0
        } else {
            let value =
                parse_int(&self.starting_points).ok_or(FormError::StartingPointsNotNumber)?;
            if value < 0 {
                return Err(FormError::StartingPointsNegative);
            }
            value
        };

        let ppu = points_per_unit_or_default(prefs.unit_level);

        Ok(AllocationRequest::new(
            budget_seconds,
            seconds_per_unit(full_time, max_units as u64),
            ppu as f64,
            slot_capacities,
        )
        .with_goal(prefs.goal_points as f64)
        .with_accelerant_rate(prefs.points_per_accelerated_minute)
        .with_starting_points(starting_points as f64))
    }

    fn slot_capacities(&self) -> Result<Vec<SlotCapacity>, FormError> {
        self.barracks
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                if raw.trim().is_empty() {
                    return Ok(SlotCapacity::Unbounded);
                }
                let value = parse_int(raw).ok_or(FormError::BarracksNotNumber(i + 1))?;
                if value < 0 {
                    return Err(FormError::BarracksNegative(i + 1));
                }
                Ok(SlotCapacity::Capped(value as u64))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> TrainingForm {
        TrainingForm {
            capacity: "729".into(),
            training_time: "25:12:51".into(),
            ..TrainingForm::default()
        }
    }

    #[test]
    fn test_valid_form_builds_request() {
        let req = filled().validate(3600, &Preferences::default()).unwrap();
        assert_eq!(req.budget_seconds, 3600);
        assert_eq!(req.points_per_unit, 22.0);
        assert_eq!(req.goal_points, 75_000.0);
        assert_eq!(req.slot_capacities, vec![SlotCapacity::Unbounded; 4]);
        assert!((req.seconds_per_unit - 90_771.0 / 729.0).abs() < 1e-9);
    }

    #[test]
    fn test_required_fields() {
        let prefs = Preferences::default();
        let mut form = filled();
        form.capacity = " ".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::CapacityRequired));

        let mut form = filled();
        form.training_time.clear();
        assert_eq!(form.validate(0, &prefs), Err(FormError::TrainingTimeRequired));
    }

    #[test]
    fn test_capacity_checks() {
        let prefs = Preferences::default();
        let mut form = filled();
        form.capacity = "lots".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::CapacityNotNumber));
        form.capacity = "0".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::CapacityNotPositive));
    }

    #[test]
    fn test_training_time_zero_is_invalid() {
        let mut form = filled();
        form.training_time = "soon".into();
        assert_eq!(
            form.validate(0, &Preferences::default()),
            Err(FormError::TrainingTimeInvalid)
        );
    }

    #[test]
    fn test_barracks_blank_vs_zero() {
        let mut form = filled();
        form.barracks = ["".into(), "0".into(), "150".into(), " ".into()];
        let req = form.validate(3600, &Preferences::default()).unwrap();
        assert_eq!(
            req.slot_capacities,
            vec![
                SlotCapacity::Unbounded,
                SlotCapacity::Capped(0),
                SlotCapacity::Capped(150),
                SlotCapacity::Unbounded,
            ]
        );
    }

    #[test]
    fn test_barracks_errors_are_one_based() {
        let prefs = Preferences::default();
        let mut form = filled();
        form.barracks[2] = "x".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::BarracksNotNumber(3)));
        form.barracks[2] = "-4".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::BarracksNegative(3)));
        assert_eq!(
            FormError::BarracksNegative(3).to_string(),
            "Barracks 3 capacity cannot be negative"
        );
    }

    #[test]
    fn test_starting_points() {
        let prefs = Preferences::default();
        let mut form = filled();
        form.starting_points = "1200".into();
        assert_eq!(form.validate(0, &prefs).unwrap().starting_points, 1200.0);
        form.starting_points = "-1".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::StartingPointsNegative));
        form.starting_points = "many".into();
        assert_eq!(form.validate(0, &prefs), Err(FormError::StartingPointsNotNumber));
    }

    #[test]
    fn test_unit_level_from_prefs() {
        let prefs = Preferences {
            unit_level: 10,
            ..Preferences::default()
        };
        assert_eq!(filled().validate(0, &prefs).unwrap().points_per_unit, 31.0);

        let unknown = Preferences {
            unit_level: 99,
            ..Preferences::default()
        };
        assert_eq!(filled().validate(0, &unknown).unwrap().points_per_unit, 22.0);
    }

    #[test]
    fn test_huge_capacity_does_not_panic_downstream() {
        let form = TrainingForm {
            capacity: "9223372036854775807".into(),
            training_time: "00:00:01".into(),
            ..TrainingForm::default()
        };
        let req = form.validate(3600, &Preferences::default()).unwrap();
        let r = crate::allocation::compute_allocation(&req);
        assert_eq!(r.normal_units, u64::MAX);
        assert!(!r.needs_acceleration());
    }

    #[test]
    fn test_starting_points_not_serialized() {
        let mut form = filled();
        form.starting_points = "5000".into();
        let json = serde_json::to_string(&form).unwrap();
        assert!(!json.contains("5000"));
        let back: TrainingForm = serde_json::from_str(&json).unwrap();
        assert!(back.starting_points.is_empty());
        assert_eq!(back.capacity, "729");
    }
}

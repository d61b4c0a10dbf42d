//! Turn an allocation into the steps a player follows, in order.

use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationResult, SlotCapacity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Instruction {
    /// Same count in every slot, no accelerant.
    TrainAll { units: u64 },
    /// Train in the listed slots (1-based), each the same count.
    Train { slots: Vec<usize>, units: u64 },
    /// Train and immediately accelerate a batch in one slot.
    TrainAccelerated { slot: usize, units: u64, minutes: u64 },
}

/// One accelerated batch: units plus accelerant minutes (rounded up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceleratedBatch {
    pub units: u64,
    pub minutes: u64,
}

/// Split accelerated units into batches the slot can hold at once.
pub fn accelerated_batches(result: &AllocationResult, capacity: SlotCapacity) -> Vec<AcceleratedBatch> {
    let total = result.accelerated_units;
    if total == 0 {
        return Vec::new();
    }

    let sizes: Vec<u64> = match capacity.ceiling() {
        Some(cap) if cap > 0 && total > cap => {
            let mut sizes = vec![cap; (total / cap) as usize];
            if total % cap > 0 {
                sizes.push(total % cap);
            }
            sizes
        }
        _ => vec![total],
    };

    sizes
        .into_iter()
        .map(|units| AcceleratedBatch {
            units,
            minutes: (units as f64 * result.accelerated_minutes / total as f64).ceil() as u64,
        })
        .collect()
}

/// Ordered steps: other slots from the highest index down, then accelerated
/// batches, then the designated slot's normal units.
pub fn training_instructions(
    result: &AllocationResult,
    accelerated_slot: usize,
    accelerated_capacity: SlotCapacity,
) -> Vec<Instruction> {
    let units = &result.slot_units;
    let Some(&designated) = units.get(accelerated_slot) else {
        return Vec::new();
    };

    if !result.needs_acceleration() && designated > 0 && units.iter().all(|&u| u == designated) {
        return vec![Instruction::TrainAll { units: designated }];
    }

    let mut steps = Vec::new();

    let others: Vec<(usize, u64)> = units
        .iter()
        .copied()
        .enumerate()
        .filter(|(i, _)| *i != accelerated_slot)
        .rev()
        .collect();

    let first = others.first().map(|(_, u)| *u).unwrap_or(0);
    if others.len() > 1 && first > 0 && others.iter().all(|(_, u)| *u == first) {
        steps.push(Instruction::Train {
            slots: others.iter().map(|(i, _)| i + 1).collect(),
            units: first,
        });
    } else {
        steps.extend(
            others
                .into_iter()
                .filter(|(_, u)| *u > 0)
                .map(|(i, units)| Instruction::Train {
                    slots: vec![i + 1],
                    units,
                }),
        );
    }

    steps.extend(
        accelerated_batches(result, accelerated_capacity)
            .into_iter()
            .map(|batch| Instruction::TrainAccelerated {
                slot: accelerated_slot + 1,
                units: batch.units,
                minutes: batch.minutes,
            }),
    );

    if designated > 0 {
        steps.push(Instruction::Train {
            slots: vec![accelerated_slot + 1],
            units: designated,
        });
    }

    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{compute_allocation, AllocationRequest};

    fn accelerated(units: u64, minutes: f64) -> AllocationResult {
        let mut r = compute_allocation(&AllocationRequest::new(
            1200,
            120.0,
            20.0,
            vec![SlotCapacity::Unbounded; 4],
        ));
        r.accelerated_units = units;
        r.accelerated_minutes = minutes;
        r
    }

    #[test]
    fn test_all_equal_collapses() {
        let r = compute_allocation(
            &AllocationRequest::new(1200, 120.0, 20.0, vec![SlotCapacity::Unbounded; 4])
                .with_goal(0.0),
        );
        assert_eq!(
            training_instructions(&r, 0, SlotCapacity::Unbounded),
            vec![Instruction::TrainAll { units: 10 }]
        );
    }

    #[test]
    fn test_accelerated_order() {
        let r = accelerated(5, 10.0);
        let steps = training_instructions(&r, 0, SlotCapacity::Unbounded);
        assert_eq!(
            steps,
            vec![
                Instruction::Train {
                    slots: vec![4, 3, 2],
                    units: 10
                },
                Instruction::TrainAccelerated {
                    slot: 1,
                    units: 5,
                    minutes: 10
                },
                Instruction::Train {
                    slots: vec![1],
                    units: 10
                },
            ]
        );
    }

    #[test]
    fn test_uneven_slots_listed_separately() {
        let r = compute_allocation(
            &AllocationRequest::new(
                1200,
                120.0,
                20.0,
                vec![
                    SlotCapacity::Unbounded,
                    SlotCapacity::Capped(3),
                    SlotCapacity::Capped(0),
                    SlotCapacity::Unbounded,
                ],
            )
            .with_goal(0.0),
        );
        let steps = training_instructions(&r, 0, SlotCapacity::Unbounded);
        assert_eq!(
            steps,
            vec![
                Instruction::Train {
                    slots: vec![4],
                    units: 10
                },
                Instruction::Train {
                    slots: vec![2],
                    units: 3
                },
                Instruction::Train {
                    slots: vec![1],
                    units: 10
                },
            ]
        );
    }

    #[test]
    fn test_batches_respect_capacity() {
        let r = accelerated(250, 500.0);
        let batches = accelerated_batches(&r, SlotCapacity::Capped(100));
        assert_eq!(
            batches,
            vec![
                AcceleratedBatch {
                    units: 100,
                    minutes: 200
                },
                AcceleratedBatch {
                    units: 100,
                    minutes: 200
                },
                AcceleratedBatch {
                    units: 50,
                    minutes: 100
                },
            ]
        );
        assert_eq!(accelerated_batches(&r, SlotCapacity::Unbounded).len(), 1);
        assert_eq!(accelerated_batches(&r, SlotCapacity::Capped(0)).len(), 1);
    }

    #[test]
    fn test_no_acceleration_no_batches() {
        let r = accelerated(0, 0.0);
        assert!(accelerated_batches(&r, SlotCapacity::Capped(10)).is_empty());
    }
}

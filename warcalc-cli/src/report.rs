//! Text rendering for command output. JSON output serializes the same records.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt::Write;
use warcalc_core::{
    format_hms, AllocationResult, DeadlineWindow, GatheringError, GatheringPlan, Instruction,
    Seconds,
};

#[derive(Debug, Serialize)]
pub struct TrainReport {
    /// Absent when a custom `--until` deadline was used.
    pub window: Option<DeadlineWindow>,
    pub budget_seconds: Seconds,
    pub result: AllocationResult,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Serialize)]
pub struct SquadReport {
    pub squad: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<GatheringPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GatherReport {
    pub reset: DateTime<Utc>,
    pub squads: Vec<SquadReport>,
}

impl GatherReport {
    pub fn new(
        reset: DateTime<Utc>,
        plans: &[Option<Result<GatheringPlan, GatheringError>>],
    ) -> Self {
        let squads = plans
            .iter()
            .enumerate()
            .filter_map(|(i, plan)| {
                let plan = plan.as_ref()?;
                Some(match plan {
                    Ok(p) => SquadReport {
                        squad: i + 1,
                        plan: Some(*p),
                        error: None,
                    },
                    Err(e) => SquadReport {
                        squad: i + 1,
                        plan: None,
                        error: Some(e.to_string()),
                    },
                })
            })
            .collect();
        Self { reset, squads }
    }
}

fn local(dt: DateTime<Utc>, tz: &Tz) -> String {
    dt.with_timezone(tz).format("%a %H:%M:%S %Z").to_string()
}

fn slot_list(slots: &[usize]) -> String {
    let names: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
    match names.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

pub fn render_instruction(step: &Instruction) -> String {
    match step {
        Instruction::TrainAll { units } => format!("Train {units} units in every barracks"),
        Instruction::Train { slots, units } if slots.len() == 1 => {
            format!("Train {units} units in barracks {}", slot_list(slots))
        }
        Instruction::Train { slots, units } => {
            format!("Train {units} units in each of barracks {}", slot_list(slots))
        }
        Instruction::TrainAccelerated {
            slot,
            units,
            minutes,
        } => format!(
            "Train {units} units in barracks {slot} and use {minutes} min of speed-ups"
        ),
    }
}

pub fn render_window(window: &DeadlineWindow, tz: &Tz) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Next round:  {}", local(window.next_event, tz));
    if window.extended {
        let _ = writeln!(out, "Target:      {} (+24h)", local(window.target, tz));
    } else if window.event_is_beyond(24) {
        let _ = writeln!(out, "Next round is more than 24h away");
    }
    let _ = writeln!(out, "Time left:   {}", format_hms(window.budget_seconds()));
    out
}

pub fn render_train(report: &TrainReport, tz: &Tz) -> String {
    let mut out = String::new();
    match &report.window {
        Some(window) => out.push_str(&render_window(window, tz)),
        None => {
            let _ = writeln!(out, "Time left:   {}", format_hms(report.budget_seconds));
        }
    }

    let r = &report.result;
    let _ = writeln!(out);
    let _ = writeln!(out, "Units per barracks: {:?}", r.slot_units);
    let _ = writeln!(out, "Units:              {}", r.normal_units);
    let _ = writeln!(out, "Points from training: {:.0}", r.total_normal_points());
    if r.needs_acceleration() {
        let _ = writeln!(
            out,
            "Accelerated units:  {} ({:.0} min of speed-ups, {:.0} points)",
            r.accelerated_units, r.accelerated_minutes, r.points_from_acceleration
        );
    }
    let _ = writeln!(out, "Total points:       {:.0}", r.total_points);
    if r.deficit > 0.0 {
        let _ = writeln!(out, "Short of goal by:   {:.0}", r.deficit);
    }

    if !report.instructions.is_empty() {
        let _ = writeln!(out);
        for (i, step) in report.instructions.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, render_instruction(step));
        }
    }
    out
}

pub fn render_gather(report: &GatherReport, tz: &Tz) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Weekly reset: {}", local(report.reset, tz));
    for squad in &report.squads {
        match (&squad.plan, &squad.error) {
            (Some(plan), _) => {
                let _ = writeln!(
                    out,
                    "Squad {}: level {} {} node, {} gathering, leave at {}",
                    squad.squad,
                    plan.level,
                    plan.kind,
                    format_hms(plan.gather_seconds.round() as Seconds),
                    local(plan.departure, tz)
                );
            }
            (None, Some(err)) => {
                let _ = writeln!(out, "Squad {}: {}", squad.squad, err);
            }
            (None, None) => {}
        }
    }
    out
}

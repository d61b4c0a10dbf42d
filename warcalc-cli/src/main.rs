use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warcalc_core::{
    compute_allocation, seconds_until, training_instructions, DeadlineWindow, GatheringPlanner,
    Preferences, ScheduleTable, SquadObservation, TrainingForm,
};

mod config;
mod report;
mod state;

use state::SavedSquad;

#[derive(Parser, Debug)]
#[command(name = "warcalc", version, about = "Unit progression and gathering calculator")]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the next unit progression round and the countdown to it
    NextEvent {
        /// IANA timezone for display (defaults to config)
        #[arg(long)]
        tz: Option<String>,

        #[command(flatten)]
        extend: ExtendArgs,
    },

    /// Work out how many units to train in each barracks
    Train(TrainArgs),

    /// Plan squad departures so gathering finishes at the weekly reset
    Gather {
        /// HH:MM:SS,LEVEL,KIND as shown for a squad's current node
        #[arg(long = "squad")]
        squads: Vec<String>,
    },

    /// Manage ~/.warcalc/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

/// Whether to count down to the next round or the one 24h after it.
#[derive(Args, Debug, Default)]
struct ExtendArgs {
    /// Aim for the round after next
    #[arg(long, conflicts_with = "no_plus_24h")]
    plus_24h: bool,

    /// Aim for the next round even when it is more than 24h away
    #[arg(long)]
    no_plus_24h: bool,
}

impl ExtendArgs {
    /// Flags win, then the config; otherwise extend when the next round is
    /// more than 24h out.
    fn extended(&self, prefs: &Preferences, window: &DeadlineWindow) -> bool {
        if self.plus_24h {
            return true;
        }
        if self.no_plus_24h {
            return false;
        }
        prefs.extend_24h || window.event_is_beyond(24)
    }

    fn resolve(&self, prefs: &Preferences, now: DateTime<Utc>) -> Result<DeadlineWindow> {
        let window = DeadlineWindow::resolve(&ScheduleTable::unit_progression(), now, false)?;
        Ok(window.with_extension(self.extended(prefs, &window)))
    }
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Units the strongest barracks trains at full capacity
    #[arg(long)]
    capacity: Option<String>,

    /// Time a full batch takes, HH:MM[:SS]
    #[arg(long)]
    training_time: Option<String>,

    /// Custom deadline "[Nd ]HH:MM" in the display timezone; replaces the
    /// round schedule and the extend_24h setting
    #[arg(long, conflicts_with_all = ["plus_24h", "no_plus_24h"])]
    until: Option<String>,

    #[command(flatten)]
    extend: ExtendArgs,

    /// Unit level (1-11)
    #[arg(long)]
    level: Option<u8>,

    /// Per-barracks caps, comma separated; blank entries are unbounded
    #[arg(long)]
    barracks: Option<String>,

    /// Points already earned this round (not saved)
    #[arg(long)]
    starting_points: Option<String>,

    /// Switch to the buffed set of inputs and remember the choice
    #[arg(long, conflicts_with = "normal")]
    buffed: bool,

    /// Switch back to the normal set of inputs and remember the choice
    #[arg(long)]
    normal: bool,
}

impl TrainArgs {
    fn buffed(&self, prefs: &Preferences) -> bool {
        if self.buffed {
            true
        } else if self.normal {
            false
        } else {
            prefs.buffed
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::NextEvent { tz, extend } => next_event(tz, &extend, cli.json)?,

        Command::Train(args) => train(args, cli.json)?,

        Command::Gather { squads } => gather(squads, cli.json)?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let prefs = config::load_config()?;
                print!("{}", toml::to_string_pretty(&prefs)?);
            }
        },
    }

    Ok(())
}

fn display_tz(prefs: &Preferences, flag: Option<String>) -> Result<Tz> {
    match flag {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("invalid timezone: {name}")),
        None => Ok(prefs.display_tz()?),
    }
}

fn next_event(tz: Option<String>, extend: &ExtendArgs, json: bool) -> Result<()> {
    let prefs = config::load_config()?;
    let tz = display_tz(&prefs, tz)?;
    let window = extend.resolve(&prefs, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&window)?);
    } else {
        print!("{}", report::render_window(&window, &tz));
    }
    Ok(())
}

/// Form fields given on the command line; unset ones fall back to saved inputs.
struct TrainOverrides {
    capacity: Option<String>,
    training_time: Option<String>,
    barracks: Option<String>,
    starting_points: Option<String>,
}

impl TrainOverrides {
    fn apply(self, form: &mut TrainingForm) -> Result<()> {
        if let Some(v) = self.capacity {
            form.capacity = v;
        }
        if let Some(v) = self.training_time {
            form.training_time = v;
        }
        if let Some(v) = self.barracks {
            form.barracks = parse_barracks(&v)?;
        }
        if let Some(v) = self.starting_points {
            form.starting_points = v;
        }
        Ok(())
    }
}

fn parse_barracks(text: &str) -> Result<[String; 4]> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() > 4 {
        bail!("at most 4 barracks values, got {}", parts.len());
    }
    let mut out: [String; 4] = Default::default();
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.to_string();
    }
    Ok(out)
}

fn train(args: TrainArgs, json: bool) -> Result<()> {
    let saved_prefs = config::load_config()?;
    let buffed = args.buffed(&saved_prefs);
    if buffed != saved_prefs.buffed {
        config::save_config(&Preferences {
            buffed,
            ..saved_prefs.clone()
        })?;
        info!(buffed, "barracks mode saved");
    }

    let mut prefs = saved_prefs;
    if let Some(level) = args.level {
        prefs.unit_level = level;
    }
    let tz = prefs.display_tz()?;

    let mut inputs = state::read_inputs()?;
    if buffed {
        inputs.seed_buffed();
    }
    let form = inputs.form_mut(buffed);
    TrainOverrides {
        capacity: args.capacity,
        training_time: args.training_time,
        barracks: args.barracks,
        starting_points: args.starting_points,
    }
    .apply(form)?;

    let now = Utc::now();
    let (window, budget) = match args.until.as_deref() {
        Some(target) => {
            let budget = seconds_until(target, &now.with_timezone(&tz));
            if budget == 0 {
                bail!("invalid --until target: {target} (use \"HH:MM\" or \"Nd HH:MM\")");
            }
            (None, budget)
        }
        None => {
            let window = args.extend.resolve(&prefs, now)?;
            (Some(window), window.budget_seconds())
        }
    };
    debug!(budget, buffed, "training window resolved");

    let request = form.validate(budget, &prefs)?;
    let result = compute_allocation(&request);
    let accelerated_capacity = request
        .slot_capacities
        .get(request.accelerated_slot)
        .copied()
        .unwrap_or_default();
    let steps = training_instructions(&result, request.accelerated_slot, accelerated_capacity);

    state::write_inputs(&inputs).context("saving inputs")?;
    info!(buffed, "inputs saved");

    let out = report::TrainReport {
        window,
        budget_seconds: budget,
        result,
        instructions: steps,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", report::render_train(&out, &tz));
    }
    Ok(())
}

fn parse_squad(text: &str) -> Result<SavedSquad> {
    let mut parts = text.split(',').map(str::trim);
    let (Some(time), Some(level), Some(kind), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("squad must be HH:MM:SS,LEVEL,KIND: {text}");
    };
    let level: u8 = level
        .parse()
        .with_context(|| format!("squad level is not a number: {level}"))?;
    let kind = kind.parse()?;
    Ok(SavedSquad {
        time: time.to_string(),
        level,
        kind,
    })
}

fn gather(squad_args: Vec<String>, json: bool) -> Result<()> {
    let prefs = config::load_config()?;
    let tz = prefs.display_tz()?;

    let mut inputs = state::read_inputs()?;
    if !squad_args.is_empty() {
        inputs.squads = squad_args
            .iter()
            .map(|s| parse_squad(s))
            .collect::<Result<Vec<_>>>()?;
    }
    if inputs.squads.is_empty() {
        bail!("no squads given (pass --squad HH:MM:SS,LEVEL,KIND)");
    }

    let observations = inputs
        .squads
        .iter()
        .map(|s| SquadObservation::from_input(&s.time, s.level, s.kind))
        .collect::<Result<Vec<_>, _>>()?;

    let planner = GatheringPlanner::new(&ScheduleTable::weekly_reset(), Utc::now())?;
    let plans = planner.plan_all(&observations);

    state::write_inputs(&inputs).context("saving inputs")?;

    let out = report::GatherReport::new(planner.reset(), &plans);
    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print!("{}", report::render_gather(&out, &tz));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warcalc_core::ResourceKind;

    #[test]
    fn test_cli_parses_train_flags() {
        let cli = Cli::try_parse_from([
            "warcalc",
            "--json",
            "train",
            "--capacity",
            "729",
            "--training-time",
            "25:12:51",
            "--plus-24h",
            "--barracks",
            "100,,,",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.capacity.as_deref(), Some("729"));
                assert!(args.extend.plus_24h);
                assert_eq!(args.barracks.as_deref(), Some("100,,,"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    fn parse_train(extra: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(["warcalc", "train"].iter().chain(extra).copied())
    }

    #[test]
    fn test_conflicting_deadline_flags_rejected() {
        assert!(parse_train(&["--until", "18:00", "--plus-24h"]).is_err());
        assert!(parse_train(&["--until", "18:00", "--no-plus-24h"]).is_err());
        assert!(parse_train(&["--plus-24h", "--no-plus-24h"]).is_err());
        assert!(parse_train(&["--buffed", "--normal"]).is_err());
        assert!(parse_train(&["--until", "1d 18:00"]).is_ok());
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_extension_preset_when_round_is_far() {
        let prefs = Preferences::default();
        // Tuesday 00:30 server: next round is Wednesday 16:00, 39.5h away.
        let far = at(3, 2, 30);
        let window = ExtendArgs::default().resolve(&prefs, far).unwrap();
        assert!(window.extended);
        assert_eq!(window.target, window.next_event + chrono::Duration::hours(24));
        assert_eq!(window.now, far);

        let opt_out = ExtendArgs {
            no_plus_24h: true,
            ..ExtendArgs::default()
        };
        let window = opt_out.resolve(&prefs, far).unwrap();
        assert!(!window.extended);
        assert_eq!(window.target, window.next_event);
    }

    #[test]
    fn test_extension_off_when_round_is_near() {
        // Monday 05:00 server: next round is 3h away.
        let near = at(2, 7, 0);
        let window = ExtendArgs::default()
            .resolve(&Preferences::default(), near)
            .unwrap();
        assert!(!window.extended);
        assert_eq!(window.budget_seconds(), 3 * 3600);

        let prefs = Preferences {
            extend_24h: true,
            ..Preferences::default()
        };
        let window = ExtendArgs::default().resolve(&prefs, near).unwrap();
        assert_eq!(window.budget_seconds(), 27 * 3600);
    }

    #[test]
    fn test_buffed_mode_choice() {
        let saved = Preferences {
            buffed: true,
            ..Preferences::default()
        };
        fn args(extra: &[&str]) -> TrainArgs {
            match parse_train(extra).unwrap().command {
                Command::Train(args) => args,
                other => panic!("unexpected command: {other:?}"),
            }
        }
        assert!(args(&[]).buffed(&saved));
        assert!(!args(&["--normal"]).buffed(&saved));
        assert!(args(&["--buffed"]).buffed(&Preferences::default()));
        assert!(!args(&[]).buffed(&Preferences::default()));
    }

    #[test]
    fn test_parse_barracks() {
        let b = parse_barracks("100, ,250").unwrap();
        assert_eq!(b, ["100".to_string(), String::new(), "250".to_string(), String::new()]);
        assert!(parse_barracks("1,2,3,4,5").is_err());
    }

    #[test]
    fn test_overrides_keep_saved_values() {
        let mut form = TrainingForm {
            capacity: "500".into(),
            training_time: "10:00:00".into(),
            ..TrainingForm::default()
        };
        TrainOverrides {
            capacity: Some("729".into()),
            training_time: None,
            barracks: None,
            starting_points: None,
        }
        .apply(&mut form)
        .unwrap();
        assert_eq!(form.capacity, "729");
        assert_eq!(form.training_time, "10:00:00");
    }

    #[test]
    fn test_parse_squad() {
        let squad = parse_squad("10:30:00, 12, gold").unwrap();
        assert_eq!(squad.level, 12);
        assert_eq!(squad.kind, ResourceKind::Gold);
        assert_eq!(squad.time, "10:30:00");
        assert!(parse_squad("10:30:00,12").is_err());
        assert!(parse_squad("10:30:00,x,food").is_err());
        assert!(parse_squad("10:30:00,3,wood").is_err());
    }
}

use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use scheduler::RankDirection;
use sessionsort::config::{Config, ConfigError, SettingsOverrides};
use sessionsort::export::{ExportError, write_outputs};
use sessionsort::ingest::{IngestError, SheetPaths, load_input};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Scheduler(#[from] scheduler::SchedulerError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    HighToLow,
    LowToHigh,
}

impl From<Direction> for RankDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::HighToLow => RankDirection::HighToLow,
            Direction::LowToHigh => RankDirection::LowToHigh,
        }
    }
}

/// Assigns attendees to sessions from their ratings.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// CSV export of the ratings sheet
    #[arg(long)]
    ratings: PathBuf,

    /// CSV export of the sessions sheet
    #[arg(long)]
    sessions: PathBuf,

    /// CSV export of the overrides sheet
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// JSON configuration file, see `Config`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the rosters and report are written to
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Number of sessions (rating columns)
    #[arg(long)]
    number_of_sessions: Option<usize>,

    /// Number of slots in each attendee's schedule
    #[arg(long)]
    sessions_per_attendee: Option<usize>,

    /// Number of trials to run
    #[arg(long)]
    max_attempts: Option<usize>,

    /// Which end of the rating scale is best
    #[arg(long, value_enum)]
    rank_direction: Option<Direction>,

    /// Fill emptier sessions before honoring higher ratings
    #[arg(long)]
    prioritize_balancing: bool,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn settings_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            number_of_sessions: self.number_of_sessions,
            sessions_per_attendee: self.sessions_per_attendee,
            max_attempts: self.max_attempts,
            rank_direction: self.rank_direction.map(RankDirection::from),
            prioritize_balancing: self.prioritize_balancing.then_some(true),
            seed: self.seed,
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(&cli.settings_overrides());
    config.validate()?;
    let Config { settings, layout } = config;

    let paths = SheetPaths {
        ratings: cli.ratings.clone(),
        sessions: cli.sessions.clone(),
        overrides: cli.overrides.clone(),
    };
    let input = load_input(&paths, &layout, settings.number_of_sessions)?;
    info!(
        sessions = input.sessions.len(),
        attendees = input.ratings.rows.len(),
        overrides = input.overrides.len(),
        "loaded sheets"
    );

    let outcome = scheduler::run(&input, &settings)?;
    let report = write_outputs(&cli.out_dir, &outcome, &settings)?;

    info!(
        "Final score {:.2}% (trial {} of {}, seed {}), {} attendees with open slots, results in {}",
        report.score_percentage,
        report.best_trial + 1,
        report.trial_scores.len(),
        report.seed,
        report.attendees_with_empty_slots,
        cli.out_dir.display()
    );
    Ok(())
}

fn main() {
    // load env vars
    dotenv().ok();
    sessionsort::init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

use clap::Parser;
use dotenvy::dotenv;
use fake::Fake;
use fake::faker::internet::raw::*;
use fake::faker::name::raw::*;
use fake::locales::EN;
use rand::SeedableRng;
use rand::rngs::StdRng;
use scheduler::RunInput;
use scheduler::synthetic::{InstanceShape, generate};
use sessionsort::config::{Config, ConfigError};
use sessionsort::export::{ExportError, write_input_sheets};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum GenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("could not create {path}: {source}")]
    Create { path: PathBuf, source: std::io::Error },
}

/// Writes fake ratings, sessions and overrides sheets.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// JSON configuration file whose sheet layout to follow
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to write the sheets to
    #[arg(long, default_value = "sheets")]
    out_dir: PathBuf,

    /// Number of sessions
    #[arg(long, default_value = "8")]
    sessions: usize,

    /// Number of attendees
    #[arg(long, default_value = "60")]
    attendees: usize,

    /// Number of slots per attendee
    #[arg(long, default_value = "3")]
    slots: usize,

    /// Number of override rows
    #[arg(long, default_value = "2")]
    overrides: usize,

    /// Seed for reproducible sheets
    #[arg(long)]
    seed: Option<u64>,
}

const NAME_DRAWS: usize = 20;

fn full_name(rng: &mut StdRng) -> String {
    let first: String = FirstName(EN).fake_with_rng(rng);
    let last: String = LastName(EN).fake_with_rng(rng);
    format!("{first} {last}")
}

/// Draws a name nobody in `used` has yet. Names are how overrides find
/// attendees, so they must stay unique.
fn unique_name(rng: &mut StdRng, used: &mut HashSet<String>) -> String {
    let mut name = full_name(rng);
    let mut draws = 1;
    while used.contains(&name.to_lowercase()) {
        name = if draws < NAME_DRAWS {
            full_name(rng)
        } else {
            format!("{} {draws}", full_name(rng))
        };
        draws += 1;
    }
    used.insert(name.to_lowercase());
    name
}

/// Swaps the generated placeholder names for fake people.
fn dress_up(input: &mut RunInput, rng: &mut StdRng) {
    let mut renamed = HashMap::new();
    let mut used = HashSet::new();
    for row in &mut input.ratings.rows {
        let name = unique_name(rng, &mut used);
        renamed.insert(row.name.clone(), name.clone());
        row.name = name;
        for (key, value) in &mut row.attributes {
            if key.eq_ignore_ascii_case("email") {
                *value = SafeEmail(EN).fake_with_rng(rng);
            }
        }
    }

    for session in &mut input.sessions {
        session.host = full_name(rng);
        session.host_email = SafeEmail(EN).fake_with_rng(rng);
    }

    for row in &mut input.overrides {
        if let Some(name) = renamed.get(&row.identifier) {
            row.identifier = name.clone();
        }
    }
}

fn create(path: PathBuf) -> Result<File, GenError> {
    File::create(&path).map_err(|source| GenError::Create { path, source })
}

fn generate_sheets(cli: &Cli) -> Result<(), GenError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let shape = InstanceShape {
        sessions: cli.sessions,
        attendees: cli.attendees,
        slots: cli.slots,
        overrides: cli.overrides,
        ..InstanceShape::default()
    };
    let mut input = generate(&shape, &mut rng);
    dress_up(&mut input, &mut rng);

    std::fs::create_dir_all(&cli.out_dir).map_err(|source| GenError::Create {
        path: cli.out_dir.clone(),
        source,
    })?;
    write_input_sheets(
        &input,
        &config.layout,
        create(cli.out_dir.join("ratings.csv"))?,
        create(cli.out_dir.join("sessions.csv"))?,
        create(cli.out_dir.join("overrides.csv"))?,
    )?;

    info!(
        "Wrote {} sessions, {} attendees and {} overrides to {} (seed {seed})",
        shape.sessions,
        shape.attendees,
        input.overrides.len(),
        cli.out_dir.display()
    );
    Ok(())
}

fn main() {
    // load env vars
    dotenv().ok();
    sessionsort::init_tracing();

    let cli = Cli::parse();
    if let Err(err) = generate_sheets(&cli) {
        error!("{err}");
        std::process::exit(1);
    }
}

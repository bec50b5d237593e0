use itertools::Itertools;
use num_format::{Locale, ToFormattedString};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use scheduler::synthetic::{InstanceShape, generate};
use scheduler::trial::score;
use scheduler::{AttendeeId, RunInput, Schedule, SchedulerError, SessionId, Settings};

const SEEDS: u64 = 200;
const ATTEMPTS: usize = 10;

struct BruteForceResults {
    scores: Vec<f64>,
    best_schedule: Schedule,
    worst_schedule: Schedule,
    best_score: f64,
    worst_score: f64,
}

struct SchedulerResults {
    scores: Vec<f64>,
    best_schedule: Schedule,
    worst_schedule: Schedule,
    best_score: f64,
    worst_score: f64,
    iterations: usize,
}

fn compare_schedulers() -> Result<(), SchedulerError> {
    let shape = InstanceShape::default();
    let scheduler_results = run_scheduler(&shape, SEEDS)?;
    print_scheduler_results(&scheduler_results);

    // Small enough to enumerate every single-slot assignment
    let tiny = InstanceShape {
        sessions: 3,
        attendees: 7,
        slots: 1,
        double_block_rate: 0.0,
        ..InstanceShape::default()
    };
    let input = generate(&tiny, &mut StdRng::seed_from_u64(7));
    let settings = tiny.settings(ATTEMPTS, Some(7));

    let tiny_results = run_scheduler_on(&input, &settings)?;
    println!("\n=== SCHEDULER ON TINY INSTANCE ===");
    println!("Score: {:.2}%\n{}", tiny_results.0, tiny_results.1);

    let brute_force_results = run_brute_force(&input, &settings)?;
    print_brute_force_results(&brute_force_results);

    Ok(())
}

fn run_scheduler_on(input: &RunInput, settings: &Settings) -> Result<(f64, Schedule), SchedulerError> {
    let outcome = scheduler::run(input, settings)?;
    Ok((outcome.percentage(), outcome.schedule))
}

/// Runs the full multi-trial scheduler on a fresh instance per seed.
fn run_scheduler(shape: &InstanceShape, seeds: u64) -> Result<SchedulerResults, SchedulerError> {
    let outcomes = (0..seeds)
        .into_par_iter()
        .map(|seed| {
            let input = generate(shape, &mut StdRng::seed_from_u64(seed));
            run_scheduler_on(&input, &shape.settings(ATTEMPTS, Some(seed)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let scores: Vec<f64> = outcomes.iter().map(|(score, _)| *score).collect();
    let best = outcomes
        .iter()
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .cloned()
        .ok_or(SchedulerError::NoTrials)?;
    let worst = outcomes
        .into_iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .ok_or(SchedulerError::NoTrials)?;

    Ok(SchedulerResults {
        iterations: scores.len(),
        scores,
        best_score: best.0,
        best_schedule: best.1,
        worst_score: worst.0,
        worst_schedule: worst.1,
    })
}

fn run_brute_force(input: &RunInput, settings: &Settings) -> Result<BruteForceResults, SchedulerError> {
    println!("\n=== BRUTE FORCE EVALUATION ===");
    let empty = Schedule::build(input, settings)?;

    // Every attendee either sits out or takes one session open in slot 0
    let choices: Vec<Option<SessionId>> = std::iter::once(None)
        .chain(
            empty
                .session_ids()
                .filter(|&id| empty.session(id).has_available_slot(0))
                .map(Some),
        )
        .collect();
    let attendees = empty.attendees().len();

    let assignments: Vec<Vec<Option<SessionId>>> = (0..attendees)
        .map(|_| choices.iter().copied())
        .multi_cartesian_product()
        .collect();

    println!(
        "Attendees: {}, Choices each: {}, Assignments: {}\n",
        attendees,
        choices.len(),
        assignments.len().to_formatted_string(&Locale::en)
    );

    let scored: Vec<(f64, Schedule)> = assignments
        .par_iter()
        .filter(|assignment| fits_capacity(&empty, assignment))
        .map(|assignment| {
            let mut schedule = empty.clone();
            for (i, session) in assignment.iter().enumerate() {
                if let Some(session) = session {
                    schedule.force_assign(AttendeeId(i), *session, 0);
                }
            }
            (score(&schedule, settings).percentage, schedule)
        })
        .collect();

    println!("Feasible assignments: {}", scored.len().to_formatted_string(&Locale::en));

    let best = scored
        .iter()
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .cloned()
        .ok_or(SchedulerError::NoTrials)?;
    let worst = scored
        .iter()
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .cloned()
        .ok_or(SchedulerError::NoTrials)?;

    Ok(BruteForceResults {
        scores: scored.into_iter().map(|(score, _)| score).collect(),
        best_score: best.0,
        best_schedule: best.1,
        worst_score: worst.0,
        worst_schedule: worst.1,
    })
}

fn fits_capacity(schedule: &Schedule, assignment: &[Option<SessionId>]) -> bool {
    let counts = assignment.iter().flatten().counts();
    counts
        .into_iter()
        .all(|(session, count)| count <= schedule.session(*session).max_size)
}

fn print_brute_force_results(brute_force_results: &BruteForceResults) {
    let num_of_brute_force_scores = brute_force_results.scores.len();
    let sum = brute_force_results.scores.iter().sum::<f64>();
    let avg = sum / num_of_brute_force_scores.max(1) as f64;

    println!("Number of brute force scores: {}", num_of_brute_force_scores.to_formatted_string(&Locale::en));
    println!("Average score: {avg:.2}%");
    println!("Minimum score: {:.2}%", brute_force_results.worst_score);
    println!("Maximum score: {:.2}%", brute_force_results.best_score);

    println!("Best brute force schedule (score: {:.2}%): \n{}", brute_force_results.best_score, brute_force_results.best_schedule);
    println!("Worst brute force schedule (score: {:.2}%): \n{}", brute_force_results.worst_score, brute_force_results.worst_schedule);
}

fn print_scheduler_results(scheduler_results: &SchedulerResults) {
    let sum = scheduler_results.scores.iter().sum::<f64>();
    let avg = sum / scheduler_results.iterations.max(1) as f64;

    println!("\n\n=== SCHEDULER RESULTS ({} seeds) ===", scheduler_results.iterations.to_formatted_string(&Locale::en));
    println!("Average score: {avg:.2}%");
    println!("Minimum score: {:.2}%", scheduler_results.worst_score);
    println!("Maximum score: {:.2}%\n", scheduler_results.best_score);

    println!("Best schedule: \n{}", scheduler_results.best_schedule);
    println!("Worst schedule: \n{}", scheduler_results.worst_schedule);
}

fn main() {
    if let Err(err) = compare_schedulers() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

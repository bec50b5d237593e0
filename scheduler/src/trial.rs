use crate::engine::{assign_sessions, balance_sessions};
use crate::error::SchedulerError;
use crate::fallback::assign_fallback_sessions;
use crate::input::RunInput;
use crate::overrides::apply_overrides;
use crate::schedule::Schedule;
use crate::settings::Settings;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

/// Satisfaction totals for one schedule.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrialScore {
    /// Sum of achieved satisfaction over every booked, rated session.
    pub score: f64,
    /// What the same attendees would have scored getting their best picks.
    pub max_score: f64,
    pub percentage: f64,
}

/// Scores a schedule against the attendees' own ratings.
///
/// Each booking counts once, however many slots it covers. An attendee who
/// holds `n` rated sessions is measured against their `n` best ratings. A
/// schedule where nobody holds a rated session scores 0%.
pub fn score(schedule: &Schedule, settings: &Settings) -> TrialScore {
    let direction = settings.rank_direction;
    let mut total = TrialScore::default();

    for attendee in schedule.attendees() {
        let mut taken = 0;
        let mut slot = 0;
        while slot < schedule.slots() {
            let Some(booking) = attendee.booking(slot) else {
                slot += 1;
                continue;
            };
            if let Some(record) = attendee.rating_for(booking.session) {
                if let Some(rating) = record.rating {
                    total.score += direction.satisfaction(rating);
                }
                taken += 1;
            }
            slot += schedule.session(booking.session).block_length.max(1);
        }

        total.max_score += (0..taken)
            .filter_map(|rank| attendee.preferences.highest(rank, direction))
            .filter_map(|record| record.rating)
            .map(|rating| direction.satisfaction(rating))
            .sum::<f64>();
    }

    if total.max_score > 0.0 {
        total.percentage = total.score / total.max_score * 100.0;
    }
    total
}

/// The retained trial of a run, after the fallback pass.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub schedule: Schedule,
    /// Score of the retained trial before the fallback pass ran.
    pub score: TrialScore,
    /// Percentage of every trial, in the order they ran.
    pub trial_scores: Vec<f64>,
    pub best_trial: usize,
    /// Seed the run's RNG was created from.
    pub seed: u64,
    pub fallback_placements: usize,
}

impl RunOutcome {
    pub fn percentage(&self) -> f64 {
        self.score.percentage
    }
}

/// Runs one trial on fresh state built from `input`.
pub fn run_trial<R: Rng + ?Sized>(
    input: &RunInput,
    settings: &Settings,
    rng: &mut R,
) -> Result<(Schedule, TrialScore), SchedulerError> {
    let mut schedule = Schedule::build(input, settings)?;

    let summary = apply_overrides(&mut schedule, &input.overrides);
    if summary.rows > 0 {
        debug!(?summary, "applied overrides");
    }

    let booked = assign_sessions(&mut schedule, settings, rng);
    let moved = balance_sessions(&mut schedule, settings);
    let score = score(&schedule, settings);
    debug!(booked, moved, percentage = score.percentage, "trial finished");

    Ok((schedule, score))
}

/// Runs `settings.max_attempts` trials, keeps the best one and fills in the
/// attendees who never answered.
///
/// The RNG is seeded from `settings.seed`, or from a fresh random seed that is
/// reported back in the outcome.
///
/// # Errors
/// Any input error from building the trial state, or `NoTrials` when
/// `max_attempts` is zero.
pub fn run(input: &RunInput, settings: &Settings) -> Result<RunOutcome, SchedulerError> {
    let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut outcome = run_with_rng(input, settings, &mut rng)?;
    outcome.seed = seed;
    Ok(outcome)
}

/// [`run`] with a caller-supplied RNG. The returned seed is `settings.seed`,
/// or 0 when unset.
pub fn run_with_rng<R: Rng + ?Sized>(
    input: &RunInput,
    settings: &Settings,
    rng: &mut R,
) -> Result<RunOutcome, SchedulerError> {
    info!(
        attempts = settings.max_attempts,
        attendees = input.ratings.rows.len(),
        sessions = settings.number_of_sessions,
        "starting scheduler run"
    );

    let mut best: Option<(usize, Schedule, TrialScore)> = None;
    let mut trial_scores = Vec::with_capacity(settings.max_attempts);

    for trial in 0..settings.max_attempts {
        let (schedule, score) = run_trial(input, settings, rng)?;
        trial_scores.push(score.percentage);
        debug!(trial, percentage = score.percentage, "scored trial");

        // Later trials win ties
        if best
            .as_ref()
            .is_none_or(|(_, _, kept)| score.percentage >= kept.percentage)
        {
            best = Some((trial, schedule, score));
        }
    }

    let (best_trial, mut schedule, score) = best.ok_or(SchedulerError::NoTrials)?;
    let fallback_placements = assign_fallback_sessions(&mut schedule, settings, rng);

    info!(
        best_trial,
        percentage = score.percentage,
        fallback_placements,
        "kept best trial"
    );

    Ok(RunOutcome {
        schedule,
        score,
        trial_scores,
        best_trial,
        seed: settings.seed.unwrap_or_default(),
        fallback_placements,
    })
}

//! Random but well-formed run inputs, for tests and the evaluation binary.

use crate::input::{AttendeeRow, OverrideRow, RatingSheet, RunInput, SessionRow};
use crate::settings::{RATING_SCALE_MAX, Settings};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Shape of a generated instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstanceShape {
    pub sessions: usize,
    pub attendees: usize,
    pub slots: usize,
    /// Chance that an attendee filled in the form at all.
    pub response_rate: f64,
    /// Chance that a single rating cell is left blank by a respondent.
    pub blank_rate: f64,
    /// Chance that a session spans two slots.
    pub double_block_rate: f64,
    pub overrides: usize,
}

impl Default for InstanceShape {
    fn default() -> Self {
        Self {
            sessions: 8,
            attendees: 60,
            slots: 3,
            response_rate: 0.9,
            blank_rate: 0.1,
            double_block_rate: 0.15,
            overrides: 0,
        }
    }
}

impl InstanceShape {
    /// Settings sized for this instance.
    pub fn settings(&self, max_attempts: usize, seed: Option<u64>) -> Settings {
        Settings {
            number_of_sessions: self.sessions,
            sessions_per_attendee: self.slots,
            max_attempts,
            seed,
            ..Settings::default()
        }
    }
}

/// Session names are zero padded to a common width so that no name is a
/// substring of another.
pub fn session_name(index: usize, sessions: usize) -> String {
    let width = sessions.to_string().len();
    format!("Session {:0width$}", index + 1)
}

fn block_letters(slots: &[usize]) -> String {
    slots
        .iter()
        .filter_map(|&slot| u8::try_from(slot).ok().and_then(|s| s.checked_add(b'A')))
        .map(char::from)
        .collect()
}

fn session_rows<R: Rng + ?Sized>(shape: &InstanceShape, rng: &mut R) -> Vec<SessionRow> {
    // Enough seats that everyone could fill every slot
    let base = shape.attendees.div_ceil(shape.sessions.max(1)).max(1);

    (0..shape.sessions)
        .map(|i| {
            let block_length = if shape.slots >= 2 && rng.random_bool(shape.double_block_rate) { 2 } else { 1 };
            let mut open: Vec<usize> = (0..shape.slots).collect();
            if block_length == 1 && shape.slots > 1 && rng.random_bool(0.25) {
                open.remove(rng.random_range(0..open.len()));
            }

            SessionRow {
                name: session_name(i, shape.sessions),
                host: format!("Host {}", i + 1),
                host_email: format!("host{}@example.org", i + 1),
                room: format!("Room {}", 100 + i),
                max_size: rng.random_range(base..=base + base / 2 + 1),
                available_blocks: block_letters(&open),
                block_length,
                randomly_assignable: rng.random_bool(0.8),
            }
        })
        .collect()
}

fn rating_sheet<R: Rng + ?Sized>(shape: &InstanceShape, rng: &mut R) -> RatingSheet {
    let headers = (0..shape.sessions)
        .map(|i| format!("How interested are you in [{}]?", session_name(i, shape.sessions)))
        .collect();

    let scale = RATING_SCALE_MAX as u32;
    let rows = (0..shape.attendees)
        .map(|i| {
            let responded = rng.random_bool(shape.response_rate);
            let ratings = (0..shape.sessions)
                .map(|_| {
                    if responded && !rng.random_bool(shape.blank_rate) {
                        Some(f64::from(rng.random_range(1..=scale)))
                    } else {
                        None
                    }
                })
                .collect();

            AttendeeRow {
                name: format!("Attendee {}", i + 1),
                attributes: vec![
                    (String::from("Email"), format!("attendee{}@example.org", i + 1)),
                    (String::from("Grade"), rng.random_range(9..=12).to_string()),
                ],
                ratings,
            }
        })
        .collect();

    RatingSheet { headers, rows }
}

fn override_rows<R: Rng + ?Sized>(shape: &InstanceShape, rows: &[AttendeeRow], rng: &mut R) -> Vec<OverrideRow> {
    if rows.is_empty() || shape.sessions == 0 || shape.slots == 0 {
        return Vec::new();
    }

    (0..shape.overrides)
        .map(|_| {
            let attendee = &rows[rng.random_range(0..rows.len())];
            OverrideRow {
                identifier: attendee.name.clone(),
                email: format!("{}@example.org", attendee.name.to_lowercase().replace(' ', ".")),
                session: session_name(rng.random_range(0..shape.sessions), shape.sessions),
                blocks: block_letters(&[rng.random_range(0..shape.slots)]),
            }
        })
        .collect()
}

/// Generates an instance. The same RNG state always yields the same input.
pub fn generate<R: Rng + ?Sized>(shape: &InstanceShape, rng: &mut R) -> RunInput {
    let sessions = session_rows(shape, rng);
    let ratings = rating_sheet(shape, rng);
    let overrides = override_rows(shape, &ratings.rows, rng);
    RunInput {
        sessions,
        ratings,
        overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Schedule;
    use crate::trial::run;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_session_names_never_contain_each_other() {
        let names: Vec<String> = (0..12).map(|i| session_name(i, 12)).collect();
        assert_eq!(names[0], "Session 01");
        for (i, a) in names.iter().enumerate() {
            for (j, b) in names.iter().enumerate() {
                assert!(i == j || !a.contains(b.as_str()));
            }
        }
    }

    #[test]
    fn test_generated_input_builds() {
        let shape = InstanceShape {
            sessions: 12,
            overrides: 3,
            ..InstanceShape::default()
        };
        let mut rng = StdRng::seed_from_u64(17);
        let input = generate(&shape, &mut rng);

        assert_eq!(input.sessions.len(), 12);
        assert_eq!(input.ratings.rows.len(), 60);
        assert_eq!(input.overrides.len(), 3);
        assert!(input.ratings.rows.iter().all(|row| row.ratings.len() == 12));

        let schedule = Schedule::build(&input, &shape.settings(1, Some(1))).unwrap();
        assert_eq!(schedule.sessions().len(), 12);
    }

    #[test]
    fn test_same_seed_same_instance() {
        let shape = InstanceShape::default();
        let a = generate(&shape, &mut StdRng::seed_from_u64(3));
        let b = generate(&shape, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_full_run_on_generated_input() {
        let shape = InstanceShape::default();
        let input = generate(&shape, &mut StdRng::seed_from_u64(8));
        let outcome = run(&input, &shape.settings(4, Some(8))).unwrap();

        assert!((0.0..=100.0).contains(&outcome.percentage()));
        assert_eq!(outcome.trial_scores.len(), 4);
    }
}

//! Roster projections of a finished schedule, one row per attendee and one
//! per session.

use crate::schedule::Schedule;
use crate::settings::Settings;
use itertools::Itertools;
use serde::Serialize;

/// Cell text for an empty slot.
pub const NO_SESSION: &str = "None";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendeeRosterRow {
    pub name: String,
    pub preferred_name: String,
    pub grade: String,
    pub email: String,
    /// `"<session> (<room>)"` per slot.
    pub sessions: Vec<String>,
    /// Best attainable rating per slot, dot terminated: `"5.4.3."`.
    pub best_picks: String,
    /// Rating of the session actually held per slot, same format.
    pub picks_ratings: String,
}

impl AttendeeRosterRow {
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.name.clone(),
            self.preferred_name.clone(),
            self.grade.clone(),
            self.email.clone(),
        ];
        record.extend(self.sessions.iter().cloned());
        record.push(self.best_picks.clone());
        record.push(self.picks_ratings.clone());
        record
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRosterRow {
    pub name: String,
    pub host: String,
    pub host_email: String,
    pub counts: Vec<usize>,
    pub fill_percentages: Vec<f64>,
    /// `Name(Preferred)` entries joined by `;`, per slot.
    pub occupants: Vec<String>,
    /// `Name(rating)` entries joined by `;`, per slot.
    pub occupant_ratings: Vec<String>,
}

impl SessionRosterRow {
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![self.name.clone(), self.host.clone(), self.host_email.clone()];
        record.extend(self.counts.iter().map(usize::to_string));
        record.extend(self.fill_percentages.iter().map(|p| format!("{p:.1}")));
        record.extend(self.occupants.iter().cloned());
        record.extend(self.occupant_ratings.iter().cloned());
        record
    }
}

pub fn attendee_headers(slots: usize) -> Vec<String> {
    let mut headers: Vec<String> = ["Name", "Preferred Name", "Grade", "Email"]
        .into_iter()
        .map(String::from)
        .collect();
    headers.extend((1..=slots).map(|n| format!("Session {n}")));
    headers.push(String::from("Best Picks"));
    headers.push(String::from("Picks Ratings"));
    headers
}

pub fn session_headers(slots: usize) -> Vec<String> {
    let mut headers: Vec<String> = ["Name", "Host", "Host Email"].into_iter().map(String::from).collect();
    headers.extend((1..=slots).map(|n| format!("People In S{n}")));
    headers.extend((1..=slots).map(|n| format!("% Filled In S{n}")));
    headers.extend((1..=slots).map(|n| format!("Session {n}")));
    headers.extend((1..=slots).map(|n| format!("Session {n} Ratings")));
    headers
}

/// Ratings print without a trailing `.0`, so 5.0 reads `5`.
fn format_rating(rating: f64) -> String {
    format!("{rating}")
}

fn dot_terminated(ratings: impl Iterator<Item = Option<f64>>) -> String {
    ratings
        .map(|rating| format!("{}.", format_rating(rating.unwrap_or(0.0))))
        .collect()
}

pub fn attendee_rows(schedule: &Schedule, settings: &Settings) -> Vec<AttendeeRosterRow> {
    let slots = schedule.slots();
    schedule
        .attendees()
        .iter()
        .map(|attendee| {
            let sessions = (0..slots)
                .map(|slot| match attendee.session_at(slot) {
                    Some(id) => {
                        let session = schedule.session(id);
                        format!("{} ({})", session.name, session.room)
                    }
                    None => String::from(NO_SESSION),
                })
                .collect();

            let best_picks = dot_terminated(
                (0..slots).map(|rank| {
                    attendee
                        .preferences
                        .highest(rank, settings.rank_direction)
                        .and_then(|record| record.rating)
                }),
            );
            let picks_ratings = dot_terminated((0..slots).map(|slot| {
                attendee
                    .session_at(slot)
                    .and_then(|session| attendee.rating_for(session))
                    .and_then(|record| record.rating)
            }));

            AttendeeRosterRow {
                name: attendee.name.clone(),
                preferred_name: attendee.preferred_name().to_string(),
                grade: attendee.grade().map(|grade| grade.to_string()).unwrap_or_default(),
                email: attendee.email().unwrap_or_default().to_string(),
                sessions,
                best_picks,
                picks_ratings,
            }
        })
        .collect()
}

/// One row per real session. Placeholder sessions created by overrides are
/// skipped.
pub fn session_rows(schedule: &Schedule) -> Vec<SessionRosterRow> {
    let slots = schedule.slots();
    schedule
        .session_ids()
        .filter(|&id| !schedule.session(id).placeholder)
        .map(|id| {
            let session = schedule.session(id);
            let counts: Vec<usize> = (0..slots).map(|slot| session.roster(slot).len()).collect();
            let fill_percentages = counts
                .iter()
                .map(|&count| {
                    if session.max_size == 0 {
                        0.0
                    } else {
                        count as f64 / session.max_size as f64 * 100.0
                    }
                })
                .collect();

            let occupants = (0..slots)
                .map(|slot| {
                    session
                        .roster(slot)
                        .iter()
                        .map(|&a| {
                            let attendee = schedule.attendee(a);
                            format!("{}({})", attendee.name, attendee.preferred_name())
                        })
                        .join(";")
                })
                .collect();
            let occupant_ratings = (0..slots)
                .map(|slot| {
                    session
                        .roster(slot)
                        .iter()
                        .map(|&a| {
                            let attendee = schedule.attendee(a);
                            let rating = attendee
                                .rating_for(id)
                                .and_then(|record| record.rating)
                                .map(format_rating)
                                .unwrap_or_default();
                            format!("{}({rating})", attendee.name)
                        })
                        .join(";")
                })
                .collect();

            SessionRosterRow {
                name: session.name.clone(),
                host: session.host.clone(),
                host_email: session.host_email.clone(),
                counts,
                fill_percentages,
                occupants,
                occupant_ratings,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::OverrideRow;
    use crate::overrides::apply_overrides;
    use crate::schedule::tests::{attendee_row, input, session_row, settings};
    use crate::{AttendeeId, SessionId};
    use approx::assert_relative_eq;

    fn schedule() -> (Schedule, Settings) {
        let mut rows = vec![
            attendee_row("Ann", &[Some(5.0), Some(3.0), None]),
            attendee_row("Ben", &[Some(4.5), None, Some(1.0)]),
        ];
        rows[0].attributes.push((String::from("Nickname"), String::from("Annie")));
        rows[0].attributes.push((String::from("Email"), String::from("ann@example.org")));
        let input = input(
            vec![
                session_row("Robotics", 4, "ab", 1),
                session_row("Chess", 2, "ab", 1),
                session_row("Drama", 2, "ab", 1),
            ],
            rows,
        );
        let settings = settings(3, 2);
        let mut schedule = Schedule::build(&input, &settings).unwrap();
        schedule.force_assign(AttendeeId(0), SessionId(0), 0);
        schedule.force_assign(AttendeeId(1), SessionId(0), 0);
        schedule.force_assign(AttendeeId(0), SessionId(1), 1);
        (schedule, settings)
    }

    #[test]
    fn test_attendee_rows() {
        let (schedule, settings) = schedule();
        let rows = attendee_rows(&schedule, &settings);

        let ann = &rows[0];
        assert_eq!(ann.preferred_name, "Annie");
        assert_eq!(ann.grade, "9");
        assert_eq!(ann.email, "ann@example.org");
        assert_eq!(ann.sessions, vec!["Robotics (Room Robotics)", "Chess (Room Chess)"]);
        assert_eq!(ann.best_picks, "5.3.");
        assert_eq!(ann.picks_ratings, "5.3.");

        let ben = &rows[1];
        assert_eq!(ben.preferred_name, "Ben");
        assert_eq!(ben.email, "");
        assert_eq!(ben.sessions[1], NO_SESSION);
        assert_eq!(ben.best_picks, "4.5.1.");
        assert_eq!(ben.picks_ratings, "4.5.0.");

        assert_eq!(ann.to_record().len(), attendee_headers(2).len());
    }

    #[test]
    fn test_session_rows() {
        let (schedule, _) = schedule();
        let rows = session_rows(&schedule);

        let robotics = &rows[0];
        assert_eq!(robotics.counts, vec![2, 0]);
        assert_relative_eq!(robotics.fill_percentages[0], 50.0);
        assert_eq!(robotics.occupants[0], "Ann(Annie);Ben(Ben)");
        assert_eq!(robotics.occupant_ratings[0], "Ann(5);Ben(4.5)");
        assert_eq!(robotics.occupants[1], "");

        let drama = &rows[2];
        assert_eq!(drama.counts, vec![0, 0]);
        assert_eq!(robotics.to_record().len(), session_headers(2).len());
    }

    #[test]
    fn test_unrated_occupants_have_blank_ratings() {
        let (mut schedule, _) = schedule();
        schedule.force_assign(AttendeeId(1), SessionId(1), 1);
        let rows = session_rows(&schedule);
        assert_eq!(rows[1].occupant_ratings[1], "Ann(3);Ben()");
    }

    #[test]
    fn test_placeholder_sessions_are_left_out() {
        let (mut schedule, _) = schedule();
        let row = OverrideRow {
            identifier: String::from("Ann"),
            email: String::new(),
            session: String::from("Assembly"),
            blocks: String::from("b"),
        };
        apply_overrides(&mut schedule, &[row]);

        let rows = session_rows(&schedule);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.name != "Assembly"));
    }
}

use crate::preferences::SortPolicy;
use crate::schedule::Schedule;
use crate::settings::Settings;
use crate::SessionId;
use rand::Rng;
use tracing::debug;

/// Fills the open slots of attendees who gave no usable answer.
///
/// Runs once on the winning trial. Each slot pass gives every no-response
/// attendee at most one session, picked from the emptiest randomly
/// assignable sessions first. Returns how many bookings were made.
pub fn assign_fallback_sessions<R: Rng + ?Sized>(schedule: &mut Schedule, settings: &Settings, rng: &mut R) -> usize {
    let direction = settings.rank_direction;
    let mut booked = 0;

    for _ in 0..settings.sessions_per_attendee {
        for attendee in schedule.attendee_ids() {
            let candidate = schedule.attendee(attendee);
            if !candidate.assignable || !candidate.preferences.is_no_response(direction) {
                continue;
            }

            schedule.sort_preferences(attendee, SortPolicy::SmallestSessionFirst, direction, rng);

            let choices: Vec<SessionId> = schedule
                .attendee(attendee)
                .preferences
                .records()
                .iter()
                .map(|record| record.session)
                .filter(|&session| schedule.session(session).randomly_assignable)
                .collect();

            if let Some(session) = choices
                .into_iter()
                .find(|&session| schedule.assign_available_slot(attendee, session))
            {
                booked += 1;
                debug!(
                    attendee = %schedule.attendee(attendee).name,
                    session = %schedule.session(session).name,
                    "fallback placement"
                );
            }
        }
    }

    booked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttendeeId;
    use crate::input::SessionRow;
    use crate::schedule::tests::{attendee_row, input, session_row, settings};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn closed(mut row: SessionRow) -> SessionRow {
        row.randomly_assignable = false;
        row
    }

    #[test]
    fn test_fills_no_response_attendees_from_smallest_sessions() {
        let input = input(
            vec![
                session_row("Big", 5, "ab", 1),
                session_row("Small", 5, "ab", 1),
                closed(session_row("Closed", 5, "ab", 1)),
            ],
            vec![
                attendee_row("Ann", &[Some(5.0), Some(1.0), Some(1.0)]),
                attendee_row("Ben", &[Some(5.0), Some(1.0), Some(1.0)]),
                attendee_row("Zed", &[Some(0.0), None, Some(0.0)]),
            ],
        );
        let settings = settings(3, 2);
        let mut schedule = Schedule::build(&input, &settings).unwrap();
        let zed = AttendeeId(2);
        for attendee in [AttendeeId(0), AttendeeId(1)] {
            assert!(schedule.assign_available_slot(attendee, SessionId(0)));
        }
        let mut rng = StdRng::seed_from_u64(5);

        let booked = assign_fallback_sessions(&mut schedule, &settings, &mut rng);

        assert_eq!(booked, 2);
        assert_eq!(schedule.attendee(zed).open_slots(), 0);
        assert!(schedule.attendee(zed).holds(SessionId(1)));
        assert!(schedule.attendee(zed).holds(SessionId(0)));
        assert!(!schedule.attendee(zed).holds(SessionId(2)));
    }

    #[test]
    fn test_respondents_are_left_alone() {
        let input = input(
            vec![session_row("Big", 5, "ab", 1)],
            vec![attendee_row("Ann", &[Some(2.0)])],
        );
        let settings = settings(1, 2);
        let mut schedule = Schedule::build(&input, &settings).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        assert_eq!(assign_fallback_sessions(&mut schedule, &settings, &mut rng), 0);
        assert_eq!(schedule.attendee(AttendeeId(0)).open_slots(), 2);
    }
}

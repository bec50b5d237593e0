use crate::preferences::PreferenceRecord;
use crate::schedule::Schedule;
use crate::settings::{RankDirection, Settings};
use crate::{AttendeeId, SessionId};
use rand::Rng;
use tracing::debug;

/// Sessions with fewer occupants than this in a slot get topped up by the
/// balancing pass, and never lose an occupant to it.
pub const MIN_SESSION_OCCUPANCY: i64 = 2;

/// An attendee has to rate a session above this to be moved into it.
pub const BALANCE_RATING_THRESHOLD: f64 = 3.0;

pub const BALANCING_PASSES: usize = 2;

/// The greedy main pass.
///
/// For every slot index, every assignable attendee with usable preferences
/// gets their list re-sorted and is booked into the first session that
/// accepts them. Nothing already granted is taken away again.
///
/// Returns how many bookings were made.
pub fn assign_sessions<R: Rng + ?Sized>(schedule: &mut Schedule, settings: &Settings, rng: &mut R) -> usize {
    let policy = settings.main_pass_policy();
    let mut booked = 0;

    for pass in 0..settings.sessions_per_attendee {
        let mut misses = 0;
        for attendee in schedule.attendee_ids() {
            let candidate = schedule.attendee(attendee);
            if !candidate.assignable || candidate.preferences.has_no_usable_data() {
                continue;
            }

            schedule.sort_preferences(attendee, policy, settings.rank_direction, rng);

            let choices: Vec<SessionId> = schedule
                .attendee(attendee)
                .preferences
                .records()
                .iter()
                .map(|record| record.session)
                .collect();

            if choices
                .into_iter()
                .any(|session| schedule.assign_available_slot(attendee, session))
            {
                booked += 1;
            } else {
                misses += 1;
            }
        }
        debug!(pass, misses, "main pass finished slot pass");
    }

    booked
}

/// How strongly the attendee wants the session, on a "higher is better"
/// scale. Records added purely for bookkeeping and blank ratings count as no
/// interest.
fn interest(schedule: &Schedule, attendee: AttendeeId, session: SessionId, direction: RankDirection) -> Option<f64> {
    schedule
        .attendee(attendee)
        .rating_for(session)
        .and_then(|record| record.rating)
        .map(|rating| direction.satisfaction(rating))
}

/// Whether moving `attendee` into `session` at `slot` is a legal balancing move.
fn can_move_into(
    schedule: &Schedule,
    attendee: AttendeeId,
    session: SessionId,
    slot: usize,
    direction: RankDirection,
) -> bool {
    let candidate = schedule.attendee(attendee);
    if !candidate.assignable || candidate.holds(session) {
        return false;
    }
    if !interest(schedule, attendee, session, direction).is_some_and(|value| value > BALANCE_RATING_THRESHOLD) {
        return false;
    }

    // Only single-block bookings are swapped, and the session they leave must
    // stay at or above the minimum afterwards
    let Some(current) = candidate.booking(slot) else {
        return false;
    };
    let current = schedule.session(current.session);
    current.block_length == 1
        && !current.placeholder
        && current.occupancy(slot) > MIN_SESSION_OCCUPANCY
        && schedule.session(session).has_available_slot(slot)
}

/// Repair pass that pulls attendees into under-filled single-block sessions.
///
/// Every (session, slot) pair below [`MIN_SESSION_OCCUPANCY`] receives at
/// most one attendee per pass: the first, in attendee order, who rates the
/// session above [`BALANCE_RATING_THRESHOLD`] and can leave their current
/// single-block session without dropping it below the minimum. Attendees with
/// no record for the session get a zero-rated one.
///
/// Returns how many attendees were moved.
pub fn balance_sessions(schedule: &mut Schedule, settings: &Settings) -> usize {
    let direction = settings.rank_direction;
    let mut moved = 0;

    for _ in 0..BALANCING_PASSES {
        for session in schedule.session_ids() {
            if schedule.session(session).block_length != 1 {
                continue;
            }

            for slot in 0..schedule.slots() {
                if schedule.session(session).occupancy(slot) >= MIN_SESSION_OCCUPANCY {
                    continue;
                }

                for attendee in schedule.attendee_ids() {
                    if schedule.attendee(attendee).rating_for(session).is_none() {
                        schedule
                            .attendee_mut(attendee)
                            .preferences
                            .push(PreferenceRecord::new(session, Some(0.0)));
                    }

                    if can_move_into(schedule, attendee, session, slot, direction) {
                        schedule.unassign(attendee, slot);
                        schedule.force_assign(attendee, session, slot);
                        moved += 1;
                        debug!(
                            attendee = %schedule.attendee(attendee).name,
                            session = %schedule.session(session).name,
                            slot,
                            "balancing moved attendee"
                        );
                        break;
                    }
                }
            }
        }
    }

    moved
}

use crate::attendee::{Attendee, Booking};
use crate::error::SchedulerError;
use crate::input::RunInput;
use crate::preferences::{PreferenceList, PreferenceRecord, SortPolicy};
use crate::session::Session;
use crate::settings::{RankDirection, Settings};
use crate::{AttendeeId, SessionId};
use rand::Rng;
use std::fmt;
use tracing::debug;

/// The mutable state of a single trial: every session and attendee, linked
/// through [`SessionId`] and [`AttendeeId`] handles.
#[derive(Debug, Clone)]
pub struct Schedule {
    sessions: Vec<Session>,
    attendees: Vec<Attendee>,
    slots: usize,
}

impl Schedule {
    pub fn new(slots: usize) -> Self {
        Self {
            sessions: Vec::new(),
            attendees: Vec::new(),
            slots,
        }
    }

    /// Builds fresh trial state from the input rows.
    ///
    /// # Errors
    /// - `MissingSessionRows` if there are fewer session rows than sessions
    /// - `InvalidSessionRow` if a session has a zero block length
    /// - `UnknownSessionHeader` if a rating header names no session
    pub fn build(input: &RunInput, settings: &Settings) -> Result<Self, SchedulerError> {
        let slots = settings.sessions_per_attendee;
        if input.sessions.len() < settings.number_of_sessions {
            return Err(SchedulerError::MissingSessionRows {
                expected: settings.number_of_sessions,
                found: input.sessions.len(),
            });
        }

        let mut schedule = Schedule::new(slots);
        for row in input.sessions.iter().take(settings.number_of_sessions) {
            schedule.add_session(Session::from_row(row, slots)?);
        }

        // Each header must contain the name of a session
        let columns = input
            .ratings
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let lowered = header.to_lowercase();
                schedule
                    .sessions
                    .iter()
                    .position(|session| lowered.contains(&session.name.to_lowercase()))
                    .map(SessionId)
                    .ok_or_else(|| SchedulerError::UnknownSessionHeader {
                        column: i + 1,
                        header: header.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for row in &input.ratings.rows {
            if row.name.trim().is_empty() {
                schedule.add_attendee(Attendee::placeholder(slots));
                continue;
            }

            let records = columns
                .iter()
                .enumerate()
                .map(|(i, &session)| PreferenceRecord::new(session, row.ratings.get(i).copied().flatten()))
                .collect();
            let mut attendee = Attendee::new(&row.name, PreferenceList::new(records), slots);
            for (key, value) in &row.attributes {
                attendee.set_attribute(key, value);
            }
            schedule.add_attendee(attendee);
        }

        debug!(
            sessions = schedule.sessions.len(),
            attendees = schedule.attendees.len(),
            "built trial state"
        );
        Ok(schedule)
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn session(&self, id: SessionId) -> &Session {
        &self.sessions[id.0]
    }

    pub fn attendee(&self, id: AttendeeId) -> &Attendee {
        &self.attendees[id.0]
    }

    pub fn session_ids(&self) -> impl Iterator<Item = SessionId> + use<> {
        (0..self.sessions.len()).map(SessionId)
    }

    pub fn attendee_ids(&self) -> impl Iterator<Item = AttendeeId> + use<> {
        (0..self.attendees.len()).map(AttendeeId)
    }

    pub fn add_session(&mut self, session: Session) -> SessionId {
        self.sessions.push(session);
        SessionId(self.sessions.len() - 1)
    }

    pub fn add_attendee(&mut self, attendee: Attendee) -> AttendeeId {
        self.attendees.push(attendee);
        AttendeeId(self.attendees.len() - 1)
    }

    pub(crate) fn attendee_mut(&mut self, id: AttendeeId) -> &mut Attendee {
        &mut self.attendees[id.0]
    }

    /// Re-sorts an attendee's preferences against current session enrollment.
    pub(crate) fn sort_preferences<R: Rng + ?Sized>(
        &mut self,
        attendee: AttendeeId,
        policy: SortPolicy,
        direction: RankDirection,
        rng: &mut R,
    ) {
        let sessions = &self.sessions;
        self.attendees[attendee.0].preferences.sort(
            policy,
            direction,
            |session| sessions[session.0].enrollment(),
            rng,
        );
    }

    /// Whether a booking of `session` starting at `start` is allowed for the
    /// attendee: the session has room there, the attendee is free for every
    /// covered slot, and they don't already hold the session.
    pub fn can_take(&self, attendee: AttendeeId, session: SessionId, start: usize) -> bool {
        let session_ref = &self.sessions[session.0];
        let attendee_ref = &self.attendees[attendee.0];
        session_ref.has_available_slot(start)
            && attendee_ref.is_free(start, session_ref.block_length)
            && !attendee_ref.holds(session)
    }

    /// Books the attendee into the first acceptable start slot of the
    /// session, trying the least occupied slot first.
    ///
    /// Returns `false` and changes nothing when no slot qualifies.
    pub fn assign_available_slot(&mut self, attendee: AttendeeId, session: SessionId) -> bool {
        let start = self.sessions[session.0]
            .rotation()
            .find(|&slot| self.can_take(attendee, session, slot));

        match start {
            Some(start) => {
                self.commit(attendee, session, start);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, attendee: AttendeeId, session: SessionId, start: usize) {
        let booking = Booking { session, start };
        let session_ref = &mut self.sessions[session.0];
        for slot in session_ref.covered_slots(start) {
            self.attendees[attendee.0].fill(slot, booking);
        }
        session_ref.seat(attendee, start);
    }

    /// Vacates whatever booking covers `slot` for the attendee, every block
    /// of it, and gives the seats back.
    pub fn unassign(&mut self, attendee: AttendeeId, slot: usize) -> Option<Booking> {
        let booking = self.attendees[attendee.0].booking(slot)?;
        let session_ref = &mut self.sessions[booking.session.0];
        for covered in session_ref.covered_slots(booking.start) {
            if self.attendees[attendee.0].booking(covered) == Some(booking) {
                self.attendees[attendee.0].clear(covered);
            }
        }
        session_ref.unseat(attendee, booking.start);
        Some(booking)
    }

    /// Books the attendee into `session` at `start` without checking capacity
    /// or availability, first vacating anything they hold in the covered
    /// slots. A booking that would run past the last slot is not made.
    pub fn force_assign(&mut self, attendee: AttendeeId, session: SessionId, start: usize) -> bool {
        if start + self.sessions[session.0].block_length > self.slots {
            return false;
        }
        for slot in self.sessions[session.0].covered_slots(start) {
            self.unassign(attendee, slot);
        }
        self.commit(attendee, session, start);
        true
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for attendee in &self.attendees {
            let slots = (0..self.slots)
                .map(|slot| match attendee.session_at(slot) {
                    Some(session) => self.session(session).name.as_str(),
                    None => "-",
                })
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(f, "{:<24} {slots}", attendee.name)?;
        }
        Ok(())
    }
}

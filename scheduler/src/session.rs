use crate::blocks::{parse_blocks, start_slots};
use crate::error::SchedulerError;
use crate::input::SessionRow;
use crate::AttendeeId;

/// A capacity-bounded activity that runs in one or more consecutive slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: String,
    pub host: String,
    pub host_email: String,
    pub room: String,
    pub max_size: usize,
    pub block_length: usize,
    pub randomly_assignable: bool,
    /// Created by an override that named an unknown session.
    pub placeholder: bool,
    availability: Vec<bool>,
    /// Remaining seats per slot. Forced placements can drive this negative.
    empty_slots: Vec<i64>,
    roster: Vec<Vec<AttendeeId>>,
    enrollment: usize,
}

impl Session {
    /// Builds a session from its sheet row for a schedule of `slots` slots.
    pub fn from_row(row: &SessionRow, slots: usize) -> Result<Self, SchedulerError> {
        if row.block_length == 0 {
            return Err(SchedulerError::InvalidSessionRow {
                name: row.name.clone(),
                field: "block length",
                value: row.block_length.to_string(),
            });
        }

        let raw = parse_blocks(&row.available_blocks, slots);
        Ok(Self {
            name: row.name.clone(),
            host: row.host.clone(),
            host_email: row.host_email.clone(),
            room: row.room.clone(),
            max_size: row.max_size,
            block_length: row.block_length,
            randomly_assignable: row.randomly_assignable,
            placeholder: false,
            availability: start_slots(&raw, row.block_length),
            empty_slots: vec![row.max_size as i64; slots],
            roster: vec![Vec::new(); slots],
            enrollment: 0,
        })
    }

    /// An empty stand-in that only carries a name. It is never available and
    /// has no seats, so only forced placements ever put anyone in it.
    pub fn placeholder(name: &str, slots: usize) -> Self {
        Self {
            name: name.to_string(),
            host: String::from("None"),
            host_email: String::from("None"),
            room: String::from("None"),
            max_size: 0,
            block_length: 1,
            randomly_assignable: false,
            placeholder: true,
            availability: vec![false; slots],
            empty_slots: vec![0; slots],
            roster: vec![Vec::new(); slots],
            enrollment: 0,
        }
    }

    pub fn slots(&self) -> usize {
        self.empty_slots.len()
    }

    /// Legal start slots for this session.
    pub fn availability(&self) -> &[bool] {
        &self.availability
    }

    pub fn empty_slots(&self, slot: usize) -> i64 {
        self.empty_slots.get(slot).copied().unwrap_or(0)
    }

    /// Attendees in the given slot, in the order they joined.
    pub fn roster(&self, slot: usize) -> &[AttendeeId] {
        self.roster.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of seats taken in a slot as tracked by the capacity counter.
    pub fn occupancy(&self, slot: usize) -> i64 {
        self.max_size as i64 - self.empty_slots(slot)
    }

    /// Number of bookings currently held, counting a multi-block booking once.
    pub fn enrollment(&self) -> usize {
        self.enrollment
    }

    /// Whether a new booking can start at `slot`: it must be a legal start
    /// and every slot the booking would cover needs a free seat.
    pub fn has_available_slot(&self, slot: usize) -> bool {
        if !self.availability.get(slot).copied().unwrap_or(false) {
            return false;
        }

        (slot..slot + self.block_length).all(|s| self.empty_slots.get(s).is_some_and(|&empty| empty > 0))
    }

    /// The slot with the most free seats, lowest index on ties.
    pub fn least_occupied_slot(&self) -> usize {
        let mut best = 0;
        for (slot, &empty) in self.empty_slots.iter().enumerate() {
            if empty > self.empty_slots[best] {
                best = slot;
            }
        }
        best
    }

    /// Candidate start slots, beginning at the least occupied one and wrapping.
    pub fn rotation(&self) -> impl Iterator<Item = usize> + '_ {
        let slots = self.slots();
        let start = self.least_occupied_slot();
        (0..slots).map(move |offset| (start + offset) % slots)
    }

    /// Slots a booking starting at `start` covers, clipped to the schedule.
    pub fn covered_slots(&self, start: usize) -> std::ops::Range<usize> {
        start..(start + self.block_length).min(self.slots())
    }

    pub(crate) fn seat(&mut self, attendee: AttendeeId, start: usize) {
        for slot in self.covered_slots(start) {
            self.roster[slot].push(attendee);
            self.empty_slots[slot] -= 1;
        }
        self.enrollment += 1;
    }

    pub(crate) fn unseat(&mut self, attendee: AttendeeId, start: usize) {
        for slot in self.covered_slots(start) {
            if let Some(position) = self.roster[slot].iter().position(|&a| a == attendee) {
                self.roster[slot].remove(position);
                self.empty_slots[slot] += 1;
            }
        }
        self.enrollment = self.enrollment.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(blocks: &str, max_size: usize, block_length: usize) -> SessionRow {
        SessionRow {
            name: String::from("Pottery"),
            host: String::from("Ms. Clay"),
            host_email: String::from("clay@example.org"),
            room: String::from("B12"),
            max_size,
            available_blocks: blocks.to_string(),
            block_length,
            randomly_assignable: true,
        }
    }

    #[test]
    fn test_from_row_culls_multi_block_starts() {
        let session = Session::from_row(&row("abcd", 3, 2), 4).unwrap();
        assert_eq!(session.availability(), &[true, false, true, false]);
        assert_eq!(session.empty_slots(0), 3);
        assert_eq!(session.enrollment(), 0);
    }

    #[test]
    fn test_zero_block_length_is_rejected() {
        let err = Session::from_row(&row("a", 3, 0), 2).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidSessionRow { .. }));
    }

    #[test]
    fn test_has_available_slot_checks_every_covered_slot() {
        let mut session = Session::from_row(&row("abc", 1, 2), 3).unwrap();
        assert!(session.has_available_slot(0));
        assert!(!session.has_available_slot(1));

        session.seat(AttendeeId(0), 0);
        assert!(!session.has_available_slot(0));
        assert_eq!(session.occupancy(0), 1);
        assert_eq!(session.occupancy(1), 1);
        assert_eq!(session.occupancy(2), 0);
    }

    #[test]
    fn test_block_running_past_the_schedule_is_unavailable() {
        let mut session = Session::from_row(&row("c", 2, 1), 3).unwrap();
        session.block_length = 2;
        assert!(!session.has_available_slot(2));
    }

    #[test]
    fn test_unseat_preserves_order_and_restores_capacity() {
        let mut session = Session::from_row(&row("a", 3, 1), 1).unwrap();
        session.seat(AttendeeId(0), 0);
        session.seat(AttendeeId(1), 0);
        session.seat(AttendeeId(2), 0);
        session.unseat(AttendeeId(1), 0);

        assert_eq!(session.roster(0), &[AttendeeId(0), AttendeeId(2)]);
        assert_eq!(session.empty_slots(0), 1);
        assert_eq!(session.enrollment(), 2);
    }

    #[test]
    fn test_rotation_starts_at_least_occupied_slot() {
        let mut session = Session::from_row(&row("abc", 2, 1), 3).unwrap();
        session.seat(AttendeeId(0), 0);
        session.seat(AttendeeId(1), 1);
        assert_eq!(session.least_occupied_slot(), 2);
        assert_eq!(session.rotation().collect::<Vec<_>>(), vec![2, 0, 1]);
    }

    #[test]
    fn test_placeholder_is_never_available() {
        let session = Session::placeholder("Assembly", 3);
        assert!(session.placeholder);
        assert!((0..3).all(|slot| !session.has_available_slot(slot)));
    }
}

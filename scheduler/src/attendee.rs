use crate::preferences::{PreferenceList, PreferenceRecord};
use crate::SessionId;
use regex::Regex;

/// A session held in one slot of an attendee's schedule. `start` is the slot
/// the booking begins in, which differs from the slot for the later blocks of
/// a multi-block session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Booking {
    pub session: SessionId,
    pub start: usize,
}

/// How to find a custom attribute.
#[derive(Debug, Clone)]
pub enum AttributeKey {
    /// Matches any normalized key containing this text.
    Contains(String),
    /// Matches any key the expression finds a match in.
    Pattern(Regex),
}

/// Custom attribute keys are compared lowercased with spaces stripped.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase().replace(' ', "")
}

#[derive(Debug, Clone)]
pub struct Attendee {
    pub name: String,
    /// Whether the assignment passes may place this attendee at all.
    pub assignable: bool,
    pub preferences: PreferenceList,
    attributes: Vec<(String, String)>,
    schedule: Vec<Option<Booking>>,
}

impl Attendee {
    pub fn new(name: &str, preferences: PreferenceList, slots: usize) -> Self {
        Self {
            name: name.to_string(),
            assignable: true,
            preferences,
            attributes: Vec::new(),
            schedule: vec![None; slots],
        }
    }

    /// A nameless attendee that is never auto-assigned.
    pub fn placeholder(slots: usize) -> Self {
        Self {
            name: String::from("None"),
            assignable: false,
            preferences: PreferenceList::default(),
            attributes: Vec::new(),
            schedule: vec![None; slots],
        }
    }

    /// Sets an attribute, replacing any value under the same normalized key.
    pub fn set_attribute(&mut self, key: &str, value: &str) {
        let key = normalize_key(key);
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((key, value.to_string())),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// First attribute whose key matches, in insertion order.
    pub fn attribute(&self, key: &AttributeKey) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| match key {
                AttributeKey::Contains(needle) => k.contains(needle.as_str()),
                AttributeKey::Pattern(pattern) => pattern.is_match(k),
            })
            .map(|(_, v)| v.as_str())
    }

    fn attribute_matching(&self, pattern: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| pattern.split('|').any(|alt| k.contains(alt)))
            .map(|(_, v)| v.as_str())
    }

    pub fn preferred_name(&self) -> &str {
        self.attribute_matching("preferredname|nickname|preferred_name")
            .unwrap_or(&self.name)
    }

    /// Grade as recorded under any key containing "grade", when numeric.
    pub fn grade(&self) -> Option<f64> {
        self.attribute_matching("grade")
            .and_then(|grade| grade.trim().parse().ok())
    }

    pub fn email(&self) -> Option<&str> {
        self.attribute_matching("email")
    }

    pub fn slots(&self) -> usize {
        self.schedule.len()
    }

    pub fn booking(&self, slot: usize) -> Option<Booking> {
        self.schedule.get(slot).copied().flatten()
    }

    pub fn session_at(&self, slot: usize) -> Option<SessionId> {
        self.booking(slot).map(|booking| booking.session)
    }

    pub fn schedule(&self) -> &[Option<Booking>] {
        &self.schedule
    }

    /// True when every slot in `start..start + length` exists and is empty.
    pub fn is_free(&self, start: usize, length: usize) -> bool {
        (start..start + length).all(|slot| matches!(self.schedule.get(slot), Some(None)))
    }

    pub fn holds(&self, session: SessionId) -> bool {
        self.schedule
            .iter()
            .flatten()
            .any(|booking| booking.session == session)
    }

    /// Number of empty slots left.
    pub fn open_slots(&self) -> usize {
        self.schedule.iter().filter(|booking| booking.is_none()).count()
    }

    pub fn rating_for(&self, session: SessionId) -> Option<&PreferenceRecord> {
        self.preferences.for_session(session)
    }

    pub(crate) fn fill(&mut self, slot: usize, booking: Booking) {
        if let Some(entry) = self.schedule.get_mut(slot) {
            *entry = Some(booking);
        }
    }

    pub(crate) fn clear(&mut self, slot: usize) {
        if let Some(entry) = self.schedule.get_mut(slot) {
            *entry = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attendee() -> Attendee {
        let mut attendee = Attendee::new("Ada Lovelace", PreferenceList::default(), 3);
        attendee.set_attribute("Preferred Name", "Ada");
        attendee.set_attribute("Grade", "10");
        attendee.set_attribute("Email Address", "ada@example.org");
        attendee
    }

    #[test]
    fn test_identity_attributes() {
        let attendee = attendee();
        assert_eq!(attendee.preferred_name(), "Ada");
        assert_eq!(attendee.grade(), Some(10.0));
        assert_eq!(attendee.email(), Some("ada@example.org"));
        assert_eq!(attendee.attributes()[0].0, "preferredname");
    }

    #[test]
    fn test_preferred_name_falls_back_to_name() {
        let attendee = Attendee::new("Grace Hopper", PreferenceList::default(), 1);
        assert_eq!(attendee.preferred_name(), "Grace Hopper");
        assert_eq!(attendee.grade(), None);
        assert_eq!(attendee.email(), None);
    }

    #[test]
    fn test_attribute_lookup_by_text_and_pattern() {
        let attendee = attendee();
        assert_eq!(attendee.attribute(&AttributeKey::Contains(String::from("grade"))), Some("10"));
        let pattern = Regex::new("^e.*address$").unwrap();
        assert_eq!(attendee.attribute(&AttributeKey::Pattern(pattern)), Some("ada@example.org"));
        assert_eq!(attendee.attribute(&AttributeKey::Contains(String::from("homeroom"))), None);
    }

    #[test]
    fn test_schedule_queries() {
        let mut attendee = attendee();
        let booking = Booking { session: SessionId(4), start: 1 };
        attendee.fill(1, booking);
        attendee.fill(2, booking);

        assert!(attendee.is_free(0, 1));
        assert!(!attendee.is_free(0, 2));
        assert!(!attendee.is_free(2, 2));
        assert!(attendee.holds(SessionId(4)));
        assert_eq!(attendee.session_at(2), Some(SessionId(4)));
        assert_eq!(attendee.open_slots(), 1);

        attendee.clear(1);
        assert_eq!(attendee.booking(1), None);
    }

    #[test]
    fn test_placeholder_is_not_assignable() {
        let attendee = Attendee::placeholder(2);
        assert!(!attendee.assignable);
        assert!(attendee.preferences.is_empty());
    }
}

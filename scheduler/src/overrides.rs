use crate::attendee::{Attendee, AttributeKey, normalize_key};
use crate::blocks::parse_blocks;
use crate::input::OverrideRow;
use crate::preferences::{PreferenceList, PreferenceRecord};
use crate::schedule::Schedule;
use crate::session::Session;
use crate::{AttendeeId, SessionId};
use regex::Regex;
use tracing::{debug, warn};

/// What an attendee's attribute value has to look like for a group directive
/// to apply.
#[derive(Debug, Clone)]
pub enum Condition {
    Equals(String),
    Pattern(Regex),
}

impl Condition {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Condition::Equals(expected) => expected == value,
            Condition::Pattern(pattern) => pattern.is_match(value),
        }
    }
}

#[derive(Debug, Clone)]
pub enum OverrideDirective {
    /// A single attendee, looked up by name.
    Literal(String),
    /// Every attendee whose attribute under `key` satisfies `condition`.
    Group { key: AttributeKey, condition: Condition },
}

/// Returns the inner expression of a `/.../` delimited string.
fn regex_body(text: &str) -> Option<&str> {
    text.strip_prefix('/')?.strip_suffix('/')
}

fn compile(body: &str) -> Option<Regex> {
    match Regex::new(body) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("override pattern /{body}/ is not a valid regex, matching it literally: {err}");
            None
        }
    }
}

impl OverrideDirective {
    /// Parses an identifier cell. A blank cell yields `None`.
    ///
    /// `Grade=10` applies to everyone whose grade attribute is exactly `10`;
    /// either side may be written as `/regex/`.
    pub fn parse(identifier: &str) -> Option<Self> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return None;
        }

        let Some((key, condition)) = identifier.split_once('=') else {
            return Some(OverrideDirective::Literal(identifier.to_string()));
        };

        let key = normalize_key(key);
        let key = match regex_body(&key).and_then(compile) {
            Some(pattern) => AttributeKey::Pattern(pattern),
            None => AttributeKey::Contains(key),
        };

        let condition = condition.trim();
        let condition = match regex_body(condition).and_then(compile) {
            Some(pattern) => Condition::Pattern(pattern),
            None => Condition::Equals(condition.to_string()),
        };

        Some(OverrideDirective::Group { key, condition })
    }
}

/// Counts of what the override rows did, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideSummary {
    pub rows: usize,
    pub placements: usize,
    pub attendees_created: usize,
    pub sessions_created: usize,
}

/// Finds the first session whose name contains `target`, ignoring case, or
/// adds a placeholder session carrying that name.
fn resolve_session(schedule: &mut Schedule, target: &str, summary: &mut OverrideSummary) -> SessionId {
    let lowered = target.trim().to_lowercase();
    if let Some(id) = schedule
        .session_ids()
        .find(|&id| schedule.session(id).name.to_lowercase().contains(&lowered))
    {
        return id;
    }

    warn!("no session matches override target '{target}', creating a placeholder");
    summary.sessions_created += 1;
    let slots = schedule.slots();
    schedule.add_session(Session::placeholder(target.trim(), slots))
}

/// Forces a booking at every flagged slot. Flagged slots already covered by
/// a booking made here for the same row are skipped.
fn force_blocks(schedule: &mut Schedule, attendee: AttendeeId, session: SessionId, blocks: &[bool]) -> usize {
    let block_length = schedule.session(session).block_length;
    let mut covered_until = 0;
    let mut placed = 0;
    for (slot, _) in blocks.iter().enumerate().filter(|(_, flagged)| **flagged) {
        if slot < covered_until {
            continue;
        }
        if schedule.force_assign(attendee, session, slot) {
            covered_until = slot + block_length;
            placed += 1;
        } else {
            warn!(
                "override for '{}' into '{}' at slot {} runs past the last slot, skipping",
                schedule.attendee(attendee).name,
                schedule.session(session).name,
                slot + 1
            );
        }
    }
    placed
}

/// Applies administrator overrides in row order, before any assignment.
///
/// Processing stops at the first blank identifier, and after the first group
/// directive. Literal directives naming an unknown attendee add that attendee.
pub fn apply_overrides(schedule: &mut Schedule, rows: &[OverrideRow]) -> OverrideSummary {
    let mut summary = OverrideSummary::default();
    let slots = schedule.slots();

    for row in rows {
        let Some(directive) = OverrideDirective::parse(&row.identifier) else {
            break;
        };
        summary.rows += 1;

        let session = resolve_session(schedule, &row.session, &mut summary);
        let blocks = parse_blocks(&row.blocks, slots);

        match directive {
            OverrideDirective::Group { key, condition } => {
                let matched: Vec<AttendeeId> = schedule
                    .attendee_ids()
                    .filter(|&id| {
                        schedule
                            .attendee(id)
                            .attribute(&key)
                            .is_some_and(|value| condition.matches(value))
                    })
                    .collect();
                debug!("group override '{}' matched {} attendees", row.identifier, matched.len());

                for attendee in matched {
                    summary.placements += force_blocks(schedule, attendee, session, &blocks);
                }
                break;
            }
            OverrideDirective::Literal(name) => {
                let lowered = name.to_lowercase();
                let existing = schedule
                    .attendee_ids()
                    .find(|&id| schedule.attendee(id).name.to_lowercase() == lowered);

                let attendee = match existing {
                    Some(id) => id,
                    None => {
                        let preferences = PreferenceList::new(vec![PreferenceRecord::new(session, Some(0.0))]);
                        let mut attendee = Attendee::new(&name, preferences, slots);
                        attendee.set_attribute("email", &row.email);
                        attendee.set_attribute("preferred_name", &name);
                        summary.attendees_created += 1;
                        schedule.add_attendee(attendee)
                    }
                };

                summary.placements += force_blocks(schedule, attendee, session, &blocks);
            }
        }
    }

    summary
}

//! Rows handed over by whatever reads the sheets. They are plain values and
//! are never mutated, so every trial can rebuild its state from them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRow {
    pub name: String,
    pub host: String,
    pub host_email: String,
    pub room: String,
    pub max_size: usize,
    /// Block list such as `"ABC"` or `"1,2,3"`.
    pub available_blocks: String,
    pub block_length: usize,
    pub randomly_assignable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeRow {
    pub name: String,
    /// Extra columns as (header, value), in sheet order.
    pub attributes: Vec<(String, String)>,
    /// One cell per rating header. `None` for blank cells.
    pub ratings: Vec<Option<f64>>,
}

/// The ratings sheet: a header per rating column plus the attendee rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSheet {
    pub headers: Vec<String>,
    pub rows: Vec<AttendeeRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideRow {
    /// Attendee name, or `key=condition` for a group directive.
    pub identifier: String,
    pub email: String,
    pub session: String,
    pub blocks: String,
}

/// Everything one run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    pub sessions: Vec<SessionRow>,
    pub ratings: RatingSheet,
    pub overrides: Vec<OverrideRow>,
}

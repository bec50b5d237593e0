pub mod attendee;
pub mod blocks;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod input;
pub mod output;
pub mod overrides;
pub mod preferences;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod synthetic;
pub mod trial;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use error::SchedulerError;
pub use input::{AttendeeRow, OverrideRow, RatingSheet, RunInput, SessionRow};
pub use schedule::Schedule;
pub use settings::{RankDirection, Settings};
pub use trial::{RunOutcome, TrialScore, run, run_with_rng};

/// Index of a session within a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub usize);

/// Index of an attendee within a [`Schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttendeeId(pub usize);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session #{}", self.0)
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attendee #{}", self.0)
    }
}

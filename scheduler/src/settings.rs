use serde::{Deserialize, Serialize};

/// Highest value on the rating scale. Low-to-high rankings are scored as
/// the complement against this value.
pub const RATING_SCALE_MAX: f64 = 5.0;

/// Which end of the rating scale means "most wanted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    #[default]
    HighToLow,
    LowToHigh,
}

impl RankDirection {
    /// Maps a raw rating onto "higher is better".
    pub fn satisfaction(self, rating: f64) -> f64 {
        match self {
            RankDirection::HighToLow => rating,
            RankDirection::LowToHigh => RATING_SCALE_MAX - rating,
        }
    }
}

/// Run configuration consumed by the scheduler.
///
/// Built once per run and handed to every component by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of sessions, which is also the width of the rating matrix.
    pub number_of_sessions: usize,
    /// Number of schedule slots every attendee has.
    pub sessions_per_attendee: usize,
    /// Number of randomized trials to run before keeping the best one.
    pub max_attempts: usize,
    pub rank_direction: RankDirection,
    /// Prefer under-filled sessions over higher ratings during the main pass.
    pub prioritize_balancing: bool,
    /// Reserved for a reassignment search. Currently ignored.
    pub recursion_depth: usize,
    /// Seed for the tie-breaking RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            number_of_sessions: 4,
            sessions_per_attendee: 3,
            max_attempts: 10,
            rank_direction: RankDirection::HighToLow,
            prioritize_balancing: false,
            recursion_depth: 2,
            seed: None,
        }
    }
}

impl Settings {
    /// The sort policy the main pass uses for every attendee.
    pub fn main_pass_policy(&self) -> crate::preferences::SortPolicy {
        if self.prioritize_balancing {
            crate::preferences::SortPolicy::Balanced
        } else {
            crate::preferences::SortPolicy::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_match_sheet_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.number_of_sessions, 4);
        assert_eq!(settings.sessions_per_attendee, 3);
        assert_eq!(settings.max_attempts, 10);
        assert_eq!(settings.rank_direction, RankDirection::HighToLow);
        assert!(!settings.prioritize_balancing);
    }

    #[test]
    fn test_satisfaction_complements_low_to_high() {
        assert_relative_eq!(RankDirection::HighToLow.satisfaction(4.0), 4.0);
        assert_relative_eq!(RankDirection::LowToHigh.satisfaction(1.0), 4.0);
    }
}

use scheduler::{RankDirection, Settings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("bad {name} variable: expected a whole number, got {value}")]
    BadVariable { name: &'static str, value: String },
    #[error("{field} must be at least 1")]
    TooSmall { field: &'static str },
}

/// Where things live in the ratings sheet. Columns are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingsLayout {
    pub header_rows: usize,
    pub name_column: usize,
    /// First of `number_of_sessions` consecutive rating columns.
    pub ratings_start_column: usize,
}

impl Default for RatingsLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            name_column: 2,
            ratings_start_column: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsLayout {
    pub header_rows: usize,
    pub name_column: usize,
    pub host_column: usize,
    pub host_email_column: usize,
    pub room_column: usize,
    pub max_size_column: usize,
    pub available_blocks_column: usize,
    pub block_length_column: usize,
    pub randomly_assignable_column: usize,
}

impl Default for SessionsLayout {
    fn default() -> Self {
        Self {
            header_rows: 2,
            name_column: 0,
            host_column: 1,
            host_email_column: 2,
            room_column: 3,
            max_size_column: 4,
            available_blocks_column: 5,
            block_length_column: 6,
            randomly_assignable_column: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridesLayout {
    pub header_rows: usize,
    pub identifier_column: usize,
    pub email_column: usize,
    pub session_column: usize,
    pub blocks_column: usize,
}

impl Default for OverridesLayout {
    fn default() -> Self {
        Self {
            header_rows: 2,
            identifier_column: 0,
            email_column: 1,
            session_column: 2,
            blocks_column: 3,
        }
    }
}

/// Column offsets and header row counts of the three input sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub ratings: RatingsLayout,
    pub sessions: SessionsLayout,
    pub overrides: OverridesLayout,
}

/// Values given on the command line. `None` leaves the configured value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub number_of_sessions: Option<usize>,
    pub sessions_per_attendee: Option<usize>,
    pub max_attempts: Option<usize>,
    pub rank_direction: Option<RankDirection>,
    pub prioritize_balancing: Option<bool>,
    pub seed: Option<u64>,
}

/// The operator configuration
///
/// # Fields
/// - `settings`: what the scheduler itself reads
/// - `layout`: where the sheet readers find each value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub layout: SheetLayout,
}

fn parse_variable<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::BadVariable { name, value })
}

impl Config {
    /// Builds the configuration from defaults, an optional JSON file and the
    /// process environment.
    ///
    /// # Returns
    /// `Ok(Config)`, or an error if a layer could not be read
    ///
    /// # Errors
    /// This function will return an error if:
    /// - The config file cannot be read or is not valid JSON
    /// - `MAX_ATTEMPTS` or `SCHEDULER_SEED` is set but not a whole number
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Applies `MAX_ATTEMPTS` and `SCHEDULER_SEED` as found by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MAX_ATTEMPTS") {
            self.settings.max_attempts = parse_variable("MAX_ATTEMPTS", value)?;
        }
        if let Some(value) = lookup("SCHEDULER_SEED") {
            self.settings.seed = Some(parse_variable("SCHEDULER_SEED", value)?);
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        let settings = &mut self.settings;
        if let Some(value) = overrides.number_of_sessions {
            settings.number_of_sessions = value;
        }
        if let Some(value) = overrides.sessions_per_attendee {
            settings.sessions_per_attendee = value;
        }
        if let Some(value) = overrides.max_attempts {
            settings.max_attempts = value;
        }
        if let Some(value) = overrides.rank_direction {
            settings.rank_direction = value;
        }
        if let Some(value) = overrides.prioritize_balancing {
            settings.prioritize_balancing = value;
        }
        if overrides.seed.is_some() {
            settings.seed = overrides.seed;
        }
    }

    /// Checks the values the scheduler relies on being positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("number of sessions", self.settings.number_of_sessions),
            ("sessions per attendee", self.settings.sessions_per_attendee),
            ("max attempts", self.settings.max_attempts),
        ];
        match checks.into_iter().find(|(_, value)| *value == 0) {
            Some((field, _)) => Err(ConfigError::TooSmall { field }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.layout.ratings.name_column, 2);
        assert_eq!(config.layout.ratings.ratings_start_column, 5);
        assert_eq!(config.layout.sessions.header_rows, 2);
        assert_eq!(config.layout.sessions.randomly_assignable_column, 7);
        assert_eq!(config.layout.overrides.blocks_column, 3);
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{"settings": {"max_attempts": 25, "rank_direction": "low_to_high"},
                       "layout": {"ratings": {"name_column": 0}}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.settings.max_attempts, 25);
        assert_eq!(config.settings.rank_direction, RankDirection::LowToHigh);
        assert_eq!(config.settings.sessions_per_attendee, 3);
        assert_eq!(config.layout.ratings.name_column, 0);
        assert_eq!(config.layout.ratings.ratings_start_column, 5);
    }

    #[test]
    fn test_environment_layer() {
        let mut config = Config::default();
        config
            .apply_env(|name| match name {
                "MAX_ATTEMPTS" => Some(String::from("40")),
                "SCHEDULER_SEED" => Some(String::from(" 1234 ")),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.settings.max_attempts, 40);
        assert_eq!(config.settings.seed, Some(1234));

        let err = config
            .apply_env(|name| (name == "MAX_ATTEMPTS").then(|| String::from("lots")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadVariable { name: "MAX_ATTEMPTS", .. }));
    }

    #[test]
    fn test_command_line_wins() {
        let mut config = Config::default();
        config.settings.seed = Some(5);
        config.apply_overrides(&SettingsOverrides {
            sessions_per_attendee: Some(2),
            prioritize_balancing: Some(true),
            ..SettingsOverrides::default()
        });
        assert_eq!(config.settings.sessions_per_attendee, 2);
        assert!(config.settings.prioritize_balancing);
        assert_eq!(config.settings.seed, Some(5));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.settings.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::TooSmall { field: "max attempts" })));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = Config::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

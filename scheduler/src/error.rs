#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("rating column #{column} ('{header}') does not name any known session")]
    UnknownSessionHeader { column: usize, header: String },
    #[error("expected {expected} session rows, found {found}")]
    MissingSessionRows { expected: usize, found: usize },
    #[error("session '{name}' has an invalid {field}: '{value}'")]
    InvalidSessionRow {
        name: String,
        field: &'static str,
        value: String,
    },
    #[error("no trials were run (max attempts is 0)")]
    NoTrials,
}

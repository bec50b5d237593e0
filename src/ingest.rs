//! Reads the three sheet exports into scheduler input rows.
//!
//! Every sheet is read as raw cells; the configured layout says which column
//! holds what and how many header rows to skip.

use crate::config::{OverridesLayout, RatingsLayout, SessionsLayout, SheetLayout};
use scheduler::{AttendeeRow, OverrideRow, RatingSheet, RunInput, SchedulerError, SessionRow};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("could not read sheet {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Paths of the exported sheets. The overrides sheet is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPaths {
    pub ratings: PathBuf,
    pub sessions: PathBuf,
    pub overrides: Option<PathBuf>,
}

pub type Rows = Vec<Vec<String>>;

/// Reads every record of a CSV file as plain cells, headers included.
pub fn read_rows(path: &Path) -> Result<Rows, IngestError> {
    let wrap = |source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(wrap)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(wrap)?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn cell(row: &[String], column: usize) -> &str {
    row.get(column).map(|value| value.trim()).unwrap_or("")
}

fn parse_rating(value: &str, attendee: &str, header: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    match value.parse::<f64>() {
        Ok(rating) if rating.is_finite() => Some(rating),
        _ => {
            warn!("ignoring rating '{value}' from {attendee} for '{header}': not a number");
            None
        }
    }
}

/// Builds the rating sheet. The last header row names the columns.
pub fn parse_ratings(rows: &[Vec<String>], layout: &RatingsLayout, number_of_sessions: usize) -> RatingSheet {
    let empty = Vec::new();
    let header_row = layout
        .header_rows
        .checked_sub(1)
        .and_then(|index| rows.get(index))
        .unwrap_or(&empty);
    let rating_columns = layout.ratings_start_column..layout.ratings_start_column + number_of_sessions;

    let headers = rating_columns
        .clone()
        .map(|column| cell(header_row, column).to_string())
        .collect::<Vec<_>>();
    let attribute_columns: Vec<usize> = (0..layout.ratings_start_column)
        .filter(|&column| column != layout.name_column)
        .collect();

    let rows = rows
        .iter()
        .skip(layout.header_rows)
        .map(|row| {
            let name = cell(row, layout.name_column).to_string();
            let attributes = attribute_columns
                .iter()
                .map(|&column| (cell(header_row, column).to_string(), cell(row, column).to_string()))
                .collect();
            let ratings = rating_columns
                .clone()
                .zip(&headers)
                .map(|(column, header)| parse_rating(cell(row, column), &name, header))
                .collect();
            AttendeeRow {
                name,
                attributes,
                ratings,
            }
        })
        .collect();

    RatingSheet { headers, rows }
}

fn invalid(name: &str, field: &'static str, value: &str) -> SchedulerError {
    SchedulerError::InvalidSessionRow {
        name: name.to_string(),
        field,
        value: value.to_string(),
    }
}

/// Reads the first `number_of_sessions` rows after the header rows. Fewer
/// rows are left for the scheduler to reject.
pub fn parse_sessions(
    rows: &[Vec<String>],
    layout: &SessionsLayout,
    number_of_sessions: usize,
) -> Result<Vec<SessionRow>, SchedulerError> {
    rows.iter()
        .skip(layout.header_rows)
        .take(number_of_sessions)
        .map(|row| {
            let name = cell(row, layout.name_column);

            let max_size = cell(row, layout.max_size_column);
            let max_size = max_size
                .parse()
                .map_err(|_| invalid(name, "capacity", max_size))?;

            let block_length = match cell(row, layout.block_length_column) {
                "" => 1,
                value => match value.parse() {
                    Ok(length) if length >= 1 => length,
                    _ => return Err(invalid(name, "block length", value)),
                },
            };

            Ok(SessionRow {
                name: name.to_string(),
                host: cell(row, layout.host_column).to_string(),
                host_email: cell(row, layout.host_email_column).to_string(),
                room: cell(row, layout.room_column).to_string(),
                max_size,
                available_blocks: cell(row, layout.available_blocks_column).to_string(),
                block_length,
                randomly_assignable: cell(row, layout.randomly_assignable_column).eq_ignore_ascii_case("yes"),
            })
        })
        .collect()
}

/// Override rows up to, not including, the first blank identifier.
pub fn parse_overrides(rows: &[Vec<String>], layout: &OverridesLayout) -> Vec<OverrideRow> {
    rows.iter()
        .skip(layout.header_rows)
        .map(|row| OverrideRow {
            identifier: cell(row, layout.identifier_column).to_string(),
            email: cell(row, layout.email_column).to_string(),
            session: cell(row, layout.session_column).to_string(),
            blocks: cell(row, layout.blocks_column).to_string(),
        })
        .take_while(|row| !row.identifier.is_empty())
        .collect()
}

/// Reads all sheets into one run input.
///
/// # Errors
/// This function will return an error if:
/// - A sheet cannot be read as CSV
/// - A session row has a non-numeric capacity or a bad block length
pub fn load_input(paths: &SheetPaths, layout: &SheetLayout, number_of_sessions: usize) -> Result<RunInput, IngestError> {
    let ratings = parse_ratings(&read_rows(&paths.ratings)?, &layout.ratings, number_of_sessions);
    let sessions = parse_sessions(&read_rows(&paths.sessions)?, &layout.sessions, number_of_sessions)?;
    let overrides = match &paths.overrides {
        Some(path) => parse_overrides(&read_rows(path)?, &layout.overrides),
        None => Vec::new(),
    };

    Ok(RunInput {
        sessions,
        ratings,
        overrides,
    })
}

//! Writes run results, and the input sheets `gen_sheets` produces.

use crate::config::SheetLayout;
use chrono::{DateTime, Utc};
use scheduler::output::{attendee_headers, attendee_rows, session_headers, session_rows};
use scheduler::{RunInput, RunOutcome, Settings};
use serde::Serialize;
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not write report: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Summary of one run, written next to the rosters as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub score_percentage: f64,
    pub trial_scores: Vec<f64>,
    pub best_trial: usize,
    pub seed: u64,
    pub attendees: usize,
    pub attendees_with_empty_slots: usize,
    pub fallback_placements: usize,
    pub generated_at: DateTime<Utc>,
}

impl RunReport {
    pub fn new(outcome: &RunOutcome) -> Self {
        let attendees = outcome.schedule.attendees();
        Self {
            score_percentage: outcome.percentage(),
            trial_scores: outcome.trial_scores.clone(),
            best_trial: outcome.best_trial,
            seed: outcome.seed,
            attendees: attendees.len(),
            attendees_with_empty_slots: attendees
                .iter()
                .filter(|attendee| attendee.assignable && attendee.open_slots() > 0)
                .count(),
            fallback_placements: outcome.fallback_placements,
            generated_at: Utc::now(),
        }
    }
}

pub fn write_attendee_roster<W: io::Write>(writer: W, outcome: &RunOutcome, settings: &Settings) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(attendee_headers(outcome.schedule.slots()))?;
    for row in attendee_rows(&outcome.schedule, settings) {
        csv.write_record(row.to_record())?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_session_roster<W: io::Write>(writer: W, outcome: &RunOutcome) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(session_headers(outcome.schedule.slots()))?;
    for row in session_rows(&outcome.schedule) {
        csv.write_record(row.to_record())?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_report<W: io::Write>(writer: W, report: &RunReport) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Writes both rosters and the report into `dir` as `attendee_roster.csv`,
/// `session_roster.csv` and `report.json`.
pub fn write_outputs(dir: &Path, outcome: &RunOutcome, settings: &Settings) -> Result<RunReport, ExportError> {
    std::fs::create_dir_all(dir)?;
    write_attendee_roster(std::fs::File::create(dir.join("attendee_roster.csv"))?, outcome, settings)?;
    write_session_roster(std::fs::File::create(dir.join("session_roster.csv"))?, outcome)?;

    let report = RunReport::new(outcome);
    write_report(std::fs::File::create(dir.join("report.json"))?, &report)?;
    Ok(report)
}

/// Places `values` into a record of at least `width` cells at the given
/// columns.
fn place(width: usize, values: &[(usize, String)]) -> Vec<String> {
    let width = values.iter().map(|(column, _)| column + 1).max().unwrap_or(0).max(width);
    let mut record = vec![String::new(); width];
    for (column, value) in values {
        record[*column] = value.clone();
    }
    record
}

/// Writes the three input sheets in the given layout, so that reading them
/// back yields `input`. Attributes fill the columns before the ratings that
/// are not the name column, in order; any that don't fit are dropped.
pub fn write_input_sheets<W: io::Write>(
    input: &RunInput,
    layout: &SheetLayout,
    ratings: W,
    sessions: W,
    overrides: W,
) -> Result<(), ExportError> {
    let ratings_layout = &layout.ratings;
    let attribute_columns: Vec<usize> = (0..ratings_layout.ratings_start_column)
        .filter(|&column| column != ratings_layout.name_column)
        .collect();
    let rating_column = |i: usize| ratings_layout.ratings_start_column + i;

    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(ratings);
    for index in 0..ratings_layout.header_rows {
        let mut values = Vec::new();
        // Only the last header row names columns
        if index + 1 == ratings_layout.header_rows {
            values.push((ratings_layout.name_column, String::from("Name")));
            if let Some(first) = input.ratings.rows.first() {
                values.extend(attribute_columns.iter().zip(&first.attributes).map(|(&c, (k, _))| (c, k.clone())));
            }
            values.extend(input.ratings.headers.iter().enumerate().map(|(i, h)| (rating_column(i), h.clone())));
        }
        csv.write_record(place(1, &values))?;
    }
    for row in &input.ratings.rows {
        let mut values = vec![(ratings_layout.name_column, row.name.clone())];
        values.extend(attribute_columns.iter().zip(&row.attributes).map(|(&c, (_, v))| (c, v.clone())));
        values.extend(
            row.ratings
                .iter()
                .enumerate()
                .map(|(i, rating)| (rating_column(i), rating.map(|r| r.to_string()).unwrap_or_default())),
        );
        csv.write_record(place(1, &values))?;
    }
    csv.flush()?;

    let sessions_layout = &layout.sessions;
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(sessions);
    for _ in 0..sessions_layout.header_rows {
        csv.write_record(place(
            1,
            &[
                (sessions_layout.name_column, String::from("Session Name")),
                (sessions_layout.host_column, String::from("Host")),
                (sessions_layout.host_email_column, String::from("Host Email")),
                (sessions_layout.room_column, String::from("Room")),
                (sessions_layout.max_size_column, String::from("Max Size")),
                (sessions_layout.available_blocks_column, String::from("Available Blocks")),
                (sessions_layout.block_length_column, String::from("Block Length")),
                (sessions_layout.randomly_assignable_column, String::from("Randomly Assignable")),
            ],
        ))?;
    }
    for row in &input.sessions {
        csv.write_record(place(
            1,
            &[
                (sessions_layout.name_column, row.name.clone()),
                (sessions_layout.host_column, row.host.clone()),
                (sessions_layout.host_email_column, row.host_email.clone()),
                (sessions_layout.room_column, row.room.clone()),
                (sessions_layout.max_size_column, row.max_size.to_string()),
                (sessions_layout.available_blocks_column, row.available_blocks.clone()),
                (sessions_layout.block_length_column, row.block_length.to_string()),
                (
                    sessions_layout.randomly_assignable_column,
                    String::from(if row.randomly_assignable { "Yes" } else { "No" }),
                ),
            ],
        ))?;
    }
    csv.flush()?;

    let overrides_layout = &layout.overrides;
    let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(overrides);
    for _ in 0..overrides_layout.header_rows {
        csv.write_record(place(
            1,
            &[
                (overrides_layout.identifier_column, String::from("Attendee or key=value")),
                (overrides_layout.email_column, String::from("Email")),
                (overrides_layout.session_column, String::from("Session")),
                (overrides_layout.blocks_column, String::from("Blocks")),
            ],
        ))?;
    }
    for row in &input.overrides {
        csv.write_record(place(
            1,
            &[
                (overrides_layout.identifier_column, row.identifier.clone()),
                (overrides_layout.email_column, row.email.clone()),
                (overrides_layout.session_column, row.session.clone()),
                (overrides_layout.blocks_column, row.blocks.clone()),
            ],
        ))?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{parse_overrides, parse_ratings, parse_sessions};
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use scheduler::synthetic::{InstanceShape, generate};

    fn csv_rows(bytes: &[u8]) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes)
            .records()
            .map(|record| record.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn outcome() -> (RunOutcome, Settings) {
        let shape = InstanceShape {
            sessions: 4,
            attendees: 12,
            slots: 2,
            ..InstanceShape::default()
        };
        let input = generate(&shape, &mut StdRng::seed_from_u64(4));
        let settings = shape.settings(3, Some(4));
        (scheduler::run(&input, &settings).unwrap(), settings)
    }

    #[test]
    fn test_attendee_roster_csv() {
        let (outcome, settings) = outcome();
        let mut buffer = Vec::new();
        write_attendee_roster(&mut buffer, &outcome, &settings).unwrap();

        let rows = csv_rows(&buffer);
        assert_eq!(rows.len(), 13);
        assert_eq!(rows[0][4], "Session 1");
        assert_eq!(rows[0].last().map(String::as_str), Some("Picks Ratings"));
        assert!(rows[1][6].ends_with('.'));
    }

    #[test]
    fn test_session_roster_csv() {
        let (outcome, _) = outcome();
        let mut buffer = Vec::new();
        write_session_roster(&mut buffer, &outcome).unwrap();

        let rows = csv_rows(&buffer);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][3], "People In S1");
        assert_eq!(rows[0].len(), 3 + 4 * 2);
    }

    #[test]
    fn test_report_json() {
        let (outcome, _) = outcome();
        let report = RunReport::new(&outcome);
        assert_relative_eq!(report.score_percentage, outcome.percentage());
        let mut buffer = Vec::new();
        write_report(&mut buffer, &report).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["seed"], 4);
        assert_eq!(value["trial_scores"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["attendees"], 12);
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn test_generated_sheets_read_back() {
        let shape = InstanceShape {
            sessions: 5,
            attendees: 9,
            overrides: 2,
            ..InstanceShape::default()
        };
        let input = generate(&shape, &mut StdRng::seed_from_u64(21));
        let layout = SheetLayout::default();

        let (mut ratings, mut sessions, mut overrides) = (Vec::new(), Vec::new(), Vec::new());
        write_input_sheets(&input, &layout, &mut ratings, &mut sessions, &mut overrides).unwrap();

        let read_ratings = parse_ratings(&csv_rows(&ratings), &layout.ratings, 5);
        assert_eq!(read_ratings.headers, input.ratings.headers);
        assert_eq!(read_ratings.rows.len(), 9);
        for (read, written) in read_ratings.rows.iter().zip(&input.ratings.rows) {
            assert_eq!(read.name, written.name);
            assert_eq!(read.ratings, written.ratings);
            assert_eq!(read.attributes[..2], written.attributes[..]);
        }

        let read_sessions = parse_sessions(&csv_rows(&sessions), &layout.sessions, 5).unwrap();
        assert_eq!(read_sessions, input.sessions);
        assert_eq!(parse_overrides(&csv_rows(&overrides), &layout.overrides), input.overrides);
    }
}

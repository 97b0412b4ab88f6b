//! Grid → record conversion.
//!
//! The first line of the grid names the fields; every following line becomes
//! one [`Record`]. Binding is by position only: cell `i` of a data line goes
//! to header name `i`, whatever the header text says. Reordering columns in
//! the source sheet therefore changes which value lands under which name.
//!
//! Cells are opaque text. Nothing is trimmed, coerced, or normalised.

use crate::error::CoreError;
use crate::types::{FieldNames, Grid, Orientation, Record, RecordBatch};

/// Build a [`RecordBatch`] from `grid`.
///
/// `orientation` only decides how the grid was fetched; by the time it gets
/// here a column-major grid already has one column per line, so both
/// orientations zip the same way.
///
/// Returns [`CoreError::EmptyData`] when the grid has no lines at all. A grid
/// holding only the header yields an empty batch; the caller decides what an
/// empty batch means.
pub fn to_records(grid: &Grid, orientation: Orientation) -> Result<RecordBatch, CoreError> {
    let mut lines = grid.lines().iter();
    let header = lines.next().ok_or(CoreError::EmptyData)?;
    let field_names = FieldNames(header.clone());

    let records: Vec<Record> = lines.map(|line| zip_line(&field_names, line)).collect();

    tracing::debug!(
        %orientation,
        fields = field_names.len(),
        records = records.len(),
        "grid converted to records"
    );

    Ok(RecordBatch {
        field_names,
        records,
    })
}

/// Parse a raw orientation token, then convert.
///
/// The token is checked before the grid is looked at, so a bad answer is a
/// configuration error even when the grid is empty.
pub fn to_records_from_token(grid: &Grid, token: &str) -> Result<RecordBatch, CoreError> {
    let orientation = Orientation::parse(token)?;
    to_records(grid, orientation)
}

fn zip_line(field_names: &FieldNames, line: &[String]) -> Record {
    let mut record = Record::default();
    // Extra cells beyond the header are dropped; missing cells stay absent.
    for (idx, name) in field_names.iter().enumerate() {
        record.assign(name, line.get(idx).map(String::as_str));
    }
    record
}

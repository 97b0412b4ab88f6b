//! Domain types for a sheetmail run.
//!
//! A run starts from an immutable [`Grid`] and an [`Orientation`], derives a
//! [`RecordBatch`] from it, and shares one [`RunConfig`] across every stage.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Timestamp-derived token shared by every artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    /// Capture the current time as milliseconds since the Unix epoch.
    ///
    /// Call once per process; every artifact of the run reuses the value.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis().to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed spreadsheet identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetId(pub String);

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SheetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SheetId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Whether each grid line is a record or a field spanning all records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Header row; one record per following row. Token `R`.
    Rows,
    /// Header column; one record per following column. Token `C`.
    Columns,
}

impl Orientation {
    /// Parse the raw operator answer. Only `R` and `C` are accepted.
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token.trim() {
            "R" => Ok(Orientation::Rows),
            "C" => Ok(Orientation::Columns),
            other => Err(CoreError::InvalidOrientation {
                token: other.to_string(),
            }),
        }
    }

    /// The Sheets API `majorDimension` value for this orientation.
    pub fn major_dimension(&self) -> &'static str {
        match self {
            Orientation::Rows => "ROWS",
            Orientation::Columns => "COLUMNS",
        }
    }
}

impl FromStr for Orientation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Orientation::parse(s)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Rows => write!(f, "rows"),
            Orientation::Columns => write!(f, "columns"),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Raw 2-D range of cell text, as fetched. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    lines: Vec<Vec<String>>,
}

impl Grid {
    pub fn from_lines(lines: Vec<Vec<String>>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[Vec<String>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<S: Into<String>> FromIterator<Vec<S>> for Grid {
    fn from_iter<I: IntoIterator<Item = Vec<S>>>(iter: I) -> Self {
        Grid::from_lines(
            iter.into_iter()
                .map(|line| line.into_iter().map(Into::into).collect())
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Ordered field names taken verbatim from the header line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames(pub Vec<String>);

impl FieldNames {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// One field-name → value mapping built from one data line.
///
/// Keys keep header order. A name that appears twice in the header keeps its
/// first position and the value of its last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, String>);

impl Record {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub(crate) fn assign(&mut self, name: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.0.insert(name.to_string(), v.to_string());
            }
            // An absent cell clears an earlier duplicate, same as assigning undefined.
            None => {
                self.0.shift_remove(name);
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Ordered records, one per non-header line of the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub field_names: FieldNames,
    pub records: Vec<Record>,
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Immutable per-run configuration, built once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub run_id: RunId,
    pub sheet_id: SheetId,
    /// A1-notation range, header line included.
    pub range: String,
    pub orientation: Orientation,
    pub settings: Settings,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

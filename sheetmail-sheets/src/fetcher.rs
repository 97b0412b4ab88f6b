//! Grid fetching.
//!
//! [`GoogleSheetsFetcher`] reads a range through the Sheets v4
//! `spreadsheets.values.get` endpoint, asking for the range row-major or
//! column-major according to the run's [`Orientation`]. [`StaticFetcher`]
//! serves a grid already in memory (local JSON files, tests).

use std::path::Path;

use serde::Deserialize;
use url::Url;

use sheetmail_core::{Grid, Orientation, RunConfig, SheetId};

use crate::auth::AccessToken;
use crate::error::{http_err, io_err, SheetsError};

/// Production API root.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// What to fetch: one range of one spreadsheet, in one orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub sheet_id: SheetId,
    pub range: String,
    pub orientation: Orientation,
}

impl FetchRequest {
    pub fn from_config(config: &RunConfig) -> Self {
        FetchRequest {
            sheet_id: config.sheet_id.clone(),
            range: config.range.clone(),
            orientation: config.orientation,
        }
    }
}

/// Source of the raw grid. Fetching is one-shot and completes before any
/// rendering starts.
pub trait SpreadsheetFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Grid, SheetsError>;
}

// ---------------------------------------------------------------------------
// Google Sheets
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Sheets v4 client authenticated with a bearer token.
pub struct GoogleSheetsFetcher {
    token: AccessToken,
    base: Url,
    agent: ureq::Agent,
}

impl GoogleSheetsFetcher {
    pub fn new(token: AccessToken) -> Result<Self, SheetsError> {
        Self::with_base_url(token, SHEETS_API_BASE)
    }

    /// Point the client at another API root (proxies, local test servers).
    pub fn with_base_url(token: AccessToken, base: &str) -> Result<Self, SheetsError> {
        Ok(GoogleSheetsFetcher {
            token,
            base: Url::parse(base)?,
            agent: ureq::Agent::new(),
        })
    }

    /// `<base>/spreadsheets/<id>/values/<range>?majorDimension=<ROWS|COLUMNS>`
    pub fn values_url(&self, request: &FetchRequest) -> Result<Url, SheetsError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend([
                "spreadsheets",
                request.sheet_id.0.as_str(),
                "values",
                request.range.as_str(),
            ]);
        url.query_pairs_mut()
            .append_pair("majorDimension", request.orientation.major_dimension());
        Ok(url)
    }
}

impl SpreadsheetFetcher for GoogleSheetsFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Grid, SheetsError> {
        let url = self.values_url(request)?;
        tracing::debug!(
            sheet = %request.sheet_id,
            range = %request.range,
            major_dimension = request.orientation.major_dimension(),
            "fetching range"
        );
        let response = self
            .agent
            .get(url.as_str())
            .set("Authorization", &format!("Bearer {}", self.token.secret()))
            .call()
            .map_err(http_err)?;
        let body: ValueRange = response
            .into_json()
            .map_err(|e| SheetsError::Transport(e.to_string()))?;
        let grid = grid_from_values(body.values);
        tracing::info!(lines = grid.len(), "range fetched");
        Ok(grid)
    }
}

// ---------------------------------------------------------------------------
// Static grids
// ---------------------------------------------------------------------------

/// Serves a fixed grid laid out as in the sheet, one line per row.
///
/// Like the API, a `Columns` request gets the grid column-major: line `j` of
/// the result is column `j` of the sheet.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    grid: Grid,
}

impl StaticFetcher {
    pub fn new(grid: Grid) -> Self {
        StaticFetcher { grid }
    }

    /// Read a JSON 2-D array of sheet rows (`[["name","email"],["Alice","a@x.com"]]`).
    /// Numbers and booleans are kept as their JSON text; `null` is empty.
    pub fn from_json_file(path: &Path) -> Result<Self, SheetsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let values: Vec<Vec<serde_json::Value>> =
            serde_json::from_str(&contents).map_err(|e| SheetsError::GridFile {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(StaticFetcher::new(grid_from_values(values)))
    }
}

impl SpreadsheetFetcher for StaticFetcher {
    fn fetch(&self, request: &FetchRequest) -> Result<Grid, SheetsError> {
        Ok(match request.orientation {
            Orientation::Rows => self.grid.clone(),
            Orientation::Columns => transpose(&self.grid),
        })
    }
}

/// Column-major view of a row-major grid. Short rows leave holes; holes
/// inside a column read as empty cells and trailing holes are dropped, the
/// way the API trims trailing empty cells.
fn transpose(grid: &Grid) -> Grid {
    let width = grid.lines().iter().map(Vec::len).max().unwrap_or(0);
    (0..width)
        .map(|col| {
            let mut cells: Vec<Option<&str>> = grid
                .lines()
                .iter()
                .map(|row| row.get(col).map(String::as_str))
                .collect();
            while matches!(cells.last(), Some(None)) {
                cells.pop();
            }
            cells
                .into_iter()
                .map(|cell| cell.unwrap_or_default())
                .collect::<Vec<&str>>()
        })
        .collect()
}

fn grid_from_values(values: Vec<Vec<serde_json::Value>>) -> Grid {
    values
        .into_iter()
        .map(|line| line.into_iter().map(cell_text).collect::<Vec<String>>())
        .collect()
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Error types for sheetmail-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from grid conversion and settings loading.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The orientation answer was neither `R` nor `C`.
    #[error("incorrect header entry '{token}': expected 'R' (header row) or 'C' (header column)")]
    InvalidOrientation { token: String },

    /// The fetched range held no lines, or only the header line.
    #[error("No data found.")]
    EmptyData,

    /// Underlying I/O failure while reading a settings file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings YAML could not be parsed, with file path and line context.
    #[error("failed to parse settings at {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested settings file does not exist.
    #[error("settings file not found at {path}")]
    SettingsNotFound { path: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}

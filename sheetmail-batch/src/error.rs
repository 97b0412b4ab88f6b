//! Error types for sheetmail-batch.

use std::path::PathBuf;

use thiserror::Error;

use sheetmail_core::CoreError;
use sheetmail_renderer::RenderError;
use sheetmail_sheets::SheetsError;

/// Failure to persist one artifact. Recovered per artifact; never aborts a run.
#[derive(Debug, Error)]
pub enum PersistError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The identifier would escape the output directory.
    #[error("invalid artifact identifier '{identifier}'")]
    InvalidIdentifier { identifier: String },
}

/// Errors that abort a run before any partial output is produced.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Bad operator input or settings.
    #[error("configuration error: {0}")]
    Configuration(#[source] CoreError),

    /// The range held no data lines.
    #[error("No data found.")]
    EmptyData,

    /// Credentials could not be obtained.
    #[error("authorization failed: {0}")]
    Authorization(#[source] SheetsError),

    /// The grid could not be fetched.
    #[error("fetch failed: {0}")]
    Fetch(#[source] SheetsError),

    /// The template file could not be read.
    #[error("{0}")]
    TemplateLoad(#[source] RenderError),

    /// The template could not be compiled.
    #[error("invalid template: {0}")]
    Template(#[source] RenderError),
}

impl From<CoreError> for BatchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::EmptyData => BatchError::EmptyData,
            other => BatchError::Configuration(other),
        }
    }
}

impl From<RenderError> for BatchError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::TemplateLoad { .. } => BatchError::TemplateLoad(err),
            other => BatchError::Template(other),
        }
    }
}

/// Convenience constructor for [`PersistError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.into(),
        source,
    }
}

//! Error types for sheetmail-sheets.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from credential handling and grid fetching.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// The OAuth client secret file could not be read.
    #[error("Error loading client secret file {path}: {source}")]
    CredentialsLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The client secret file is not valid JSON or lacks a client section.
    #[error("invalid client secret file {path}: {message}")]
    CredentialsInvalid { path: PathBuf, message: String },

    /// No access token is stored yet; the authorization bootstrap must run.
    #[error("no stored token at {path}; authorization required")]
    TokenMissing { path: PathBuf },

    /// I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (token store, API payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A local grid file did not hold a 2-D JSON array.
    #[error("invalid grid file {path}: {source}")]
    GridFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The remote API answered with a non-success status.
    #[error("The API returned an error: {status} {message}")]
    Api { status: u16, message: String },

    /// Network-level failure (DNS, connect, TLS, truncated body).
    #[error("transport error: {0}")]
    Transport(String),

    /// A request URL could not be built.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SheetsError {
    SheetsError::Io {
        path: path.into(),
        source,
    }
}

/// Map a `ureq` failure onto [`SheetsError`], keeping the response body of
/// status errors for the operator.
pub(crate) fn http_err(err: ureq::Error) -> SheetsError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_string()
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            SheetsError::Api {
                status,
                message: message.trim().to_string(),
            }
        }
        ureq::Error::Transport(t) => SheetsError::Transport(t.to_string()),
    }
}

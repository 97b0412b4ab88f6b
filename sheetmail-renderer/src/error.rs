//! Error types for sheetmail-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from template loading, compilation and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template file could not be read. Fatal to the run.
    #[error("Template error: cannot read {path}: {source}")]
    TemplateLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed mustache markup (unclosed tag, mismatched section, empty name).
    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    /// Mustache feature this renderer does not provide (partials, delimiter changes).
    #[error("unsupported template feature at byte {offset}: {feature}")]
    Unsupported { offset: usize, feature: String },

    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rendering one record failed; other records are unaffected.
    #[error("failed to render {identifier}: {source}")]
    Record {
        position: usize,
        identifier: String,
        #[source]
        source: Box<RenderError>,
    },
}

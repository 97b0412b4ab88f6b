//! Template loading.

use std::path::Path;

use crate::error::RenderError;

/// Where template text comes from. A load failure is fatal to the run.
pub trait TemplateSource {
    fn load(&self, path: &Path) -> Result<String, RenderError>;
}

/// Reads UTF-8 templates from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTemplateSource;

impl TemplateSource for FsTemplateSource {
    fn load(&self, path: &Path) -> Result<String, RenderError> {
        let text = std::fs::read_to_string(path).map_err(|e| RenderError::TemplateLoad {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::info!("Using template: {}", path.display());
        Ok(text)
    }
}

//! Artifact persistence.
//!
//! ## `atomic_write` protocol
//!
//! 1. Create the output directory if needed.
//! 2. Write the content to `<path>.sheetmail.tmp`.
//! 3. Rename to the final path (atomic on POSIX).
//! 4. On rename failure, remove the `.tmp` and report.
//!
//! Content is written byte-for-byte; no line-ending normalisation.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, PersistError};

/// Destination for rendered artifacts.
pub trait ArtifactWriter {
    /// Store `content` under `identifier`; returns where it landed.
    fn persist(&self, identifier: &str, content: &str) -> Result<PathBuf, PersistError>;
}

/// Writes each artifact as a file in one output directory.
#[derive(Debug, Clone)]
pub struct FsArtifactWriter {
    output_dir: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        FsArtifactWriter {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn target(&self, identifier: &str) -> Result<PathBuf, PersistError> {
        let plain = !identifier.is_empty()
            && identifier != "."
            && identifier != ".."
            && !identifier.contains(['/', '\\']);
        if !plain {
            return Err(PersistError::InvalidIdentifier {
                identifier: identifier.to_string(),
            });
        }
        Ok(self.output_dir.join(identifier))
    }
}

impl ArtifactWriter for FsArtifactWriter {
    fn persist(&self, identifier: &str, content: &str) -> Result<PathBuf, PersistError> {
        let path = self.target(identifier)?;
        atomic_write(&path, content)?;
        Ok(path)
    }
}

/// Hex SHA-256 of `content`.
pub fn content_digest(content: &str) -> String {
    let mut h = Sha256::new();
    h.update(content.as_bytes());
    hex::encode(h.finalize())
}

pub(crate) fn atomic_write(path: &Path, content: &str) -> Result<(), PersistError> {
    let tmp = PathBuf::from(format!("{}.sheetmail.tmp", path.display()));
    atomic_write_with_tmp(path, content, &tmp)
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Per-artifact outcomes and the run summary.
//!
//! The summary is also persisted next to the artifacts as
//! `<prefix>_<run_id>.manifest.json`.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sheetmail_core::RunId;

/// Which step an artifact failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Render,
    Persist,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Render => write!(f, "render"),
            FailureStage::Persist => write!(f, "persist"),
        }
    }
}

/// Result of producing one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Written { path: PathBuf, sha256: String },
    Failed { stage: FailureStage, cause: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactOutcome {
    /// 1-based position in the batch.
    pub position: usize,
    pub identifier: String,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

impl ArtifactOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self.status, ArtifactStatus::Written { .. })
    }
}

/// Aggregate result of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records in the batch, whether or not they were attempted.
    pub total: usize,
    pub written: usize,
    pub failed: usize,
    /// Set when the run stopped early on request.
    pub cancelled: bool,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl RunSummary {
    pub fn new(
        run_id: RunId,
        started_at: DateTime<Utc>,
        total: usize,
        cancelled: bool,
        outcomes: Vec<ArtifactOutcome>,
    ) -> Self {
        let written = outcomes.iter().filter(|o| o.is_written()).count();
        RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            total,
            written,
            failed: outcomes.len() - written,
            cancelled,
            outcomes,
        }
    }

    /// Every record was attempted and every artifact written.
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.written == self.total
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactOutcome> {
        self.outcomes.iter().filter(|o| !o.is_written())
    }
}

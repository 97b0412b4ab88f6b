//! # sheetmail-batch
//!
//! Run orchestration and artifact persistence.
//!
//! Call [`run`] to load the template, fetch the grid and write one artifact
//! per record, or [`run_batch`] when the grid and template are already in
//! hand. Both return a [`RunSummary`].

pub mod error;
pub mod pipeline;
pub mod summary;
pub mod writer;

pub use error::{BatchError, PersistError};
pub use pipeline::{run, run_batch, CancelFlag, Collaborators};
pub use summary::{ArtifactOutcome, ArtifactStatus, FailureStage, RunSummary};
pub use writer::{content_digest, ArtifactWriter, FsArtifactWriter};

//! Run pipeline: template → grid → records → artifacts.
//!
//! [`run`] is the full flow used by the CLI. [`run_batch`] starts from an
//! already fetched grid and a loaded template.
//!
//! Fatal errors (bad orientation, no data, fetch, template) surface before
//! the first artifact is written. Per-artifact render and persist failures
//! are recorded in the [`RunSummary`] and the run moves on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use sheetmail_core::{to_records, Grid, RunConfig};
use sheetmail_renderer::{
    ArtifactNamer, BatchRenderer, RenderError, RenderedArtifact, TemplateEngine, TemplateSource,
};
use sheetmail_sheets::{FetchRequest, SheetsError, SpreadsheetFetcher};

use crate::error::{BatchError, PersistError};
use crate::summary::{ArtifactOutcome, ArtifactStatus, FailureStage, RunSummary};
use crate::writer::{content_digest, ArtifactWriter};

/// Cooperative stop signal. Once set, no further artifacts are scheduled;
/// the one in flight completes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// External collaborators of a run.
pub struct Collaborators<'a> {
    pub templates: &'a dyn TemplateSource,
    pub fetcher: &'a dyn SpreadsheetFetcher,
    pub writer: &'a dyn ArtifactWriter,
}

/// Load the template, fetch the grid, then render and persist every record.
///
/// The template is loaded first so a missing file fails the run before the
/// network is touched.
pub fn run(
    config: &RunConfig,
    collaborators: &Collaborators<'_>,
    cancel: &CancelFlag,
) -> Result<RunSummary, BatchError> {
    let template = collaborators
        .templates
        .load(&config.settings.template_path)?;
    let grid = fetch_with_retry(
        collaborators.fetcher,
        &FetchRequest::from_config(config),
        config.settings.fetch_retries,
    )?;
    run_batch(config, &template, &grid, collaborators.writer, cancel)
}

/// Convert `grid`, render every record through `template`, persist each
/// artifact through `writer`.
pub fn run_batch(
    config: &RunConfig,
    template: &str,
    grid: &Grid,
    writer: &dyn ArtifactWriter,
    cancel: &CancelFlag,
) -> Result<RunSummary, BatchError> {
    let started_at = Utc::now();
    let settings = &config.settings;

    let batch = to_records(grid, config.orientation)?;
    if batch.is_empty() {
        return Err(BatchError::EmptyData);
    }
    let engine = TemplateEngine::compile(template, settings.escape_html)?;
    let namer = ArtifactNamer::new(
        settings.file_prefix.as_str(),
        config.run_id.clone(),
        settings.file_extension.as_str(),
    );

    tracing::info!(run_id = %config.run_id, records = batch.len(), "Generating HTML...");

    let mut outcomes = Vec::with_capacity(batch.len());
    let mut cancelled = false;
    for rendered in BatchRenderer::new(&engine, &namer).render(&batch) {
        if cancel.is_cancelled() {
            tracing::warn!(done = outcomes.len(), "run cancelled, remaining artifacts skipped");
            cancelled = true;
            break;
        }
        let outcome = match rendered {
            Ok(artifact) => persist_with_retry(writer, artifact, settings.persist_retries),
            Err(err) => render_failure(err),
        };
        outcomes.push(outcome);
    }

    let summary = RunSummary::new(config.run_id.clone(), started_at, batch.len(), cancelled, outcomes);
    write_manifest(writer, &namer, &summary);

    tracing::info!(
        written = summary.written,
        failed = summary.failed,
        "run finished"
    );
    Ok(summary)
}

fn persist_with_retry(
    writer: &dyn ArtifactWriter,
    artifact: RenderedArtifact,
    retries: u32,
) -> ArtifactOutcome {
    let mut attempt = 0;
    let result: Result<_, PersistError> = loop {
        match writer.persist(&artifact.identifier, &artifact.content) {
            Ok(path) => break Ok(path),
            Err(err) if attempt < retries => {
                attempt += 1;
                tracing::warn!(identifier = %artifact.identifier, attempt, error = %err, "write failed, retrying");
            }
            Err(err) => break Err(err),
        }
    };

    let status = match result {
        Ok(path) => {
            tracing::info!("Saved file: {}", path.display());
            ArtifactStatus::Written {
                path,
                sha256: content_digest(&artifact.content),
            }
        }
        Err(err) => {
            tracing::error!(identifier = %artifact.identifier, error = %err, "write failed");
            ArtifactStatus::Failed {
                stage: FailureStage::Persist,
                cause: err.to_string(),
            }
        }
    };
    ArtifactOutcome {
        position: artifact.position,
        identifier: artifact.identifier,
        status,
    }
}

fn render_failure(err: RenderError) -> ArtifactOutcome {
    tracing::error!(error = %err, "render failed");
    match err {
        RenderError::Record {
            position,
            identifier,
            source,
        } => ArtifactOutcome {
            position,
            identifier,
            status: ArtifactStatus::Failed {
                stage: FailureStage::Render,
                cause: source.to_string(),
            },
        },
        // The batch renderer only yields `Record` errors.
        other => ArtifactOutcome {
            position: 0,
            identifier: String::new(),
            status: ArtifactStatus::Failed {
                stage: FailureStage::Render,
                cause: other.to_string(),
            },
        },
    }
}

fn write_manifest(writer: &dyn ArtifactWriter, namer: &ArtifactNamer, summary: &RunSummary) {
    let identifier = format!("{}.manifest.json", namer.run_prefix());
    let json = match serde_json::to_string_pretty(summary) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "could not serialize run manifest");
            return;
        }
    };
    match writer.persist(&identifier, &json) {
        Ok(path) => tracing::debug!(path = %path.display(), "manifest written"),
        Err(err) => tracing::warn!(error = %err, "could not write run manifest"),
    }
}

fn fetch_with_retry(
    fetcher: &dyn SpreadsheetFetcher,
    request: &FetchRequest,
    retries: u32,
) -> Result<Grid, BatchError> {
    let mut attempt = 0;
    loop {
        match fetcher.fetch(request) {
            Ok(grid) => return Ok(grid),
            Err(err) if attempt < retries && is_transient(&err) => {
                attempt += 1;
                tracing::warn!(attempt, error = %err, "fetch failed, retrying");
            }
            Err(err) => return Err(BatchError::Fetch(err)),
        }
    }
}

fn is_transient(err: &SheetsError) -> bool {
    match err {
        SheetsError::Transport(_) => true,
        SheetsError::Api { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

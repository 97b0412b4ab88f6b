//! Tera rendering engine: [`TemplateEngine`], [`ArtifactNamer`] and
//! [`BatchRenderer`].
//!
//! # Naming
//!
//! Artifact `i` (1-based, header excluded) of run `<run_id>` is named
//! `<prefix>_<run_id>_<i>.<ext>`, e.g. `email_1700000000000_3.html`. The run
//! id is captured once per process, so one run never collides with itself and
//! all of its files sort together.

use tera::Tera;

use sheetmail_core::{Record, RecordBatch, RunId};

use crate::context::RecordContext;
use crate::error::RenderError;
use crate::mustache::{self, CompiledTemplate};

/// Name the compiled template is registered under. The `.html` suffix is
/// what switches Tera autoescaping on.
const TEMPLATE_NAME: &str = "record.html";

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// A mustache template compiled once and rendered per record.
pub struct TemplateEngine {
    tera: Tera,
    compiled: CompiledTemplate,
}

impl TemplateEngine {
    /// Compile `template`. With `escape_html`, `{{name}}` output is
    /// HTML-escaped; `{{{name}}}` never is.
    pub fn compile(template: &str, escape_html: bool) -> Result<Self, RenderError> {
        let compiled = mustache::compile(template)?;

        let mut tera = Tera::default();
        if escape_html {
            tera.autoescape_on(vec![".html"]);
        } else {
            tera.autoescape_on(vec![]);
        }
        tera.add_raw_template(TEMPLATE_NAME, compiled.source())?;

        tracing::debug!(fields = compiled.slots().len(), "template compiled");
        Ok(TemplateEngine { tera, compiled })
    }

    /// Field names the template refers to, in first-use order.
    pub fn fields(&self) -> &[String] {
        self.compiled.slots()
    }

    /// Render one record. Missing fields render as the empty string.
    pub fn render_record(&self, record: &Record) -> Result<String, RenderError> {
        let ctx = RecordContext::from_record(self.compiled.slots(), record).to_tera_context()?;
        Ok(self.tera.render(TEMPLATE_NAME, &ctx)?)
    }
}

// ---------------------------------------------------------------------------
// ArtifactNamer
// ---------------------------------------------------------------------------

/// Builds collision-free artifact identifiers for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNamer {
    prefix: String,
    run_id: RunId,
    extension: String,
}

impl ArtifactNamer {
    pub fn new(prefix: impl Into<String>, run_id: RunId, extension: impl Into<String>) -> Self {
        ArtifactNamer {
            prefix: prefix.into(),
            run_id,
            extension: extension.into(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Identifier for 1-based `position`.
    pub fn name(&self, position: usize) -> String {
        let stem = format!("{}_{}_{}", self.prefix, self.run_id, position);
        if self.extension.is_empty() {
            stem
        } else {
            format!("{stem}.{}", self.extension)
        }
    }

    /// Shared prefix of every identifier in the run, e.g. `email_1700000000000`.
    pub fn run_prefix(&self) -> String {
        format!("{}_{}", self.prefix, self.run_id)
    }
}

// ---------------------------------------------------------------------------
// BatchRenderer
// ---------------------------------------------------------------------------

/// One rendered output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// 1-based position of the record in the batch.
    pub position: usize,
    pub identifier: String,
    pub content: String,
}

/// Renders every record of a batch through one template.
pub struct BatchRenderer<'a> {
    engine: &'a TemplateEngine,
    namer: &'a ArtifactNamer,
}

impl<'a> BatchRenderer<'a> {
    pub fn new(engine: &'a TemplateEngine, namer: &'a ArtifactNamer) -> Self {
        BatchRenderer { engine, namer }
    }

    /// Lazily render `batch`, one artifact per record, in batch order.
    ///
    /// A record that fails to render yields [`RenderError::Record`] and the
    /// iterator moves on to the next one.
    pub fn render<'b>(&'b self, batch: &'b RecordBatch) -> Artifacts<'b> {
        Artifacts {
            engine: self.engine,
            namer: self.namer,
            records: batch.iter().enumerate(),
        }
    }
}

/// Iterator returned by [`BatchRenderer::render`].
pub struct Artifacts<'b> {
    engine: &'b TemplateEngine,
    namer: &'b ArtifactNamer,
    records: std::iter::Enumerate<std::slice::Iter<'b, Record>>,
}

impl Iterator for Artifacts<'_> {
    type Item = Result<RenderedArtifact, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, record) = self.records.next()?;
        let position = idx + 1;
        let identifier = self.namer.name(position);
        Some(match self.engine.render_record(record) {
            Ok(content) => Ok(RenderedArtifact {
                position,
                identifier,
                content,
            }),
            Err(e) => Err(RenderError::Record {
                position,
                identifier,
                source: Box::new(e),
            }),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! # sheetmail-renderer
//!
//! Renders spreadsheet records through a logic-less mustache template, using
//! Tera as the rendering engine.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sheetmail_core::{RecordBatch, RunId};
//! use sheetmail_renderer::{ArtifactNamer, BatchRenderer, TemplateEngine};
//!
//! fn render_all(batch: &RecordBatch) {
//!     let Ok(engine) = TemplateEngine::compile("<p>Hi {{name}}</p>", true) else { return };
//!     let namer = ArtifactNamer::new("email", RunId::now(), "html");
//!     for artifact in BatchRenderer::new(&engine, &namer).render(batch).flatten() {
//!         println!("{}: {} bytes", artifact.identifier, artifact.content.len());
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod mustache;
pub mod source;

pub use context::RecordContext;
pub use engine::{ArtifactNamer, Artifacts, BatchRenderer, RenderedArtifact, TemplateEngine};
pub use error::RenderError;
pub use source::{FsTemplateSource, TemplateSource};

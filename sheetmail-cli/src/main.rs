//! sheetmail: render one file per spreadsheet record through a template.
//!
//! # Usage
//!
//! ```text
//! sheetmail                                   # prompts for everything
//! sheetmail --sheet-id <id> --range 'Sheet1!A1:D20' --orientation R
//! sheetmail --grid-file grid.json --orientation C --json
//! ```
//!
//! On first use, without a stored token, the command walks through the
//! OAuth consent flow, stores the token and exits.

mod bootstrap;
mod interrupt;
mod prompts;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use sheetmail_batch::{BatchError, CancelFlag, Collaborators, FsArtifactWriter};
use sheetmail_core::{RunConfig, RunId, Settings};
use sheetmail_renderer::FsTemplateSource;
use sheetmail_sheets::{GoogleSheetsFetcher, OAuthCredentialProvider, SpreadsheetFetcher, StaticFetcher};

use bootstrap::Authorization;
use prompts::{Preset, StdinPrompts};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sheetmail",
    version,
    about = "Render one document per spreadsheet record from a mustache template",
    long_about = None,
)]
struct Cli {
    /// Spreadsheet ID (skips the prompt).
    #[arg(long)]
    sheet_id: Option<String>,

    /// A1-notation range including the header line (skips the prompt).
    #[arg(long)]
    range: Option<String>,

    /// `R` when the first row holds field names, `C` when the first column does.
    #[arg(long)]
    orientation: Option<String>,

    /// Settings file to use instead of the default lookup.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Template file (overrides settings).
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output directory (overrides settings).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Read the grid from a JSON 2-D array of sheet rows instead of the Sheets API.
    #[arg(long)]
    grid_file: Option<PathBuf>,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn run(self) -> Result<()> {
        let mut settings = Settings::load(self.config.as_deref()).map_err(BatchError::from)?;
        if let Some(template) = self.template {
            settings.template_path = template;
        }
        if let Some(output_dir) = self.output_dir {
            settings.output_dir = output_dir;
        }

        let mut input = StdinPrompts::new();

        let fetcher: Box<dyn SpreadsheetFetcher> = match self.grid_file {
            Some(path) => Box::new(StaticFetcher::from_json_file(&path).map_err(BatchError::Fetch)?),
            None => {
                let provider = OAuthCredentialProvider::from_files(
                    &settings.credentials_path,
                    settings.token_path.clone(),
                )
                .map_err(BatchError::Authorization)?;
                match bootstrap::authorize(&provider, &mut input)? {
                    Authorization::Ready(token) => {
                        Box::new(GoogleSheetsFetcher::new(token).map_err(BatchError::Fetch)?)
                    }
                    Authorization::Bootstrapped => return Ok(()),
                }
            }
        };

        let answers = prompts::collect(
            &mut input,
            Preset {
                sheet_id: self.sheet_id,
                range: self.range,
                orientation: self.orientation,
            },
        )?;

        let config = RunConfig {
            run_id: RunId::now(),
            sheet_id: answers.sheet_id,
            range: answers.range,
            orientation: answers.orientation,
            settings,
        };
        tracing::debug!(run_id = %config.run_id, orientation = %config.orientation, "starting run");

        let writer = FsArtifactWriter::new(&config.settings.output_dir);
        let collaborators = Collaborators {
            templates: &FsTemplateSource,
            fetcher: fetcher.as_ref(),
            writer: &writer,
        };
        let cancel = CancelFlag::new();
        if let Err(err) = interrupt::cancel_on_ctrl_c(cancel.clone()) {
            tracing::warn!(error = %err, "ctrl-c will abort without a manifest");
        }
        let summary = sheetmail_batch::run(&config, &collaborators, &cancel)?;

        if self.json {
            report::print_json(&summary)?;
        } else {
            report::print_table(&summary);
        }
        Ok(())
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    Cli::parse().run()
}

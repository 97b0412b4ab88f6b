//! Run summary output: a table for humans, JSON for scripts.

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use sheetmail_batch::{ArtifactOutcome, ArtifactStatus, RunSummary};

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
}

impl From<&ArtifactOutcome> for OutcomeRow {
    fn from(outcome: &ArtifactOutcome) -> Self {
        let (status, detail) = match &outcome.status {
            ArtifactStatus::Written { sha256, .. } => (
                "WRITTEN".green().bold().to_string(),
                format!("sha256 {}", short_digest(sha256)),
            ),
            ArtifactStatus::Failed { stage, cause } => (
                "FAILED".red().bold().to_string(),
                format!("{stage}: {cause}"),
            ),
        };
        OutcomeRow {
            position: outcome.position,
            file: outcome.identifier.clone(),
            status,
            detail,
        }
    }
}

fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}

pub fn print_table(summary: &RunSummary) {
    println!("Run {} | {} records", summary.run_id, summary.total);
    if !summary.outcomes.is_empty() {
        let rows: Vec<OutcomeRow> = summary.outcomes.iter().map(OutcomeRow::from).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }

    let failed = if summary.failed > 0 {
        format!("{} failed", summary.failed).red().to_string()
    } else {
        format!("{} failed", summary.failed)
    };
    let written = format!("{} written", summary.written).green();
    println!("{written}, {failed}");

    if summary.cancelled {
        let skipped = summary.total - summary.outcomes.len();
        println!("{}", format!("Cancelled: {skipped} records not attempted.").yellow());
    }
}

pub fn print_json(summary: &RunSummary) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(summary).context("failed to serialize run summary")?
    );
    Ok(())
}

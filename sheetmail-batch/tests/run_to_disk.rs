use std::fs;
use std::path::Path;

use sheetmail_batch::{run, ArtifactStatus, BatchError, CancelFlag, Collaborators, FsArtifactWriter, RunSummary};
use sheetmail_core::{Grid, Orientation, RunConfig, RunId, Settings, SheetId};
use sheetmail_renderer::FsTemplateSource;
use sheetmail_sheets::StaticFetcher;
use tempfile::TempDir;

fn config(root: &Path, orientation: Orientation) -> RunConfig {
    RunConfig {
        run_id: RunId::from("1700000000000"),
        sheet_id: SheetId::from("sheet-1"),
        range: "A1:C3".to_string(),
        orientation,
        settings: Settings {
            template_path: root.join("template").join("template.html"),
            output_dir: root.join("output"),
            ..Settings::default()
        },
    }
}

fn write_template(root: &Path, body: &str) {
    let dir = root.join("template");
    fs::create_dir_all(&dir).expect("template dir");
    fs::write(dir.join("template.html"), body).expect("template file");
}

fn execute(cfg: &RunConfig, grid: Grid) -> Result<RunSummary, BatchError> {
    let fetcher = StaticFetcher::new(grid);
    let writer = FsArtifactWriter::new(&cfg.settings.output_dir);
    let collaborators = Collaborators {
        templates: &FsTemplateSource,
        fetcher: &fetcher,
        writer: &writer,
    };
    run(cfg, &collaborators, &CancelFlag::new())
}

#[test]
fn one_file_per_record_in_output_dir() {
    let root = TempDir::new().expect("root");
    write_template(root.path(), "<p>Hi {{name}} <{{email}}></p>");
    let cfg = config(root.path(), Orientation::Rows);
    let grid: Grid = vec![
        vec!["name", "email"],
        vec!["Alice", "a@x.com"],
        vec!["Bob", "b@x.com"],
    ]
    .into_iter()
    .collect();

    let summary = execute(&cfg, grid).expect("run");
    assert!(summary.is_clean(), "{summary:?}");

    let out = root.path().join("output");
    assert_eq!(
        fs::read_to_string(out.join("email_1700000000000_1.html")).expect("first"),
        "<p>Hi Alice <a@x.com></p>"
    );
    assert_eq!(
        fs::read_to_string(out.join("email_1700000000000_2.html")).expect("second"),
        "<p>Hi Bob <b@x.com></p>"
    );
}

#[test]
fn markup_in_cells_is_escaped_but_template_markup_is_not() {
    let root = TempDir::new().expect("root");
    write_template(root.path(), "<b>{{note}}</b>|{{{note}}}");
    let cfg = config(root.path(), Orientation::Rows);
    let grid: Grid = vec![vec!["note"], vec!["<i>R&D</i>"]].into_iter().collect();

    execute(&cfg, grid).expect("run");

    let out = root.path().join("output").join("email_1700000000000_1.html");
    assert_eq!(
        fs::read_to_string(out).expect("artifact"),
        "<b>&lt;i&gt;R&amp;D&lt;&#x2F;i&gt;</b>|<i>R&D</i>"
    );
}

#[test]
fn manifest_lists_every_artifact() {
    let root = TempDir::new().expect("root");
    write_template(root.path(), "{{name}}");
    let cfg = config(root.path(), Orientation::Rows);
    let grid: Grid = vec![vec!["name"], vec!["Alice"], vec!["Bob"]].into_iter().collect();

    execute(&cfg, grid).expect("run");

    let manifest = root
        .path()
        .join("output")
        .join("email_1700000000000.manifest.json");
    let parsed: RunSummary =
        serde_json::from_str(&fs::read_to_string(manifest).expect("manifest")).expect("json");
    assert_eq!(parsed.total, 2);
    assert_eq!(parsed.written, 2);
    let names: Vec<_> = parsed.outcomes.iter().map(|o| o.identifier.as_str()).collect();
    assert_eq!(names, vec!["email_1700000000000_1.html", "email_1700000000000_2.html"]);
    match &parsed.outcomes[1].status {
        ArtifactStatus::Written { sha256, .. } => {
            assert_eq!(sha256, &sheetmail_batch::content_digest("Bob"))
        }
        other => panic!("expected written, got {other:?}"),
    }
}

#[test]
fn column_major_grid_reads_header_column() {
    let root = TempDir::new().expect("root");
    write_template(root.path(), "{{name}}={{email}}");
    let cfg = config(root.path(), Orientation::Columns);
    // Sheet layout with the field names down column A.
    let grid: Grid = vec![
        vec!["name", "Alice", "Bob"],
        vec!["email", "a@x.com", "b@x.com"],
    ]
    .into_iter()
    .collect();

    let summary = execute(&cfg, grid).expect("run");
    assert_eq!(summary.written, 2);
    let out = root.path().join("output");
    assert_eq!(
        fs::read_to_string(out.join("email_1700000000000_2.html")).expect("second"),
        "Bob=b@x.com"
    );
}

#[test]
fn missing_template_fails_before_output() {
    let root = TempDir::new().expect("root");
    let cfg = config(root.path(), Orientation::Rows);
    let grid: Grid = vec![vec!["name"], vec!["Alice"]].into_iter().collect();

    let err = execute(&cfg, grid).expect_err("no template");
    assert!(matches!(err, BatchError::TemplateLoad(_)), "got: {err}");
    assert!(!root.path().join("output").exists());
}

#[test]
fn empty_range_reports_no_data() {
    let root = TempDir::new().expect("root");
    write_template(root.path(), "{{name}}");
    let cfg = config(root.path(), Orientation::Rows);

    let err = execute(&cfg, Grid::default()).expect_err("empty");
    assert_eq!(err.to_string(), "No data found.");
    assert!(!root.path().join("output").exists());
}

#[test]
fn second_run_never_overwrites_first() {
    let root = TempDir::new().expect("root");
    write_template(root.path(), "{{name}}");
    let grid: Grid = vec![vec!["name"], vec!["Alice"]].into_iter().collect();

    let first = config(root.path(), Orientation::Rows);
    let mut second = first.clone();
    second.run_id = RunId::from("1700000000001");

    execute(&first, grid.clone()).expect("first run");
    execute(&second, grid).expect("second run");

    let out = root.path().join("output");
    assert!(out.join("email_1700000000000_1.html").exists());
    assert!(out.join("email_1700000000001_1.html").exists());
}

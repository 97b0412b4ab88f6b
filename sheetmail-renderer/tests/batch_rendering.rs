use std::collections::HashSet;

use rstest::rstest;
use sheetmail_core::{to_records, Grid, Orientation, RecordBatch, RunId};
use sheetmail_renderer::{ArtifactNamer, BatchRenderer, RenderError, RenderedArtifact, TemplateEngine};

fn batch(lines: &[&[&str]]) -> RecordBatch {
    let grid: Grid = lines.iter().map(|l| l.to_vec()).collect();
    to_records(&grid, Orientation::Rows).expect("records")
}

fn render(template: &str, batch: &RecordBatch, run_id: &str) -> Vec<RenderedArtifact> {
    let engine = TemplateEngine::compile(template, true).expect("compile");
    let namer = ArtifactNamer::new("email", RunId::from(run_id), "html");
    BatchRenderer::new(&engine, &namer)
        .render(batch)
        .collect::<Result<Vec<_>, RenderError>>()
        .expect("render")
}

fn people() -> RecordBatch {
    batch(&[
        &["name", "email"],
        &["Alice", "a@x.com"],
        &["Bob", "b@x.com"],
    ])
}

#[test]
fn greeting_end_to_end() {
    let out = render("Hi {{name}} <{{email}}>", &people(), "1700000000000");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].content, "Hi Alice <a@x.com>");
    assert_eq!(out[1].content, "Hi Bob <b@x.com>");
    assert_eq!(out[0].identifier, "email_1700000000000_1.html");
    assert_eq!(out[1].identifier, "email_1700000000000_2.html");
}

#[test]
fn missing_cells_render_empty() {
    let b = batch(&[&["A", "B", "C"], &["1"]]);
    let out = render("{{A}}-{{B}}-{{C}}", &b, "1");
    assert_eq!(out[0].content, "1--");
}

#[test]
fn unknown_keys_render_empty() {
    let out = render("[{{nickname}}]", &people(), "1");
    assert!(out.iter().all(|a| a.content == "[]"));
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(120)]
fn identifiers_are_unique_and_ordered(#[case] n: usize) {
    let mut lines: Vec<Vec<String>> = vec![vec!["n".to_string()]];
    lines.extend((1..=n).map(|i| vec![i.to_string()]));
    let grid = Grid::from_lines(lines);
    let b = to_records(&grid, Orientation::Rows).unwrap();

    let out = render("{{n}}", &b, "42");
    let ids: HashSet<_> = out.iter().map(|a| a.identifier.clone()).collect();
    assert_eq!(ids.len(), n);
    for (i, artifact) in out.iter().enumerate() {
        assert_eq!(artifact.position, i + 1);
        assert_eq!(artifact.identifier, format!("email_42_{}.html", i + 1));
        assert_eq!(artifact.content, (i + 1).to_string());
    }
}

#[test]
fn different_run_ids_keep_identical_content() {
    let first = render("<p>{{name}}</p>", &people(), "1000");
    let second = render("<p>{{name}}</p>", &people(), "2000");
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.content, b.content);
        assert_ne!(a.identifier, b.identifier);
    }
}

#[test]
fn html_in_cells_is_escaped() {
    let b = batch(&[&["name"], &["<script>alert(1)</script>"]]);
    let out = render("<p>{{name}}</p>", &b, "1");
    assert!(!out[0].content.contains("<script>"), "got: {}", out[0].content);
    assert!(out[0].content.starts_with("<p>&lt;script&gt;"));
}

#[test]
fn header_only_batch_renders_nothing() {
    let b = batch(&[&["name"]]);
    assert!(render("{{name}}", &b, "1").is_empty());
}

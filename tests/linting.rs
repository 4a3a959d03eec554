use stanza::build::{
    lint::{Report, Severity},
    ContentBuilder,
};
use std::path::{Path, PathBuf};

mod common;

fn lint(root: PathBuf) -> Report {
    let builder = ContentBuilder::load(root).expect("failed to load content");
    let (_, report) = builder.lint().expect("failed to lint content");

    report
}

fn count(report: &Report, check: &str, severity: Severity) -> usize {
    report
        .by_check(check)
        .filter(|diagnostic| diagnostic.severity == severity)
        .count()
}

#[test]
fn it_reports_nothing_for_clean_content() {
    let report = lint(common::test_dir());

    assert!(report.diagnostics.is_empty(), "{:#?}", report.diagnostics);
}

#[test]
fn it_reports_every_kind_of_problem() {
    let report = lint(common::issues_dir());

    assert_eq!(2, count(&report, "front-matter", Severity::Error));
    assert_eq!(1, count(&report, "links", Severity::Error));
    assert_eq!(2, count(&report, "code-fences", Severity::Error));
    assert_eq!(4, count(&report, "section-index", Severity::Warning));
    assert_eq!(1, count(&report, "attribution", Severity::Warning));
    assert_eq!(1, count(&report, "ordering", Severity::Warning));
    assert_eq!(1, count(&report, "challenges", Severity::Warning));

    assert_eq!(5, report.error_count());
    assert_eq!(7, report.warning_count());
    assert!(report.fails(false));
}

#[test]
fn it_points_at_the_offending_lines() {
    let report = lint(common::issues_dir());

    let fences: Vec<_> = report
        .by_check("code-fences")
        .map(|diagnostic| (diagnostic.path.as_path(), diagnostic.line))
        .collect();
    let links: Vec<_> = report
        .by_check("links")
        .map(|diagnostic| (diagnostic.path.as_path(), diagnostic.line))
        .collect();

    let hello = Path::new("go/1-basics/1-hello.md");
    assert_eq!(vec![(hello, Some(7)), (hello, Some(11))], fences);
    assert_eq!(vec![(Path::new("go/1-basics/README.md"), Some(4))], links);
}

#[test]
fn it_reports_skipped_files() {
    let report = lint(common::issues_dir());

    let skipped: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.message.contains("skipped"))
        .map(|diagnostic| diagnostic.path.as_path())
        .collect();

    assert_eq!(vec![Path::new("go/1-basics/broken.md")], skipped);
}

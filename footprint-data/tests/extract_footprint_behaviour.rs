//! Behavioural tests for the two-pass `extract_footprint` entry point.

use camino::Utf8PathBuf;
use chrono::{NaiveDate, NaiveDateTime};
use footprint_core::{BoundingBox, ExtractOptions, Footprint, TimeWindow};
use footprint_data::test_support::CorpusBuilder;
use footprint_data::{
    CorpusSource, ExtractHeader, ExtractionReport, FileSource, MemorySource, PipelineError,
    ScanConfig, SourceError, extract_footprint_with,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs};

type Outcome = Result<(String, ExtractionReport), PipelineError>;

#[fixture]
fn source() -> RefCell<Option<Box<dyn CorpusSource>>> {
    RefCell::new(None)
}

#[fixture]
fn options() -> RefCell<Option<ExtractOptions>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> RefCell<Option<Outcome>> {
    RefCell::new(None)
}

fn stamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .expect("valid timestamp")
}

fn missing_path() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/absent.osm.bz2")
}

fn use_corpus(source: &RefCell<Option<Box<dyn CorpusSource>>>, corpus: &CorpusBuilder) {
    *source.borrow_mut() = Some(Box::new(MemorySource::new(corpus.build())));
}

fn written(outcome: &RefCell<Option<Outcome>>) -> String {
    outcome
        .borrow()
        .as_ref()
        .expect("extraction was attempted")
        .as_ref()
        .map(|(text, _)| text.clone())
        .unwrap_or_else(|err| panic!("expected a successful extraction, got {err}"))
}

#[given("a corpus with one node inside, one node outside and a way to the inside node")]
fn small_city(#[from(source)] source: &RefCell<Option<Box<dyn CorpusSource>>>) {
    use_corpus(
        source,
        &CorpusBuilder::new()
            .node(1, 10.0, 10.0)
            .node(2, 80.0, 80.0)
            .way(10, &[1]),
    );
}

#[given("node 7 edited at versions 1, 2 and 5 inside the box")]
fn versioned_node(#[from(source)] source: &RefCell<Option<Box<dyn CorpusSource>>>) {
    use_corpus(
        source,
        &CorpusBuilder::new()
            .node_version(7, 1, 5.0, 5.0)
            .node_version(7, 2, 5.0, 5.0)
            .node_version(7, 5, 5.0, 5.0),
    );
}

#[given("a way listed before the only node it references inside the box")]
fn way_before_nodes(#[from(source)] source: &RefCell<Option<Box<dyn CorpusSource>>>) {
    use_corpus(
        source,
        &CorpusBuilder::new()
            .node(2, 80.0, 80.0)
            .way(10, &[1, 2])
            .node(1, 5.0, 5.0),
    );
}

#[given("a node inside the box tagged with an angle bracket in its key")]
fn bracketed_tag(#[from(source)] source: &RefCell<Option<Box<dyn CorpusSource>>>) {
    use_corpus(
        source,
        &CorpusBuilder::new().tagged_node(1, 5.0, 5.0, "a>b", "c"),
    );
}

#[given("a corpus path that does not exist")]
fn missing_corpus(#[from(source)] source: &RefCell<Option<Box<dyn CorpusSource>>>) {
    *source.borrow_mut() = Some(Box::new(FileSource::new(missing_path())));
}

#[given("a footprint spanning 0 to 20 degrees during 2010")]
fn footprint_2010(#[from(options)] options: &RefCell<Option<ExtractOptions>>) {
    let bbox = BoundingBox::new(0.0, 20.0, 20.0, 0.0).expect("valid box");
    let window = TimeWindow::new(
        NaiveDate::from_ymd_opt(2010, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2010, 12, 31).expect("valid date"),
    )
    .expect("valid window");
    *options.borrow_mut() = Some(ExtractOptions::new(Footprint::new(bbox, window)));
}

#[given("history mode is enabled")]
fn history_enabled(#[from(options)] options: &RefCell<Option<ExtractOptions>>) {
    let mut guard = options.borrow_mut();
    let current = guard.take().expect("footprint configured first");
    *guard = Some(current.with_history(true));
}

#[when("the footprint is extracted")]
fn extract(
    #[from(source)] source: &RefCell<Option<Box<dyn CorpusSource>>>,
    #[from(options)] options: &RefCell<Option<ExtractOptions>>,
    #[from(outcome)] outcome: &RefCell<Option<Outcome>>,
) {
    let result = {
        let source = source.borrow();
        let source = source.as_deref().expect("corpus prepared");
        let options = options.borrow().expect("footprint configured");
        let mut out = Vec::new();
        extract_footprint_with(
            source,
            &options,
            &ScanConfig::default(),
            &ExtractHeader::new(stamp()),
            &mut out,
        )
        .map(|report| {
            (
                String::from_utf8(out).expect("extract output is UTF-8"),
                report,
            )
        })
    };
    *outcome.borrow_mut() = Some(result);
}

#[then("node 1 and way 10 are written")]
fn node_and_way_written(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    let text = written(outcome);
    assert!(text.contains(r#"<node id="1""#), "node 1 missing:\n{text}");
    assert!(text.contains(r#"<way id="10""#), "way 10 missing:\n{text}");
    assert!(text.contains("    <nd ref=\"1\"/>\n  </way>"));
}

#[then("node 2 is not written")]
fn node_two_dropped(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    assert!(!written(outcome).contains(r#"<node id="2""#));
}

#[then("only version 5 of node 7 is written")]
fn newest_version_only(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    let text = written(outcome);
    assert_eq!(text.matches(r#"<node id="7""#).count(), 1);
    assert!(text.contains(r#"<node id="7" version="5""#));
}

#[then("versions 1, 2 and 5 of node 7 are written")]
fn every_version(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    let text = written(outcome);
    for version in [1, 2, 5] {
        assert!(
            text.contains(&format!(r#"<node id="7" version="{version}""#)),
            "version {version} missing:\n{text}"
        );
    }
}

#[then("way 10 is not written")]
fn way_dropped(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    assert!(!written(outcome).contains("<way"));
}

#[then("node 1 is written")]
fn node_one_written(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    assert!(written(outcome).contains(r#"<node id="1""#));
}

#[then("the bracketed tag is written intact")]
fn bracket_intact(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    let text = written(outcome);
    assert!(text.contains("    <tag k=\"a>b\" v=\"c\"/>\n"), "tag split:\n{text}");
}

#[then("an open error names the missing path")]
fn open_error(#[from(outcome)] outcome: &RefCell<Option<Outcome>>) {
    let borrowed = outcome.borrow();
    match borrowed.as_ref().expect("extraction was attempted") {
        Err(PipelineError::Source(SourceError::Open { path, .. })) => {
            assert_eq!(path, &missing_path());
        }
        Err(other) => panic!("expected an open error, got {other:?}"),
        Ok(_) => panic!("expected an open error for a missing corpus"),
    }
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features/extract_footprint.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    let expected = [
        "Extracting a small city",
        "Keeping only the newest node version",
        "Keeping every node version in history mode",
        "Dropping a way listed before its nodes",
        "Copying quoted angle brackets intact",
        "Reporting a missing corpus",
    ];
    assert_eq!(titles, expected, "scenario order changed in feature file");
}

#[scenario(path = "tests/features/extract_footprint.feature", index = 0)]
fn extracting_a_small_city(
    source: RefCell<Option<Box<dyn CorpusSource>>>,
    options: RefCell<Option<ExtractOptions>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (source, options, outcome);
}

#[scenario(path = "tests/features/extract_footprint.feature", index = 1)]
fn keeping_the_newest_version(
    source: RefCell<Option<Box<dyn CorpusSource>>>,
    options: RefCell<Option<ExtractOptions>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (source, options, outcome);
}

#[scenario(path = "tests/features/extract_footprint.feature", index = 2)]
fn keeping_every_version(
    source: RefCell<Option<Box<dyn CorpusSource>>>,
    options: RefCell<Option<ExtractOptions>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (source, options, outcome);
}

#[scenario(path = "tests/features/extract_footprint.feature", index = 3)]
fn dropping_early_ways(
    source: RefCell<Option<Box<dyn CorpusSource>>>,
    options: RefCell<Option<ExtractOptions>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (source, options, outcome);
}

#[scenario(path = "tests/features/extract_footprint.feature", index = 4)]
fn copying_bracketed_tags(
    source: RefCell<Option<Box<dyn CorpusSource>>>,
    options: RefCell<Option<ExtractOptions>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (source, options, outcome);
}

#[scenario(path = "tests/features/extract_footprint.feature", index = 5)]
fn reporting_missing_corpus(
    source: RefCell<Option<Box<dyn CorpusSource>>>,
    options: RefCell<Option<ExtractOptions>>,
    outcome: RefCell<Option<Outcome>>,
) {
    let _ = (source, options, outcome);
}

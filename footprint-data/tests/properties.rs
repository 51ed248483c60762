//! Property tests for the two-pass extraction.

use chrono::NaiveDate;
use footprint_core::{BoundingBox, ExtractOptions, Footprint, MemberKind, TimeWindow};
use footprint_data::test_support::CorpusBuilder;
use footprint_data::{
    ExtractHeader, ExtractionReport, MemorySource, ScanConfig, extract_footprint_with,
};
use proptest::prelude::*;

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

fn header() -> ExtractHeader {
    let stamp = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .expect("valid timestamp");
    ExtractHeader::new(stamp)
}

/// Nodes `1..=n` at the given points, one way per node, one relation and
/// the changeset they all belong to.
fn corpus(points: &[(f64, f64)]) -> String {
    let mut builder = CorpusBuilder::new().changeset(1);
    for (id, (lat, lon)) in (1..).zip(points) {
        builder = builder.node(id, *lat, *lon);
    }
    for id in 1..=points.len() as i64 {
        builder = builder.way(100 + id, &[id]);
    }
    builder.relation(500, &[(MemberKind::Way, 101)]).build()
}

fn extract(corpus: &str, options: &ExtractOptions, config: &ScanConfig) -> (String, ExtractionReport) {
    let mut out = Vec::new();
    let report = extract_footprint_with(
        &MemorySource::new(corpus),
        options,
        config,
        &header(),
        &mut out,
    )
    .expect("extraction succeeds");
    (String::from_utf8(out).expect("UTF-8 output"), report)
}

fn points() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-90.0f64..=90.0, -180.0f64..=180.0), 1..12)
}

fn bbox() -> impl Strategy<Value = BoundingBox> {
    (
        -180.0f64..=180.0,
        -180.0f64..=180.0,
        -90.0f64..=90.0,
        -90.0f64..=90.0,
    )
        .prop_map(|(x1, x2, y1, y2)| {
            let (left, right) = ordered(x1, x2);
            let (bottom, top) = ordered(y1, y2);
            BoundingBox::new(left, right, top, bottom).expect("ordered edges")
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn nodes_are_retained_exactly_when_inside(points in points(), bbox in bbox()) {
        let options = ExtractOptions::new(Footprint::new(bbox, TimeWindow::default()));
        let (text, report) = extract(&corpus(&points), &options, &ScanConfig::default());
        for (id, (lat, lon)) in (1..).zip(&points) {
            let inside = bbox.left() <= *lon
                && *lon <= bbox.right()
                && bbox.bottom() <= *lat
                && *lat <= bbox.top();
            let needle = format!("<node id=\"{id}\" ");
            prop_assert_eq!(text.contains(&needle), inside, "node {} at {},{}", id, lat, lon);
            let way = format!("<way id=\"{}\" ", 100 + id);
            prop_assert_eq!(text.contains(&way), inside, "way {}", 100 + id);
        }
        prop_assert_eq!(report.membership.nodes_retained as u64, report.extract.nodes);
    }

    #[test]
    fn world_footprint_keeps_every_object(points in points()) {
        let options = ExtractOptions::new(Footprint::new(BoundingBox::world(), TimeWindow::default()))
            .with_changesets(true);
        let (_, report) = extract(&corpus(&points), &options, &ScanConfig::default());
        let count = points.len() as u64;
        prop_assert_eq!(report.extract.nodes, count);
        prop_assert_eq!(report.extract.ways, count);
        prop_assert_eq!(report.extract.relations, 1);
        prop_assert_eq!(report.extract.changesets, 1);
        prop_assert_eq!(report.membership.objects, report.extract.objects());
    }

    #[test]
    fn extracts_are_fixed_points(points in points(), bbox in bbox()) {
        let options = ExtractOptions::new(Footprint::new(bbox, TimeWindow::default()));
        let (first, _) = extract(&corpus(&points), &options, &ScanConfig::default());
        let (second, _) = extract(&first, &options, &ScanConfig::default());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn window_size_does_not_change_the_extract(points in points(), chunk_size in 1usize..96) {
        let options = ExtractOptions::default();
        let corpus = corpus(&points);
        let (expected, _) = extract(&corpus, &options, &ScanConfig::default());
        let config = ScanConfig {
            chunk_size,
            ..ScanConfig::default()
        };
        let (actual, report) = extract(&corpus, &options, &config);
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(report.extract.bytes_read, corpus.len() as u64);
    }
}

//! Property tests for footprint containment.

use footprint_core::BoundingBox;
use geo::Coord;
use proptest::prelude::*;

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn containment_matches_edge_comparisons(
        x1 in -180.0f64..=180.0,
        x2 in -180.0f64..=180.0,
        y1 in -90.0f64..=90.0,
        y2 in -90.0f64..=90.0,
        px in -180.0f64..=180.0,
        py in -90.0f64..=90.0,
    ) {
        let (left, right) = ordered(x1, x2);
        let (bottom, top) = ordered(y1, y2);
        let bbox = BoundingBox::new(left, right, top, bottom).expect("ordered edges");
        let inside = left <= px && px <= right && bottom <= py && py <= top;
        prop_assert_eq!(bbox.contains(Coord { x: px, y: py }), inside);
    }

    #[test]
    fn corners_are_always_inside(
        x1 in -180.0f64..=180.0,
        x2 in -180.0f64..=180.0,
        y1 in -90.0f64..=90.0,
        y2 in -90.0f64..=90.0,
    ) {
        let (left, right) = ordered(x1, x2);
        let (bottom, top) = ordered(y1, y2);
        let bbox = BoundingBox::new(left, right, top, bottom).expect("ordered edges");
        let bottom_left = Coord { x: left, y: bottom };
        let top_right = Coord { x: right, y: top };
        prop_assert!(bbox.contains(bottom_left));
        prop_assert!(bbox.contains(top_right));
    }
}

use proptest::prelude::*;
use siteinspect_geo::models::{Point, Ring};
use siteinspect_geo::{
    edges_of, merge_collinear_ring, polygon_area_m2, polygon_perimeter_m, translate,
    DEFAULT_COLLINEAR_TOLERANCE,
};

/// Star-shaped polygon with evenly spaced spokes of the given lengths in meters
fn star(center: (f64, f64), radii: &[f64]) -> Vec<Point> {
    let n = radii.len() as f64;
    let cos_lat = center.1.to_radians().cos();
    radii
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let angle = std::f64::consts::TAU * i as f64 / n;
            Point::new(
                center.0 + r * angle.cos() / (111_195.0 * cos_lat),
                center.1 + r * angle.sin() / 111_195.0,
            )
        })
        .collect()
}

fn close(mut points: Vec<Point>) -> Ring {
    points.push(points[0]);
    Ring::new(points)
}

fn relative_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn area_and_perimeter_ignore_starting_vertex(
        lng in -170.0f64..170.0,
        lat in -60.0f64..60.0,
        radii in prop::collection::vec(20.0f64..200.0, 3..10),
        shift in 0usize..10,
    ) {
        let points = star((lng, lat), &radii);
        let mut rotated = points.clone();
        rotated.rotate_left(shift % points.len());

        let a = close(points);
        let b = close(rotated);
        prop_assert!(relative_eq(polygon_area_m2(&a), polygon_area_m2(&b)));
        prop_assert!(relative_eq(polygon_perimeter_m(&a), polygon_perimeter_m(&b)));
    }

    #[test]
    fn area_and_perimeter_ignore_orientation(
        lng in -170.0f64..170.0,
        lat in -60.0f64..60.0,
        radii in prop::collection::vec(20.0f64..200.0, 3..10),
    ) {
        let points = star((lng, lat), &radii);
        let mut reversed = points.clone();
        reversed.reverse();

        let a = close(points);
        let b = close(reversed);
        prop_assert!(polygon_area_m2(&a) > 0.0);
        prop_assert!(relative_eq(polygon_area_m2(&a), polygon_area_m2(&b)));
        prop_assert!(relative_eq(polygon_perimeter_m(&a), polygon_perimeter_m(&b)));
    }

    #[test]
    fn closing_point_is_optional(
        radii in prop::collection::vec(20.0f64..200.0, 3..10),
    ) {
        let points = star((174.76, -36.85), &radii);
        let open = Ring::new(points.clone());
        let closed = close(points);

        prop_assert_eq!(edges_of(&open).len(), radii.len());
        prop_assert_eq!(edges_of(&closed).len(), radii.len());
        prop_assert!(relative_eq(polygon_area_m2(&open), polygon_area_m2(&closed)));
    }

    #[test]
    fn merge_never_adds_vertices(
        radii in prop::collection::vec(20.0f64..200.0, 3..10),
    ) {
        let ring = close(star((0.0, 45.0), &radii));
        let merged = merge_collinear_ring(&ring, DEFAULT_COLLINEAR_TOLERANCE);
        prop_assert!(merged.vertex_count() <= ring.vertex_count());
        prop_assert!(merged.is_closed());
    }

    #[test]
    fn translation_round_trips(
        radii in prop::collection::vec(20.0f64..200.0, 3..10),
        d_lng in -0.01f64..0.01,
        d_lat in -0.01f64..0.01,
    ) {
        let ring = close(star((10.0, 10.0), &radii));
        let back = translate(&translate(&ring, d_lng, d_lat), -d_lng, -d_lat);
        for (p, q) in ring.points().iter().zip(back.points()) {
            prop_assert!(p.approx_eq(q, 1e-9));
        }
    }
}

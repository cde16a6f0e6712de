use proptest::prelude::*;
use siteinspect_core::models::{Point, Ring};
use siteinspect_geo::edges_of;
use siteinspect_workflow::{AddPointOutcome, EdgeTarget, PolygonBuilder, SelectOutcome, SetbackEngine};

/// Convex polygon on a circle of roughly 100 m radius
fn regular(n: usize, center: (f64, f64)) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            Point::new(center.0 + 0.001 * angle.cos(), center.1 + 0.001 * angle.sin())
        })
        .collect()
}

fn engine_for(n: usize) -> SetbackEngine {
    let ring = Ring::new(regular(n, (10.0, 10.0))).closed();
    let edges = edges_of(&ring);
    let mut engine = SetbackEngine::new();
    engine.set_boundary(ring, 1.0, edges);
    engine
}

proptest! {
    #[test]
    fn finished_triangle_closes_with_three_edges(
        lng in -170.0f64..170.0,
        lat in -60.0f64..60.0,
    ) {
        let mut builder = PolygonBuilder::new();
        builder.start();
        let points = regular(3, (lng, lat));
        for point in &points {
            let added = matches!(builder.add_point(*point).unwrap(), AddPointOutcome::Added { .. });
            prop_assert!(added);
        }
        let ring = builder.finish().unwrap();

        prop_assert_eq!(ring.len(), 4);
        prop_assert_eq!(ring.points()[0], ring.points()[3]);
        prop_assert_eq!(edges_of(&ring).len(), 3);
    }

    #[test]
    fn same_edge_twice_never_sets_back(n in 3usize..12, pick in 0usize..12) {
        let index = pick % n;
        let mut engine = engine_for(n);
        engine.enter_selection().unwrap();

        let first = engine.select_edge(EdgeTarget::Index(index)).unwrap();
        prop_assert!(matches!(first, SelectOutcome::FrontSelected(_)));
        prop_assert_eq!(engine.select_edge(EdgeTarget::Index(index)).unwrap(), SelectOutcome::SameEdge);
        prop_assert!(engine.selection().back.is_none());
        prop_assert_eq!(engine.state().name(), "selecting_edges");
    }

    #[test]
    fn distinct_edges_complete_selection(n in 3usize..12, a in 0usize..12, b in 0usize..12) {
        let (front, back) = (a % n, b % n);
        prop_assume!(front != back);
        let mut engine = engine_for(n);
        engine.enter_selection().unwrap();

        engine.select_edge(EdgeTarget::Index(front)).unwrap();
        let outcome = engine.select_edge(EdgeTarget::Index(back)).unwrap();

        prop_assert!(matches!(outcome, SelectOutcome::BackSelected(_)));
        prop_assert_eq!(engine.selection().indices(), vec![front, back]);
        prop_assert_eq!(engine.state().name(), "edges_selected");
        // selection mode has ended
        prop_assert_eq!(engine.select_edge(EdgeTarget::Index(front)).unwrap(), SelectOutcome::Ignored);
    }
}

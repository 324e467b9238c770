//! End-to-end tests for cycle detection, DSM ordering, and the
//! edge-removal payoff ranking working over one graph.

use tanglemap::analysis::{analyze_graph, dsm, payoff};
use tanglemap::config::AnalysisConfig;
use tanglemap::graph::cycles::detect_cycles;
use tanglemap::graph::DepGraph;

fn graph_from(edges: &[(&str, &str, u64)]) -> DepGraph<String> {
    let mut g = DepGraph::new();
    for (s, t, w) in edges {
        g.add_edge(s.to_string(), t.to_string(), *w).unwrap();
    }
    g
}

#[test]
fn layered_architecture_with_one_violation() {
    // Clean layering ui -> domain -> storage plus one upward reference
    // from storage back into domain's peer.
    let g = graph_from(&[
        ("ui", "domain", 4),
        ("domain", "storage", 4),
        ("domain", "validation", 2),
        ("validation", "storage", 1),
        ("storage", "validation", 1),
    ]);
    let view = g.view();

    let cycles = detect_cycles(&view);
    assert_eq!(cycles.region_count(), 1);
    let region = &cycles.regions()[0];
    assert_eq!(region.vertex_count(), 2);
    assert!(region.vertices.contains(&"storage".to_string()));
    assert!(region.vertices.contains(&"validation".to_string()));

    let ordering = dsm::order(&view);
    let back = ordering.back_edges(&view);
    assert_eq!(back.len(), 1, "a two-cycle has exactly one back-edge");

    let candidates = payoff::rank_removable_edges(&view, &ordering);
    assert_eq!(candidates.len(), 1);
    // Removing the single back-edge clears all back-weight.
    assert_eq!(candidates[0].remaining_back_edges, 0);
    assert!(candidates[0].payoff > 0.0);
}

#[test]
fn triangle_yields_one_fully_clearing_candidate() {
    // A simple triangle orders with exactly one back-edge, and removing it
    // leaves nothing cyclic behind.
    let g = graph_from(&[("a", "b", 10), ("b", "c", 10), ("c", "a", 1)]);
    let view = g.view();
    let ordering = dsm::order(&view);
    let candidates = payoff::rank_removable_edges(&view, &ordering);

    assert_eq!(candidates.len(), 1);
    let best = &candidates[0];
    assert_eq!(best.edge.source, "c");
    assert_eq!(best.edge.target, "a");
    assert_eq!(best.remaining_back_edges, 0);
    assert!((best.payoff - 1.0).abs() < 1e-9);
}

#[test]
fn dsm_order_is_topological_on_acyclic_graphs() {
    let g = graph_from(&[
        ("app", "core", 1),
        ("app", "util", 1),
        ("core", "util", 1),
        ("util", "base", 1),
    ]);
    let view = g.view();
    let ordering = dsm::order(&view);

    assert!(ordering.back_edges(&view).is_empty());
    for id in view.active() {
        for (t, _) in view.out_edges(id) {
            assert!(
                ordering.position_of(id) < ordering.position_of(t),
                "every dependency must point forward in the ordering"
            );
        }
    }
}

#[test]
fn self_loop_forms_its_own_region() {
    let g = {
        let mut g = graph_from(&[("a", "b", 1), ("b", "a", 1)]);
        g.add_self_loop("c".to_string(), 2).unwrap();
        g
    };
    let cycles = detect_cycles(&g.view());
    assert_eq!(cycles.region_count(), 2);
    let trivial = cycles.get(&"c".to_string()).unwrap();
    assert!(trivial.self_loop);
    assert_eq!(trivial.vertex_count(), 1);
}

#[test]
fn whole_pipeline_reports_per_region_plans() {
    // Two independent tangles; each region gets its own ranked plan.
    let g = graph_from(&[
        ("a", "b", 1),
        ("b", "c", 1),
        ("c", "a", 1),
        ("x", "y", 5),
        ("y", "x", 2),
    ]);
    let analysis = analyze_graph(&g, &AnalysisConfig::default());

    assert_eq!(analysis.regions.len(), 2);
    for region in &analysis.regions {
        assert!(
            !region.candidates.is_empty(),
            "every multi-vertex region needs at least one removal candidate"
        );
    }
    assert_eq!(analysis.feedback_vertices.k, 2);
    assert_eq!(analysis.feedback_arcs.len(), 2);
}

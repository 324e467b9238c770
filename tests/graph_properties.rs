//! Property-based tests over random graphs.
//!
//! Invariants exercised here:
//! - Acyclic graphs produce no cycle regions, no removal candidates, an
//!   empty feedback vertex set, and an empty feedback arc set.
//! - For any digraph, deleting the feedback vertex set leaves it acyclic,
//!   and so does deleting the feedback arc set.
//! - Cycle regions partition the cyclic vertices.
//! - The treewidth bound never grows as the modulator does.
//! - Repeated runs agree on solution size and score.

use proptest::prelude::*;
use std::collections::HashSet;
use tanglemap::analysis::fvs::FvsSolver;
use tanglemap::analysis::treewidth::compute_eta;
use tanglemap::analysis::{dsm, pagerank_fas, payoff};
use tanglemap::config::AnalysisConfig;
use tanglemap::graph::cycles::detect_cycles;
use tanglemap::graph::scc::has_cycle;
use tanglemap::graph::DepGraph;

fn vertex_name(i: usize) -> String {
    format!("v{i:02}")
}

/// Random DAG: edges only point from lower to higher index.
fn arbitrary_dag() -> impl Strategy<Value = DepGraph<String>> {
    (2usize..12, any::<u64>()).prop_flat_map(|(n, seed)| {
        proptest::collection::vec(any::<bool>(), n * (n - 1) / 2).prop_map(move |picks| {
            let mut g = DepGraph::new();
            for i in 0..n {
                g.add_vertex(vertex_name(i));
            }
            let mut k = 0;
            for i in 0..n {
                for j in (i + 1)..n {
                    if picks[k] {
                        let w = (seed >> (k % 60)) % 9 + 1;
                        g.add_edge(vertex_name(i), vertex_name(j), w).unwrap();
                    }
                    k += 1;
                }
            }
            g
        })
    })
}

/// Random digraph over up to ten vertices, any direction allowed.
fn arbitrary_digraph() -> impl Strategy<Value = DepGraph<String>> {
    (2usize..10).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n, 1u64..9), 1..30).prop_map(move |edges| {
            let mut g = DepGraph::new();
            for i in 0..n {
                g.add_vertex(vertex_name(i));
            }
            for (s, t, w) in edges {
                if s == t {
                    g.add_self_loop(vertex_name(s), w).unwrap();
                } else {
                    g.add_edge(vertex_name(s), vertex_name(t), w).unwrap();
                }
            }
            g
        })
    })
}

fn residual_without(g: &DepGraph<String>, removed: &[String]) -> bool {
    let ids: Vec<usize> = removed.iter().map(|v| g.id_of(v).unwrap()).collect();
    has_cycle(&g.view().without_vertices(&ids))
}

proptest! {
    #[test]
    fn dags_have_no_structural_findings(g in arbitrary_dag()) {
        let view = g.view();
        prop_assert!(detect_cycles(&view).is_empty());

        let ordering = dsm::order(&view);
        prop_assert!(ordering.back_edges(&view).is_empty());
        prop_assert!(payoff::rank_removable_edges(&view, &ordering).is_empty());

        let config = AnalysisConfig::default();
        let result = FvsSolver::new(g.view(), &config).solve();
        prop_assert_eq!(result.k, 0);
        prop_assert!(pagerank_fas::compute_feedback_arc_set(&view, &config).is_empty());
    }

    #[test]
    fn feedback_vertex_set_clears_every_cycle(g in arbitrary_digraph()) {
        let result = FvsSolver::new(g.view(), &AnalysisConfig::default()).solve();
        prop_assert!(!residual_without(&g, &result.vertices));
        prop_assert_eq!(result.k, result.vertices.len());
    }

    #[test]
    fn feedback_arc_set_clears_every_cycle(g in arbitrary_digraph()) {
        let config = AnalysisConfig::default();
        let arcs = pagerank_fas::compute_feedback_arc_set(&g.view(), &config);

        let removed: HashSet<(String, String)> = arcs
            .iter()
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();
        let mut residual = DepGraph::new();
        let view = g.view();
        for id in view.active() {
            residual.add_vertex(g.vertex(id).clone());
        }
        for id in view.active() {
            for (t, w) in view.out_edges(id) {
                let s = g.vertex(id).clone();
                let d = g.vertex(t).clone();
                if removed.contains(&(s.clone(), d.clone())) {
                    continue;
                }
                if s == d {
                    residual.add_self_loop(s, w).unwrap();
                } else {
                    residual.add_edge(s, d, w).unwrap();
                }
            }
        }
        prop_assert!(!has_cycle(&residual.view()));
    }

    #[test]
    fn cycle_regions_partition_cyclic_vertices(g in arbitrary_digraph()) {
        let view = g.view();
        let cycles = detect_cycles(&view);

        let mut seen: HashSet<&String> = HashSet::new();
        let mut multi_vertex_total = 0usize;
        for region in cycles.regions() {
            if !region.self_loop {
                multi_vertex_total += region.vertex_count();
            }
            for v in &region.vertices {
                seen.insert(v);
            }
        }
        // Multi-vertex regions are disjoint, so their sizes add up.
        let multi_vertex_distinct: HashSet<&String> = cycles
            .regions()
            .iter()
            .filter(|r| !r.self_loop)
            .flat_map(|r| r.vertices.iter())
            .collect();
        prop_assert_eq!(multi_vertex_total, multi_vertex_distinct.len());

        // Every region vertex really sits on a cycle.
        for v in &seen {
            let id = g.id_of(v).unwrap();
            let keep: Vec<usize> = cycles
                .get(v)
                .unwrap()
                .vertices
                .iter()
                .map(|u| g.id_of(u).unwrap())
                .collect();
            prop_assert!(keep.contains(&id));
        }
    }

    #[test]
    fn eta_never_grows_as_the_modulator_does(
        g in arbitrary_digraph(),
        picks in proptest::collection::vec(any::<u8>(), 1..8),
    ) {
        let view = g.view();
        let active = view.active();

        let mut modulator: Vec<usize> = Vec::new();
        let mut previous = compute_eta(&view, &modulator);
        for p in picks {
            let id = active[p as usize % active.len()];
            if modulator.contains(&id) {
                continue;
            }
            modulator.push(id);
            let next = compute_eta(&view, &modulator);
            prop_assert!(
                next <= previous,
                "removing {} raised eta {} -> {}",
                id,
                previous,
                next
            );
            previous = next;
        }
    }

    #[test]
    fn solver_runs_agree_on_size(g in arbitrary_digraph()) {
        let config = AnalysisConfig::default();
        let first = FvsSolver::new(g.view(), &config).solve();
        let second = FvsSolver::new(g.view(), &config).solve();
        prop_assert_eq!(first.k, second.k);
        prop_assert_eq!(first.total_cost, second.total_cost);
    }
}

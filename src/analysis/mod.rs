//! Structural analysis of the class-reference graph.
//!
//! The pipeline runs cycle detection, DSM ordering with payoff ranking,
//! the feedback-vertex-set solve, and the PageRank arc-set heuristic over
//! one immutable graph, and bundles everything the report renderer and the
//! result assembler consume. Per-region work is isolated: a panic while
//! analyzing one cyclic region is logged and skipped without aborting the
//! others.

pub mod dsm;
pub mod fvs;
pub mod graph_metrics;
pub mod modulator;
pub mod pagerank_fas;
pub mod payoff;
pub mod treewidth;

use crate::config::AnalysisConfig;
use crate::graph::cycles::{detect_cycles, CycleMap, CycleSubgraph};
use crate::graph::{DepGraph, Edge, Vertex};
use fvs::{FeedbackVertexSetResult, FvsSolver};
use payoff::EdgeRemovalCandidate;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// One cyclic region with its ranked removal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAnalysis<V> {
    pub region: CycleSubgraph<V>,
    /// Back-edges of the region ranked by removal payoff, best first.
    pub candidates: Vec<EdgeRemovalCandidate<V>>,
}

/// Everything the structural side of the ranking produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphAnalysis<V: Eq + std::hash::Hash> {
    pub cycles: CycleMap<V>,
    pub regions: Vec<RegionAnalysis<V>>,
    /// Whole-graph removal plan across all back-edges.
    pub candidates: Vec<EdgeRemovalCandidate<V>>,
    pub feedback_vertices: FeedbackVertexSetResult<V>,
    pub feedback_arcs: Vec<Edge<V>>,
}

/// Run the full structural analysis over an immutable graph.
pub fn analyze_graph<V: Vertex>(graph: &DepGraph<V>, config: &AnalysisConfig) -> GraphAnalysis<V> {
    let view = graph.view();
    let cycles = detect_cycles(&view);

    let ordering = dsm::order(&view);
    let candidates = payoff::rank_removable_edges(&view, &ordering);

    let mut regions = Vec::with_capacity(cycles.region_count());
    for region in cycles.regions() {
        if region.self_loop {
            // A trivial one-cycle has no ordering to improve; its only plan
            // is removing the loop itself.
            regions.push(RegionAnalysis {
                region: region.clone(),
                candidates: Vec::new(),
            });
            continue;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let ids: Vec<usize> = region
                .vertices
                .iter()
                .map(|v| graph.id_of(v).expect("region vertex in graph"))
                .collect();
            let region_view = view.induced(&ids);
            let region_ordering = dsm::order(&region_view);
            payoff::rank_removable_edges(&region_view, &region_ordering)
        }));
        match outcome {
            Ok(candidates) => regions.push(RegionAnalysis {
                region: region.clone(),
                candidates,
            }),
            Err(_) => {
                log::error!(
                    "analysis: payoff ranking panicked for a region of {} vertices, skipping it",
                    region.vertex_count()
                );
            }
        }
    }

    let feedback_vertices = FvsSolver::new(graph.view(), config).solve();
    let feedback_arcs = pagerank_fas::compute_feedback_arc_set(&view, config);

    GraphAnalysis {
        cycles,
        regions,
        candidates,
        feedback_vertices,
        feedback_arcs,
    }
}

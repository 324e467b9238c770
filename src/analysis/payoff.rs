//! Edge-removal payoff ranking.
//!
//! For every back-edge of a DSM ordering, simulate its removal on an
//! edge-excluded view, recompute the ordering, and measure how much
//! back-edge weight and how many cyclic regions disappear. Payoff is the
//! weight reduction per unit of removed weight. Simulations are independent
//! and run in parallel; each owns its excluded-edge view and scratch state.

use crate::analysis::dsm::{self, DsmOrdering};
use crate::graph::cycles::detect_cycles;
use crate::graph::{Edge, GraphView, Vertex};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A back-edge scored by the effect of removing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRemovalCandidate<V> {
    pub edge: Edge<V>,
    /// Weight removed from the graph by deleting this edge.
    pub removed_weight: u64,
    /// Distinct cyclic regions eliminated by the removal.
    pub cycles_eliminated: usize,
    /// Back-edge count remaining after the removal.
    pub remaining_back_edges: usize,
    /// Total back-edge weight eliminated by the removal.
    pub back_weight_reduction: u64,
    /// Benefit over cost: back-edge weight reduction per removed weight.
    pub payoff: f64,
}

/// Rank the back-edges of `ordering` by removal payoff, best first. Ties in
/// payoff prefer the lighter edge; remaining ties fall back to the edge's
/// vertex order so the ranking is deterministic.
pub fn rank_removable_edges<V: Vertex>(
    view: &GraphView<'_, V>,
    ordering: &DsmOrdering,
) -> Vec<EdgeRemovalCandidate<V>> {
    let back_edges = ordering.back_edges(view);
    if back_edges.is_empty() {
        return Vec::new();
    }
    let original_back_weight = back_edges.iter().map(|&(_, _, w)| w).sum::<u64>();
    let original_regions = detect_cycles(view).region_count();

    let mut candidates: Vec<EdgeRemovalCandidate<V>> = back_edges
        .par_iter()
        .map(|&(s, t, w)| {
            let simulated = view.without_edge(s, t);
            let new_ordering = dsm::order(&simulated);
            let remaining = new_ordering.back_edges(&simulated);
            let new_back_weight: u64 = remaining.iter().map(|&(_, _, w)| w).sum();
            let new_regions = detect_cycles(&simulated).region_count();

            let reduction = original_back_weight.saturating_sub(new_back_weight);
            EdgeRemovalCandidate {
                edge: view.resolve_edge(s, t, w),
                removed_weight: w,
                cycles_eliminated: original_regions.saturating_sub(new_regions),
                remaining_back_edges: remaining.len(),
                back_weight_reduction: reduction,
                payoff: reduction as f64 / w as f64,
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.payoff
            .partial_cmp(&a.payoff)
            .expect("payoff is a ratio of finite weights")
            .then(a.removed_weight.cmp(&b.removed_weight))
            .then(a.edge.cmp(&b.edge))
    });
    candidates
}

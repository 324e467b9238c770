//! Treewidth upper-bound estimation for modulator validation.
//!
//! Exact treewidth is itself NP-hard, so the estimator computes the
//! minimum-degree elimination bound: repeatedly eliminate a minimum-degree
//! vertex of the undirected simplification, turning its neighborhood into a
//! clique; the largest degree seen at elimination time bounds the treewidth
//! from above. The bound is 0 for empty and single-vertex graphs, 1 for
//! forests, and 2 for a simple cycle.
//!
//! The order is computed once on the full graph and residuals are eliminated
//! along that fixed order. On an induced subgraph a fixed order can only
//! produce a subgraph of the original fill-in, so the reported width never
//! grows as the modulator does.

use crate::analysis::graph_metrics::undirected_adjacency;
use crate::graph::{GraphView, Vertex};
use std::collections::BTreeSet;

/// Minimum-degree elimination order of an undirected graph given as sorted
/// neighbor lists. Covers every active vertex.
fn elimination_order(active: &[usize], undirected: &[Vec<usize>]) -> Vec<usize> {
    let mut alive: BTreeSet<usize> = active.iter().copied().collect();
    let mut neighbors: Vec<BTreeSet<usize>> = undirected
        .iter()
        .map(|n| n.iter().copied().collect())
        .collect();

    let mut order = Vec::with_capacity(alive.len());
    while !alive.is_empty() {
        // Minimum degree, smallest id on ties.
        let &victim = alive
            .iter()
            .min_by_key(|&&id| (neighbors[id].len(), id))
            .expect("alive set checked non-empty");

        let hood: Vec<usize> = neighbors[victim].iter().copied().collect();
        for (i, &a) in hood.iter().enumerate() {
            neighbors[a].remove(&victim);
            for &b in &hood[i + 1..] {
                neighbors[a].insert(b);
                neighbors[b].insert(a);
            }
        }
        alive.remove(&victim);
        order.push(victim);
    }
    order
}

/// Elimination width of the graph restricted to the vertices outside `skip`,
/// eliminating along the fixed `order`.
fn width_along(order: &[usize], skip: &BTreeSet<usize>, undirected: &[Vec<usize>]) -> usize {
    let mut neighbors: Vec<BTreeSet<usize>> = undirected
        .iter()
        .enumerate()
        .map(|(id, n)| {
            if skip.contains(&id) {
                BTreeSet::new()
            } else {
                n.iter().copied().filter(|t| !skip.contains(t)).collect()
            }
        })
        .collect();

    let mut width = 0;
    for &victim in order.iter().filter(|&&v| !skip.contains(&v)) {
        width = width.max(neighbors[victim].len());

        let hood: Vec<usize> = neighbors[victim].iter().copied().collect();
        for (i, &a) in hood.iter().enumerate() {
            neighbors[a].remove(&victim);
            for &b in &hood[i + 1..] {
                neighbors[a].insert(b);
                neighbors[b].insert(a);
            }
        }
    }
    width
}

/// Heuristic upper bound on the treewidth of `view` after removing the
/// `modulator` vertices. Monotone non-increasing in the modulator: the
/// elimination order is fixed by the view alone, so for nested modulators
/// the larger one can only lower the bound.
///
/// The remainder is collapsed to a simple undirected graph (direction and
/// multiplicity dropped, self-loops dropped) before elimination. Ids must
/// be active in the view; passing a vertex that is not is a caller bug.
pub fn compute_eta<V: Vertex>(view: &GraphView<'_, V>, modulator: &[usize]) -> usize {
    for &id in modulator {
        assert!(
            view.is_active(id),
            "vertex id {id} is not part of this view"
        );
    }
    let skip: BTreeSet<usize> = modulator.iter().copied().collect();
    let active = view.active();
    if active.len() - skip.len() <= 1 {
        return 0;
    }
    let adj = undirected_adjacency(view);
    let order = elimination_order(&active, &adj);
    width_along(&order, &skip, &adj)
}

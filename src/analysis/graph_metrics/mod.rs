//! Structural metrics over the class-reference graph.
//!
//! These feed the modulator-selection strategies: degree, local clustering,
//! triangle counts, betweenness centrality, and articulation points. All
//! functions are pure over a view; the per-source centrality computation is
//! the parallel unit.

pub mod centrality;
pub mod clustering;

use crate::graph::{GraphView, Vertex};

/// Undirected simplification of a view: direction and edge multiplicity
/// collapsed, self-loops dropped. Rows for inactive ids are empty; neighbor
/// lists are sorted.
pub fn undirected_adjacency<V: Vertex>(view: &GraphView<'_, V>) -> Vec<Vec<usize>> {
    let mut adj = vec![Vec::new(); view.id_bound()];
    for s in view.active() {
        for (t, _) in view.out_edges(s) {
            if s != t {
                adj[s].push(t);
                adj[t].push(s);
            }
        }
    }
    for neighbors in &mut adj {
        neighbors.sort_unstable();
        neighbors.dedup();
    }
    adj
}

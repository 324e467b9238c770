//! Cycle detection and cyclic-region extraction.
//!
//! Every vertex that lies on a directed cycle is mapped to the induced
//! subgraph of the maximal cyclic region around it. The traversal is the
//! stack-safe equivalent of DFS-with-recursion-stack cycle detection: the
//! closure of "all vertices cyclically reachable from any cycle vertex" is
//! exactly the vertex's strongly connected component, so regions are built
//! from cyclic SCCs. Self-loops form their own single-vertex, single-edge
//! regions and are never merged into multi-vertex regions.

use crate::graph::scc::scc_labels;
use crate::graph::{Edge, GraphView, Vertex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An induced subgraph known to contain at least one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSubgraph<V> {
    /// Member vertices, sorted for deterministic output.
    pub vertices: Vec<V>,
    /// Induced edges between members.
    pub edges: Vec<Edge<V>>,
    /// True for a trivial one-cycle (an explicit self-loop).
    pub self_loop: bool,
}

impl<V> CycleSubgraph<V> {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Result of cycle detection: the distinct cyclic regions plus a membership
/// index from vertex to region.
///
/// A vertex carrying a self-loop inside a larger cyclic region keeps the
/// multi-vertex region as its primary membership; the trivial region is
/// still listed under [`regions`](CycleMap::regions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleMap<V: Eq + std::hash::Hash> {
    regions: Vec<CycleSubgraph<V>>,
    membership: HashMap<V, usize>,
}

impl<V: Vertex> CycleMap<V> {
    /// No vertex participates in any cycle.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of distinct cyclic regions after duplicate suppression.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn regions(&self) -> &[CycleSubgraph<V>] {
        &self.regions
    }

    /// The region `vertex` belongs to, if it lies on a cycle.
    pub fn get(&self, vertex: &V) -> Option<&CycleSubgraph<V>> {
        self.membership.get(vertex).map(|&i| &self.regions[i])
    }

    /// Vertices known to lie on a cycle.
    pub fn cyclic_vertices(&self) -> impl Iterator<Item = &V> {
        self.membership.keys()
    }
}

/// Conservative duplicate check: equal vertex-set size, equal edge-set
/// size, and at least one shared vertex. This is a cheap membership
/// heuristic, not an isomorphism test; two genuinely different regions of
/// equal size sharing a vertex would be suppressed as duplicates. Cyclic
/// SCCs are disjoint so the situation does not arise for regions built
/// here, but the rule is kept as the documented contract for externally
/// constructed subgraphs.
fn is_duplicate<V: Vertex>(a: &CycleSubgraph<V>, b: &CycleSubgraph<V>) -> bool {
    a.vertex_count() == b.vertex_count()
        && a.edge_count() == b.edge_count()
        && a.vertices.iter().any(|v| b.vertices.binary_search(v).is_ok())
}

/// Find all cyclic regions of `view`.
///
/// Pure function over an immutable view; an acyclic graph yields an empty
/// map. Multi-vertex regions must have more than one vertex and more than
/// one edge to be reported, which every cyclic SCC satisfies.
pub fn detect_cycles<V: Vertex>(view: &GraphView<'_, V>) -> CycleMap<V> {
    let labels = scc_labels(view);
    let components = labels.components();

    let mut regions: Vec<CycleSubgraph<V>> = Vec::new();
    let mut membership: HashMap<V, usize> = HashMap::new();

    for component in &components {
        if component.len() <= 1 {
            continue;
        }
        let mut vertices: Vec<V> = component
            .iter()
            .map(|&id| view.graph().vertex(id).clone())
            .collect();
        vertices.sort();

        let mut edges = Vec::new();
        for &s in component {
            for (t, w) in view.out_edges(s) {
                // Intra-region edges only; self-loops stay in their own
                // trivial region.
                if s != t && labels.label[t] == labels.label[s] {
                    edges.push(view.resolve_edge(s, t, w));
                }
            }
        }
        edges.sort();

        let region = CycleSubgraph {
            vertices,
            edges,
            self_loop: false,
        };
        if regions.iter().any(|existing| is_duplicate(existing, &region)) {
            continue;
        }
        let index = regions.len();
        for v in &region.vertices {
            membership.insert(v.clone(), index);
        }
        regions.push(region);
    }

    // Trivial one-cycles, reported separately.
    for id in view.active() {
        if let Some(w) = view.edge_weight(id, id) {
            let vertex = view.graph().vertex(id).clone();
            let region = CycleSubgraph {
                vertices: vec![vertex.clone()],
                edges: vec![view.resolve_edge(id, id, w)],
                self_loop: true,
            };
            let index = regions.len();
            membership.entry(vertex).or_insert(index);
            regions.push(region);
        }
    }

    CycleMap { regions, membership }
}

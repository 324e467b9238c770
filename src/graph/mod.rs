//! Directed, edge-weighted dependency graph.
//!
//! Vertices are opaque values (typically fully-qualified class names); edges
//! carry a reference count. Repeated references between the same ordered
//! pair accumulate into a single edge's weight rather than creating parallel
//! edges. The graph is immutable for the duration of an analysis: algorithms
//! operate on [`GraphView`]s, which restrict or exclude parts of the graph
//! without copying adjacency storage.

pub mod cycles;
pub mod scc;

use crate::errors::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Trait alias for vertex value requirements. `Ord` is only used to make
/// iteration and tie-breaking deterministic; it carries no semantic meaning.
pub trait Vertex: Clone + Eq + Hash + Ord + Send + Sync {}

impl<T: Clone + Eq + Hash + Ord + Send + Sync> Vertex for T {}

/// A resolved edge, returned to callers by value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge<V> {
    pub source: V,
    pub target: V,
    pub weight: u64,
}

/// Directed, edge-weighted multigraph over opaque vertex values.
///
/// Internally vertices are dense `usize` ids; the public surface speaks in
/// `V`. Adjacency is stored both forward and reverse so traversals in either
/// direction are cheap.
#[derive(Debug, Clone, Default)]
pub struct DepGraph<V> {
    vertices: Vec<V>,
    ids: HashMap<V, usize>,
    out: Vec<Vec<(usize, u64)>>,
    inc: Vec<Vec<(usize, u64)>>,
    edge_count: usize,
}

impl<V: Vertex> DepGraph<V> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            ids: HashMap::new(),
            out: Vec::new(),
            inc: Vec::new(),
            edge_count: 0,
        }
    }

    /// Insert a vertex if absent; returns its dense id either way.
    pub fn add_vertex(&mut self, vertex: V) -> usize {
        if let Some(&id) = self.ids.get(&vertex) {
            return id;
        }
        let id = self.vertices.len();
        self.ids.insert(vertex.clone(), id);
        self.vertices.push(vertex);
        self.out.push(Vec::new());
        self.inc.push(Vec::new());
        id
    }

    /// Add a directed reference from `source` to `target`, accumulating the
    /// weight into an existing edge if one is already present. Endpoints are
    /// inserted as vertices if missing.
    ///
    /// Rejects zero weights and identical endpoints; a self-reference is a
    /// trivial one-cycle and must go through [`add_self_loop`].
    ///
    /// [`add_self_loop`]: DepGraph::add_self_loop
    pub fn add_edge(&mut self, source: V, target: V, weight: u64) -> Result<(), GraphError> {
        if weight == 0 {
            return Err(GraphError::InvalidWeight(weight));
        }
        if source == target {
            return Err(GraphError::SelfLoop);
        }
        let s = self.add_vertex(source);
        let t = self.add_vertex(target);
        self.accumulate(s, t, weight);
        Ok(())
    }

    /// Explicitly add a self-loop (a trivial one-cycle) on `vertex`.
    pub fn add_self_loop(&mut self, vertex: V, weight: u64) -> Result<(), GraphError> {
        if weight == 0 {
            return Err(GraphError::InvalidWeight(weight));
        }
        let v = self.add_vertex(vertex);
        self.accumulate(v, v, weight);
        Ok(())
    }

    fn accumulate(&mut self, s: usize, t: usize, weight: u64) {
        if let Some(entry) = self.out[s].iter_mut().find(|(v, _)| *v == t) {
            entry.1 += weight;
            let back = self.inc[t]
                .iter_mut()
                .find(|(u, _)| *u == s)
                .expect("reverse adjacency out of sync with forward adjacency");
            back.1 += weight;
            return;
        }
        self.out[s].push((t, weight));
        self.inc[t].push((s, weight));
        self.edge_count += 1;
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct (source, target) edges, self-loops included.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Dense id of `vertex`, if present.
    pub fn id_of(&self, vertex: &V) -> Option<usize> {
        self.ids.get(vertex).copied()
    }

    /// Vertex value for a dense id. Panics on an out-of-range id: that is a
    /// caller bug, not an input condition.
    pub fn vertex(&self, id: usize) -> &V {
        &self.vertices[id]
    }

    pub fn vertices(&self) -> impl Iterator<Item = &V> {
        self.vertices.iter()
    }

    /// A view over the whole graph.
    pub fn view(&self) -> GraphView<'_, V> {
        GraphView {
            graph: self,
            mask: None,
            excluded: None,
        }
    }
}

/// Borrowed, copy-free view of a [`DepGraph`].
///
/// A view can restrict the vertex set (induced subgraph) and exclude a
/// single edge (removal simulation). Views are cheap to clone and share the
/// mask through an `Arc`, so concurrent analysis units each hold their own
/// handle without touching shared mutable state.
#[derive(Debug, Clone)]
pub struct GraphView<'g, V> {
    graph: &'g DepGraph<V>,
    mask: Option<Arc<Vec<bool>>>,
    excluded: Option<(usize, usize)>,
}

impl<'g, V: Vertex> GraphView<'g, V> {
    /// Size of the underlying id space (not the active vertex count).
    pub fn id_bound(&self) -> usize {
        self.graph.vertex_count()
    }

    /// Whether the id is part of this view.
    pub fn is_active(&self, id: usize) -> bool {
        id < self.graph.vertex_count()
            && self.mask.as_ref().map_or(true, |mask| mask[id])
    }

    /// Active vertex ids in ascending order.
    pub fn active(&self) -> Vec<usize> {
        (0..self.graph.vertex_count())
            .filter(|&id| self.is_active(id))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        match &self.mask {
            None => self.graph.vertex_count(),
            Some(mask) => mask.iter().filter(|&&keep| keep).count(),
        }
    }

    pub fn graph(&self) -> &'g DepGraph<V> {
        self.graph
    }

    /// Outgoing `(target, weight)` pairs of `id` visible through this view.
    pub fn out_edges(&self, id: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        assert!(self.is_active(id), "vertex id {id} is not part of this view");
        self.graph.out[id]
            .iter()
            .copied()
            .filter(move |&(t, _)| self.is_active(t) && self.excluded != Some((id, t)))
    }

    /// Incoming `(source, weight)` pairs of `id` visible through this view.
    pub fn in_edges(&self, id: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        assert!(self.is_active(id), "vertex id {id} is not part of this view");
        self.graph.inc[id]
            .iter()
            .copied()
            .filter(move |&(s, _)| self.is_active(s) && self.excluded != Some((s, id)))
    }

    /// Weight of the `(source, target)` edge if visible.
    pub fn edge_weight(&self, source: usize, target: usize) -> Option<u64> {
        if !self.is_active(source) || !self.is_active(target) {
            return None;
        }
        if self.excluded == Some((source, target)) {
            return None;
        }
        self.graph.out[source]
            .iter()
            .find(|&&(t, _)| t == target)
            .map(|&(_, w)| w)
    }

    pub fn has_self_loop(&self, id: usize) -> bool {
        self.edge_weight(id, id).is_some()
    }

    /// All visible edges as `(source, target, weight)` triples, ascending by
    /// source then insertion order.
    pub fn edges(&self) -> Vec<(usize, usize, u64)> {
        let mut edges = Vec::new();
        for s in self.active() {
            for (t, w) in self.out_edges(s) {
                edges.push((s, t, w));
            }
        }
        edges
    }

    /// Forward adjacency snapshot (weights dropped), indexed by id. Inactive
    /// rows are empty. Used by the index-based traversal algorithms.
    pub fn out_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.id_bound()];
        for s in self.active() {
            adj[s] = self.out_edges(s).map(|(t, _)| t).collect();
        }
        adj
    }

    /// Reverse adjacency snapshot (weights dropped).
    pub fn in_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.id_bound()];
        for t in self.active() {
            adj[t] = self.in_edges(t).map(|(s, _)| s).collect();
        }
        adj
    }

    /// A view with one edge hidden. The edge must be visible; hiding an edge
    /// that does not exist is a caller bug.
    pub fn without_edge(&self, source: usize, target: usize) -> GraphView<'g, V> {
        assert!(
            self.edge_weight(source, target).is_some(),
            "cannot exclude edge {source} -> {target}: not visible in this view"
        );
        assert!(
            self.excluded.is_none(),
            "a view can exclude at most one edge; derive from the base view instead"
        );
        GraphView {
            graph: self.graph,
            mask: self.mask.clone(),
            excluded: Some((source, target)),
        }
    }

    /// Induced-subgraph view on `ids`. Ids must be active in this view.
    pub fn induced(&self, ids: &[usize]) -> GraphView<'g, V> {
        let mut mask = vec![false; self.id_bound()];
        for &id in ids {
            assert!(self.is_active(id), "vertex id {id} is not part of this view");
            mask[id] = true;
        }
        GraphView {
            graph: self.graph,
            mask: Some(Arc::new(mask)),
            excluded: self.excluded,
        }
    }

    /// View with `ids` removed. Ids must be active in this view.
    pub fn without_vertices(&self, ids: &[usize]) -> GraphView<'g, V> {
        let mut mask = match &self.mask {
            Some(mask) => mask.as_ref().clone(),
            None => vec![true; self.id_bound()],
        };
        for &id in ids {
            assert!(self.is_active(id), "vertex id {id} is not part of this view");
            mask[id] = false;
        }
        GraphView {
            graph: self.graph,
            mask: Some(Arc::new(mask)),
            excluded: self.excluded,
        }
    }

    /// Undirected degree: number of distinct neighbors in either direction,
    /// self-loops ignored.
    pub fn undirected_degree(&self, id: usize) -> usize {
        let mut neighbors: Vec<usize> = self
            .out_edges(id)
            .map(|(t, _)| t)
            .chain(self.in_edges(id).map(|(s, _)| s))
            .filter(|&n| n != id)
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors.len()
    }

    /// Total edge weight touching `id` in either direction; the coupling
    /// signal consumed by the assembler.
    pub fn weighted_degree(&self, id: usize) -> u64 {
        let outgoing: u64 = self.out_edges(id).map(|(_, w)| w).sum();
        let incoming: u64 = self
            .in_edges(id)
            .filter(|&(s, _)| s != id)
            .map(|(_, w)| w)
            .sum();
        outgoing + incoming
    }

    /// Resolve an id triple to an owned [`Edge`].
    pub fn resolve_edge(&self, source: usize, target: usize, weight: u64) -> Edge<V> {
        Edge {
            source: self.graph.vertex(source).clone(),
            target: self.graph.vertex(target).clone(),
            weight,
        }
    }
}

//! Strongly connected components via Kosaraju's algorithm.
//!
//! Kosaraju is preferred over the recursive Tarjan formulation because both
//! passes run on an explicit stack; class-reference graphs routinely contain
//! chains deep enough to overflow the call stack under naive recursion.

use crate::graph::{GraphView, Vertex};

/// Per-id SCC labels plus the component count. Inactive ids are labelled
/// `usize::MAX`.
#[derive(Debug, Clone)]
pub struct SccLabels {
    pub label: Vec<usize>,
    pub count: usize,
}

impl SccLabels {
    /// Components as sorted id lists, indexed by label.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let mut components = vec![Vec::new(); self.count];
        for (id, &label) in self.label.iter().enumerate() {
            if label != usize::MAX {
                components[label].push(id);
            }
        }
        components
    }
}

/// Iterative DFS computing reverse finish order.
///
/// Each stack frame is `(node, next_neighbor, backtracking)`; a frame pushed
/// with the backtrack flag set records its finish time instead of expanding.
fn dfs_finish(start: usize, adj: &[Vec<usize>], visited: &mut [bool], finish_order: &mut Vec<usize>) {
    let mut stack: Vec<(usize, usize, bool)> = vec![(start, 0, false)];

    while let Some((node, neighbor_idx, backtracking)) = stack.pop() {
        if backtracking {
            finish_order.push(node);
            continue;
        }
        visited[node] = true;

        let mut expanded = false;
        for (i, &neighbor) in adj[node].iter().enumerate().skip(neighbor_idx) {
            if !visited[neighbor] {
                stack.push((node, i + 1, false));
                stack.push((neighbor, 0, false));
                expanded = true;
                break;
            }
        }
        if !expanded {
            stack.push((node, 0, true));
        }
    }
}

/// Iterative DFS collecting all vertices reachable from `start`.
fn dfs_collect(start: usize, adj: &[Vec<usize>], visited: &mut [bool], out: &mut Vec<usize>) {
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;
        out.push(node);
        for &neighbor in &adj[node] {
            if !visited[neighbor] {
                stack.push(neighbor);
            }
        }
    }
}

/// Label every active vertex of `view` with its strongly connected
/// component. Labels are assigned in the order components are discovered on
/// the reverse graph, which makes them stable for a fixed input.
pub fn scc_labels<V: Vertex>(view: &GraphView<'_, V>) -> SccLabels {
    scc_labels_from_adjacency(&view.active(), &view.out_adjacency(), &view.in_adjacency())
}

/// Adjacency-based core of [`scc_labels`], shared with algorithms that
/// iterate on their own mutable adjacency snapshots.
pub(crate) fn scc_labels_from_adjacency(
    active: &[usize],
    adj: &[Vec<usize>],
    radj: &[Vec<usize>],
) -> SccLabels {
    let n = adj.len();

    let mut visited = vec![false; n];
    let mut finish_order = Vec::with_capacity(active.len());
    for &id in active {
        if !visited[id] {
            dfs_finish(id, adj, &mut visited, &mut finish_order);
        }
    }

    let mut label = vec![usize::MAX; n];
    let mut visited = vec![false; n];
    let mut count = 0;
    for &node in finish_order.iter().rev() {
        if !visited[node] {
            let mut component = Vec::new();
            dfs_collect(node, radj, &mut visited, &mut component);
            for member in component {
                label[member] = count;
            }
            count += 1;
        }
    }

    SccLabels { label, count }
}

/// Components as sorted vertex-id lists.
pub fn strongly_connected_components<V: Vertex>(view: &GraphView<'_, V>) -> Vec<Vec<usize>> {
    scc_labels(view).components()
}

/// Ids of every vertex on some directed cycle: members of multi-vertex
/// components plus self-loop vertices.
pub fn cyclic_vertices<V: Vertex>(view: &GraphView<'_, V>) -> Vec<usize> {
    let labels = scc_labels(view);
    let mut size = vec![0usize; labels.count];
    for &l in labels.label.iter().filter(|&&l| l != usize::MAX) {
        size[l] += 1;
    }
    view.active()
        .into_iter()
        .filter(|&id| size[labels.label[id]] > 1 || view.has_self_loop(id))
        .collect()
}

/// Whether the view contains any directed cycle.
pub fn has_cycle<V: Vertex>(view: &GraphView<'_, V>) -> bool {
    !cyclic_vertices(view).is_empty()
}

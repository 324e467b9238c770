//! Dependency-structure-matrix ordering.
//!
//! Produces a source-to-sink total order that tolerates cycles: strongly
//! connected components are collapsed first, the condensation is sorted
//! topologically, and vertices inside an SCC fall back to a stable DFS
//! post-order. After ordering, every edge whose source sits *after* its
//! target is by definition a back-edge, the candidate set for
//! cycle-breaking removal. Only intra-SCC edges can be back-edges.
//!
//! Rendering the matrix itself is a presentation concern and lives with the
//! report collaborator, not here.

use crate::graph::scc::scc_labels;
use crate::graph::{GraphView, Vertex};

/// A back-edge with its weight, in id space.
pub type BackEdge = (usize, usize, u64);

/// A cycle-tolerant topological order over the active vertices of a view.
#[derive(Debug, Clone)]
pub struct DsmOrdering {
    /// Active ids, source-to-sink.
    order: Vec<usize>,
    /// Position of each id in `order`; `usize::MAX` for inactive ids.
    position: Vec<usize>,
}

impl DsmOrdering {
    /// Ids in source-to-sink order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Position of `id` in the order. Panics for ids outside the ordered
    /// view; querying them is a caller bug.
    pub fn position_of(&self, id: usize) -> usize {
        let pos = self.position[id];
        assert!(pos != usize::MAX, "vertex id {id} was not part of the ordered view");
        pos
    }

    /// Edges violating the order: source position strictly greater than
    /// target position. Self-loops never qualify; they are handled by the
    /// cycle machinery, not by reordering.
    pub fn back_edges<V: Vertex>(&self, view: &GraphView<'_, V>) -> Vec<BackEdge> {
        let mut back = Vec::new();
        for &s in &self.order {
            for (t, w) in view.out_edges(s) {
                if s != t && self.position[s] > self.position[t] {
                    back.push((s, t, w));
                }
            }
        }
        back
    }

    /// Total weight of the order-violating edges.
    pub fn total_back_weight<V: Vertex>(&self, view: &GraphView<'_, V>) -> u64 {
        self.back_edges(view).iter().map(|&(_, _, w)| w).sum()
    }
}

/// Stable iterative DFS post-order restricted to one component, started
/// from the smallest member id with neighbors visited in ascending order.
fn component_post_order(adj: &[Vec<usize>], component: &[usize]) -> Vec<usize> {
    let mut in_component = vec![false; adj.len()];
    for &id in component {
        in_component[id] = true;
    }
    let mut sorted_adj: Vec<Vec<usize>> = vec![Vec::new(); adj.len()];
    for &id in component {
        let mut n: Vec<usize> = adj[id]
            .iter()
            .copied()
            .filter(|&t| t != id && in_component[t])
            .collect();
        n.sort_unstable();
        sorted_adj[id] = n;
    }

    let mut visited = vec![false; adj.len()];
    let mut post = Vec::with_capacity(component.len());
    for &root in component {
        if visited[root] {
            continue;
        }
        let mut stack: Vec<(usize, usize, bool)> = vec![(root, 0, false)];
        while let Some((node, idx, backtracking)) = stack.pop() {
            if backtracking {
                post.push(node);
                continue;
            }
            visited[node] = true;
            let mut expanded = false;
            for (i, &next) in sorted_adj[node].iter().enumerate().skip(idx) {
                if !visited[next] {
                    stack.push((node, i + 1, false));
                    stack.push((next, 0, false));
                    expanded = true;
                    break;
                }
            }
            if !expanded {
                stack.push((node, 0, true));
            }
        }
    }
    post
}

/// Compute the cycle-tolerant ordering of `view`.
pub fn order<V: Vertex>(view: &GraphView<'_, V>) -> DsmOrdering {
    let labels = scc_labels(view);
    let components = labels.components();
    let adj = view.out_adjacency();

    // Condensation adjacency, deduplicated.
    let mut cond_adj: Vec<Vec<usize>> = vec![Vec::new(); labels.count];
    for s in view.active() {
        for (t, _) in view.out_edges(s) {
            let (ls, lt) = (labels.label[s], labels.label[t]);
            if ls != lt {
                cond_adj[ls].push(lt);
            }
        }
    }
    for targets in &mut cond_adj {
        targets.sort_unstable();
        targets.dedup();
    }

    // Topological order of the condensation: reverse DFS post-order.
    let all_components: Vec<usize> = (0..labels.count).collect();
    let mut cond_order = component_post_order(&cond_adj, &all_components);
    cond_order.reverse();

    let mut order = Vec::with_capacity(view.active_count());
    for scc in cond_order {
        if components[scc].len() == 1 {
            order.push(components[scc][0]);
        } else {
            // Arbitrary-but-stable inner order: reversed DFS post-order
            // within the component.
            let mut inner = component_post_order(&adj, &components[scc]);
            inner.reverse();
            order.extend(inner);
        }
    }

    let mut position = vec![usize::MAX; view.id_bound()];
    for (pos, &id) in order.iter().enumerate() {
        position[id] = pos;
    }
    DsmOrdering { order, position }
}

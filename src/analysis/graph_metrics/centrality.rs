//! Betweenness centrality and articulation points.
//!
//! Betweenness identifies bridge classes that sit on many shortest
//! reference paths between other classes; articulation points are the
//! undirected bottlenecks whose removal disconnects a region. Both are
//! consumed by the bottleneck and structural-importance modulator
//! strategies.

use crate::graph::{GraphView, Vertex};
use rayon::prelude::*;

/// Brandes single-source dependency accumulation over the directed graph.
fn brandes_from_source(source: usize, adj: &[Vec<usize>]) -> Vec<f64> {
    let n = adj.len();
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![usize::MAX; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut visit_order = Vec::new();

    sigma[source] = 1.0;
    dist[source] = 0;
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        visit_order.push(u);
        for &v in &adj[u] {
            if v == u {
                continue;
            }
            if dist[v] == usize::MAX {
                dist[v] = dist[u] + 1;
                queue.push_back(v);
            }
            if dist[v] == dist[u] + 1 {
                sigma[v] += sigma[u];
                preds[v].push(u);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    let mut partial = vec![0.0f64; n];
    for &w in visit_order.iter().rev() {
        for &u in &preds[w] {
            delta[u] += sigma[u] / sigma[w] * (1.0 + delta[w]);
        }
        if w != source {
            partial[w] = delta[w];
        }
    }
    partial
}

/// Betweenness centrality for every vertex, normalized to `[0, 1]` by the
/// number of ordered vertex pairs. Per-source BFS passes run in parallel;
/// each pass owns its scratch state and partial sums are reduced at the
/// end.
pub fn betweenness<V: Vertex>(view: &GraphView<'_, V>) -> Vec<f64> {
    let n = view.id_bound();
    let adj = view.out_adjacency();
    let active = view.active();
    let active_count = active.len();
    if active_count <= 2 {
        return vec![0.0; n];
    }

    let mut scores = active
        .par_iter()
        .map(|&source| brandes_from_source(source, &adj))
        .reduce(
            || vec![0.0f64; n],
            |mut acc, partial| {
                for (a, p) in acc.iter_mut().zip(partial) {
                    *a += p;
                }
                acc
            },
        );

    let pairs = ((active_count - 1) * (active_count - 2)) as f64;
    for score in &mut scores {
        *score /= pairs;
    }
    scores
}

/// Articulation points of the undirected simplification, found with an
/// explicit-stack DFS (disc/low). Returned in ascending id order.
pub fn articulation_points(active: &[usize], undirected: &[Vec<usize>]) -> Vec<usize> {
    let n = undirected.len();
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut is_cut = vec![false; n];
    let mut timer = 0usize;

    for &root in active {
        if disc[root] != usize::MAX {
            continue;
        }
        let mut root_children = 0usize;
        // Frames: (vertex, dfs parent, next neighbor index).
        let mut stack: Vec<(usize, usize, usize)> = vec![(root, usize::MAX, 0)];
        loop {
            let (u, parent) = match stack.last() {
                Some(&(u, parent, _)) => (u, parent),
                None => break,
            };
            if disc[u] == usize::MAX {
                disc[u] = timer;
                low[u] = timer;
                timer += 1;
            }
            let idx = {
                let frame = stack.last_mut().expect("frame checked above");
                let idx = frame.2;
                frame.2 += 1;
                idx
            };
            if idx < undirected[u].len() {
                let v = undirected[u][idx];
                if v == parent {
                    continue;
                }
                if disc[v] == usize::MAX {
                    if u == root {
                        root_children += 1;
                    }
                    stack.push((v, u, 0));
                } else {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if parent != usize::MAX {
                    low[parent] = low[parent].min(low[u]);
                    if parent != root && low[u] >= disc[parent] {
                        is_cut[parent] = true;
                    }
                }
            }
        }
        is_cut[root] = root_children > 1;
    }

    (0..n).filter(|&id| is_cut[id]).collect()
}

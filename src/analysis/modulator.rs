//! Treewidth-modulator selection.
//!
//! Five independent strategies each propose a vertex set whose removal
//! should bound the remaining treewidth to a target η. The aggregator races
//! them under a shared deadline, validates each proposal by recomputing the
//! achieved η, and keeps the valid result with minimum quality score
//! `size + 0.1·η` in a mutex-guarded best slot updated only on strict
//! improvement. If every strategy fails to validate, a plain
//! highest-degree truncation is returned instead; the aggregator never
//! fails.

use crate::analysis::fvs;
use crate::analysis::graph_metrics::centrality::{articulation_points, betweenness};
use crate::analysis::graph_metrics::clustering::{clustering_coefficient, triangle_count};
use crate::analysis::graph_metrics::undirected_adjacency;
use crate::analysis::treewidth::compute_eta;
use crate::graph::{GraphView, Vertex};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// The selection strategies raced by the aggregator. `DegreeTruncation` is
/// the deterministic fallback, never raced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModulatorStrategy {
    GreedyDegree,
    FvsSeeded,
    StructuralImportance,
    HighDegreeFirst,
    Bottleneck,
    DegreeTruncation,
}

impl ModulatorStrategy {
    /// The five raced strategies, in tie-break priority order.
    pub const RACED: [ModulatorStrategy; 5] = [
        ModulatorStrategy::GreedyDegree,
        ModulatorStrategy::FvsSeeded,
        ModulatorStrategy::StructuralImportance,
        ModulatorStrategy::HighDegreeFirst,
        ModulatorStrategy::Bottleneck,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModulatorStrategy::GreedyDegree => "greedy-degree",
            ModulatorStrategy::FvsSeeded => "fvs-seeded",
            ModulatorStrategy::StructuralImportance => "structural-importance",
            ModulatorStrategy::HighDegreeFirst => "high-degree-first",
            ModulatorStrategy::Bottleneck => "bottleneck",
            ModulatorStrategy::DegreeTruncation => "degree-truncation",
        }
    }

    fn rank(&self) -> usize {
        Self::RACED.iter().position(|s| s == self).unwrap_or(usize::MAX)
    }
}

/// A validated modulator in id space.
#[derive(Debug, Clone)]
pub(crate) struct ModulatorIds {
    pub vertices: Vec<usize>,
    pub eta: usize,
    pub strategy: ModulatorStrategy,
    pub quality: f64,
}

/// A validated modulator resolved to vertex values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulatorResult<V> {
    pub vertices: Vec<V>,
    /// Treewidth bound achieved after removing the modulator.
    pub eta: usize,
    pub strategy: ModulatorStrategy,
    /// `size + 0.1·eta`; lower is better.
    pub quality: f64,
}

/// Candidate ordering shared by the simple strategies: walk `ranked` and
/// keep adding vertices until the target η or one of the budgets is hit.
fn select_from_ranking<V: Vertex>(
    view: &GraphView<'_, V>,
    ranked: &[usize],
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> Vec<usize> {
    let mut selected = Vec::new();
    if compute_eta(view, &selected) <= target_eta {
        return selected;
    }
    for &candidate in ranked {
        if selected.len() >= max_size || Instant::now() >= deadline {
            break;
        }
        selected.push(candidate);
        if compute_eta(view, &selected) <= target_eta {
            break;
        }
    }
    selected
}

/// Degree-descending order with ascending-id tie-break.
fn degree_ranking<V: Vertex>(view: &GraphView<'_, V>) -> Vec<usize> {
    let mut ranked = view.active();
    ranked.sort_by_key(|&id| (std::cmp::Reverse(view.undirected_degree(id)), id));
    ranked
}

fn select_greedy_degree<V: Vertex>(
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::new();
    loop {
        if compute_eta(view, &selected) <= target_eta
            || selected.len() >= max_size
            || Instant::now() >= deadline
        {
            return selected;
        }
        let residual = view.without_vertices(&selected);
        let adj = undirected_adjacency(&residual);
        // Highest degree x (1 + local clustering) wins, recomputed after
        // every removal.
        let next = residual.active().into_iter().max_by(|&a, &b| {
            let score = |id: usize| {
                adj[id].len() as f64 * (1.0 + clustering_coefficient(&adj, id))
            };
            score(a)
                .partial_cmp(&score(b))
                .expect("degree scores are finite")
                .then(b.cmp(&a))
        });
        match next {
            Some(id) => selected.push(id),
            None => return selected,
        }
    }
}

fn select_fvs_seeded<V: Vertex>(
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> Vec<usize> {
    let mut seed = fvs::greedy_fvs_ids(view, None);
    seed.truncate(max_size);
    if compute_eta(view, &seed) <= target_eta {
        return seed;
    }
    // Extend the seed with the highest-degree leftovers.
    let mut selected = seed;
    for id in degree_ranking(view) {
        if selected.len() >= max_size || Instant::now() >= deadline {
            break;
        }
        if selected.contains(&id) {
            continue;
        }
        selected.push(id);
        if compute_eta(view, &selected) <= target_eta {
            break;
        }
    }
    selected
}

fn select_structural_importance<V: Vertex>(
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> Vec<usize> {
    let adj = undirected_adjacency(view);
    let central = betweenness(view);
    let max_degree = view
        .active()
        .iter()
        .map(|&id| adj[id].len())
        .max()
        .unwrap_or(0)
        .max(1) as f64;
    let max_triangles = view
        .active()
        .iter()
        .map(|&id| triangle_count(&adj, id))
        .max()
        .unwrap_or(0)
        .max(1) as f64;

    let mut ranked = view.active();
    ranked.sort_by(|&a, &b| {
        let score = |id: usize| {
            adj[id].len() as f64 / max_degree
                + central[id]
                + triangle_count(&adj, id) as f64 / max_triangles
        };
        score(b)
            .partial_cmp(&score(a))
            .expect("importance scores are finite")
            .then(a.cmp(&b))
    });
    select_from_ranking(view, &ranked, target_eta, max_size, deadline)
}

fn select_bottleneck<V: Vertex>(
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> Vec<usize> {
    let adj = undirected_adjacency(view);
    let central = betweenness(view);

    let mut cuts = articulation_points(&view.active(), &adj);
    cuts.sort_by_key(|&id| (std::cmp::Reverse(adj[id].len()), id));

    let mut by_centrality = view.active();
    by_centrality.sort_by(|&a, &b| {
        central[b]
            .partial_cmp(&central[a])
            .expect("centrality scores are finite")
            .then(a.cmp(&b))
    });

    let mut ranked = cuts;
    for id in by_centrality {
        if !ranked.contains(&id) {
            ranked.push(id);
        }
    }
    select_from_ranking(view, &ranked, target_eta, max_size, deadline)
}

fn select<V: Vertex>(
    strategy: ModulatorStrategy,
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> Vec<usize> {
    match strategy {
        ModulatorStrategy::GreedyDegree => {
            select_greedy_degree(view, target_eta, max_size, deadline)
        }
        ModulatorStrategy::FvsSeeded => select_fvs_seeded(view, target_eta, max_size, deadline),
        ModulatorStrategy::StructuralImportance => {
            select_structural_importance(view, target_eta, max_size, deadline)
        }
        ModulatorStrategy::HighDegreeFirst => {
            select_from_ranking(view, &degree_ranking(view), target_eta, max_size, deadline)
        }
        ModulatorStrategy::Bottleneck => select_bottleneck(view, target_eta, max_size, deadline),
        ModulatorStrategy::DegreeTruncation => {
            let mut ranked = degree_ranking(view);
            ranked.truncate(max_size);
            ranked
        }
    }
}

/// Race all strategies and return the best validated modulator, in id
/// space. Falls back to degree truncation when nothing validates.
pub(crate) fn compute_modulator_ids<V: Vertex>(
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> ModulatorIds {
    let best: Mutex<Option<ModulatorIds>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for strategy in ModulatorStrategy::RACED {
            // Each strategy works on its own view handle and scratch state.
            let view = view.clone();
            let best = &best;
            scope.spawn(move || {
                let mut vertices = select(strategy, &view, target_eta, max_size, deadline);
                vertices.sort_unstable();
                let eta = compute_eta(&view, &vertices);
                if eta > target_eta || vertices.len() > max_size {
                    log::debug!(
                        "modulator: {} discarded (eta={eta}, size={})",
                        strategy.name(),
                        vertices.len()
                    );
                    return;
                }
                let quality = vertices.len() as f64 + 0.1 * eta as f64;
                let candidate = ModulatorIds {
                    vertices,
                    eta,
                    strategy,
                    quality,
                };
                let mut slot = best.lock();
                // Strictly-better-or-earlier-ranked wins; inferior late
                // arrivals are rejected, not blocked on.
                let improves = match slot.as_ref() {
                    None => true,
                    Some(current) => {
                        candidate.quality < current.quality
                            || (candidate.quality == current.quality
                                && candidate.strategy.rank() < current.strategy.rank())
                    }
                };
                if improves {
                    *slot = Some(candidate);
                }
            });
        }
    });

    match best.into_inner() {
        Some(winner) => winner,
        None => {
            log::warn!("modulator: no strategy validated, falling back to degree truncation");
            let vertices = select(
                ModulatorStrategy::DegreeTruncation,
                view,
                target_eta,
                max_size,
                deadline,
            );
            let eta = compute_eta(view, &vertices);
            ModulatorIds {
                quality: vertices.len() as f64 + 0.1 * eta as f64,
                eta,
                strategy: ModulatorStrategy::DegreeTruncation,
                vertices,
            }
        }
    }
}

/// Race all strategies under `deadline` and resolve the winner to vertex
/// values.
pub fn compute_modulator<V: Vertex>(
    view: &GraphView<'_, V>,
    target_eta: usize,
    max_size: usize,
    deadline: Instant,
) -> ModulatorResult<V> {
    let ids = compute_modulator_ids(view, target_eta, max_size, deadline);
    let mut vertices: Vec<V> = ids
        .vertices
        .iter()
        .map(|&id| view.graph().vertex(id).clone())
        .collect();
    vertices.sort();
    ModulatorResult {
        vertices,
        eta: ids.eta,
        strategy: ids.strategy,
        quality: ids.quality,
    }
}

//! Directed feedback vertex set solver.
//!
//! A solve estimates bounds, applies the kernel budget, and expands the
//! branching search; [`SolveState`] records where it ended. Cheap bounds
//! (vertex-disjoint cycle packing below, greedy removal above) bracket the
//! optimum before any search happens; a treewidth modulator parameterizes
//! the kernel budget; the branching search then branches on the vertices of
//! a shortest discovered cycle, with branches running concurrently against
//! a shared best-result slot. Deadline expiry degrades to the best heuristic
//! found: a timeout is never an error, and for a cyclic graph the result is
//! never empty.

use crate::analysis::modulator::{self, ModulatorIds};
use crate::config::AnalysisConfig;
use crate::errors::GraphError;
use crate::graph::cycles::detect_cycles;
use crate::graph::scc::{self, scc_labels};
use crate::graph::{GraphView, Vertex};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Phase a solve ended in, reported on the result for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveState {
    /// The kernel exceeded its budget; the search was never expanded and
    /// the result is the greedy heuristic.
    KernelApplied,
    /// The search ran to completion within the deadline.
    Solved,
    /// The deadline expired mid-search; the result is the best found.
    TimedOut,
}

/// Outcome of a feedback-vertex-set solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackVertexSetResult<V> {
    /// Removed vertices, sorted. Removing them leaves the graph acyclic.
    pub vertices: Vec<V>,
    /// Size of the removed set.
    pub k: usize,
    /// Total removal cost under the supplied vertex costs (equals `k` for
    /// the unit-cost variant).
    pub total_cost: f64,
    /// Which strategy produced the winning set.
    pub strategy: String,
    pub wall_time: Duration,
    /// True only if the search completed without truncation by the budget
    /// or the kernel bound; otherwise the set is a heuristic upper bound.
    pub exact: bool,
    pub state: SolveState,
    /// Cycle-packing lower bound on the optimal k.
    pub lower_bound: usize,
    /// Greedy upper bound on the optimal k.
    pub upper_bound: usize,
    /// Kernel budget derived from (k, modulator size, eta).
    pub kernel_bound: usize,
}

/// Kernel budget as a function of the solution-size parameter `k`, the
/// modulator size `l`, and the residual treewidth bound `eta`. Polynomial
/// surrogate for the parameterized kernelization bound; the search refuses
/// kernels larger than this and falls back to heuristic mode.
pub fn kernel_size_bound(k: usize, modulator_len: usize, eta: usize) -> usize {
    (k + modulator_len + 1)
        .saturating_mul(eta + 1)
        .saturating_mul(eta + 1)
}

/// Shortest directed cycle through `start`, as a vertex list, restricted to
/// `start`'s strongly connected component. `None` when `start` lies on no
/// cycle.
fn shortest_cycle_through<V: Vertex>(
    view: &GraphView<'_, V>,
    labels: &[usize],
    start: usize,
) -> Option<Vec<usize>> {
    if view.edge_weight(start, start).is_some() {
        return Some(vec![start]);
    }
    let mut pred = vec![usize::MAX; view.id_bound()];
    let mut queue = VecDeque::new();
    queue.push_back(start);
    while let Some(u) = queue.pop_front() {
        for (v, _) in view.out_edges(u) {
            if v == start {
                let mut cycle = vec![u];
                let mut cursor = u;
                while cursor != start {
                    cursor = pred[cursor];
                    cycle.push(cursor);
                }
                cycle.reverse();
                return Some(cycle);
            }
            if v != u && pred[v] == usize::MAX && labels[v] == labels[start] {
                pred[v] = u;
                queue.push_back(v);
            }
        }
    }
    None
}

/// Shortest cycle anywhere in the view.
fn shortest_cycle<V: Vertex>(view: &GraphView<'_, V>) -> Option<Vec<usize>> {
    let labels = scc_labels(view);
    let mut best: Option<Vec<usize>> = None;
    for v in scc::cyclic_vertices(view) {
        if let Some(cycle) = shortest_cycle_through(view, &labels.label, v) {
            if cycle.len() == 1 {
                return Some(cycle);
            }
            if best.as_ref().map_or(true, |b| cycle.len() < b.len()) {
                best = Some(cycle);
            }
        }
    }
    best
}

/// Lower bound on k: the size of a greedily packed family of
/// vertex-disjoint cycles.
fn cycle_packing_bound<V: Vertex>(view: &GraphView<'_, V>) -> usize {
    let mut current = view.clone();
    let mut packed = 0;
    while let Some(cycle) = shortest_cycle(&current) {
        current = current.without_vertices(&cycle);
        packed += 1;
    }
    packed
}

/// Greedy heuristic: repeatedly remove the cyclic vertex with the best
/// degree-per-cost score until no cycle remains. Always terminates, always
/// valid; this is the fallback every solve can return.
pub(crate) fn greedy_fvs_ids<V: Vertex>(
    view: &GraphView<'_, V>,
    costs: Option<&[f64]>,
) -> Vec<usize> {
    let mut current = view.clone();
    let mut removed = Vec::new();
    loop {
        let cyclic = scc::cyclic_vertices(&current);
        if cyclic.is_empty() {
            return removed;
        }
        let victim = cyclic
            .into_iter()
            .max_by(|&a, &b| {
                let score = |id: usize| {
                    let degree = current.weighted_degree(id) as f64;
                    match costs {
                        Some(costs) => degree / costs[id].max(f64::MIN_POSITIVE),
                        None => degree,
                    }
                };
                score(a)
                    .partial_cmp(&score(b))
                    .expect("degree scores are finite")
                    // Ascending ids win ties under max_by.
                    .then(b.cmp(&a))
            })
            .expect("cyclic set checked non-empty");
        removed.push(victim);
        current = current.without_vertices(&[victim]);
    }
}

struct BestSolution {
    vertices: Vec<usize>,
    cost: f64,
    from_search: bool,
}

struct SearchContext<'a> {
    deadline: Instant,
    costs: Option<&'a [f64]>,
    lower_bound: usize,
    best: Mutex<BestSolution>,
    stop: AtomicBool,
    deadline_hit: AtomicBool,
    truncated: AtomicBool,
}

impl<'a> SearchContext<'a> {
    fn cost_of(&self, ids: &[usize]) -> f64 {
        match self.costs {
            Some(costs) => ids.iter().map(|&id| costs[id]).sum(),
            None => ids.len() as f64,
        }
    }

    /// Record a valid solution; keep it only on strict improvement
    /// (cheaper, or equally cheap but smaller). Inferior late arrivals are
    /// rejected, not blocked on.
    fn offer(&self, vertices: Vec<usize>, from_search: bool) {
        let cost = self.cost_of(&vertices);
        let mut best = self.best.lock();
        let better = cost < best.cost
            || (cost == best.cost && vertices.len() < best.vertices.len());
        if better {
            log::debug!(
                "fvs: improved solution k={} cost={cost:.2} (search={from_search})",
                vertices.len()
            );
            let at_lower = self.costs.is_none() && vertices.len() <= self.lower_bound;
            *best = BestSolution {
                vertices,
                cost,
                from_search,
            };
            if at_lower {
                // Optimal by the packing bound: cancel sibling branches.
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }
}

fn branch<V: Vertex>(
    view: &GraphView<'_, V>,
    chosen: &mut Vec<usize>,
    ctx: &SearchContext<'_>,
) {
    if ctx.stop.load(Ordering::Relaxed) {
        return;
    }
    if Instant::now() >= ctx.deadline {
        ctx.deadline_hit.store(true, Ordering::Relaxed);
        ctx.truncated.store(true, Ordering::Relaxed);
        ctx.stop.store(true, Ordering::Relaxed);
        return;
    }
    // Prune branches that cannot beat the incumbent.
    let chosen_cost = ctx.cost_of(chosen);
    {
        let best = ctx.best.lock();
        if chosen_cost >= best.cost {
            return;
        }
    }

    let cycle = match shortest_cycle(view) {
        None => {
            ctx.offer(chosen.clone(), true);
            return;
        }
        Some(cycle) => cycle,
    };

    // Prefer cheaper vertices first so the weighted variant converges on
    // low-cost sets early.
    let mut order = cycle;
    if let Some(costs) = ctx.costs {
        order.sort_by(|&a, &b| {
            costs[a]
                .partial_cmp(&costs[b])
                .expect("vertex costs validated finite")
                .then(a.cmp(&b))
        });
    }
    for &v in &order {
        let child = view.without_vertices(&[v]);
        chosen.push(v);
        branch(&child, chosen, ctx);
        chosen.pop();
        if ctx.stop.load(Ordering::Relaxed) {
            return;
        }
    }
}

/// Feedback-vertex-set solver over a graph view.
pub struct FvsSolver<'g, V> {
    view: GraphView<'g, V>,
    budget: Duration,
    strategy_deadline: Duration,
    target_eta: usize,
    max_modulator_size: usize,
    costs: Option<Vec<f64>>,
}

impl<'g, V: Vertex> FvsSolver<'g, V> {
    pub fn new(view: GraphView<'g, V>, config: &AnalysisConfig) -> Self {
        Self {
            view,
            budget: config.fvs_budget(),
            strategy_deadline: config.strategy_deadline(),
            target_eta: config.target_eta,
            max_modulator_size: config.max_modulator_size,
            costs: None,
        }
    }

    /// Supply per-vertex removal costs for the weighted variant. Costs must
    /// be finite and non-negative; vertices without an entry cost 1.
    pub fn with_vertex_costs(mut self, costs: &HashMap<V, f64>) -> Result<Self, GraphError> {
        let mut table = vec![1.0f64; self.view.id_bound()];
        for (vertex, &cost) in costs {
            if !cost.is_finite() || cost < 0.0 {
                return Err(GraphError::InvalidVertexCost(cost));
            }
            if let Some(id) = self.view.graph().id_of(vertex) {
                table[id] = cost;
            }
        }
        self.costs = Some(table);
        Ok(self)
    }

    /// Solve in id space; wrapped by [`solve`](FvsSolver::solve).
    fn solve_ids(&self) -> (Vec<usize>, SolveInfo) {
        let started = Instant::now();
        let deadline = started + self.budget;

        // Self-loop vertices are in every feedback set.
        let forced: Vec<usize> = self
            .view
            .active()
            .into_iter()
            .filter(|&id| self.view.has_self_loop(id))
            .collect();
        let residual = if forced.is_empty() {
            self.view.clone()
        } else {
            self.view.without_vertices(&forced)
        };

        if !scc::has_cycle(&residual) {
            let exact_forced = SolveInfo {
                strategy: if forced.is_empty() { "acyclic" } else { "self-loops-only" },
                exact: true,
                state: SolveState::Solved,
                lower_bound: forced.len(),
                upper_bound: forced.len(),
                kernel_bound: 0,
                started,
            };
            return (forced, exact_forced);
        }

        // Bounds.
        let packing = cycle_packing_bound(&residual);
        let greedy = greedy_fvs_ids(&residual, self.costs.as_deref());
        let lower_bound = forced.len() + packing;
        let upper_bound = forced.len() + greedy.len();
        debug_assert!(lower_bound <= upper_bound);

        // Kernel: a modulator bounds the residual treewidth, which
        // parameterizes how large a kernel the search may expand.
        let modulator_deadline = deadline.min(Instant::now() + self.strategy_deadline);
        let ModulatorIds { vertices: modulator, eta, .. } = modulator::compute_modulator_ids(
            &residual,
            self.target_eta,
            self.max_modulator_size,
            modulator_deadline,
        );
        let kernel_bound = kernel_size_bound(upper_bound, modulator.len(), eta);
        let core = scc::cyclic_vertices(&residual);

        if core.len() > kernel_bound {
            log::debug!(
                "fvs: kernel of {} vertices exceeds budget {kernel_bound}, staying heuristic",
                core.len()
            );
            let mut vertices = forced;
            vertices.extend(greedy);
            let info = SolveInfo {
                strategy: "greedy-degree",
                exact: false,
                state: SolveState::KernelApplied,
                lower_bound,
                upper_bound,
                kernel_bound,
                started,
            };
            return (vertices, info);
        }

        // Search: branch on the vertices of a shortest cycle of the
        // kernel, one concurrent branch per vertex.
        let kernel = residual.induced(&core);
        let ctx = SearchContext {
            deadline,
            costs: self.costs.as_deref(),
            lower_bound: packing,
            best: Mutex::new(BestSolution {
                cost: match &self.costs {
                    Some(costs) => greedy.iter().map(|&id| costs[id]).sum(),
                    None => greedy.len() as f64,
                },
                vertices: greedy,
                from_search: false,
            }),
            stop: AtomicBool::new(false),
            deadline_hit: AtomicBool::new(false),
            truncated: AtomicBool::new(false),
        };

        let first_cycle = shortest_cycle(&kernel).expect("kernel contains a cycle");
        rayon::scope(|scope| {
            for &v in &first_cycle {
                let kernel = kernel.clone();
                let ctx = &ctx;
                scope.spawn(move |_| {
                    let child = kernel.without_vertices(&[v]);
                    let mut chosen = vec![v];
                    branch(&child, &mut chosen, ctx);
                });
            }
        });

        let best = ctx.best.into_inner();
        let searched = best.from_search;
        let timed_out = ctx.deadline_hit.load(Ordering::Relaxed);
        let truncated = ctx.truncated.load(Ordering::Relaxed);

        let mut vertices = forced;
        vertices.extend(best.vertices);
        let info = SolveInfo {
            strategy: if searched { "branch-and-bound" } else { "greedy-degree" },
            exact: !truncated,
            state: if timed_out { SolveState::TimedOut } else { SolveState::Solved },
            lower_bound,
            upper_bound,
            kernel_bound,
            started,
        };
        (vertices, info)
    }

    /// Run the solve.
    ///
    /// Validity invariant: removing the returned vertex set from the graph
    /// leaves it acyclic, re-verified here through the cycle detector. On
    /// deadline expiry the best heuristic found is returned with
    /// `exact = false`.
    pub fn solve(&self) -> FeedbackVertexSetResult<V> {
        let (mut ids, mut info) = self.solve_ids();

        // Re-verify through the cycle detector; fall back to the greedy
        // heuristic if a search product were ever invalid.
        let residual = if ids.is_empty() {
            self.view.clone()
        } else {
            self.view.without_vertices(&ids)
        };
        if !detect_cycles(&residual).is_empty() {
            log::warn!("fvs: discarding invalid solution of size {}", ids.len());
            ids = greedy_fvs_ids(&self.view, self.costs.as_deref());
            info.strategy = "greedy-degree";
            info.exact = false;
        }

        ids.sort_unstable();
        let total_cost = match &self.costs {
            Some(costs) => ids.iter().map(|&id| costs[id]).sum(),
            None => ids.len() as f64,
        };
        let mut vertices: Vec<V> = ids
            .iter()
            .map(|&id| self.view.graph().vertex(id).clone())
            .collect();
        vertices.sort();

        FeedbackVertexSetResult {
            k: vertices.len(),
            vertices,
            total_cost,
            strategy: info.strategy.to_string(),
            wall_time: info.started.elapsed(),
            exact: info.exact,
            state: info.state,
            lower_bound: info.lower_bound,
            upper_bound: info.upper_bound,
            kernel_bound: info.kernel_bound,
        }
    }
}

struct SolveInfo {
    strategy: &'static str,
    exact: bool,
    state: SolveState,
    lower_bound: usize,
    upper_bound: usize,
    kernel_bound: usize,
    started: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DepGraph;

    fn graph_from(edges: &[(u32, u32)]) -> DepGraph<u32> {
        let mut g = DepGraph::new();
        for &(s, t) in edges {
            g.add_edge(s, t, 1).unwrap();
        }
        g
    }

    fn solve(g: &DepGraph<u32>) -> FeedbackVertexSetResult<u32> {
        FvsSolver::new(g.view(), &AnalysisConfig::default()).solve()
    }

    fn assert_valid(g: &DepGraph<u32>, result: &FeedbackVertexSetResult<u32>) {
        let ids: Vec<usize> = result
            .vertices
            .iter()
            .map(|v| g.id_of(v).unwrap())
            .collect();
        let residual = g.view().without_vertices(&ids);
        assert!(detect_cycles(&residual).is_empty());
    }

    #[test]
    fn acyclic_graph_solves_to_zero() {
        let g = graph_from(&[(0, 1), (1, 2), (0, 2)]);
        let result = solve(&g);
        assert_eq!(result.k, 0);
        assert!(result.vertices.is_empty());
        assert!(result.exact);
        assert_eq!(result.state, SolveState::Solved);
    }

    #[test]
    fn three_cycle_needs_one_vertex() {
        let g = graph_from(&[(0, 1), (1, 2), (2, 0)]);
        let result = solve(&g);
        assert_eq!(result.k, 1);
        assert!(result.exact);
        assert!(result.vertices[0] <= 2);
        assert_valid(&g, &result);
    }

    #[test]
    fn self_loop_forces_its_vertex() {
        let mut g = DepGraph::new();
        g.add_edge(0u32, 1, 1).unwrap();
        g.add_self_loop(7u32, 1).unwrap();
        let result = solve(&g);
        assert_eq!(result.k, 1);
        assert_eq!(result.vertices, vec![7]);
        assert!(result.exact);
    }

    #[test]
    fn disjoint_cycles_need_one_vertex_each() {
        let g = graph_from(&[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]);
        let result = solve(&g);
        assert_eq!(result.k, 2);
        assert!(result.exact);
        assert_valid(&g, &result);
    }

    #[test]
    fn complete_digraph_bounds() {
        let n = 5u32;
        let mut g = DepGraph::new();
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    g.add_edge(i, j, 1).unwrap();
                }
            }
        }
        let result = solve(&g);
        assert!(result.k >= (n as usize) - 1, "k={} too small", result.k);
        assert!(result.k <= n as usize);
        assert_valid(&g, &result);
    }

    #[test]
    fn repeated_solves_agree_on_k() {
        let g = graph_from(&[
            (0, 1),
            (1, 2),
            (2, 0),
            (2, 3),
            (3, 4),
            (4, 2),
            (4, 5),
            (5, 6),
            (6, 4),
        ]);
        let first = solve(&g);
        let second = solve(&g);
        assert_eq!(first.k, second.k);
        assert_eq!(first.lower_bound, second.lower_bound);
        assert_valid(&g, &first);
    }

    #[test]
    fn weighted_variant_prefers_the_cheap_vertex() {
        // A 2-cycle where vertex 1 is far cheaper to remove.
        let g = graph_from(&[(0, 1), (1, 0)]);
        let costs: HashMap<u32, f64> = [(0u32, 10.0), (1u32, 0.5)].into_iter().collect();
        let result = FvsSolver::new(g.view(), &AnalysisConfig::default())
            .with_vertex_costs(&costs)
            .unwrap()
            .solve();
        assert_eq!(result.vertices, vec![1]);
        assert_eq!(result.total_cost, 0.5);
    }

    #[test]
    fn negative_cost_is_rejected() {
        let g = graph_from(&[(0, 1), (1, 0)]);
        let costs: HashMap<u32, f64> = [(0u32, -1.0)].into_iter().collect();
        let err = FvsSolver::new(g.view(), &AnalysisConfig::default())
            .with_vertex_costs(&costs)
            .err();
        assert_eq!(err, Some(GraphError::InvalidVertexCost(-1.0)));
    }

    #[test]
    fn bounds_bracket_the_solution() {
        let g = graph_from(&[(0, 1), (1, 0), (1, 2), (2, 3), (3, 1)]);
        let result = solve(&g);
        assert!(result.lower_bound <= result.k);
        assert!(result.k <= result.upper_bound);
    }

    #[test]
    fn oversized_kernel_stays_heuristic() {
        // A plain 25-cycle has upper bound 1 and an empty modulator, so its
        // kernel budget caps out well below 25 vertices and the solve must
        // stop after the kernel phase with the greedy result.
        let edges: Vec<(u32, u32)> = (0..25).map(|i| (i, (i + 1) % 25)).collect();
        let g = graph_from(&edges);
        let result = solve(&g);
        assert_eq!(result.state, SolveState::KernelApplied);
        assert!(!result.exact);
        assert_eq!(result.k, 1);
        assert!(result.k <= result.kernel_bound);
        assert_valid(&g, &result);
    }

    #[test]
    fn kernel_bound_grows_with_parameters() {
        assert!(kernel_size_bound(2, 1, 2) < kernel_size_bound(4, 1, 2));
        assert!(kernel_size_bound(2, 1, 2) < kernel_size_bound(2, 1, 4));
    }
}

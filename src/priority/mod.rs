//! Combines structural analysis with change history into a ranked list of
//! refactoring targets.
//!
//! Structural impact blends four normalized signals through configurable
//! weights: feedback-set membership, participation in high-payoff edge
//! removals, weighted coupling, and the size of the cycle region a vertex
//! sits in. The final priority rewards vertices that are both structurally
//! impactful and change-prone, computed as a rank difference so one noisy
//! dimension cannot drown out the other.

use crate::analysis::GraphAnalysis;
use crate::config::AssemblerWeights;
use crate::graph::{DepGraph, Vertex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const SECONDS_PER_MONTH: f64 = 30.44 * 24.0 * 3600.0;

/// Commit history for one source file, taken from the VCS log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeProneness {
    /// Unix timestamp of the earliest commit touching the file.
    pub first_commit_epoch: i64,
    /// Unix timestamp of the latest commit touching the file.
    pub last_commit_epoch: i64,
    pub commit_count: u32,
}

impl ChangeProneness {
    /// Commits per month over the file's active span. A file with a single
    /// commit, or with a degenerate span, scores its raw commit count so it
    /// still registers as touched.
    pub fn change_score(&self) -> f64 {
        let span = (self.last_commit_epoch - self.first_commit_epoch) as f64;
        if span <= 0.0 {
            return f64::from(self.commit_count);
        }
        f64::from(self.commit_count) / (span / SECONDS_PER_MONTH).max(1.0)
    }
}

/// One ranked entry of the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactoringTarget<V> {
    pub vertex: V,
    pub source_path: Option<PathBuf>,
    pub structural_impact: f64,
    pub change_score: f64,
    pub in_feedback_set: bool,
    /// Vertex count of the cycle region containing this vertex, zero when
    /// the vertex is acyclic.
    pub cycle_region_size: usize,
    /// Rank difference combining the structural and change orderings;
    /// larger means refactor sooner.
    pub priority: i64,
}

struct Signals {
    feedback: f64,
    payoff: f64,
    coupling: f64,
    region: f64,
}

impl Signals {
    fn impact(&self, w: &AssemblerWeights) -> f64 {
        w.feedback_membership * self.feedback
            + w.payoff_participation * self.payoff
            + w.coupling * self.coupling
            + w.cycle_size * self.region
    }
}

fn normalize(values: &mut [f64]) {
    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for v in values.iter_mut() {
            *v /= max;
        }
    }
}

/// Side table mapping vertices to the source file that defines them.
pub type VertexSourceMap<V> = HashMap<V, PathBuf>;

/// Ranks every vertex of the graph, most urgent first.
///
/// `sources` maps vertices to the files that define them and `history` maps
/// those files to their commit statistics; vertices missing from either map
/// simply score zero change-proneness.
pub fn assemble<V: Vertex>(
    graph: &DepGraph<V>,
    analysis: &GraphAnalysis<V>,
    sources: &VertexSourceMap<V>,
    history: &HashMap<PathBuf, ChangeProneness>,
    weights: &AssemblerWeights,
) -> Vec<RefactoringTarget<V>> {
    let view = graph.view();
    let n = graph.vertex_count();
    if n == 0 {
        return Vec::new();
    }

    let mut payoff_sums = vec![0.0_f64; n];
    for candidate in &analysis.candidates {
        let payoff = candidate.payoff.max(0.0);
        for endpoint in [&candidate.edge.source, &candidate.edge.target] {
            if let Some(id) = graph.id_of(endpoint) {
                payoff_sums[id] += payoff;
            }
        }
    }
    normalize(&mut payoff_sums);

    let mut couplings: Vec<f64> = (0..n).map(|id| view.weighted_degree(id) as f64).collect();
    normalize(&mut couplings);

    let max_region = analysis
        .cycles
        .regions()
        .iter()
        .map(|r| r.vertex_count())
        .max()
        .unwrap_or(0);

    let mut targets: Vec<RefactoringTarget<V>> = Vec::with_capacity(n);
    for id in 0..n {
        let vertex = graph.vertex(id).clone();
        let in_feedback_set = analysis
            .feedback_vertices
            .vertices
            .binary_search(&vertex)
            .is_ok();
        let region_size = analysis
            .cycles
            .get(&vertex)
            .map(|r| r.vertex_count())
            .unwrap_or(0);

        let signals = Signals {
            feedback: if in_feedback_set { 1.0 } else { 0.0 },
            payoff: payoff_sums[id],
            coupling: couplings[id],
            region: if max_region > 0 {
                region_size as f64 / max_region as f64
            } else {
                0.0
            },
        };

        let source_path = sources.get(&vertex).cloned();
        let change_score = source_path
            .as_ref()
            .and_then(|p| history.get(p))
            .map(|h| h.change_score())
            .unwrap_or(0.0);

        targets.push(RefactoringTarget {
            vertex,
            source_path,
            structural_impact: signals.impact(weights),
            change_score,
            in_feedback_set,
            cycle_region_size: region_size,
            priority: 0,
        });
    }

    // Rank both dimensions so that a higher number means "more". The
    // priority is structural rank minus the change rank counted from the
    // top, which is the same ordering as summing the two rankings: a vertex
    // must score well on both axes to reach the head of the list.
    let structural_rank = rank_by(&targets, |t| t.structural_impact);
    let change_rank = rank_by(&targets, |t| t.change_score);
    let count = targets.len() as i64;
    for (i, target) in targets.iter_mut().enumerate() {
        target.priority = structural_rank[i] - (count + 1 - change_rank[i]);
    }

    targets.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| {
                b.structural_impact
                    .partial_cmp(&a.structural_impact)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.vertex.cmp(&b.vertex))
    });
    targets
}

/// Ascending ranks starting at 1; the largest score gets rank `n` and tied
/// scores share a rank, so a dimension where everything ties (say, no
/// history at all) contributes nothing to the ordering.
fn rank_by<V: Vertex>(
    targets: &[RefactoringTarget<V>],
    score: impl Fn(&RefactoringTarget<V>) -> f64,
) -> Vec<i64> {
    let mut order: Vec<usize> = (0..targets.len()).collect();
    order.sort_by(|&a, &b| {
        score(&targets[a])
            .partial_cmp(&score(&targets[b]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut ranks = vec![0_i64; targets.len()];
    let mut current = 0_i64;
    for (pos, &idx) in order.iter().enumerate() {
        if pos == 0 || score(&targets[idx]) > score(&targets[order[pos - 1]]) {
            current = pos as i64 + 1;
        }
        ranks[idx] = current;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_graph;
    use crate::config::AnalysisConfig;
    use pretty_assertions::assert_eq;

    fn graph_from(edges: &[(&str, &str, u64)]) -> DepGraph<String> {
        let mut g = DepGraph::new();
        for (s, t, w) in edges {
            g.add_edge(s.to_string(), t.to_string(), *w).unwrap();
        }
        g
    }

    fn history_entry(commits: u32) -> ChangeProneness {
        ChangeProneness {
            first_commit_epoch: 0,
            last_commit_epoch: 6 * SECONDS_PER_MONTH as i64,
            commit_count: commits,
        }
    }

    #[test]
    fn change_score_is_commits_per_month() {
        let h = history_entry(12);
        assert!((h.change_score() - 2.0).abs() < 0.05);
    }

    #[test]
    fn single_commit_file_still_scores() {
        let h = ChangeProneness {
            first_commit_epoch: 100,
            last_commit_epoch: 100,
            commit_count: 1,
        };
        assert_eq!(h.change_score(), 1.0);
    }

    #[test]
    fn empty_graph_yields_empty_ranking() {
        let g: DepGraph<String> = DepGraph::new();
        let analysis = analyze_graph(&g, &AnalysisConfig::default());
        let targets = assemble(
            &g,
            &analysis,
            &HashMap::new(),
            &HashMap::new(),
            &AssemblerWeights::default(),
        );
        assert!(targets.is_empty());
    }

    #[test]
    fn churny_cycle_member_outranks_quiet_leaf() {
        // a <-> b is the cycle; c is an acyclic leaf with heavy churn.
        let g = graph_from(&[("a", "b", 2), ("b", "a", 2), ("a", "c", 1)]);
        let analysis = analyze_graph(&g, &AnalysisConfig::default());

        let mut sources = HashMap::new();
        for name in ["a", "b", "c"] {
            sources.insert(name.to_string(), PathBuf::from(format!("src/{name}.cs")));
        }
        let mut history = HashMap::new();
        history.insert(PathBuf::from("src/a.cs"), history_entry(30));
        history.insert(PathBuf::from("src/c.cs"), history_entry(30));

        let targets = assemble(
            &g,
            &analysis,
            &sources,
            &history,
            &AssemblerWeights::default(),
        );
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].cycle_region_size, 2);
        let a_pos = targets.iter().position(|t| t.vertex == "a").unwrap();
        let c_pos = targets.iter().position(|t| t.vertex == "c").unwrap();
        assert!(a_pos < c_pos, "cycle member with churn outranks the churny leaf");
    }

    #[test]
    fn vertices_without_history_score_zero_change() {
        let g = graph_from(&[("a", "b", 1)]);
        let analysis = analyze_graph(&g, &AnalysisConfig::default());
        let targets = assemble(
            &g,
            &analysis,
            &HashMap::new(),
            &HashMap::new(),
            &AssemblerWeights::default(),
        );
        assert!(targets.iter().all(|t| t.change_score == 0.0));
        assert!(targets.iter().all(|t| t.source_path.is_none()));
    }

    #[test]
    fn ranking_is_deterministic_under_ties() {
        let g = graph_from(&[("a", "b", 1), ("b", "a", 1), ("c", "d", 1), ("d", "c", 1)]);
        let analysis = analyze_graph(&g, &AnalysisConfig::default());
        let first = assemble(
            &g,
            &analysis,
            &HashMap::new(),
            &HashMap::new(),
            &AssemblerWeights::default(),
        );
        let second = assemble(
            &g,
            &analysis,
            &HashMap::new(),
            &HashMap::new(),
            &AssemblerWeights::default(),
        );
        let order: Vec<&String> = first.iter().map(|t| &t.vertex).collect();
        let again: Vec<&String> = second.iter().map(|t| &t.vertex).collect();
        assert_eq!(order, again);
    }

    #[test]
    fn report_rows_serialize() {
        let g = graph_from(&[("a", "b", 1), ("b", "a", 1)]);
        let analysis = analyze_graph(&g, &AnalysisConfig::default());
        let targets = assemble(
            &g,
            &analysis,
            &HashMap::new(),
            &HashMap::new(),
            &AssemblerWeights::default(),
        );
        let json = serde_json::to_string_pretty(&targets).unwrap();
        assert!(json.contains("structural_impact"));
    }
}

//! Integration tests for the branch-and-bound feedback vertex set solver
//! on graph families with known optimum sizes.

use std::collections::HashMap;
use tanglemap::analysis::fvs::{FvsSolver, SolveState};
use tanglemap::config::AnalysisConfig;
use tanglemap::graph::cycles::detect_cycles;
use tanglemap::graph::DepGraph;

fn graph_from(edges: &[(&str, &str, u64)]) -> DepGraph<String> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = DepGraph::new();
    for (s, t, w) in edges {
        g.add_edge(s.to_string(), t.to_string(), *w).unwrap();
    }
    g
}

fn directed_cycle(names: &[&str]) -> DepGraph<String> {
    let mut g = DepGraph::new();
    for i in 0..names.len() {
        let s = names[i].to_string();
        let t = names[(i + 1) % names.len()].to_string();
        g.add_edge(s, t, 1).unwrap();
    }
    g
}

/// Removing the solver's answer must leave the graph acyclic.
fn assert_solution_breaks_all_cycles(g: &DepGraph<String>, solution: &[String]) {
    let ids: Vec<usize> = solution.iter().map(|v| g.id_of(v).unwrap()).collect();
    let residual = g.view().without_vertices(&ids);
    assert!(
        detect_cycles(&residual).is_empty(),
        "solution {solution:?} leaves a cycle behind"
    );
}

#[test]
fn long_cycle_needs_exactly_one_vertex() {
    let g = directed_cycle(&["a", "b", "c", "d", "e", "f", "g", "h"]);
    let result = FvsSolver::new(g.view(), &AnalysisConfig::default()).solve();

    assert_eq!(result.k, 1);
    assert!(result.exact);
    assert_eq!(result.state, SolveState::Solved);
    assert_solution_breaks_all_cycles(&g, &result.vertices);
}

#[test]
fn bidirectional_clique_needs_all_but_one() {
    // K4 with every edge in both directions: any two remaining vertices
    // still form a two-cycle, so the optimum is n - 1.
    let names = ["a", "b", "c", "d"];
    let mut g = DepGraph::new();
    for s in &names {
        for t in &names {
            if s != t {
                g.add_edge(s.to_string(), t.to_string(), 1).unwrap();
            }
        }
    }
    let result = FvsSolver::new(g.view(), &AnalysisConfig::default()).solve();

    assert_eq!(result.k, 3);
    assert_solution_breaks_all_cycles(&g, &result.vertices);
}

#[test]
fn overlapping_triangles_share_one_cut_vertex() {
    // Two triangles glued on vertex b: b alone breaks both.
    let g = graph_from(&[
        ("a", "b", 1),
        ("b", "c", 1),
        ("c", "a", 1),
        ("b", "d", 1),
        ("d", "e", 1),
        ("e", "b", 1),
    ]);
    let result = FvsSolver::new(g.view(), &AnalysisConfig::default()).solve();

    assert_eq!(result.k, 1);
    assert_eq!(result.vertices, vec!["b".to_string()]);
    assert_solution_breaks_all_cycles(&g, &result.vertices);
}

#[test]
fn self_loops_are_always_in_the_solution() {
    let mut g = directed_cycle(&["a", "b", "c"]);
    g.add_self_loop("z".to_string(), 1).unwrap();
    let result = FvsSolver::new(g.view(), &AnalysisConfig::default()).solve();

    assert_eq!(result.k, 2);
    assert!(result.vertices.contains(&"z".to_string()));
    assert_solution_breaks_all_cycles(&g, &result.vertices);
}

#[test]
fn bounds_bracket_the_answer() {
    let g = graph_from(&[
        ("a", "b", 1),
        ("b", "a", 1),
        ("c", "d", 1),
        ("d", "c", 1),
        ("e", "f", 1),
        ("f", "e", 1),
    ]);
    let result = FvsSolver::new(g.view(), &AnalysisConfig::default()).solve();

    assert!(result.lower_bound <= result.k);
    assert!(result.k <= result.upper_bound);
    assert_eq!(result.k, 3);
    assert_solution_breaks_all_cycles(&g, &result.vertices);
}

#[test]
fn weighted_solve_routes_around_expensive_vertices() {
    // Triangle where b is nearly free: the weighted variant must pick it
    // even though all three vertices break the cycle equally well.
    let g = directed_cycle(&["a", "b", "c"]);
    let mut costs = HashMap::new();
    costs.insert("a".to_string(), 10.0);
    costs.insert("b".to_string(), 0.1);
    costs.insert("c".to_string(), 10.0);

    let result = FvsSolver::new(g.view(), &AnalysisConfig::default())
        .with_vertex_costs(&costs)
        .unwrap()
        .solve();

    assert_eq!(result.vertices, vec!["b".to_string()]);
    assert!((result.total_cost - 0.1).abs() < 1e-9);
}

#[test]
fn repeated_solves_agree_on_size_and_cost() {
    let g = graph_from(&[
        ("a", "b", 1),
        ("b", "c", 2),
        ("c", "a", 1),
        ("c", "d", 1),
        ("d", "e", 1),
        ("e", "c", 3),
        ("e", "f", 1),
        ("f", "d", 1),
    ]);
    let config = AnalysisConfig::default();
    let first = FvsSolver::new(g.view(), &config).solve();
    for _ in 0..3 {
        let again = FvsSolver::new(g.view(), &config).solve();
        assert_eq!(first.k, again.k);
        assert_eq!(first.total_cost, again.total_cost);
        assert_solution_breaks_all_cycles(&g, &again.vertices);
    }
}

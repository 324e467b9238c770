//! Error types for graph construction and analysis configuration.
//!
//! Analysis itself never fails hard: timeouts and invalid strategy results
//! degrade to heuristic output (see `analysis::fvs`). Errors here cover the
//! recoverable input class only: malformed weights, misconfigured options.
//! Contract violations such as referencing a vertex that is not part of the
//! graph are caller bugs and panic instead.

use thiserror::Error;

/// Errors raised while building a dependency graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// `add_edge` was called with identical endpoints. Self-loops model a
    /// trivial one-cycle and must be requested explicitly through
    /// [`add_self_loop`](crate::graph::DepGraph::add_self_loop).
    #[error("edge endpoints are equal; self-loops must be added with add_self_loop")]
    SelfLoop,

    /// Edge weights are reference counts and must be at least 1.
    #[error("edge weight must be a positive reference count, got {0}")]
    InvalidWeight(u64),

    /// Per-vertex removal costs for the weighted FVS variant must be
    /// finite and non-negative.
    #[error("vertex cost must be finite and non-negative, got {0}")]
    InvalidVertexCost(f64),
}

/// Errors raised while validating an [`AnalysisConfig`](crate::config::AnalysisConfig).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("pagerank damping must be in (0, 1), got {0}")]
    InvalidDamping(f64),

    #[error("pagerank iteration count must be at least 1")]
    ZeroIterations,

    #[error("target treewidth must be at least 1")]
    ZeroTargetEta,

    #[error("{name} weight must be finite and non-negative, got {value}")]
    InvalidAssemblerWeight { name: &'static str, value: f64 },
}

//! Tanglemap ranks the classes of a codebase for refactoring by combining
//! the structure of its dependency cycles with how often each class
//! actually changes.
//!
//! The heavy lifting happens in [`analysis`]: cycle-region detection over a
//! directed edge-weighted multigraph, design-structure-matrix ordering with
//! an edge-removal payoff ranking, an anytime branch-and-bound minimum
//! feedback vertex set solver, and a PageRank-based feedback arc set
//! heuristic. [`priority`] folds those structural signals together with
//! commit history into the final ranked report.
//!
//! ```
//! use tanglemap::analysis::analyze_graph;
//! use tanglemap::config::AnalysisConfig;
//! use tanglemap::graph::DepGraph;
//!
//! let mut graph = DepGraph::new();
//! graph.add_edge("Billing".to_string(), "Orders".to_string(), 3).unwrap();
//! graph.add_edge("Orders".to_string(), "Billing".to_string(), 1).unwrap();
//!
//! let analysis = analyze_graph(&graph, &AnalysisConfig::default());
//! assert_eq!(analysis.feedback_vertices.k, 1);
//! assert_eq!(analysis.feedback_arcs.len(), 1);
//! ```

pub mod analysis;
pub mod config;
pub mod errors;
pub mod graph;
pub mod priority;

pub use analysis::{analyze_graph, GraphAnalysis};
pub use config::{AnalysisConfig, AssemblerWeights};
pub use errors::{ConfigError, GraphError};
pub use graph::{DepGraph, Edge, GraphView, Vertex};
pub use priority::{assemble, ChangeProneness, RefactoringTarget, VertexSourceMap};

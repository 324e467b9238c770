//! Analysis configuration.
//!
//! All knobs have serde defaults so a partial TOML/JSON table deserializes
//! into a usable configuration; `validate` rejects values the solvers cannot
//! work with. `AnalysisConfig::default()` matches the serde defaults.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of power-iteration steps for the PageRank arc-set
/// heuristic. Overridable per run via [`AnalysisConfig::pagerank_iterations`].
pub const DEFAULT_PAGERANK_ITERATIONS: usize = 50;

/// Weights used by the result assembler when combining structural signals
/// into a single per-vertex impact score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblerWeights {
    /// Weight of feedback-vertex-set membership.
    #[serde(default = "default_feedback_weight")]
    pub feedback_membership: f64,

    /// Weight of participation in high-payoff edge removals.
    #[serde(default = "default_payoff_weight")]
    pub payoff_participation: f64,

    /// Weight of coupling (normalized weighted degree).
    #[serde(default = "default_coupling_weight")]
    pub coupling: f64,

    /// Weight of the size of the cyclic region the vertex belongs to.
    #[serde(default = "default_cycle_size_weight")]
    pub cycle_size: f64,
}

fn default_feedback_weight() -> f64 {
    0.4
}

fn default_payoff_weight() -> f64 {
    0.25
}

fn default_coupling_weight() -> f64 {
    0.2
}

fn default_cycle_size_weight() -> f64 {
    0.15
}

impl Default for AssemblerWeights {
    fn default() -> Self {
        Self {
            feedback_membership: default_feedback_weight(),
            payoff_participation: default_payoff_weight(),
            coupling: default_coupling_weight(),
            cycle_size: default_cycle_size_weight(),
        }
    }
}

impl AssemblerWeights {
    fn validate_weight(value: f64, name: &'static str) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidAssemblerWeight { name, value })
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_weight(self.feedback_membership, "feedback_membership")?;
        Self::validate_weight(self.payoff_participation, "payoff_participation")?;
        Self::validate_weight(self.coupling, "coupling")?;
        Self::validate_weight(self.cycle_size, "cycle_size")?;
        Ok(())
    }
}

/// Top-level configuration for a whole-graph analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Shared deadline for the multi-strategy modulator search, in seconds.
    #[serde(default = "default_strategy_deadline_secs")]
    pub strategy_deadline_secs: u64,

    /// Wall-clock budget for a feedback-vertex-set solve, in seconds.
    #[serde(default = "default_fvs_budget_secs")]
    pub fvs_budget_secs: u64,

    /// Treewidth bound the modulator strategies aim for.
    #[serde(default = "default_target_eta")]
    pub target_eta: usize,

    /// Size budget for modulator candidates.
    #[serde(default = "default_max_modulator_size")]
    pub max_modulator_size: usize,

    /// Power-iteration steps for the PageRank arc-set heuristic.
    #[serde(default = "default_pagerank_iterations")]
    pub pagerank_iterations: usize,

    /// Damping factor for the PageRank arc-set heuristic.
    #[serde(default = "default_pagerank_damping")]
    pub pagerank_damping: f64,

    /// Weights for the result assembler.
    #[serde(default)]
    pub weights: AssemblerWeights,
}

fn default_strategy_deadline_secs() -> u64 {
    60
}

fn default_fvs_budget_secs() -> u64 {
    60
}

fn default_target_eta() -> usize {
    3
}

fn default_max_modulator_size() -> usize {
    16
}

fn default_pagerank_iterations() -> usize {
    DEFAULT_PAGERANK_ITERATIONS
}

fn default_pagerank_damping() -> f64 {
    0.85
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            strategy_deadline_secs: default_strategy_deadline_secs(),
            fvs_budget_secs: default_fvs_budget_secs(),
            target_eta: default_target_eta(),
            max_modulator_size: default_max_modulator_size(),
            pagerank_iterations: default_pagerank_iterations(),
            pagerank_damping: default_pagerank_damping(),
            weights: AssemblerWeights::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check that every knob is in a range the solvers accept.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pagerank_damping > 0.0 && self.pagerank_damping < 1.0) {
            return Err(ConfigError::InvalidDamping(self.pagerank_damping));
        }
        if self.pagerank_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.target_eta == 0 {
            return Err(ConfigError::ZeroTargetEta);
        }
        self.weights.validate()
    }

    /// Deadline for the modulator strategy race.
    pub fn strategy_deadline(&self) -> Duration {
        Duration::from_secs(self.strategy_deadline_secs)
    }

    /// Wall-clock budget for a feedback-vertex-set solve.
    pub fn fvs_budget(&self) -> Duration {
        Duration::from_secs(self.fvs_budget_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn default_matches_serde_defaults() {
        let from_empty: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(from_empty, AnalysisConfig::default());
    }

    #[test]
    fn rejects_out_of_range_damping() {
        let mut config = AnalysisConfig::default();
        config.pagerank_damping = 1.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidDamping(1.0))
        );
    }

    #[test]
    fn rejects_zero_iterations() {
        let mut config = AnalysisConfig::default();
        config.pagerank_iterations = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroIterations));
    }

    #[test]
    fn rejects_negative_assembler_weight() {
        let mut config = AnalysisConfig::default();
        config.weights.coupling = -0.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAssemblerWeight { name: "coupling", .. })
        ));
    }
}

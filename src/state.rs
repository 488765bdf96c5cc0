//! ═══════════════════════════════════════════════════════════════════════════════
//! STATE — Cognitive State and Hypotheses
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! The evolving simulation state: foam value phi, entropy, coherence, the
//! negentropy budget, and the accumulated hypothesis pool. Treated as
//! immutable per step; every stepper produces a fresh value.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{ConfigError, FoamResult};

// ═══════════════════════════════════════════════════════════════════════════════
// HYPOTHESES
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a hypothesis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HypothesisOrigin {
    /// Produced by the engine's own stub generator
    Internal,
    /// Injected by an external generator collaborator
    External,
}

/// A candidate idea. Never mutated after creation; collapse wraps it with
/// derived phase/amplitude fields instead of touching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: String,
    pub text: String,
    /// Novelty score in [0, 1]
    pub novelty: f64,
    /// Risk score in [0, 1]
    pub risk: f64,
    pub origin: HypothesisOrigin,
    /// State entropy at injection time
    pub base_entropy: f64,
}

impl Hypothesis {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        novelty: f64,
        risk: f64,
        origin: HypothesisOrigin,
        base_entropy: f64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            novelty: novelty.clamp(0.0, 1.0),
            risk: risk.clamp(0.0, 1.0),
            origin,
            base_entropy,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COGNITIVE STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// The evolving simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveState {
    /// Current foam value; >= 0, drives the convergence check
    pub phi: f64,
    /// Bounded scalar, clamped to the configured entropy range
    pub entropy: f64,
    /// Bounded [0, 1], decays under barrier pressure
    pub coherence: f64,
    /// Bookkeeping budget, monotonically consumed
    pub negentropy_reserve: f64,
    /// Accumulated candidate ideas; insertion order is the cluster tie-break
    pub hypotheses: Vec<Hypothesis>,
}

impl CognitiveState {
    /// Build the initial state for a run. Coherence and entropy baselines
    /// rise monotonically with complexity; phi always starts at 1.0.
    ///
    /// Goal text may be empty (rejecting empty goals is a caller concern);
    /// only non-positive complexity is an error.
    pub fn initialize(_goal: &str, complexity: f64, config: &EngineConfig) -> FoamResult<Self> {
        if !complexity.is_finite() || complexity <= 0.0 {
            return Err(ConfigError::NonPositiveComplexity(complexity).into());
        }

        let normalized = (complexity / 10.0).clamp(0.0, 1.0);
        Ok(Self {
            phi: 1.0,
            entropy: (0.4 * complexity).clamp(config.entropy_floor, config.entropy_ceiling),
            coherence: (0.7 + 0.1 * normalized).clamp(0.0, 1.0),
            negentropy_reserve: 1.0 + 0.1 * complexity,
            hypotheses: Vec::new(),
        })
    }

    /// Return a copy with one more hypothesis and the entropy cost applied.
    pub fn with_hypothesis(&self, hypothesis: Hypothesis, config: &EngineConfig) -> Self {
        let mut next = self.clone();
        next.entropy = (next.entropy + config.entropy_per_hypothesis)
            .clamp(config.entropy_floor, config.entropy_ceiling);
        next.hypotheses.push(hypothesis);
        next
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FUNDAMENTAL LIMIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Effective dimension of the solution space: D = max(1, 2 * complexity)
pub fn effective_dimension(complexity: f64) -> f64 {
    (2.0 * complexity).max(1.0)
}

/// Theoretical floor for phi: phi_min = (hbar_G / 2) * ln(D + 1)
pub fn phi_min(heisenberg_constant: f64, complexity: f64) -> f64 {
    (heisenberg_constant / 2.0) * (effective_dimension(complexity) + 1.0).ln()
}

/// Formalized problem complexity: goal length plus the declared level.
/// Feeds the diagnostics readout only.
pub fn formalized_complexity(goal: &str, complexity: f64) -> f64 {
    goal.chars().count() as f64 / 50.0 + complexity * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_baseline() {
        let cfg = EngineConfig::default();
        let state = CognitiveState::initialize("test", 5.0, &cfg).unwrap();
        assert_eq!(state.phi, 1.0);
        assert!(state.hypotheses.is_empty());
        // 0.4 * 5 = 2.0, exactly the ceiling
        assert_eq!(state.entropy, 2.0);
        // 0.7 + 0.1 * 0.5
        assert!((state.coherence - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_initialize_monotone_in_complexity() {
        let cfg = EngineConfig::default();
        let low = CognitiveState::initialize("", 1.0, &cfg).unwrap();
        let high = CognitiveState::initialize("", 4.0, &cfg).unwrap();
        assert!(high.entropy > low.entropy);
        assert!(high.coherence > low.coherence);
        assert!(high.negentropy_reserve > low.negentropy_reserve);
    }

    #[test]
    fn test_initialize_rejects_bad_complexity() {
        let cfg = EngineConfig::default();
        assert!(CognitiveState::initialize("x", 0.0, &cfg).is_err());
        assert!(CognitiveState::initialize("x", -3.0, &cfg).is_err());
        assert!(CognitiveState::initialize("x", f64::NAN, &cfg).is_err());
        // Empty goal is fine
        assert!(CognitiveState::initialize("", 1.0, &cfg).is_ok());
    }

    #[test]
    fn test_with_hypothesis_raises_entropy() {
        let cfg = EngineConfig::default();
        let state = CognitiveState::initialize("x", 1.0, &cfg).unwrap();
        let h = Hypothesis::new("h1", "idea", 0.5, 0.2, HypothesisOrigin::Internal, 0.4);
        let next = state.with_hypothesis(h, &cfg);
        assert_eq!(next.hypotheses.len(), 1);
        assert!((next.entropy - (state.entropy + cfg.entropy_per_hypothesis)).abs() < 1e-12);
        // Original untouched
        assert!(state.hypotheses.is_empty());
    }

    #[test]
    fn test_phi_min_formula() {
        // hbar = 0.7, complexity = 5: D = 10, phi_min = 0.35 * ln(11)
        let expected = 0.35 * 11f64.ln();
        assert!((phi_min(0.7, 5.0) - expected).abs() < 1e-12);
        // Dimension floors at 1 for tiny complexity: phi_min = 0.5 * ln(2)
        assert!((phi_min(1.0, 0.1) - 0.5 * 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_hypothesis_scores_clamped() {
        let h = Hypothesis::new("h", "t", 1.7, -0.4, HypothesisOrigin::External, 0.0);
        assert_eq!(h.novelty, 1.0);
        assert_eq!(h.risk, 0.0);
    }
}

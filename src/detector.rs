//! ═══════════════════════════════════════════════════════════════════════════════
//! DETECTOR — Revolution Activation Gates
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Decides whether the system should leave the stable regime and begin
//! accumulating toward a collapse. Four gates, all required:
//!
//!   1. Stagnation  — mean |phi gradient| over the last 3 steps is tiny
//!   2. Tension     — accumulated pressure crosses the discounted threshold
//!   3. Coherence   — a sufficiently coherent hypothesis cluster exists
//!   4. Success     — the estimated collapse success probability is high
//!
//! Pure predicate. Historical collapse counts are an explicit argument,
//! never hidden state, so identical inputs always give identical answers.
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::cluster;
use crate::config::{EngineConfig, MetaParams};
use crate::state::CognitiveState;
use crate::stats::mean_absolute_difference;
use crate::trajectory::{recent_phi_values, SimulationStep};

/// Running collapse outcome counts for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollapseStats {
    pub successful: u32,
    pub failed: u32,
}

impl CollapseStats {
    /// Fraction of collapse attempts that succeeded; None before any attempt
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.successful + self.failed;
        if total == 0 {
            None
        } else {
            Some(self.successful as f64 / total as f64)
        }
    }
}

pub struct RevolutionDetector;

impl RevolutionDetector {
    /// All four gates, AND-ed. See module docs.
    #[allow(clippy::too_many_arguments)]
    pub fn should_activate(
        state: &CognitiveState,
        history: &[SimulationStep],
        tension: f64,
        meta: &MetaParams,
        phi_min: f64,
        collapse_stats: &CollapseStats,
        config: &EngineConfig,
    ) -> bool {
        // Gate 1: stagnation. With fewer than 3 recorded steps progress is
        // treated as infinite and activation is impossible.
        if progress_rate(history) > meta.min_progress_rate {
            return false;
        }

        // Gate 2: tension against the Heisenberg-discounted threshold
        let adjusted = meta.critical_tension * (1.0 - meta.heisenberg_constant / 2.0);
        if tension < adjusted {
            return false;
        }

        // Gate 3: cluster coherence
        let coherence =
            cluster::best_coherence(&state.hypotheses, &config.cluster, config.entropy_ceiling);
        if coherence < meta.min_coherence {
            return false;
        }

        // Gate 4: estimated success probability
        Self::success_probability(state, coherence, phi_min, collapse_stats, config)
            >= meta.min_success_threshold
    }

    /// Monotonic in cluster coherence, proximity to the fundamental limit,
    /// and the historical success rate; clamped away from certainty.
    pub fn success_probability(
        state: &CognitiveState,
        cluster_coherence: f64,
        phi_min: f64,
        collapse_stats: &CollapseStats,
        config: &EngineConfig,
    ) -> f64 {
        let w = &config.detector;

        // Proximity saturates where the barrier regime begins
        let stability_limit = (config.barrier_onset * phi_min).max(1e-9);
        let proximity = 1.0 - state.phi / stability_limit;

        let mut p = w.base + w.coherence_weight * cluster_coherence + w.proximity_weight * proximity;

        if let Some(rate) = collapse_stats.success_rate() {
            p *= w.history_base + w.history_weight * rate;
        }

        p.clamp(w.prob_floor, w.prob_ceiling)
    }
}

/// Mean absolute phi gradient over the last 3 recorded steps;
/// infinite when fewer than 3 exist.
fn progress_rate(history: &[SimulationStep]) -> f64 {
    if history.len() < 3 {
        return f64::INFINITY;
    }
    mean_absolute_difference(&recent_phi_values(history, 3))
}

//! ═══════════════════════════════════════════════════════════════════════════════
//! DIAGNOSTICS — Post-Run Readout
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Scores a completed trajectory. Every component is a deterministic
//! function of the history; nothing here feeds back into the engine.
//!
//! genius = 0.3 * proximity + 0.3 * optimality + 0.2 * coherence + 0.2 * stability
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::state::CognitiveState;
use crate::stats::{mean_successive_difference, variance};
use crate::trajectory::{recent_phi_values, SimulationStep};

/// Window of trailing phi values used for the stability estimate
const STABILITY_WINDOW: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Composite score in [0, 1]
    pub genius_score: f64,
    /// How close the final phi sits to the fundamental limit
    pub phi_proximity: f64,
    /// Achieved descent against the ideal pure-decay path
    pub path_optimality: f64,
    /// Final state coherence
    pub coherence: f64,
    /// Meta-stability of the trailing phi window
    pub stability: f64,
    /// Mean successive phi difference over the whole run
    pub convergence_rate: f64,
    /// One-line human readout
    pub summary: String,
}

impl Diagnostics {
    pub fn evaluate(
        final_state: &CognitiveState,
        history: &[SimulationStep],
        phi_min: f64,
        config: &EngineConfig,
    ) -> Self {
        let phi_final = final_state.phi;

        let phi_proximity = (phi_min / (phi_final + 1e-3)).min(1.0);
        let path_optimality = path_optimality(history, config);
        let coherence = final_state.coherence;
        let stability = stability(history);

        let genius_score = 0.3 * phi_proximity
            + 0.3 * path_optimality
            + 0.2 * coherence
            + 0.2 * stability;

        let phi_trace: Vec<f64> = history.iter().map(|s| s.phi_value).collect();
        let convergence_rate = mean_successive_difference(&phi_trace);

        let summary = format!(
            "genius index {:.1}%: phi {:.6} against floor {:.6} after {} steps",
            genius_score * 100.0,
            phi_final,
            phi_min,
            history.len(),
        );

        Self {
            genius_score,
            phi_proximity,
            path_optimality,
            coherence,
            stability,
            convergence_rate,
            summary,
        }
    }
}

/// Ratio of the ideal pure-decay step count to the steps actually spent
/// reaching the final phi. Collapses shorten the path, pushing this up.
fn path_optimality(history: &[SimulationStep], config: &EngineConfig) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let first = history[0].phi_value.max(1e-9);
    let last = history[history.len() - 1].phi_value.max(1e-9);
    if last >= first {
        return 0.0;
    }
    // Steps a pure decay chain would need for the same drop
    let ideal = (last / first).ln() / config.decay_factor.ln();
    (ideal / history.len() as f64).clamp(0.0, 1.0)
}

/// 1 minus the normalized variance of the trailing phi window. For values
/// bounded in [0, 1] the maximum variance is 0.25.
fn stability(history: &[SimulationStep]) -> f64 {
    if history.len() < 3 {
        return 0.5;
    }
    let window = recent_phi_values(history, STABILITY_WINDOW);
    let normalized = (variance(&window) / 0.25).min(1.0);
    1.0 - normalized
}

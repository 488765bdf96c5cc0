//! ═══════════════════════════════════════════════════════════════════════════════
//! COLLAPSE — Discontinuous Regime Transition
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! The revolutionary collapse: select the most coherent hypothesis cluster,
//! wrap its members with derived phase/amplitude fields, cut phi sharply and
//! drain entropy. A miss (no cluster) is a recoverable no-op tagged
//! COLLAPSE_FAILED, never an error.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::cluster::{self, CriticalCluster};
use crate::config::{EngineConfig, MetaParams};
use crate::state::{CognitiveState, Hypothesis};
use crate::trajectory::{unix_millis, SimulationStep, StepMode, Strategy};

/// A cluster member wrapped with derived collapse fields. The underlying
/// hypothesis itself is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasedHypothesis {
    pub hypothesis: Hypothesis,
    /// Phase shift in radians, derived from novelty
    pub phase: f64,
    pub amplitude: f64,
    /// Amplitude normalized over the cluster (sums to 1)
    pub normalized_amplitude: f64,
}

/// Terminal readout emitted by a successful collapse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeniusReadout {
    pub phased: Vec<PhasedHypothesis>,
    pub cluster_coherence: f64,
    pub summary: String,
}

/// Result of one collapse attempt
#[derive(Debug, Clone)]
pub struct CollapseOutcome {
    pub step: SimulationStep,
    /// Present only when the collapse succeeded
    pub readout: Option<GeniusReadout>,
}

impl CollapseOutcome {
    pub fn succeeded(&self) -> bool {
        self.step.mode == StepMode::RevolutionaryCollapse
    }
}

pub struct CollapseOperator;

impl CollapseOperator {
    /// Attempt the discontinuous transition. Empty hypothesis pools and
    /// pools with no coherent cluster both degrade to a failed-collapse
    /// record with the state untouched.
    pub fn execute(
        state: &CognitiveState,
        _meta: &MetaParams,
        config: &EngineConfig,
    ) -> CollapseOutcome {
        let best =
            cluster::best_cluster(&state.hypotheses, &config.cluster, config.entropy_ceiling);

        let cluster = match best {
            Some(c) if !c.hypotheses.is_empty() => c,
            _ => return Self::miss(state),
        };

        let phased = phase_shift(&cluster);

        let new_phi = state.phi * (1.0 - state.coherence * 0.5);
        let new_entropy = (state.entropy * 0.9).max(config.entropy_floor);

        let next = CognitiveState {
            phi: new_phi,
            entropy: new_entropy,
            coherence: state.coherence,
            negentropy_reserve: state.negentropy_reserve,
            hypotheses: state.hypotheses.clone(),
        };

        let summary = format!(
            "collapse folded {} hypotheses (coherence {:.3}) into phi {:.6}",
            cluster.hypotheses.len(),
            cluster.coherence,
            new_phi,
        );

        CollapseOutcome {
            step: SimulationStep {
                phi_value: new_phi,
                phi_change: new_phi - state.phi,
                state: next,
                mode: StepMode::RevolutionaryCollapse,
                strategy: Strategy::GlobalRestart,
                timestamp_ms: unix_millis(),
                critical_set: Some(cluster.clone()),
            },
            readout: Some(GeniusReadout {
                phased,
                cluster_coherence: cluster.coherence,
                summary,
            }),
        }
    }

    fn miss(state: &CognitiveState) -> CollapseOutcome {
        CollapseOutcome {
            step: SimulationStep {
                state: state.clone(),
                phi_value: state.phi,
                phi_change: 0.0,
                mode: StepMode::CollapseFailed,
                strategy: Strategy::LocalRefinement,
                timestamp_ms: unix_millis(),
                critical_set: None,
            },
            readout: None,
        }
    }
}

/// Wrap cluster members with phase and amplitude. Phase favors low-novelty
/// (well-grounded) members toward zero shift; amplitudes grow with novelty
/// and with cluster coherence, then normalize to unit total.
fn phase_shift(cluster: &CriticalCluster) -> Vec<PhasedHypothesis> {
    let raw: Vec<(f64, f64)> = cluster
        .hypotheses
        .iter()
        .map(|h| {
            let phase = PI * (1.0 - h.novelty);
            let amplitude = (0.5 + 0.5 * h.novelty) * (1.0 + cluster.coherence);
            (phase, amplitude)
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, a)| a.abs()).sum();
    let total = if total > 0.0 { total } else { 1.0 };

    cluster
        .hypotheses
        .iter()
        .zip(raw)
        .map(|(h, (phase, amplitude))| PhasedHypothesis {
            hypothesis: h.clone(),
            phase,
            amplitude,
            normalized_amplitude: amplitude / total,
        })
        .collect()
}

//! ═══════════════════════════════════════════════════════════════════════════════
//! TRAJECTORY — Step Records and Modes
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! One immutable snapshot per micro-step, appended to a run's history.
//! History order is the sole source of truth for detection, adaptation and
//! convergence decisions; records are never edited after append.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cluster::CriticalCluster;
use crate::state::CognitiveState;

/// Closed set of step modes. Every consumer matches exhaustively; there is
/// no unknown-mode fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepMode {
    /// Ordinary decay step in the stable regime
    Stable,
    /// Decay step while tension accumulates toward a collapse
    Accumulating,
    /// A successful discontinuous collapse
    RevolutionaryCollapse,
    /// A collapse attempt that found no coherent cluster; recoverable
    CollapseFailed,
}

impl StepMode {
    pub fn name(&self) -> &'static str {
        match self {
            StepMode::Stable => "STABLE",
            StepMode::Accumulating => "ACCUMULATING",
            StepMode::RevolutionaryCollapse => "REVOLUTIONARY_COLLAPSE",
            StepMode::CollapseFailed => "COLLAPSE_FAILED",
        }
    }
}

/// Refinement strategy chosen for a step. Diversity of recent choices
/// feeds the outer loop's cadence adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    LocalRefinement,
    GlobalRestart,
    ParameterRescaling,
}

impl Strategy {
    pub const COUNT: usize = 3;

    pub fn index(&self) -> usize {
        match self {
            Strategy::LocalRefinement => 0,
            Strategy::GlobalRestart => 1,
            Strategy::ParameterRescaling => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::LocalRefinement => "local_refinement",
            Strategy::GlobalRestart => "global_restart",
            Strategy::ParameterRescaling => "parameter_rescaling",
        }
    }
}

/// Immutable trajectory record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStep {
    /// Full state snapshot after the step
    pub state: CognitiveState,
    /// phi after the step
    pub phi_value: f64,
    /// phi after minus phi before
    pub phi_change: f64,
    pub mode: StepMode,
    pub strategy: Strategy,
    /// Wall-clock milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    /// Present only on collapse steps
    pub critical_set: Option<CriticalCluster>,
}

/// Wall clock as Unix milliseconds; 0 if the clock is before the epoch
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// phi values of the trailing `n` steps, oldest first
pub fn recent_phi_values(history: &[SimulationStep], n: usize) -> Vec<f64> {
    let start = history.len().saturating_sub(n);
    history[start..].iter().map(|s| s.phi_value).collect()
}

/// The trailing `n` steps of a history, oldest first
pub fn last_window(history: &[SimulationStep], n: usize) -> &[SimulationStep] {
    let start = history.len().saturating_sub(n);
    &history[start..]
}

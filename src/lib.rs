//! ═══════════════════════════════════════════════════════════════════════════════
//! FOAM — Dual-Loop Cognitive Foam Relaxation Engine
//! ═══════════════════════════════════════════════════════════════════════════════
//! Inner loop decays the foam value phi toward a fundamental floor; the
//! outer loop retunes the control constant; stagnation pressure triggers
//! discontinuous collapse transitions. One crate, no hidden state.
//! ═══════════════════════════════════════════════════════════════════════════════

// ═══════════════════════════════════════════════════════════════════════════════
// FOUNDATION MODULES — errors, configuration, primitives
// ═══════════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod error;
pub mod noise;
pub mod stats;

// Re-export common error types
pub use error::{FoamError, FoamResult};

// ═══════════════════════════════════════════════════════════════════════════════
// CORE MODULES — state evolution, detection, collapse, adaptation
// ═══════════════════════════════════════════════════════════════════════════════

pub mod adapter;
pub mod cluster;
pub mod collapse;
pub mod detector;
pub mod state;
pub mod stepper;
pub mod tension;
pub mod trajectory;

// ═══════════════════════════════════════════════════════════════════════════════
// ORCHESTRATION AND COLLABORATORS
// ═══════════════════════════════════════════════════════════════════════════════

pub mod diagnostics;
pub mod engine;
pub mod generator;
pub mod physics;

pub use engine::{
    AuxiliaryComputation, Outcome, Problem, ProblemKind, ProgressEvent, Regime, SimulationEngine,
    SimulationResult,
};

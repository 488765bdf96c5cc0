//! ═══════════════════════════════════════════════════════════════════════════════
//! TENSION — Stagnation Pressure Accumulator
//! ═══════════════════════════════════════════════════════════════════════════════
//! Accumulates across inner steps; reset to exactly zero when a collapse
//! fires or the regime returns to stable.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::EngineConfig;

#[derive(Debug, Clone, Default)]
pub struct TensionAccumulator {
    tension: f64,
}

impl TensionAccumulator {
    pub fn new() -> Self {
        Self { tension: 0.0 }
    }

    /// tension' = tension + |phi_change| * alpha + max(0, entropy - target) * beta
    pub fn update(&mut self, phi_change: f64, entropy: f64, config: &EngineConfig) -> f64 {
        self.tension += phi_change.abs() * config.tension_alpha
            + (entropy - config.target_entropy).max(0.0) * config.tension_beta;
        self.tension
    }

    pub fn value(&self) -> f64 {
        self.tension
    }

    pub fn reset(&mut self) {
        self.tension = 0.0;
    }
}

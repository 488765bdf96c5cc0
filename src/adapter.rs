//! ═══════════════════════════════════════════════════════════════════════════════
//! ADAPTER — Outer-Loop Meta Adaptation
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Runs once per outer iteration: reads the trailing trajectory window,
//! estimates the convergence rate, and retunes the Heisenberg constant.
//! Descent that is both fast and already near the floor widens exploration
//! (x1.5); stagnation tightens it (x0.7). The constant is clamped back into
//! its configured range after every adaptation.
//!
//! Cadence: the Shannon diversity of recent strategy choices shrinks or
//! grows the adaptation window within [2, max_meta_window].
//!
//! Pure function of its inputs.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::{EngineConfig, MetaParams};
use crate::stats::{mean_successive_difference, shannon_entropy};
use crate::trajectory::{SimulationStep, Strategy};

pub struct MetaAdapter;

impl MetaAdapter {
    pub fn adapt(
        recent: &[SimulationStep],
        meta: &MetaParams,
        phi_min: f64,
        config: &EngineConfig,
    ) -> MetaParams {
        let mut next = meta.clone();

        let phi_values: Vec<f64> = recent.iter().map(|s| s.phi_value).collect();
        let rate = mean_successive_difference(&phi_values);

        let current_phi = phi_values.last().copied().unwrap_or(f64::INFINITY);
        let near_floor = (current_phi - phi_min).abs() <= 0.2 * phi_min;

        if rate <= config.overshoot_rate && near_floor {
            // Converging too fast right at the floor: explore more
            next.heisenberg_constant *= 1.5;
        } else if rate.abs() < config.stagnation_band {
            // Stagnant: tighten
            next.heisenberg_constant *= 0.7;
        }
        next.clamp_heisenberg(config);

        next.meta_window = adapt_cadence(recent, next.meta_window, config);
        next
    }
}

/// Diversity-driven window adjustment, floored at 2 and capped at the
/// configured maximum.
fn adapt_cadence(recent: &[SimulationStep], window: usize, config: &EngineConfig) -> usize {
    let mut counts = [0usize; Strategy::COUNT];
    for step in recent {
        counts[step.strategy.index()] += 1;
    }
    let diversity = shannon_entropy(&counts);

    if diversity < config.low_diversity {
        ((window as f64 * 0.8).floor() as usize).max(2)
    } else if diversity > config.high_diversity {
        ((window as f64 * 1.2).ceil() as usize).min(config.max_meta_window)
    } else {
        window
    }
}

//! ═══════════════════════════════════════════════════════════════════════════════
//! STEPPER — Inner-Loop State Refinement
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! One micro-step: decay phi, drain entropy toward its floor, apply barrier
//! pressure to coherence near the fundamental limit, and consume the
//! negentropy budget. The deterministic variant (NoNoise) is exact; the
//! stochastic variant adds bounded noise scaled by the Heisenberg constant
//! and clamps every bounded quantity afterwards.
//!
//! A step is atomic: the new record is built from an immutable snapshot and
//! the caller swaps it in only once the computation is complete.
//! ═══════════════════════════════════════════════════════════════════════════════

use crate::config::{EngineConfig, MetaParams, StrategyWeights};
use crate::noise::NoiseSource;
use crate::state::CognitiveState;
use crate::trajectory::{unix_millis, SimulationStep, StepMode, Strategy};

pub struct InnerLoopStepper;

impl InnerLoopStepper {
    /// Advance the state one micro-step. `mode` carries the current regime
    /// flavor (Stable or Accumulating); collapse steps are produced by the
    /// collapse operator, never here.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        state: &CognitiveState,
        meta: &MetaParams,
        phi_min: f64,
        complexity: f64,
        config: &EngineConfig,
        noise: &mut dyn NoiseSource,
        mode: StepMode,
    ) -> SimulationStep {
        let strategy = choose_strategy(&config.strategies, noise);

        // Bounded noise proportional to the control constant; exactly zero
        // for the deterministic source
        let jitter = meta.heisenberg_constant * config.noise_scale * noise.next_centered();

        let phi = (state.phi * config.decay_factor + config.phi_increment + jitter).max(0.0);

        let entropy = (state.entropy - config.entropy_decrement + jitter * 0.5)
            .clamp(config.entropy_floor, config.entropy_ceiling);

        // Barrier pressure rises as phi approaches the fundamental limit
        let barrier = barrier_pressure(state.phi, phi_min, config);
        let coherence = (state.coherence - config.coherence_decay_rate * barrier)
            .clamp(config.coherence_floor, 1.0);

        // Entropy-invariant violation drains the negentropy budget
        let violation = entropy_invariant_violation(entropy, complexity);
        let reserve = (state.negentropy_reserve
            - config.step_cost
            - config.invariant_coupling * violation)
            .max(0.0);

        let next = CognitiveState {
            phi,
            entropy,
            coherence,
            negentropy_reserve: reserve,
            hypotheses: state.hypotheses.clone(),
        };

        SimulationStep {
            phi_value: phi,
            phi_change: phi - state.phi,
            state: next,
            mode,
            strategy,
            timestamp_ms: unix_millis(),
            critical_set: None,
        }
    }
}

/// Barrier term: active only below `barrier_onset * phi_min`, growing
/// quadratically with the overshoot past the limit.
pub fn barrier_pressure(phi: f64, phi_min: f64, config: &EngineConfig) -> f64 {
    if phi_min <= 0.0 || phi >= config.barrier_onset * phi_min {
        return 0.0;
    }
    config.barrier_strength * (1.0 - phi / phi_min).powi(2)
}

/// Squared violation of the entropy invariant H + H_struct = K(G0)
fn entropy_invariant_violation(entropy: f64, complexity: f64) -> f64 {
    let structural = 0.3 * complexity;
    let target_constant = 0.8 * (complexity + 1.0);
    let violation = entropy + structural - target_constant;
    5.0 * violation.powi(2)
}

/// Deterministic cumulative-weight choice driven by the noise source.
/// The null source always lands in the first (largest-weight) band.
fn choose_strategy(weights: &StrategyWeights, noise: &mut dyn NoiseSource) -> Strategy {
    let u = noise.next_unit() * weights.total();
    if u < weights.local_refinement {
        Strategy::LocalRefinement
    } else if u < weights.local_refinement + weights.global_restart {
        Strategy::GlobalRestart
    } else {
        Strategy::ParameterRescaling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{NoNoise, Xorshift64};
    use crate::state::CognitiveState;

    fn setup() -> (CognitiveState, MetaParams, EngineConfig) {
        let cfg = EngineConfig::default();
        let state = CognitiveState::initialize("test", 5.0, &cfg).unwrap();
        (state, MetaParams::medium(), cfg)
    }

    #[test]
    fn test_single_deterministic_step() {
        let (state, meta, cfg) = setup();
        let phi_floor = crate::state::phi_min(meta.heisenberg_constant, 5.0);
        let step = InnerLoopStepper::step(
            &state,
            &meta,
            phi_floor,
            5.0,
            &cfg,
            &mut NoNoise,
            StepMode::Stable,
        );
        // 1.0 * 0.95 + 0.001
        assert!((step.phi_value - 0.951).abs() < 1e-12);
        assert!((step.phi_change + 0.049).abs() < 1e-12);
        assert_eq!(step.mode, StepMode::Stable);
        assert!(step.critical_set.is_none());
    }

    #[test]
    fn test_fifty_step_closed_form() {
        let (mut state, meta, cfg) = setup();
        let phi_floor = crate::state::phi_min(meta.heisenberg_constant, 5.0);
        for _ in 0..50 {
            let step = InnerLoopStepper::step(
                &state,
                &meta,
                phi_floor,
                5.0,
                &cfg,
                &mut NoNoise,
                StepMode::Stable,
            );
            state = step.state;
        }
        // phi_n = d^n * phi_0 + inc * (1 - d^n) / (1 - d)
        let d: f64 = 0.95;
        let expected = d.powi(50) + 0.001 * (1.0 - d.powi(50)) / (1.0 - d);
        assert!((state.phi - expected).abs() < 1e-12);
    }

    #[test]
    fn test_monotonic_decay_in_stable_mode() {
        let (mut state, meta, cfg) = setup();
        let phi_floor = crate::state::phi_min(meta.heisenberg_constant, 5.0);
        for _ in 0..100 {
            let step = InnerLoopStepper::step(
                &state,
                &meta,
                phi_floor,
                5.0,
                &cfg,
                &mut NoNoise,
                StepMode::Stable,
            );
            assert!(step.phi_change <= 0.0, "phi must not rise in stable mode");
            assert!(step.phi_value >= 0.0);
            state = step.state;
        }
    }

    #[test]
    fn test_bounds_hold_under_noise() {
        let (mut state, meta, cfg) = setup();
        let phi_floor = crate::state::phi_min(meta.heisenberg_constant, 5.0);
        let mut rng = Xorshift64::new(99);
        for _ in 0..500 {
            let step = InnerLoopStepper::step(
                &state,
                &meta,
                phi_floor,
                5.0,
                &cfg,
                &mut rng,
                StepMode::Stable,
            );
            let s = &step.state;
            assert!(s.phi >= 0.0);
            assert!(s.entropy >= cfg.entropy_floor && s.entropy <= cfg.entropy_ceiling);
            assert!(s.coherence >= cfg.coherence_floor && s.coherence <= 1.0);
            assert!(s.negentropy_reserve >= 0.0);
            state = step.state;
        }
    }

    #[test]
    fn test_barrier_pressure_shape() {
        let cfg = EngineConfig::default();
        // Inactive above onset
        assert_eq!(barrier_pressure(1.0, 0.5, &cfg), 0.0);
        // Active and positive below phi_min
        let b = barrier_pressure(0.25, 0.5, &cfg);
        assert!((b - 10.0 * 0.25).abs() < 1e-12);
        // Degenerate floor disables the barrier
        assert_eq!(barrier_pressure(0.1, 0.0, &cfg), 0.0);
    }

    #[test]
    fn test_coherence_decays_under_barrier() {
        let (_, meta, cfg) = setup();
        let state = CognitiveState {
            phi: 0.2,
            entropy: 1.0,
            coherence: 0.9,
            negentropy_reserve: 1.0,
            hypotheses: Vec::new(),
        };
        // phi well below phi_min = 0.8: strong barrier
        let step =
            InnerLoopStepper::step(&state, &meta, 0.8, 5.0, &cfg, &mut NoNoise, StepMode::Stable);
        assert!(step.state.coherence < state.coherence);
        assert!(step.state.coherence >= cfg.coherence_floor);
    }

    #[test]
    fn test_null_noise_strategy_is_fixed() {
        let cfg = EngineConfig::default();
        let mut noise = NoNoise;
        for _ in 0..10 {
            assert_eq!(
                choose_strategy(&cfg.strategies, &mut noise),
                Strategy::LocalRefinement
            );
        }
    }

    #[test]
    fn test_seeded_strategies_cover_all_variants() {
        let cfg = EngineConfig::default();
        let mut rng = Xorshift64::new(3);
        let mut seen = [false; Strategy::COUNT];
        for _ in 0..200 {
            seen[choose_strategy(&cfg.strategies, &mut rng).index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}

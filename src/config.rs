//! ═══════════════════════════════════════════════════════════════════════════════
//! CONFIG — Explicit Run Configuration
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! One fully-populated configuration structure, constructed once at run start,
//! validated before any state mutation, and passed down by reference. No
//! threshold is ever defaulted mid-call.
//!
//! Constants trace back to the calibrated presets of the source system:
//! tension coefficients 0.7/0.3, cluster coherence threshold 0.75, and three
//! complexity-tiered strategy presets (simple / medium / complex).
//! ═══════════════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Static constants of the simulation core. Distinct from [`MetaParams`],
/// which the outer loop mutates during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Multiplicative phi decay per inner step
    pub decay_factor: f64,
    /// Small positive additive term, keeps phi away from exact zero
    pub phi_increment: f64,
    /// Entropy lower clamp
    pub entropy_floor: f64,
    /// Entropy upper clamp
    pub entropy_ceiling: f64,
    /// Entropy removed per inner step
    pub entropy_decrement: f64,
    /// Coherence lower clamp
    pub coherence_floor: f64,
    /// Barrier gain near the phi floor
    pub barrier_strength: f64,
    /// Barrier activates below `barrier_onset * phi_min`
    pub barrier_onset: f64,
    /// Coherence lost per unit of barrier pressure
    pub coherence_decay_rate: f64,
    /// Tension gain on |phi change|, in [0, 1]
    pub tension_alpha: f64,
    /// Tension gain on entropy excess, in [0, 1]
    pub tension_beta: f64,
    /// Entropy level above which the beta term accumulates
    pub target_entropy: f64,
    /// Entropy added per accepted hypothesis
    pub entropy_per_hypothesis: f64,
    /// Negentropy reserve consumed per inner step
    pub step_cost: f64,
    /// Reserve drain per unit of entropy-invariant violation
    pub invariant_coupling: f64,
    /// Noise amplitude as a fraction of the Heisenberg constant
    pub noise_scale: f64,
    /// Heisenberg constant clamp range
    pub hbar_min: f64,
    pub hbar_max: f64,
    /// Absolute convergence floor for phi
    pub absolute_floor: f64,
    /// Relative convergence tolerance around phi_min
    pub relative_tolerance: f64,
    /// Convergence rate at or below which descent counts as over-fast
    pub overshoot_rate: f64,
    /// |rate| below this counts as stagnant
    pub stagnation_band: f64,
    /// Strategy diversity (bits) below which cadence tightens
    pub low_diversity: f64,
    /// Strategy diversity (bits) above which cadence relaxes
    pub high_diversity: f64,
    /// Cadence adaptation ceiling for meta_window
    pub max_meta_window: usize,
    pub cluster: ClusterParams,
    pub detector: DetectorWeights,
    pub strategies: StrategyWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decay_factor: 0.95,
            phi_increment: 0.001,
            entropy_floor: 0.01,
            entropy_ceiling: 2.0,
            entropy_decrement: 0.005,
            coherence_floor: 0.1,
            barrier_strength: 10.0,
            barrier_onset: 1.2,
            coherence_decay_rate: 0.1,
            tension_alpha: 0.7,
            tension_beta: 0.3,
            target_entropy: 0.8,
            entropy_per_hypothesis: 0.02,
            step_cost: 0.01,
            invariant_coupling: 0.002,
            noise_scale: 0.3,
            hbar_min: 0.001,
            hbar_max: 2.0,
            absolute_floor: 1e-6,
            relative_tolerance: 0.1,
            overshoot_rate: -0.8,
            stagnation_band: 0.05,
            low_diversity: 0.8,
            high_diversity: 2.2,
            max_meta_window: 10,
            cluster: ClusterParams::default(),
            detector: DetectorWeights::default(),
            strategies: StrategyWeights::default(),
        }
    }
}

impl EngineConfig {
    /// Validate every constant. Called once, before any state exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("tension_alpha", self.tension_alpha)?;
        check_unit_interval("tension_beta", self.tension_beta)?;
        check_unit_interval("decay_factor", self.decay_factor)?;
        check_positive("barrier_strength", self.barrier_strength)?;
        check_positive("barrier_onset", self.barrier_onset)?;
        check_positive("entropy_floor", self.entropy_floor)?;
        check_positive("relative_tolerance", self.relative_tolerance)?;
        check_finite("phi_increment", self.phi_increment)?;
        check_finite("noise_scale", self.noise_scale)?;

        if self.phi_increment < 0.0 {
            return Err(ConfigError::NonPositive {
                name: "phi_increment",
                value: self.phi_increment,
            });
        }
        if self.entropy_floor > self.entropy_ceiling {
            return Err(ConfigError::InvertedBounds {
                name: "entropy",
                min: self.entropy_floor,
                max: self.entropy_ceiling,
            });
        }
        if self.hbar_min > self.hbar_max {
            return Err(ConfigError::InvertedBounds {
                name: "heisenberg_constant",
                min: self.hbar_min,
                max: self.hbar_max,
            });
        }
        if self.hbar_min <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "hbar_min",
                value: self.hbar_min,
            });
        }
        if self.max_meta_window < 2 {
            return Err(ConfigError::ZeroSteps("max_meta_window"));
        }
        self.cluster.validate()?;
        self.detector.validate()?;
        self.strategies.validate()?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLUSTER / DETECTOR / STRATEGY PARAMETERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Hypothesis clustering coefficients. The exact affinity formula is a
/// tunable, not a canon: these knobs are the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterParams {
    /// Minimum pairwise affinity for an edge in the hypothesis graph
    pub coherence_threshold: f64,
    /// Coherence assigned to single-hypothesis clusters
    pub singleton_coherence: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            coherence_threshold: 0.75,
            singleton_coherence: 0.5,
        }
    }
}

impl ClusterParams {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("coherence_threshold", self.coherence_threshold)?;
        check_unit_interval("singleton_coherence", self.singleton_coherence)?;
        Ok(())
    }
}

/// Success-probability weights for the revolution detector.
/// p = base + coherence_weight * C + proximity_weight * P, then the
/// historical factor, then clamped to [prob_floor, prob_ceiling].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorWeights {
    pub base: f64,
    pub coherence_weight: f64,
    pub proximity_weight: f64,
    /// Historical correction: p *= history_base + history_weight * success_rate
    pub history_base: f64,
    pub history_weight: f64,
    /// Probability clamp, avoids certainty claims at either extreme
    pub prob_floor: f64,
    pub prob_ceiling: f64,
}

impl Default for DetectorWeights {
    fn default() -> Self {
        Self {
            base: 0.3,
            coherence_weight: 0.5,
            proximity_weight: 0.2,
            history_base: 0.8,
            history_weight: 0.4,
            prob_floor: 0.05,
            prob_ceiling: 0.95,
        }
    }
}

impl DetectorWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        check_unit_interval("prob_floor", self.prob_floor)?;
        check_unit_interval("prob_ceiling", self.prob_ceiling)?;
        if self.prob_floor > self.prob_ceiling {
            return Err(ConfigError::InvertedBounds {
                name: "success_probability",
                min: self.prob_floor,
                max: self.prob_ceiling,
            });
        }
        check_finite("base", self.base)?;
        check_finite("coherence_weight", self.coherence_weight)?;
        check_finite("proximity_weight", self.proximity_weight)?;
        Ok(())
    }
}

/// Relative weights for per-step refinement strategy choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyWeights {
    pub local_refinement: f64,
    pub global_restart: f64,
    pub parameter_rescaling: f64,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            local_refinement: 0.6,
            global_restart: 0.2,
            parameter_rescaling: 0.2,
        }
    }
}

impl StrategyWeights {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, w) in [
            ("local_refinement", self.local_refinement),
            ("global_restart", self.global_restart),
            ("parameter_rescaling", self.parameter_rescaling),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::NonPositive { name, value: w });
            }
        }
        let total = self.local_refinement + self.global_restart + self.parameter_rescaling;
        if total <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "strategy_weights_total",
                value: total,
            });
        }
        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.local_refinement + self.global_restart + self.parameter_rescaling
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// META PARAMS — outer-loop control state
// ═══════════════════════════════════════════════════════════════════════════════

/// Outer-loop control parameters, mutated once per outer iteration by the
/// meta adapter and clamped after every adaptation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaParams {
    /// Inner steps per outer iteration
    pub inner_steps: usize,
    /// Trailing window (in steps) fed to the adapter
    pub meta_window: usize,
    /// Tension level that fires a collapse
    pub critical_tension: f64,
    /// The hbar_G-like control constant
    pub heisenberg_constant: f64,
    /// Stagnation gate: mean |phi gradient| at or below this passes
    pub min_progress_rate: f64,
    /// Cluster gate: best cluster coherence must reach this
    pub min_coherence: f64,
    /// Success gate: estimated probability must reach this
    pub min_success_threshold: f64,
}

impl Default for MetaParams {
    fn default() -> Self {
        Self::medium()
    }
}

impl MetaParams {
    /// Preset for low-complexity problems: tight noise, long windows.
    pub fn simple() -> Self {
        Self {
            inner_steps: 5,
            meta_window: 10,
            critical_tension: 0.95,
            heisenberg_constant: 0.3,
            ..Self::thresholds()
        }
    }

    /// Preset for mid-complexity problems.
    pub fn medium() -> Self {
        Self {
            inner_steps: 10,
            meta_window: 5,
            critical_tension: 0.8,
            heisenberg_constant: 0.7,
            ..Self::thresholds()
        }
    }

    /// Preset for high-complexity problems: wide noise, eager collapse.
    pub fn complex() -> Self {
        Self {
            inner_steps: 20,
            meta_window: 2,
            critical_tension: 0.3,
            heisenberg_constant: 1.5,
            ..Self::thresholds()
        }
    }

    /// Detection thresholds shared by every preset
    fn thresholds() -> Self {
        Self {
            inner_steps: 10,
            meta_window: 5,
            critical_tension: 0.8,
            heisenberg_constant: 0.7,
            min_progress_rate: 0.001,
            min_coherence: 0.7,
            min_success_threshold: 0.6,
        }
    }

    /// Select a preset tier from problem complexity (nominal scale 1..10).
    pub fn for_complexity(complexity: f64) -> Self {
        let normalized = (complexity / 10.0).clamp(0.0, 1.0);
        if normalized <= 0.4 {
            Self::simple()
        } else if normalized <= 0.7 {
            Self::medium()
        } else {
            Self::complex()
        }
    }

    /// Validate positivity and finiteness requirements.
    pub fn validate(&self, config: &EngineConfig) -> Result<(), ConfigError> {
        if self.inner_steps == 0 {
            return Err(ConfigError::ZeroSteps("inner_steps"));
        }
        if self.meta_window == 0 {
            return Err(ConfigError::ZeroSteps("meta_window"));
        }
        check_positive("critical_tension", self.critical_tension)?;
        check_finite("heisenberg_constant", self.heisenberg_constant)?;
        check_finite("min_progress_rate", self.min_progress_rate)?;
        check_unit_interval("min_coherence", self.min_coherence)?;
        check_unit_interval("min_success_threshold", self.min_success_threshold)?;
        if self.heisenberg_constant < config.hbar_min
            || self.heisenberg_constant > config.hbar_max
        {
            return Err(ConfigError::OutOfRange {
                name: "heisenberg_constant",
                value: self.heisenberg_constant,
                min: config.hbar_min,
                max: config.hbar_max,
            });
        }
        Ok(())
    }

    /// Clamp the control constant back into its configured range.
    pub fn clamp_heisenberg(&mut self, config: &EngineConfig) {
        if !self.heisenberg_constant.is_finite() {
            self.heisenberg_constant = config.hbar_min;
            return;
        }
        self.heisenberg_constant = self
            .heisenberg_constant
            .clamp(config.hbar_min, config.hbar_max);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { name })
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

fn check_unit_interval(name: &'static str, value: f64) -> Result<(), ConfigError> {
    check_finite(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.hbar_min = 3.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_tension_coefficients_bounded() {
        let mut cfg = EngineConfig::default();
        cfg.tension_alpha = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_preset_selection() {
        assert_eq!(MetaParams::for_complexity(2.0), MetaParams::simple());
        assert_eq!(MetaParams::for_complexity(5.0), MetaParams::medium());
        assert_eq!(MetaParams::for_complexity(9.0), MetaParams::complex());
        // Above the nominal scale saturates at the complex tier
        assert_eq!(MetaParams::for_complexity(50.0), MetaParams::complex());
    }

    #[test]
    fn test_presets_validate() {
        let cfg = EngineConfig::default();
        for meta in [MetaParams::simple(), MetaParams::medium(), MetaParams::complex()] {
            assert!(meta.validate(&cfg).is_ok());
        }
    }

    #[test]
    fn test_clamp_heisenberg() {
        let cfg = EngineConfig::default();
        let mut meta = MetaParams::medium();

        meta.heisenberg_constant = 1e9;
        meta.clamp_heisenberg(&cfg);
        assert_eq!(meta.heisenberg_constant, cfg.hbar_max);

        meta.heisenberg_constant = -5.0;
        meta.clamp_heisenberg(&cfg);
        assert_eq!(meta.heisenberg_constant, cfg.hbar_min);

        meta.heisenberg_constant = f64::NAN;
        meta.clamp_heisenberg(&cfg);
        assert_eq!(meta.heisenberg_constant, cfg.hbar_min);
    }

    #[test]
    fn test_zero_inner_steps_rejected() {
        let cfg = EngineConfig::default();
        let mut meta = MetaParams::medium();
        meta.inner_steps = 0;
        assert!(matches!(
            meta.validate(&cfg),
            Err(ConfigError::ZeroSteps("inner_steps"))
        ));
    }
}

//! ═══════════════════════════════════════════════════════════════════════════════
//! ENGINE — Dual-Loop Orchestration
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Runs the outer loop, which runs the inner loop, applies detection and
//! collapse, and terminates on convergence or budget exhaustion.
//!
//! Regimes: STABLE -> (all gates pass) -> ACCUMULATING -> (tension over the
//! critical level) -> COLLAPSING -> GENIUS on success, back to STABLE on a
//! miss. Convergence and budget exhaustion are outcomes of the run, not
//! regimes of the state.
//!
//! A run owns its state, params, tension and history outright; runs in
//! parallel threads need no coordination. Cancellation is cooperative,
//! checked at the top of each outer iteration only, and a step is atomic:
//! the state is replaced only after the full computation succeeds.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::adapter::MetaAdapter;
use crate::collapse::{CollapseOperator, GeniusReadout};
use crate::config::{EngineConfig, MetaParams};
use crate::detector::{CollapseStats, RevolutionDetector};
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, FoamResult};
use crate::generator::{HypothesisSource, PromptContext, StubHypothesisSource};
use crate::noise::{NoNoise, NoiseSource};
use crate::physics::{self, HubbardParams, HubbardResult, TwoQubitParams, TwoQubitResult};
use crate::state::{phi_min, CognitiveState};
use crate::stepper::InnerLoopStepper;
use crate::tension::TensionAccumulator;
use crate::trajectory::{last_window, SimulationStep, StepMode};

// ═══════════════════════════════════════════════════════════════════════════════
// RUN INPUT / OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// The problem a run works on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub description: String,
    /// Nominal scale 1..10; anything > 0 is accepted
    pub complexity: f64,
    pub kind: ProblemKind,
}

/// Optional structured parameters selecting an auxiliary calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProblemKind {
    Generic,
    Hubbard(HubbardParams),
    TwoQubit(TwoQubitParams),
}

/// Active regime of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Stable,
    Accumulating,
    Collapsing,
    Genius,
}

impl Regime {
    pub fn name(&self) -> &'static str {
        match self {
            Regime::Stable => "STABLE",
            Regime::Accumulating => "ACCUMULATING",
            Regime::Collapsing => "COLLAPSING",
            Regime::Genius => "GENIUS",
        }
    }
}

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Converged,
    MaxStepsReached,
    Cancelled,
}

impl Outcome {
    pub fn name(&self) -> &'static str {
        match self {
            Outcome::Converged => "CONVERGED",
            Outcome::MaxStepsReached => "MAX_STEPS_REACHED",
            Outcome::Cancelled => "CANCELLED",
        }
    }
}

/// Auxiliary closed-form computation attached to the result unmodified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuxiliaryComputation {
    Hubbard(HubbardResult),
    TwoQubit(TwoQubitResult),
}

/// One notification per outer iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub outer_iteration: usize,
    pub phi: f64,
    pub tension: f64,
    pub regime: Regime,
    pub steps_recorded: usize,
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub final_state: CognitiveState,
    /// Append-only trajectory, strictly in execution order
    pub history: Vec<SimulationStep>,
    pub outcome: Outcome,
    /// Outer iterations consumed
    pub steps_used: usize,
    pub phi_min: f64,
    pub final_meta: MetaParams,
    pub collapse_stats: CollapseStats,
    /// Collaborator calls that failed and were absorbed
    pub collaborator_failures: Vec<String>,
    pub auxiliary: Option<AuxiliaryComputation>,
    /// Readout of the last successful collapse, if any
    pub genius_readout: Option<GeniusReadout>,
    pub diagnostics: Diagnostics,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// The orchestrator. Construct once per run or reuse across runs; every
/// call to [`SimulationEngine::run`] owns its state completely.
pub struct SimulationEngine {
    config: EngineConfig,
    noise: Box<dyn NoiseSource>,
    source: Box<dyn HypothesisSource>,
    cancel: Arc<AtomicBool>,
    progress: Option<Sender<ProgressEvent>>,
}

impl SimulationEngine {
    /// Engine with validated configuration, deterministic noise and the
    /// seeded stub hypothesis source.
    pub fn new(config: EngineConfig) -> FoamResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            noise: Box::new(NoNoise),
            source: Box::new(StubHypothesisSource::new(42, 3)),
            cancel: Arc::new(AtomicBool::new(false)),
            progress: None,
        })
    }

    pub fn with_noise(mut self, noise: Box<dyn NoiseSource>) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_hypothesis_source(mut self, source: Box<dyn HypothesisSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_progress(mut self, sender: Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Shared flag for cooperative cancellation. Setting it stops the run
    /// at the top of the next outer iteration. The flag stays set until
    /// cleared by the caller, so a reused engine must clear it between runs.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Execute one full simulation run.
    ///
    /// Fatal only on invalid configuration, rejected before any state
    /// exists. Collaborator failures are absorbed and recorded; a failed
    /// collapse degrades to the stable regime.
    pub fn run(&mut self, problem: &Problem, max_meta_steps: usize) -> FoamResult<SimulationResult> {
        if max_meta_steps == 0 {
            return Err(ConfigError::ZeroSteps("max_meta_steps").into());
        }
        let mut meta = MetaParams::for_complexity(problem.complexity);
        meta.validate(&self.config)?;

        let mut state =
            CognitiveState::initialize(&problem.description, problem.complexity, &self.config)?;
        let floor = phi_min(meta.heisenberg_constant, problem.complexity);

        let mut history: Vec<SimulationStep> = Vec::new();
        let mut tension = TensionAccumulator::new();
        let mut regime = Regime::Stable;
        let mut collapse_stats = CollapseStats::default();
        let mut failures: Vec<String> = Vec::new();
        let mut readout: Option<GeniusReadout> = None;

        // Auxiliary calculator: at most one invocation per run, failure
        // absorbed
        let auxiliary = self.run_auxiliary(&problem.kind, &mut failures);

        for k in 0..max_meta_steps {
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(self.finish(
                    state,
                    history,
                    Outcome::Cancelled,
                    k,
                    floor,
                    meta,
                    collapse_stats,
                    failures,
                    auxiliary,
                    readout,
                ));
            }

            // A genius state that did not converge starts a fresh
            // accumulation cycle
            if regime == Regime::Genius {
                regime = Regime::Stable;
                tension.reset();
            }

            // One hypothesis batch per outer iteration
            let ctx = PromptContext {
                goal: &problem.description,
                entropy: state.entropy,
                outer_iteration: k,
            };
            match self.source.generate(&ctx) {
                Ok(batch) => {
                    for hypothesis in batch {
                        state = state.with_hypothesis(hypothesis, &self.config);
                    }
                }
                Err(e) => failures.push(format!("hypothesis source (iteration {}): {}", k, e)),
            }

            for _ in 0..meta.inner_steps {
                let mode = match regime {
                    Regime::Accumulating => StepMode::Accumulating,
                    _ => StepMode::Stable,
                };
                let step = InnerLoopStepper::step(
                    &state,
                    &meta,
                    floor,
                    problem.complexity,
                    &self.config,
                    self.noise.as_mut(),
                    mode,
                );
                state = step.state.clone();
                tension.update(step.phi_change, state.entropy, &self.config);
                history.push(step);

                match regime {
                    Regime::Stable => {
                        if RevolutionDetector::should_activate(
                            &state,
                            &history,
                            tension.value(),
                            &meta,
                            floor,
                            &collapse_stats,
                            &self.config,
                        ) {
                            regime = Regime::Accumulating;
                        }
                    }
                    Regime::Accumulating => {
                        if tension.value() > meta.critical_tension {
                            regime = Regime::Collapsing;
                            let outcome = CollapseOperator::execute(&state, &meta, &self.config);
                            state = outcome.step.state.clone();
                            history.push(outcome.step.clone());
                            tension.reset();
                            if outcome.succeeded() {
                                collapse_stats.successful += 1;
                                readout = outcome.readout;
                                regime = Regime::Genius;
                            } else {
                                collapse_stats.failed += 1;
                                regime = Regime::Stable;
                            }
                            // End the inner loop early this outer iteration
                            break;
                        }
                    }
                    Regime::Collapsing | Regime::Genius => {
                        // Unreachable while stepping: collapse resolves
                        // within the same iteration that entered it
                    }
                }
            }

            if has_converged(state.phi, floor, &self.config) {
                return Ok(self.finish(
                    state,
                    history,
                    Outcome::Converged,
                    k,
                    floor,
                    meta,
                    collapse_stats,
                    failures,
                    auxiliary,
                    readout,
                ));
            }

            self.notify(ProgressEvent {
                outer_iteration: k,
                phi: state.phi,
                tension: tension.value(),
                regime,
                steps_recorded: history.len(),
            });

            meta = MetaAdapter::adapt(
                last_window(&history, meta.meta_window),
                &meta,
                floor,
                &self.config,
            );
        }

        Ok(self.finish(
            state,
            history,
            Outcome::MaxStepsReached,
            max_meta_steps,
            floor,
            meta,
            collapse_stats,
            failures,
            auxiliary,
            readout,
        ))
    }

    fn run_auxiliary(
        &self,
        kind: &ProblemKind,
        failures: &mut Vec<String>,
    ) -> Option<AuxiliaryComputation> {
        match kind {
            ProblemKind::Generic => None,
            ProblemKind::Hubbard(params) => match physics::solve_hubbard(params) {
                Ok(result) => Some(AuxiliaryComputation::Hubbard(result)),
                Err(e) => {
                    failures.push(format!("hubbard calculator: {}", e));
                    None
                }
            },
            ProblemKind::TwoQubit(params) => match physics::solve_two_qubit(params) {
                Ok(result) => Some(AuxiliaryComputation::TwoQubit(result)),
                Err(e) => {
                    failures.push(format!("two-qubit calculator: {}", e));
                    None
                }
            },
        }
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(sender) = &self.progress {
            // A dropped receiver never aborts a run
            let _ = sender.send(event);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        final_state: CognitiveState,
        history: Vec<SimulationStep>,
        outcome: Outcome,
        steps_used: usize,
        floor: f64,
        final_meta: MetaParams,
        collapse_stats: CollapseStats,
        collaborator_failures: Vec<String>,
        auxiliary: Option<AuxiliaryComputation>,
        genius_readout: Option<GeniusReadout>,
    ) -> SimulationResult {
        let diagnostics = Diagnostics::evaluate(&final_state, &history, floor, &self.config);
        SimulationResult {
            final_state,
            history,
            outcome,
            steps_used,
            phi_min: floor,
            final_meta,
            collapse_stats,
            collaborator_failures,
            auxiliary,
            genius_readout,
            diagnostics,
        }
    }
}

/// Convergence predicate, identical in every regime: phi under the
/// absolute floor, or within the relative tolerance of phi_min.
pub fn has_converged(phi: f64, phi_min: f64, config: &EngineConfig) -> bool {
    phi < config.absolute_floor || (phi - phi_min).abs() <= config.relative_tolerance * phi_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FoamError, FoamResult};
    use crate::generator::PromptContext;
    use crate::state::Hypothesis;

    fn problem(complexity: f64) -> Problem {
        Problem {
            description: "test problem".to_string(),
            complexity,
            kind: ProblemKind::Generic,
        }
    }

    struct FailingSource;
    impl HypothesisSource for FailingSource {
        fn generate(&mut self, _ctx: &PromptContext) -> FoamResult<Vec<Hypothesis>> {
            Err(FoamError::Collaborator("generator offline".to_string()))
        }
    }

    #[test]
    fn test_zero_meta_steps_rejected() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let err = engine.run(&problem(5.0), 0);
        assert!(matches!(err, Err(FoamError::Config(_))));
    }

    #[test]
    fn test_invalid_complexity_rejected_before_stepping() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        assert!(engine.run(&problem(0.0), 10).is_err());
        assert!(engine.run(&problem(-2.0), 10).is_err());
    }

    #[test]
    fn test_termination_at_budget() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let result = engine.run(&problem(5.0), 4).unwrap();
        assert_eq!(result.outcome, Outcome::MaxStepsReached);
        assert_eq!(result.steps_used, 4);
        assert!(!result.history.is_empty());
    }

    #[test]
    fn test_history_is_ordered_and_timestamped() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let result = engine.run(&problem(5.0), 3).unwrap();
        for pair in result.history.windows(2) {
            assert!(pair[0].timestamp_ms <= pair[1].timestamp_ms);
        }
    }

    #[test]
    fn test_tension_zero_after_collapse() {
        // Drive a run long enough to stagnate and collapse
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let result = engine.run(&problem(5.0), 40).unwrap();
        let collapses: Vec<usize> = result
            .history
            .iter()
            .enumerate()
            .filter(|(_, s)| s.mode == StepMode::RevolutionaryCollapse)
            .map(|(i, _)| i)
            .collect();
        assert!(
            !collapses.is_empty(),
            "expected at least one collapse in a long stagnant run"
        );
        assert!(result.collapse_stats.successful as usize >= collapses.len());
    }

    #[test]
    fn test_collaborator_failure_absorbed() {
        let mut engine = SimulationEngine::new(EngineConfig::default())
            .unwrap()
            .with_hypothesis_source(Box::new(FailingSource));
        let result = engine.run(&problem(5.0), 3).unwrap();
        assert_eq!(result.outcome, Outcome::MaxStepsReached);
        assert_eq!(result.collaborator_failures.len(), 3);
        // No hypotheses ever arrive, so no collapse can fire
        assert_eq!(result.collapse_stats.successful, 0);
    }

    #[test]
    fn test_auxiliary_hubbard_attached() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let p = Problem {
            description: "lattice".to_string(),
            complexity: 5.0,
            kind: ProblemKind::Hubbard(HubbardParams::default()),
        };
        let result = engine.run(&p, 2).unwrap();
        assert!(matches!(
            result.auxiliary,
            Some(AuxiliaryComputation::Hubbard(_))
        ));
        assert!(result.collaborator_failures.is_empty());
    }

    #[test]
    fn test_auxiliary_failure_absorbed() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let p = Problem {
            description: "bad lattice".to_string(),
            complexity: 5.0,
            kind: ProblemKind::Hubbard(HubbardParams {
                t: -1.0,
                ..HubbardParams::default()
            }),
        };
        let result = engine.run(&p, 2).unwrap();
        assert!(result.auxiliary.is_none());
        assert_eq!(result.collaborator_failures.len(), 1);
        assert_eq!(result.outcome, Outcome::MaxStepsReached);
    }

    #[test]
    fn test_convergence_via_absolute_floor() {
        // Disable the additive increment so pure decay crosses the
        // absolute floor
        let mut cfg = EngineConfig::default();
        cfg.phi_increment = 0.0;
        let mut engine = SimulationEngine::new(cfg)
            .unwrap()
            .with_hypothesis_source(Box::new(crate::generator::NullHypothesisSource));
        let result = engine.run(&problem(9.0), 100).unwrap();
        // complexity 9 selects the complex tier: 20 inner steps per outer
        // iteration; 0.95^n < 1e-6 needs n >= 270
        assert_eq!(result.outcome, Outcome::Converged);
        assert!(result.final_state.phi < 1e-6);
        assert!(result.steps_used < 100);
    }

    #[test]
    fn test_deterministic_runs_identical() {
        let run = || {
            let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
            engine.run(&problem(5.0), 10).unwrap()
        };
        let a = run();
        let b = run();
        assert_eq!(a.history.len(), b.history.len());
        assert_eq!(a.final_state.phi, b.final_state.phi);
        assert_eq!(a.collapse_stats, b.collapse_stats);
    }

    #[test]
    fn test_cancellation_returns_partial_result() {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        let flag = engine.cancel_flag();
        flag.store(true, Ordering::SeqCst);
        let result = engine.run(&problem(5.0), 50).unwrap();
        assert_eq!(result.outcome, Outcome::Cancelled);
        assert_eq!(result.steps_used, 0);
        assert!(result.history.is_empty());

        // Cleared flag lets the engine run again
        flag.store(false, Ordering::SeqCst);
        let result = engine.run(&problem(5.0), 2).unwrap();
        assert_eq!(result.outcome, Outcome::MaxStepsReached);
    }

    #[test]
    fn test_progress_events_one_per_outer_iteration() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut engine = SimulationEngine::new(EngineConfig::default())
            .unwrap()
            .with_progress(tx);
        let result = engine.run(&problem(5.0), 5).unwrap();
        drop(engine);
        let events: Vec<ProgressEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 5);
        assert_eq!(result.outcome, Outcome::MaxStepsReached);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.outer_iteration, i);
            assert!(event.steps_recorded > 0);
        }
    }

    #[test]
    fn test_has_converged_identical_across_regimes() {
        let cfg = EngineConfig::default();
        // Pure function of phi and the floor
        assert!(has_converged(1e-7, 0.8, &cfg));
        assert!(has_converged(0.79, 0.8, &cfg));
        assert!(!has_converged(0.5, 0.8, &cfg));
    }
}

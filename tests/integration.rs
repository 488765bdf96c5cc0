//! Integration Tests - Does the dual loop hold together end to end?
//!
//! Every run here is fully deterministic: null stepping noise and the
//! seeded stub hypothesis source.

use std::sync::atomic::Ordering;

use foam::config::{EngineConfig, MetaParams};
use foam::engine::{Problem, ProblemKind, SimulationEngine};
use foam::generator::NullHypothesisSource;
use foam::physics::{HubbardParams, TwoQubitParams};
use foam::state::phi_min;
use foam::trajectory::StepMode;
use foam::{AuxiliaryComputation, Outcome};

fn generic_problem(complexity: f64) -> Problem {
    Problem {
        description: "minimize the action of an unknown field".to_string(),
        complexity,
        kind: ProblemKind::Generic,
    }
}

/// I1: a budget-bound run terminates with the full budget accounted for
#[test]
fn integration_budget_exhaustion() {
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
    let result = engine.run(&generic_problem(5.0), 6).unwrap();
    assert_eq!(result.outcome, Outcome::MaxStepsReached);
    assert_eq!(result.steps_used, 6);
    assert_eq!(result.phi_min, phi_min(MetaParams::medium().heisenberg_constant, 5.0));
}

/// I2: the stable-regime prefix of a deterministic run decays monotonically
/// and respects the entropy bounds
#[test]
fn integration_stable_prefix_monotone() {
    let cfg = EngineConfig::default();
    let mut engine = SimulationEngine::new(cfg.clone()).unwrap();
    let result = engine.run(&generic_problem(5.0), 10).unwrap();

    for step in result
        .history
        .iter()
        .take_while(|s| s.mode == StepMode::Stable)
    {
        assert!(step.phi_change <= 0.0);
        assert!(step.state.entropy >= cfg.entropy_floor);
        assert!(step.state.entropy <= cfg.entropy_ceiling);
        assert!(step.state.coherence >= cfg.coherence_floor);
        assert!(step.state.coherence <= 1.0);
    }
}

/// I3: a long stagnant run reaches a collapse, and every collapse step
/// carries its critical set while every miss carries none
#[test]
fn integration_collapse_records() {
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
    let result = engine.run(&generic_problem(5.0), 40).unwrap();

    let mut saw_collapse = false;
    for step in &result.history {
        match step.mode {
            StepMode::RevolutionaryCollapse => {
                saw_collapse = true;
                let set = step.critical_set.as_ref().expect("collapse without set");
                assert!(!set.hypotheses.is_empty());
                assert!(step.phi_change < 0.0);
            }
            StepMode::CollapseFailed => {
                assert!(step.critical_set.is_none());
                assert_eq!(step.phi_change, 0.0);
            }
            StepMode::Stable | StepMode::Accumulating => {}
        }
    }
    assert!(saw_collapse, "expected a collapse within 40 outer iterations");
    assert!(result.genius_readout.is_some());
    assert!(result.collapse_stats.successful > 0);
}

/// I4: without any hypothesis supply the engine never collapses and still
/// completes cleanly
#[test]
fn integration_no_hypotheses_no_collapse() {
    let mut engine = SimulationEngine::new(EngineConfig::default())
        .unwrap()
        .with_hypothesis_source(Box::new(NullHypothesisSource));
    let result = engine.run(&generic_problem(5.0), 20).unwrap();
    assert_eq!(result.outcome, Outcome::MaxStepsReached);
    assert_eq!(result.collapse_stats.successful, 0);
    assert_eq!(result.collapse_stats.failed, 0);
    assert!(result
        .history
        .iter()
        .all(|s| s.mode != StepMode::RevolutionaryCollapse));
}

/// I5: identical configurations replay to identical trajectories
#[test]
fn integration_replay_determinism() {
    let run = || {
        let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
        engine.run(&generic_problem(5.0), 15).unwrap()
    };
    let a = run();
    let b = run();

    assert_eq!(a.history.len(), b.history.len());
    for (sa, sb) in a.history.iter().zip(b.history.iter()) {
        assert_eq!(sa.phi_value, sb.phi_value);
        assert_eq!(sa.mode, sb.mode);
        assert_eq!(sa.strategy, sb.strategy);
    }
    assert_eq!(a.diagnostics.genius_score, b.diagnostics.genius_score);
}

/// I6: cancellation before the first outer iteration yields a partial,
/// well-formed result
#[test]
fn integration_cancellation() {
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
    engine.cancel_flag().store(true, Ordering::SeqCst);
    let result = engine.run(&generic_problem(5.0), 30).unwrap();
    assert_eq!(result.outcome, Outcome::Cancelled);
    assert_eq!(result.steps_used, 0);
    assert!(result.history.is_empty());
}

/// I7: auxiliary calculators ride along without disturbing the run
#[test]
fn integration_auxiliary_calculators() {
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();

    let hubbard = Problem {
        description: "lattice spectrum".to_string(),
        complexity: 4.0,
        kind: ProblemKind::Hubbard(HubbardParams::default()),
    };
    let result = engine.run(&hubbard, 3).unwrap();
    match result.auxiliary {
        Some(AuxiliaryComputation::Hubbard(ref r)) => {
            assert!((r.effective_mass - 1.5).abs() < 1e-5);
        }
        _ => panic!("expected a Hubbard readout"),
    }

    let qubit = Problem {
        description: "exchange dynamics".to_string(),
        complexity: 4.0,
        kind: ProblemKind::TwoQubit(TwoQubitParams::default()),
    };
    let result = engine.run(&qubit, 3).unwrap();
    assert!(matches!(
        result.auxiliary,
        Some(AuxiliaryComputation::TwoQubit(_))
    ));
}

/// I8: the full result serializes to JSON and back
#[test]
fn integration_result_roundtrips_json() {
    let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
    let result = engine.run(&generic_problem(3.0), 4).unwrap();

    let encoded = serde_json::to_string(&result).unwrap();
    let decoded: foam::SimulationResult = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.outcome, result.outcome);
    assert_eq!(decoded.history.len(), result.history.len());
    assert_eq!(decoded.final_state.phi, result.final_state.phi);
}

/// I9: runs on parallel threads share nothing and both complete
#[test]
fn integration_parallel_runs_independent() {
    let handles: Vec<_> = (0..2)
        .map(|_| {
            std::thread::spawn(|| {
                let mut engine = SimulationEngine::new(EngineConfig::default()).unwrap();
                engine.run(&generic_problem(5.0), 8).unwrap()
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results[0].history.len(), results[1].history.len());
    assert_eq!(results[0].final_state.phi, results[1].final_state.phi);
}

//! ═══════════════════════════════════════════════════════════════════════════════
//! FOAM — Unified Entry Point
//! ═══════════════════════════════════════════════════════════════════════════════
//! Single binary, subcommand dispatch: run a simulation, or call one of
//! the closed-form calculators directly.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::thread;

use anyhow::Result;
use clap::{Parser, Subcommand};

use foam::config::EngineConfig;
use foam::engine::{Problem, ProblemKind, SimulationEngine};
use foam::generator::StubHypothesisSource;
use foam::noise::Xorshift64;
use foam::physics::{self, HubbardParams, TwoQubitParams};
use foam::Outcome;

#[derive(Parser)]
#[command(name = "foam")]
#[command(about = "Cognitive foam relaxation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full simulation
    Run {
        /// Research goal text
        #[arg(long, default_value = "untitled goal")]
        goal: String,

        /// Problem complexity (nominal scale 1..10)
        #[arg(long, default_value_t = 5.0)]
        complexity: f64,

        /// Outer iteration budget
        #[arg(long, default_value_t = 100)]
        max_meta_steps: usize,

        /// Seed for the hypothesis stub
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Hypotheses requested per outer iteration
        #[arg(long, default_value_t = 3)]
        batch: usize,

        /// Enable stochastic stepping noise (deterministic by default)
        #[arg(long)]
        stochastic: bool,

        /// Emit the full result as JSON instead of the report
        #[arg(long)]
        json: bool,
    },

    /// Solve the 4-site Hubbard lattice
    Hubbard {
        #[arg(long, default_value_t = 1.0)]
        t: f64,
        #[arg(long, default_value_t = 4.0)]
        u: f64,
        #[arg(long, default_value_t = 2)]
        up: u32,
        #[arg(long, default_value_t = 2)]
        down: u32,
        #[arg(long)]
        json: bool,
    },

    /// Solve the two-level exchange system
    Qubit {
        #[arg(long, default_value_t = 1.25)]
        j: f64,
        #[arg(long, default_value_t = 0.75)]
        b: f64,
        #[arg(long, default_value_t = 100.0)]
        total_time: f64,
        #[arg(long, default_value_t = 0.01)]
        time_step: f64,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            goal,
            complexity,
            max_meta_steps,
            seed,
            batch,
            stochastic,
            json,
        } => cmd_run(goal, complexity, max_meta_steps, seed, batch, stochastic, json),
        Commands::Hubbard { t, u, up, down, json } => {
            let result = physics::solve_hubbard(&HubbardParams {
                t,
                u,
                electrons_up: up,
                electrons_down: down,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("4-site Hubbard lattice (t={} eV, U={} eV, {}+{} electrons)", t, u, up, down);
                println!("  eigenvalues (eV): {:?}", result.eigenvalues_ev);
                println!("  spin correlations: {:?}", result.spin_correlations);
                println!("  Uc transition (eV): {:.6}", result.uc_transition_ev);
                println!("  effective mass: {:.6}", result.effective_mass);
            }
            Ok(())
        }
        Commands::Qubit {
            j,
            b,
            total_time,
            time_step,
            json,
        } => {
            let result = physics::solve_two_qubit(&TwoQubitParams {
                j,
                b,
                total_time,
                time_step,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Two-level system (J={} GHz, B={} GHz)", j, b);
                println!("  Rabi frequency (GHz): {:.6}", result.frequency_ghz);
                println!("  concurrence maxima (ns): {:?}", result.concurrence_maxima_ns);
                println!("  average concurrence: {:.4}", result.concurrence_average);
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    goal: String,
    complexity: f64,
    max_meta_steps: usize,
    seed: u64,
    batch: usize,
    stochastic: bool,
    json: bool,
) -> Result<()> {
    let mut engine = SimulationEngine::new(EngineConfig::default())?
        .with_hypothesis_source(Box::new(StubHypothesisSource::new(seed, batch)));
    if stochastic {
        engine = engine.with_noise(Box::new(Xorshift64::new(seed)));
    }

    // Stream one progress line per outer iteration while the run computes
    let progress_printer = if json {
        None
    } else {
        let (tx, rx) = crossbeam_channel::unbounded::<foam::ProgressEvent>();
        engine = engine.with_progress(tx);
        Some(thread::spawn(move || {
            for event in rx {
                println!(
                    "  k={:<4} regime={:<12} phi={:.6} tension={:.4}",
                    event.outer_iteration,
                    event.regime.name(),
                    event.phi,
                    event.tension,
                );
            }
        }))
    };

    let problem = Problem {
        description: goal,
        complexity,
        kind: ProblemKind::Generic,
    };
    let result = engine.run(&problem, max_meta_steps)?;
    drop(engine); // closes the progress channel

    if let Some(handle) = progress_printer {
        let _ = handle.join();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("══ Simulation complete ═══════════════════════════════════════");
    println!("  outcome:        {}", result.outcome.name());
    println!("  outer steps:    {}", result.steps_used);
    println!("  recorded steps: {}", result.history.len());
    println!("  final phi:      {:.6}", result.final_state.phi);
    println!("  phi floor:      {:.6}", result.phi_min);
    println!("  final entropy:  {:.4}", result.final_state.entropy);
    println!(
        "  collapses:      {} succeeded, {} failed",
        result.collapse_stats.successful, result.collapse_stats.failed
    );
    if !result.collaborator_failures.is_empty() {
        println!("  collaborator failures:");
        for failure in &result.collaborator_failures {
            println!("    - {}", failure);
        }
    }
    if let Some(readout) = &result.genius_readout {
        println!("  genius readout: {}", readout.summary);
    }
    println!("  diagnostics:    {}", result.diagnostics.summary);
    if result.outcome == Outcome::MaxStepsReached {
        println!("  note: budget exhausted before convergence");
    }

    Ok(())
}

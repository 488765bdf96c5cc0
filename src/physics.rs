//! ═══════════════════════════════════════════════════════════════════════════════
//! PHYSICS — Closed-Form Auxiliary Calculators
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Two independent pure solvers the engine may invoke at most once per run
//! for an auxiliary readout. No state machine, no iteration: exact
//! expressions only.
//!
//! - 4-site Hubbard lattice with periodic boundaries: spectrum, spin
//!   correlations, metal-insulator transition point, effective mass.
//! - Two-level (two-qubit) exchange system: concurrence maxima and the
//!   sampled average concurrence over a time window.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{FoamResult, ValidationError};

// ═══════════════════════════════════════════════════════════════════════════════
// HUBBARD LATTICE
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters for the 4-site Hubbard solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HubbardParams {
    /// Hopping integral t (eV)
    pub t: f64,
    /// Coulomb repulsion U (eV)
    pub u: f64,
    pub electrons_up: u32,
    pub electrons_down: u32,
}

impl Default for HubbardParams {
    fn default() -> Self {
        Self {
            t: 1.0,
            u: 4.0,
            electrons_up: 2,
            electrons_down: 2,
        }
    }
}

/// Spectrum and correlation readout of the 4-site lattice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubbardResult {
    /// Three lowest eigenvalues (eV), ground state first
    pub eigenvalues_ev: [f64; 3],
    /// Nearest and next-nearest neighbor spin correlations
    pub spin_correlations: [f64; 2],
    /// Metal-insulator transition point Uc (eV)
    pub uc_transition_ev: f64,
    /// Quasiparticle effective mass in units of the free mass
    pub effective_mass: f64,
}

/// Exact solution for the half-filled 2-up/2-down configuration; a tight
/// binding approximation for every other filling.
pub fn solve_hubbard(params: &HubbardParams) -> FoamResult<HubbardResult> {
    validate_hubbard(params)?;
    let HubbardParams {
        t,
        u,
        electrons_up,
        electrons_down,
    } = *params;

    let eigenvalues_ev = if electrons_up == 2 && electrons_down == 2 {
        let term = (2.0 + (u / (4.0 * t)).powi(2)).sqrt();
        [
            -2.0 * t * term - u / 2.0,
            -u / 2.0,
            -2.0 * t * term + u / 2.0,
        ]
    } else {
        approximate_eigenvalues(t, u, electrons_up, electrons_down)
    };

    let denominator = (2.0 + (u / (4.0 * t)).powi(2)).sqrt();
    let spin_correlations = [-1.0 / (2.0 * denominator), 1.0 / (4.0 * denominator)];

    let uc_transition_ev = if electrons_up == 2 && electrons_down == 2 {
        4.0 * t * 2f64.sqrt()
    } else {
        let filling = (electrons_up + electrons_down) as f64 / 4.0;
        8.0 * t * filling * (1.0 - filling)
    };

    // m* = m0 * (1 + (U/4t)^2 / 2)
    let effective_mass = 1.0 + (u / (4.0 * t)).powi(2) / 2.0;

    Ok(HubbardResult {
        eigenvalues_ev,
        spin_correlations,
        uc_transition_ev,
        effective_mass,
    })
}

fn validate_hubbard(params: &HubbardParams) -> Result<(), ValidationError> {
    if !params.t.is_finite() || params.t <= 0.0 {
        return Err(ValidationError::NonPositiveHopping(params.t));
    }
    if !params.u.is_finite() || params.u < 0.0 {
        return Err(ValidationError::NegativeInteraction(params.u));
    }
    let total = params.electrons_up + params.electrons_down;
    if total > 8 {
        return Err(ValidationError::ElectronCount {
            up: params.electrons_up,
            down: params.electrons_down,
        });
    }
    if total == 0 {
        return Err(ValidationError::EmptyLattice);
    }
    Ok(())
}

fn approximate_eigenvalues(t: f64, u: f64, up: u32, down: u32) -> [f64; 3] {
    let total = (up + down) as f64;
    let base = -t * total * 2.0;
    [
        base - u * up.min(down) as f64 * 0.5,
        base,
        base + u * 0.3,
    ]
}

// ═══════════════════════════════════════════════════════════════════════════════
// TWO-LEVEL SYSTEM
// ═══════════════════════════════════════════════════════════════════════════════

/// Parameters for the two-qubit exchange solver. J and B in GHz, times
/// in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoQubitParams {
    /// Exchange coupling J (GHz)
    pub j: f64,
    /// Transverse field B (GHz)
    pub b: f64,
    /// Averaging window (ns)
    pub total_time: f64,
    /// Sampling step (ns)
    pub time_step: f64,
}

impl Default for TwoQubitParams {
    fn default() -> Self {
        Self {
            j: 1.25,
            b: 0.75,
            total_time: 100.0,
            time_step: 0.01,
        }
    }
}

/// Concurrence readout of the two-level system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoQubitResult {
    /// Rabi frequency sqrt(J^2 + B^2) (GHz)
    pub frequency_ghz: f64,
    /// First three concurrence maxima (ns): (2n-1) pi / (4 f)
    pub concurrence_maxima_ns: [f64; 3],
    /// Mean of |sin(2 f t)| sampled over the window
    pub concurrence_average: f64,
}

/// Concurrence C(t) = |sin(2 f t)| with f = sqrt(J^2 + B^2); maxima fall
/// at odd multiples of pi / (4 f).
pub fn solve_two_qubit(params: &TwoQubitParams) -> FoamResult<TwoQubitResult> {
    validate_two_qubit(params)?;
    let f = (params.j.powi(2) + params.b.powi(2)).sqrt();

    let concurrence_maxima_ns = [
        PI / (4.0 * f),
        3.0 * PI / (4.0 * f),
        5.0 * PI / (4.0 * f),
    ];

    let samples = (params.total_time / params.time_step).floor() as usize;
    let mut sum = 0.0;
    for i in 0..samples {
        let t = i as f64 * params.time_step;
        sum += (2.0 * f * t).sin().abs();
    }
    let concurrence_average = if samples > 0 { sum / samples as f64 } else { 0.0 };

    Ok(TwoQubitResult {
        frequency_ghz: f,
        concurrence_maxima_ns,
        concurrence_average,
    })
}

fn validate_two_qubit(params: &TwoQubitParams) -> Result<(), ValidationError> {
    if !params.time_step.is_finite() || params.time_step <= 0.0 {
        return Err(ValidationError::NonPositiveTimeStep(params.time_step));
    }
    let f2 = params.j.powi(2) + params.b.powi(2);
    if !f2.is_finite() || f2 <= 0.0 {
        return Err(ValidationError::ZeroFrequency);
    }
    Ok(())
}

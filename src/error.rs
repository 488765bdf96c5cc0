//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR — Unified Error Type for Foam
//! ═══════════════════════════════════════════════════════════════════════════════
//! Centralized error handling. Only configuration problems are fatal; every
//! mid-run condition is absorbed and reflected as data in the result.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::fmt;

/// Convenience alias used throughout the crate
pub type FoamResult<T> = Result<T, FoamError>;

/// The unified error type for the Foam crate
#[derive(Debug)]
pub enum FoamError {
    /// Invalid run configuration, rejected before any state mutation
    Config(ConfigError),
    /// Invalid parameters for a closed-form solver
    Validation(ValidationError),
    /// A collaborator (hypothesis source, calculator) failed
    Collaborator(String),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// I/O error (CLI output paths)
    Io(std::io::Error),
}

impl std::error::Error for FoamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FoamError::Json(e) => Some(e),
            FoamError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for FoamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoamError::Config(e) => write!(f, "Configuration error: {}", e),
            FoamError::Validation(e) => write!(f, "Validation error: {}", e),
            FoamError::Collaborator(msg) => write!(f, "Collaborator failure: {}", msg),
            FoamError::Json(e) => write!(f, "JSON error: {}", e),
            FoamError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<serde_json::Error> for FoamError {
    fn from(err: serde_json::Error) -> Self {
        FoamError::Json(err)
    }
}

impl From<std::io::Error> for FoamError {
    fn from(err: std::io::Error) -> Self {
        FoamError::Io(err)
    }
}

/// Configuration-specific errors, surfaced before a run starts
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Problem complexity must be strictly positive
    NonPositiveComplexity(f64),
    /// A step count that must be at least 1 was zero
    ZeroSteps(&'static str),
    /// A constant that must be strictly positive was not
    NonPositive { name: &'static str, value: f64 },
    /// A constant fell outside its documented range
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    /// A [min, max] bound pair was inverted
    InvertedBounds {
        name: &'static str,
        min: f64,
        max: f64,
    },
    /// A value that must be finite was NaN or infinite
    NotFinite { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NonPositiveComplexity(c) => {
                write!(f, "complexity must be > 0, got {}", c)
            }
            ConfigError::ZeroSteps(name) => write!(f, "{} must be at least 1", name),
            ConfigError::NonPositive { name, value } => {
                write!(f, "{} must be > 0, got {}", name, value)
            }
            ConfigError::OutOfRange {
                name,
                value,
                min,
                max,
            } => write!(f, "{} = {} outside [{}, {}]", name, value, min, max),
            ConfigError::InvertedBounds { name, min, max } => {
                write!(f, "{} bounds inverted: min {} > max {}", name, min, max)
            }
            ConfigError::NotFinite { name } => write!(f, "{} must be finite", name),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for FoamError {
    fn from(err: ConfigError) -> Self {
        FoamError::Config(err)
    }
}

/// Parameter errors from the closed-form physics solvers
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Hopping integral t must be positive
    NonPositiveHopping(f64),
    /// Coulomb repulsion U cannot be negative
    NegativeInteraction(f64),
    /// Electron count out of range for the 4-site lattice
    ElectronCount { up: u32, down: u32 },
    /// The lattice must contain at least one electron
    EmptyLattice,
    /// Time step must be positive
    NonPositiveTimeStep(f64),
    /// Coupling and field cannot both be zero
    ZeroFrequency,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonPositiveHopping(t) => {
                write!(f, "hopping integral t must be > 0, got {}", t)
            }
            ValidationError::NegativeInteraction(u) => {
                write!(f, "interaction U cannot be negative, got {}", u)
            }
            ValidationError::ElectronCount { up, down } => write!(
                f,
                "electron count {} up / {} down invalid for 4 sites (max 8 total)",
                up, down
            ),
            ValidationError::EmptyLattice => {
                write!(f, "lattice must contain at least one electron")
            }
            ValidationError::NonPositiveTimeStep(dt) => {
                write!(f, "time step must be > 0, got {}", dt)
            }
            ValidationError::ZeroFrequency => {
                write!(f, "coupling J and field B cannot both be zero")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for FoamError {
    fn from(err: ValidationError) -> Self {
        FoamError::Validation(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let e = ConfigError::NonPositiveComplexity(-1.0);
        assert!(e.to_string().contains("complexity"));

        let e = ConfigError::OutOfRange {
            name: "tension_alpha",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert!(e.to_string().contains("tension_alpha"));
    }

    #[test]
    fn test_error_conversion() {
        let e: FoamError = ConfigError::ZeroSteps("inner_steps").into();
        assert!(matches!(e, FoamError::Config(_)));

        let e: FoamError = ValidationError::EmptyLattice.into();
        assert!(matches!(e, FoamError::Validation(_)));
    }
}

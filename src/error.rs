//! Error types for the hybrid solver.
//!
//! Configuration errors are raised while building models, reaction systems
//! and coupling rules, before any simulation time elapses. Numerical errors
//! come out of the ODE integrator during a synchronization step and abort the
//! run.

use thiserror::Error;

/// Errors raised by the hybrid RDME/ODE layer
#[derive(Debug, Error)]
pub enum HybridError {
    // === Configuration ===
    #[error("unknown species `{0}`")]
    UnknownSpecies(String),

    #[error("unknown region `{0}`")]
    UnknownRegion(String),

    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },

    #[error("reaction {index} has neither reactants nor products")]
    DegenerateReaction { index: usize },

    #[error("reaction {index} has invalid rate constant {value}")]
    InvalidRateConstant { index: usize, value: f64 },

    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    // === Numerical ===
    #[error("ODE integration diverged at t = {time_sec} s (variable `{variable}` = {value})")]
    IntegratorDiverged {
        time_sec: f64,
        variable: String,
        value: f64,
    },

    #[error("negative concentration for `{variable}` ({value} M) at t = {time_sec} s")]
    NegativeConcentration {
        time_sec: f64,
        variable: String,
        value: f64,
    },

    // === Protocol ===
    #[error("synchronization time went backwards: {current} s < {previous} s")]
    TimeReversal { previous: f64, current: f64 },

    // === I/O ===
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, HybridError>;

impl HybridError {
    /// True for errors detected while building the model, before the run starts
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HybridError::UnknownSpecies(_)
                | HybridError::UnknownRegion(_)
                | HybridError::DuplicateName { .. }
                | HybridError::DegenerateReaction { .. }
                | HybridError::InvalidRateConstant { .. }
                | HybridError::DimensionMismatch { .. }
                | HybridError::InvalidParameter { .. }
        )
    }

    /// True for integrator failures
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            HybridError::IntegratorDiverged { .. } | HybridError::NegativeConcentration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(HybridError::UnknownSpecies("G9".into()).is_configuration());
        assert!(HybridError::DegenerateReaction { index: 0 }.is_configuration());
        assert!(!HybridError::TimeReversal { previous: 1.0, current: 0.5 }.is_configuration());

        let err = HybridError::NegativeConcentration {
            time_sec: 1.0,
            variable: "GAI".into(),
            value: -1e-3,
        };
        assert!(err.is_numerical());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_error_messages() {
        let err = HybridError::UnknownRegion("vacuole".into());
        assert_eq!(err.to_string(), "unknown region `vacuole`");

        let err = HybridError::DimensionMismatch {
            context: "ODE state",
            expected: 6,
            actual: 5,
        };
        assert!(err.to_string().contains("expected 6, got 5"));
    }
}

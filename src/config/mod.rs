//! Configuration module for loading simulation parameters.
//!
//! Biological parameters carry the source they were taken from.

mod parameters;

pub use parameters::{
    HostParameters, HybridParameters, IntegratorParameters, Parameters, AVOGADRO, MAX_STEP_HALVINGS,
};

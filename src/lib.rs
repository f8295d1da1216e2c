//! Galactose switch hybrid simulator
//!
//! Couples a stochastic particle engine (RDME, or the bundled well-mixed
//! Gillespie host) with a deterministic ODE subsystem for the fast galactose
//! transport and binding reactions of the yeast GAL network.

// Allow non-snake-case for unit suffixes in field names (M, L, sec).
// This follows the project convention of including units in names.
#![allow(non_snake_case)]

pub mod config;
pub mod error;
pub mod export;
pub mod host;
pub mod hybrid;
pub mod model;
pub mod ode;

pub use config::{HostParameters, HybridParameters, IntegratorParameters, Parameters, AVOGADRO};
pub use error::{HybridError, Result};
pub use host::{run_hybrid, simulate, HybridHook, RateUpdate, SpeciesTrajectory, WellMixedHost};
pub use hybrid::{
    Coupling, CouplingSpec, CountSnapshot, HybridStepper, LatticeView, OdeTrajectory,
    SyncDiagnostics,
};
pub use model::{ModelBuilder, ModelDefinition, ReactionId, RegionId, SpeciesId};
pub use ode::{IntegratorConfig, OdeSolver, RK4Integrator, ReactionSpec, ReactionSystem};

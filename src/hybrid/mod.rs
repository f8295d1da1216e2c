//! Hybrid RDME/ODE coupling.
//!
//! The discrete engine tracks integer particle counts per species and
//! region. A small set of fast transport and binding reactions is instead
//! carried by an ODE subsystem owned by `HybridStepper`.
//!
//! ## Data Flow
//! ```text
//! Discrete engine (particle counts)          ODE subsystem (mol/L)
//!        │                                          │
//!        │   protein totals / N_A·V                 │
//!        ├─────────────────────────────────────────►│ reconcile
//!        │   exchanged population delta             │
//!        ├─────────────────────────────────────────►│ substrate pool
//!        │                                          │ integrate dt
//!        │◄─────────────────────────────────────────┤
//!        │   feedback rate = k × [driver]           │
//! ```
//!
//! Counts flow one way (discrete → continuous); the only influence of the
//! ODE state on the discrete engine is the feedback rate.

pub mod coupling;
pub mod lattice;
pub mod stepper;
pub mod trajectory;

pub use coupling::{
    BoundSpec, ConservationRule, ConservationSpec, CountSource, Coupling, CouplingSpec,
    FeedbackChannel, Reconciliation,
};
pub use lattice::{CountSnapshot, LatticeView};
pub use stepper::{HybridStepper, StepperPhase, SyncDiagnostics};
pub use trajectory::OdeTrajectory;

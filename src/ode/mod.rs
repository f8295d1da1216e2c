//! Continuous subsystem: mass-action reaction systems and their integration.
//!
//! The hybrid stepper hands the solver a concentration vector at every
//! synchronization point and asks for it to be advanced by the elapsed
//! simulated time. Concentrations are in mol/L and time in seconds.

pub mod integrator;
pub mod reaction_system;

pub use integrator::{IntegratorConfig, RK4Integrator};
pub use reaction_system::{ReactionSpec, ReactionSystem};

use crate::error::Result;

/// A compiled reaction system paired with its integrator
pub struct OdeSolver {
    system: ReactionSystem,
    integrator: RK4Integrator,
}

impl OdeSolver {
    pub fn new(system: ReactionSystem, config: IntegratorConfig) -> Self {
        let integrator = RK4Integrator::new(system.n_species(), config);
        Self { system, integrator }
    }

    pub fn system(&self) -> &ReactionSystem {
        &self.system
    }

    pub fn integrator(&self) -> &RK4Integrator {
        &self.integrator
    }

    /// Advance `state` by `dt_sec` in place. Non-positive `dt_sec` is a no-op.
    pub fn advance(&mut self, state: &mut [f64], dt_sec: f64) -> Result<()> {
        self.system.check_len("ODE state", state.len())?;
        let system = &self.system;
        self.integrator
            .integrate(state, dt_sec, system.names(), |y, dydt| {
                system.derivatives_unchecked(y, dydt)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_order_conversion() {
        // A -> B, k = 2, A(0) = 5: A(1) = 5·e⁻²
        let system = ReactionSystem::build(&[ReactionSpec::new(["A"], ["B"], 2.0)]).unwrap();
        let mut solver = OdeSolver::new(system, IntegratorConfig::default());

        let mut y = vec![5.0, 0.0];
        solver.advance(&mut y, 1.0).unwrap();

        let expected_a = 5.0 * (-2.0_f64).exp();
        assert!((y[0] - expected_a).abs() < 1e-8, "A = {}", y[0]);
        assert!((y[1] - (5.0 - expected_a)).abs() < 1e-8, "B = {}", y[1]);
    }

    #[test]
    fn test_wrong_state_length() {
        let system = ReactionSystem::build(&[ReactionSpec::new(["A"], ["B"], 2.0)]).unwrap();
        let mut solver = OdeSolver::new(system, IntegratorConfig::default());
        let mut y = vec![5.0];
        assert!(solver.advance(&mut y, 1.0).is_err());
    }
}

//! Hybrid stepper synchronizing the discrete engine with the ODE subsystem.
//!
//! The host engine pauses at fixed simulated-time checkpoints and calls
//! `synchronize`. Each call:
//! 1. seeds (first call) or reconciles the ODE state against the lattice counts
//! 2. adds the change in the exchanged population to the substrate pool
//! 3. integrates the ODE state over the elapsed interval
//! 4. returns the new rate for the feedback reaction
//!
//! ## Usage
//! ```ignore
//! let mut stepper = HybridStepper::new(system, coupling, IntegratorConfig::default())?;
//! let rate = stepper.synchronize(t, &snapshot)?;
//! host.set_reaction_rate(stepper.feedback_reaction(), rate)?;
//! ```

use crate::error::{HybridError, Result};
use crate::model::{ModelDefinition, ReactionId};
use crate::ode::{IntegratorConfig, OdeSolver, ReactionSystem};

use super::coupling::{Coupling, Reconciliation};
use super::lattice::LatticeView;
use super::trajectory::OdeTrajectory;

/// Lifecycle of the stepper
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepperPhase {
    /// No synchronization has happened yet
    Uninitialized,
    /// Carrying ODE state between synchronizations
    Running {
        last_time_sec: f64,
        /// Exchanged population at the last synchronization (M)
        exchange_baseline: f64,
    },
}

/// Hybrid RDME/ODE stepper
pub struct HybridStepper {
    solver: OdeSolver,
    coupling: Coupling,
    state: Vec<f64>,
    phase: StepperPhase,
    trajectory: OdeTrajectory,
    /// Substrate that the exchange update tried to remove but was not there (M)
    exchange_deficit: f64,
    sync_count: u64,
    last_rate: f64,
}

impl HybridStepper {
    /// Create a stepper. Indices in `coupling` must refer to `system`.
    pub fn new(system: ReactionSystem, coupling: Coupling, config: IntegratorConfig) -> Result<Self> {
        let n = system.n_species();
        let mut indices = vec![coupling.substrate, coupling.feedback.driver];
        for rule in &coupling.rules {
            indices.push(rule.free);
            for b in &rule.bound {
                indices.push(b.variable);
                indices.extend(b.releases_to);
            }
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= n) {
            return Err(HybridError::DimensionMismatch {
                context: "coupling variable index",
                expected: n,
                actual: bad,
            });
        }

        let trajectory = OdeTrajectory::new(system.names().to_vec());
        Ok(Self {
            state: system.zero_state(),
            solver: OdeSolver::new(system, config),
            coupling,
            phase: StepperPhase::Uninitialized,
            trajectory,
            exchange_deficit: 0.0,
            sync_count: 0,
            last_rate: 0.0,
        })
    }

    /// Synchronize with the discrete engine at `current_time_sec`.
    ///
    /// Returns the rate to apply to the feedback reaction until the next
    /// synchronization. The ODE state is only committed if every stage
    /// succeeds.
    pub fn synchronize<V: LatticeView + ?Sized>(
        &mut self,
        current_time_sec: f64,
        lattice: &V,
    ) -> Result<f64> {
        if !current_time_sec.is_finite() {
            return Err(HybridError::InvalidParameter {
                name: "current_time_sec",
                reason: format!("synchronization time must be finite, got {current_time_sec}"),
            });
        }
        let nav = self.coupling.nav;
        let mut next = self.state.clone();

        let (dt, baseline) = match self.phase {
            StepperPhase::Uninitialized => {
                next.iter_mut().for_each(|x| *x = 0.0);
                for rule in &self.coupling.rules {
                    let total = rule.source.read(lattice)? as f64 / nav;
                    rule.seed(&mut next, total);
                }
                let baseline = self.coupling.exchange_concentration(lattice)?;
                log::debug!(
                    "Hybrid stepper seeded at t = {:.4} s, exchange baseline {:.4e} M",
                    current_time_sec,
                    baseline
                );
                (0.0, baseline)
            }
            StepperPhase::Running {
                last_time_sec,
                exchange_baseline,
            } => {
                if current_time_sec < last_time_sec {
                    return Err(HybridError::TimeReversal {
                        previous: last_time_sec,
                        current: current_time_sec,
                    });
                }

                for rule in &self.coupling.rules {
                    let total = rule.source.read(lattice)? as f64 / nav;
                    if let Reconciliation::Scaled { fraction, released } = rule.reconcile(&mut next, total) {
                        log::trace!(
                            "{} lost mass: scaled by {:.4}, released {:.4e} M",
                            rule.label,
                            fraction,
                            released
                        );
                    }
                }

                let now = self.coupling.exchange_concentration(lattice)?;
                let substrate = self.coupling.substrate;
                let updated = next[substrate] + (now - exchange_baseline);
                if updated < 0.0 {
                    self.exchange_deficit += -updated;
                    log::warn!(
                        "Exchange update drove `{}` to {:.4e} M at t = {:.4} s; flooring at zero",
                        self.solver.system().names()[substrate],
                        updated,
                        current_time_sec
                    );
                    next[substrate] = 0.0;
                } else {
                    next[substrate] = updated;
                }

                (current_time_sec - last_time_sec, now)
            }
        };

        if dt > 0.0 {
            self.solver.advance(&mut next, dt)?;
        }

        let rate = self.coupling.feedback.rate(&next);
        self.trajectory.push(current_time_sec, &next)?;

        self.state = next;
        self.phase = StepperPhase::Running {
            last_time_sec: current_time_sec,
            exchange_baseline: baseline,
        };
        self.sync_count += 1;
        self.last_rate = rate;

        log::debug!(
            "Sync #{} at t = {:.4} s (dt = {:.4} s): feedback rate {:.4e}",
            self.sync_count,
            current_time_sec,
            dt,
            rate
        );

        Ok(rate)
    }

    /// Current ODE state in `names()` order
    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn names(&self) -> &[String] {
        self.solver.system().names()
    }

    /// Concentration of one ODE variable
    pub fn concentration(&self, name: &str) -> Result<f64> {
        let idx = self.solver.system().index_of(name)?;
        Ok(self.state[idx])
    }

    pub fn phase(&self) -> StepperPhase {
        self.phase
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.phase, StepperPhase::Uninitialized)
    }

    pub fn last_sync_time(&self) -> Option<f64> {
        match self.phase {
            StepperPhase::Uninitialized => None,
            StepperPhase::Running { last_time_sec, .. } => Some(last_time_sec),
        }
    }

    /// Reaction whose rate this stepper drives
    pub fn feedback_reaction(&self) -> ReactionId {
        self.coupling.feedback.reaction
    }

    pub fn last_rate(&self) -> f64 {
        self.last_rate
    }

    pub fn sync_count(&self) -> u64 {
        self.sync_count
    }

    pub fn exchange_deficit(&self) -> f64 {
        self.exchange_deficit
    }

    pub fn coupling(&self) -> &Coupling {
        &self.coupling
    }

    pub fn system(&self) -> &ReactionSystem {
        self.solver.system()
    }

    pub fn trajectory(&self) -> &OdeTrajectory {
        &self.trajectory
    }

    /// Hand over the recorded trajectory, leaving an empty one behind
    pub fn take_trajectory(&mut self) -> OdeTrajectory {
        let names = self.trajectory.names.clone();
        std::mem::replace(&mut self.trajectory, OdeTrajectory::new(names))
    }

    /// Snapshot of ODE and discrete state for reporting
    pub fn diagnostics<V: LatticeView + ?Sized>(
        &self,
        model: &ModelDefinition,
        lattice: &V,
    ) -> Result<SyncDiagnostics> {
        let ode = self
            .names()
            .iter()
            .cloned()
            .zip(self.state.iter().copied())
            .collect();

        let mut rdme = Vec::with_capacity(model.n_species());
        for name in model.species_names() {
            let id = model.species_id(name)?;
            rdme.push((name.clone(), lattice.total_count(id)?));
        }

        Ok(SyncDiagnostics {
            time_sec: self.last_sync_time().unwrap_or(0.0),
            ode,
            rdme,
            feedback_rate: self.last_rate,
            exchange_deficit: self.exchange_deficit,
        })
    }
}

/// Diagnostic information from one synchronization
#[derive(Debug, Clone)]
pub struct SyncDiagnostics {
    /// Simulation time (seconds)
    pub time_sec: f64,
    /// ODE variables (M)
    pub ode: Vec<(String, f64)>,
    /// Discrete totals (particles)
    pub rdme: Vec<(String, u64)>,
    /// Rate handed to the feedback reaction
    pub feedback_rate: f64,
    /// Cumulative floored substrate (M)
    pub exchange_deficit: f64,
}

impl SyncDiagnostics {
    /// Print a formatted summary.
    pub fn print_summary(&self) {
        println!("{}", "=".repeat(80));
        println!("t = {:.4} s", self.time_sec);
        println!("ODE");
        for (name, value) in &self.ode {
            println!("  {:<16}{:16.5e}", name, value);
        }
        println!("RDME");
        for (name, count) in &self.rdme {
            println!("  {:<16}{:16}", name, count);
        }
        println!("new rate: {:.3e}", self.feedback_rate);
        if self.exchange_deficit > 0.0 {
            println!("exchange deficit: {:.3e} M", self.exchange_deficit);
        }
        println!("{}", "-".repeat(80));
    }

    /// Print a one-line row header for time series.
    pub fn print_row_header(&self) {
        let mut header = format!("{:>10}", "Time(s)");
        for (name, _) in &self.ode {
            header.push_str(&format!(" {:>12}", name));
        }
        header.push_str(&format!(" {:>12}", "Rate"));
        println!("{}", header);
        println!("{}", "-".repeat(header.len()));
    }

    /// Print a one-line row.
    pub fn print_row(&self) {
        let mut row = format!("{:10.3}", self.time_sec);
        for (_, value) in &self.ode {
            row.push_str(&format!(" {:12.4e}", value));
        }
        row.push_str(&format!(" {:12.4e}", self.feedback_rate));
        println!("{}", row);
    }
}

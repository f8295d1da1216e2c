//! ODE integration for the fast transport/binding subsystem.
//!
//! Implements 4th-order Runge-Kutta (RK4) integration over one
//! synchronization interval. The interval is split into equal substeps no
//! longer than `max_step_sec`. After every substep, values in
//! `[-negative_tolerance, 0)` are round-off and are set to zero. A value
//! below `-negative_tolerance`, or a non-finite one, fails the interval,
//! which is then retried from the saved start state with half the substep
//! size.
//!
//! Reference: Press et al., Numerical Recipes, 3rd ed., Cambridge University Press 2007

use crate::config::{IntegratorParameters, MAX_STEP_HALVINGS};
use crate::error::{HybridError, Result};

/// Configuration for the ODE integrator
#[derive(Debug, Clone)]
pub struct IntegratorConfig {
    /// Largest substep in seconds
    pub max_step_sec: f64,
    /// Minimum number of substeps per interval
    pub min_substeps: usize,
    /// Values in [-tolerance, 0) are treated as round-off and set to zero
    pub negative_tolerance: f64,
    /// Number of times a failed interval is retried with halved substeps,
    /// capped at `MAX_STEP_HALVINGS`
    pub max_step_halvings: u32,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        IntegratorParameters::default().into()
    }
}

impl From<IntegratorParameters> for IntegratorConfig {
    fn from(p: IntegratorParameters) -> Self {
        Self {
            max_step_sec: p.max_step_sec,
            min_substeps: p.min_substeps.max(1),
            negative_tolerance: p.negative_tolerance_M,
            max_step_halvings: p.max_step_halvings.min(MAX_STEP_HALVINGS),
        }
    }
}

/// Why a single attempt at an interval failed
#[derive(Debug, Clone, Copy, PartialEq)]
enum StepFailure {
    NonFinite { index: usize, value: f64 },
    Negative { index: usize, value: f64 },
}

/// 4th-order Runge-Kutta integrator for ODE systems
///
/// Solves dy/dt = f(y) where y is a vector of concentrations
pub struct RK4Integrator {
    /// Configuration
    pub config: IntegratorConfig,
    /// Total integrated time in seconds
    pub time_sec: f64,
    /// Number of accepted substeps
    pub step_count: u64,
    /// Number of intervals that needed a retry
    pub retry_count: u64,
    /// Scratch vectors for intermediate calculations
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    y_temp: Vec<f64>,
    y_start: Vec<f64>,
}

impl RK4Integrator {
    /// Create a new RK4 integrator for a system with n variables
    pub fn new(n_variables: usize, config: IntegratorConfig) -> Self {
        Self {
            config,
            time_sec: 0.0,
            step_count: 0,
            retry_count: 0,
            k1: vec![0.0; n_variables],
            k2: vec![0.0; n_variables],
            k3: vec![0.0; n_variables],
            k4: vec![0.0; n_variables],
            y_temp: vec![0.0; n_variables],
            y_start: vec![0.0; n_variables],
        }
    }

    /// Resize internal buffers if system size changes
    pub fn resize(&mut self, n_variables: usize) {
        if self.k1.len() != n_variables {
            self.k1.resize(n_variables, 0.0);
            self.k2.resize(n_variables, 0.0);
            self.k3.resize(n_variables, 0.0);
            self.k4.resize(n_variables, 0.0);
            self.y_temp.resize(n_variables, 0.0);
            self.y_start.resize(n_variables, 0.0);
        }
    }

    /// Perform one RK4 step of size `h`
    ///
    /// # RK4 Algorithm
    /// k1 = f(y)
    /// k2 = f(y + h/2 * k1)
    /// k3 = f(y + h/2 * k2)
    /// k4 = f(y + h * k3)
    /// y_new = y + h/6 * (k1 + 2*k2 + 2*k3 + k4)
    pub fn step<F>(&mut self, y: &mut [f64], h: f64, derivatives: F)
    where
        F: Fn(&[f64], &mut [f64]),
    {
        let n = y.len();
        self.resize(n);

        derivatives(y, &mut self.k1);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * h * self.k1[i];
        }
        derivatives(&self.y_temp, &mut self.k2);

        for i in 0..n {
            self.y_temp[i] = y[i] + 0.5 * h * self.k2[i];
        }
        derivatives(&self.y_temp, &mut self.k3);

        for i in 0..n {
            self.y_temp[i] = y[i] + h * self.k3[i];
        }
        derivatives(&self.y_temp, &mut self.k4);

        let h_6 = h / 6.0;
        for i in 0..n {
            y[i] += h_6 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }
    }

    /// Integrate `y` forward by `duration_sec`.
    ///
    /// `labels` names the entries of `y` for error reporting. On error `y`
    /// holds the state at the start of the interval.
    pub fn integrate<F>(
        &mut self,
        y: &mut [f64],
        duration_sec: f64,
        labels: &[String],
        derivatives: F,
    ) -> Result<()>
    where
        F: Fn(&[f64], &mut [f64]),
    {
        if duration_sec <= 0.0 {
            return Ok(());
        }
        if labels.len() != y.len() {
            return Err(HybridError::DimensionMismatch {
                context: "integrator labels",
                expected: y.len(),
                actual: labels.len(),
            });
        }

        self.resize(y.len());
        self.y_start.copy_from_slice(y);

        let base_steps = ((duration_sec / self.config.max_step_sec).ceil() as usize)
            .max(self.config.min_substeps);

        let max_halvings = self.config.max_step_halvings.min(MAX_STEP_HALVINGS);
        let mut attempt = 0u32;
        loop {
            let n_steps = base_steps.saturating_mul(1usize << attempt);
            match self.attempt(y, duration_sec, n_steps, &derivatives) {
                Ok(()) => {
                    self.time_sec += duration_sec;
                    return Ok(());
                }
                Err(failure) => {
                    y.copy_from_slice(&self.y_start);
                    if attempt >= max_halvings {
                        return Err(self.to_error(failure, labels));
                    }
                    attempt += 1;
                    self.retry_count += 1;
                    log::warn!(
                        "ODE interval of {:.3e} s failed ({:?}), retrying with {} substeps",
                        duration_sec,
                        failure,
                        base_steps.saturating_mul(1usize << attempt)
                    );
                }
            }
        }
    }

    fn attempt<F>(
        &mut self,
        y: &mut [f64],
        duration_sec: f64,
        n_steps: usize,
        derivatives: &F,
    ) -> std::result::Result<(), StepFailure>
    where
        F: Fn(&[f64], &mut [f64]),
    {
        let h = duration_sec / n_steps as f64;
        for _ in 0..n_steps {
            self.step(y, h, derivatives);
            self.step_count += 1;

            for (index, value) in y.iter_mut().enumerate() {
                if !value.is_finite() {
                    return Err(StepFailure::NonFinite { index, value: *value });
                }
                if *value < 0.0 {
                    if *value < -self.config.negative_tolerance {
                        return Err(StepFailure::Negative { index, value: *value });
                    }
                    *value = 0.0;
                }
            }
        }
        Ok(())
    }

    fn to_error(&self, failure: StepFailure, labels: &[String]) -> HybridError {
        match failure {
            StepFailure::NonFinite { index, value } => HybridError::IntegratorDiverged {
                time_sec: self.time_sec,
                variable: labels[index].clone(),
                value,
            },
            StepFailure::Negative { index, value } => HybridError::NegativeConcentration {
                time_sec: self.time_sec,
                variable: labels[index].clone(),
                value,
            },
        }
    }

    /// Reset integrator state
    pub fn reset(&mut self) {
        self.time_sec = 0.0;
        self.step_count = 0;
        self.retry_count = 0;
    }
}

//! Reference host: a well-mixed stochastic engine that pauses at fixed
//! checkpoints and hands its counts to a hook.
//!
//! The hybrid stepper plugs in through `HybridHook`; any other engine that
//! can expose a `LatticeView` and accept rate updates can drive it the same
//! way.

pub mod gillespie;
pub mod run;

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, Result};
use crate::hybrid::{CountSnapshot, HybridStepper};
use crate::model::ReactionId;

pub use gillespie::WellMixedHost;
pub use run::{run_hybrid, simulate, HybridRun, RunOutcome};

/// Rate change requested by a hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateUpdate {
    pub reaction: ReactionId,
    pub rate_constant: f64,
}

/// Callback invoked by the host at each checkpoint
pub trait HybridHook {
    fn on_hook(&mut self, time_sec: f64, lattice: &CountSnapshot) -> Result<Option<RateUpdate>>;
}

impl HybridHook for HybridStepper {
    fn on_hook(&mut self, time_sec: f64, lattice: &CountSnapshot) -> Result<Option<RateUpdate>> {
        let rate_constant = self.synchronize(time_sec, lattice)?;
        Ok(Some(RateUpdate {
            reaction: self.feedback_reaction(),
            rate_constant,
        }))
    }
}

/// Species totals (summed over regions) over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesTrajectory {
    pub names: Vec<String>,
    pub times: Vec<f64>,
    pub counts: Vec<Vec<u64>>,
}

impl SpeciesTrajectory {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            times: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub fn push(&mut self, time_sec: f64, counts: Vec<u64>) -> Result<()> {
        if counts.len() != self.names.len() {
            return Err(HybridError::DimensionMismatch {
                context: "species row",
                expected: self.names.len(),
                actual: counts.len(),
            });
        }
        self.times.push(time_sec);
        self.counts.push(counts);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Column of one species over time
    pub fn series(&self, name: &str) -> Result<Vec<u64>> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| HybridError::UnknownSpecies(name.to_string()))?;
        self.counts
            .iter()
            .map(|c| {
                c.get(idx).copied().ok_or(HybridError::DimensionMismatch {
                    context: "species row",
                    expected: self.names.len(),
                    actual: c.len(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_trajectory() {
        let mut traj = SpeciesTrajectory::new(vec!["A".into(), "B".into()]);
        traj.push(0.0, vec![3, 4]).unwrap();
        traj.push(1.0, vec![2, 5]).unwrap();
        assert!(traj.push(2.0, vec![1]).is_err());
        assert_eq!(traj.len(), 2);
        assert_eq!(traj.series("B").unwrap(), vec![4, 5]);
        assert!(traj.series("Z").is_err());
    }

    #[test]
    fn test_series_on_ragged_rows_is_error() {
        let mut traj = SpeciesTrajectory::new(vec!["A".into(), "B".into()]);
        traj.push(0.0, vec![3, 4]).unwrap();
        traj.counts[0].pop();
        assert!(matches!(
            traj.series("B"),
            Err(HybridError::DimensionMismatch { actual: 1, .. })
        ));
    }
}

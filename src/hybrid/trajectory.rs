//! In-memory time series of ODE states.
//!
//! One row is appended per synchronization. At the end of a run the series
//! is written next to the host's output as `<output>_ode.json` (and
//! optionally `<output>_ode.csv`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HybridError, Result};

/// Time series of ODE state vectors with their variable labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdeTrajectory {
    pub names: Vec<String>,
    pub times: Vec<f64>,
    pub states: Vec<Vec<f64>>,
}

impl OdeTrajectory {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            times: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn push(&mut self, time_sec: f64, state: &[f64]) -> Result<()> {
        if state.len() != self.names.len() {
            return Err(HybridError::DimensionMismatch {
                context: "trajectory row",
                expected: self.names.len(),
                actual: state.len(),
            });
        }
        self.times.push(time_sec);
        self.states.push(state.to_vec());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last recorded `(time, state)`
    pub fn last(&self) -> Option<(f64, &[f64])> {
        self.times
            .last()
            .zip(self.states.last())
            .map(|(t, s)| (*t, s.as_slice()))
    }

    /// Column of one variable over time
    pub fn series(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| HybridError::UnknownSpecies(name.to_string()))?;
        self.states
            .iter()
            .map(|s| {
                s.get(idx).copied().ok_or(HybridError::DimensionMismatch {
                    context: "trajectory row",
                    expected: self.names.len(),
                    actual: s.len(),
                })
            })
            .collect()
    }

    /// Check that every row has one value per label
    pub fn validate(&self) -> Result<()> {
        if self.times.len() != self.states.len() {
            return Err(HybridError::DimensionMismatch {
                context: "trajectory rows",
                expected: self.times.len(),
                actual: self.states.len(),
            });
        }
        if let Some(row) = self.states.iter().find(|s| s.len() != self.names.len()) {
            return Err(HybridError::DimensionMismatch {
                context: "trajectory row",
                expected: self.names.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }

    /// `<output>_ode.json`
    pub fn sidecar_path(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push("_ode.json");
        PathBuf::from(name)
    }

    /// Write the JSON sidecar for `output` and return its path
    pub fn save_sidecar(&self, output: &Path) -> Result<PathBuf> {
        let path = Self::sidecar_path(output);
        crate::export::export_ode_json_to(self, &path)?;
        Ok(path)
    }

    /// Read a JSON sidecar written by `save_sidecar`
    pub fn load_sidecar(path: &Path) -> Result<Self> {
        crate::export::import_ode_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OdeTrajectory {
        let mut traj = OdeTrajectory::new(vec!["A".into(), "B".into()]);
        traj.push(0.0, &[1.0, 0.0]).unwrap();
        traj.push(0.1, &[0.8, 0.2]).unwrap();
        traj
    }

    #[test]
    fn test_push_and_last() {
        let traj = sample();
        assert_eq!(traj.len(), 2);
        let (t, s) = traj.last().unwrap();
        assert!((t - 0.1).abs() < 1e-12);
        assert_eq!(s, &[0.8, 0.2]);
    }

    #[test]
    fn test_push_wrong_width() {
        let mut traj = sample();
        assert!(traj.push(0.2, &[1.0]).is_err());
        assert_eq!(traj.len(), 2);
    }

    #[test]
    fn test_series() {
        let traj = sample();
        assert_eq!(traj.series("B").unwrap(), vec![0.0, 0.2]);
        assert!(traj.series("C").is_err());
    }

    #[test]
    fn test_series_on_ragged_rows_is_error() {
        let mut traj = sample();
        traj.states[1].pop();
        assert!(matches!(
            traj.series("B"),
            Err(HybridError::DimensionMismatch { expected: 2, actual: 1, .. })
        ));
        assert_eq!(traj.series("A").unwrap(), vec![1.0, 0.8]);
    }

    #[test]
    fn test_sidecar_path() {
        let path = OdeTrajectory::sidecar_path(Path::new("runs/galactose.lm"));
        assert_eq!(path, PathBuf::from("runs/galactose.lm_ode.json"));
    }

    #[test]
    fn test_validate_detects_ragged_rows() {
        let mut traj = sample();
        traj.states[1].pop();
        assert!(traj.validate().is_err());
    }
}

//! JSON sidecar for ODE trajectories.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hybrid::OdeTrajectory;

/// Sidecar format version
pub const ODE_EXPORT_VERSION: &str = "1.0.0";

/// On-disk layout of `<output>_ode.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdeExport {
    /// Export timestamp
    pub exported_at: String,
    /// Export version for compatibility
    pub version: String,
    pub names: Vec<String>,
    pub times: Vec<f64>,
    pub states: Vec<Vec<f64>>,
}

impl From<&OdeTrajectory> for OdeExport {
    fn from(traj: &OdeTrajectory) -> Self {
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: ODE_EXPORT_VERSION.to_string(),
            names: traj.names.clone(),
            times: traj.times.clone(),
            states: traj.states.clone(),
        }
    }
}

/// Write an ODE trajectory to `path`
pub fn export_ode_json_to(traj: &OdeTrajectory, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &OdeExport::from(traj))?;

    log::info!(
        "ODE trajectory exported: {} ({} rows)",
        path.display(),
        traj.len()
    );
    Ok(())
}

/// Read an ODE trajectory written by `export_ode_json_to`
pub fn import_ode_json(path: &Path) -> Result<OdeTrajectory> {
    let file = BufReader::new(File::open(path)?);
    let export: OdeExport = serde_json::from_reader(file)?;
    if export.version != ODE_EXPORT_VERSION {
        log::warn!(
            "{} has sidecar version {}, expected {}",
            path.display(),
            export.version,
            ODE_EXPORT_VERSION
        );
    }

    let traj = OdeTrajectory {
        names: export.names,
        times: export.times,
        states: export.states,
    };
    traj.validate()?;
    Ok(traj)
}

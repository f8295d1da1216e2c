//! CSV time-series export.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::{HybridError, Result};
use crate::host::SpeciesTrajectory;
use crate::hybrid::OdeTrajectory;

/// Row-oriented CSV writer with a `time_sec` column followed by named columns
pub struct CsvExporter {
    writer: csv::Writer<File>,
    n_columns: usize,
    rows: usize,
    path: PathBuf,
}

impl CsvExporter {
    /// Create `path` (and its parent directory) and write the header
    pub fn create(path: &Path, columns: &[String]) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut writer = csv::Writer::from_writer(File::create(path)?);

        let mut header = Vec::with_capacity(columns.len() + 1);
        header.push("time_sec");
        header.extend(columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        log::info!("CSV export started: {}", path.display());

        Ok(Self {
            writer,
            n_columns: columns.len(),
            rows: 0,
            path: path.to_path_buf(),
        })
    }

    /// Append one row; `values` must match the header
    pub fn record<T: ToString>(&mut self, time_sec: f64, values: &[T]) -> Result<()> {
        if values.len() != self.n_columns {
            return Err(HybridError::DimensionMismatch {
                context: "csv row",
                expected: self.n_columns,
                actual: values.len(),
            });
        }
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(time_sec.to_string());
        row.extend(values.iter().map(ToString::to_string));
        self.writer.write_record(&row)?;
        self.rows += 1;
        Ok(())
    }

    /// Finish writing and return the output path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!("CSV export completed: {} ({} rows)", self.path.display(), self.rows);
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write an ODE trajectory as CSV (concentrations in M)
pub fn export_ode_csv(traj: &OdeTrajectory, path: &Path) -> Result<PathBuf> {
    let mut exporter = CsvExporter::create(path, &traj.names)?;
    for (t, state) in traj.times.iter().zip(&traj.states) {
        exporter.record(*t, state)?;
    }
    exporter.finish()
}

/// Write discrete species totals as CSV (particle counts)
pub fn export_species_csv(traj: &SpeciesTrajectory, path: &Path) -> Result<PathBuf> {
    let mut exporter = CsvExporter::create(path, &traj.names)?;
    for (t, counts) in traj.times.iter().zip(&traj.counts) {
        exporter.record(*t, counts)?;
    }
    exporter.finish()
}

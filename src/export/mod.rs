//! Export functionality for simulation data.
//!
//! Provides CSV time-series export and the JSON ODE sidecar.

mod csv_export;
mod json_export;

pub use csv_export::{export_ode_csv, export_species_csv, CsvExporter};
pub use json_export::{export_ode_json_to, import_ode_json, OdeExport, ODE_EXPORT_VERSION};

//! Parameter structures with citation metadata.
//!
//! Rate constants for the galactose switch follow Bianchi et al., IET Syst
//! Biol 2018 (appendix), converted from min⁻¹ to s⁻¹. The cell geometry is the
//! cryo-ET derived yeast cell of Earnest et al., J Phys Chem B 2017.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HybridError, Result};

/// Avogadro's number (molecules/mol)
pub const AVOGADRO: f64 = 6.022e23;

/// Upper bound on integrator retries; the last retry uses 2^16 times the substeps
pub const MAX_STEP_HALVINGS: u32 = 16;

/// Top-level parameters container
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters {
    /// Hybrid stepper and ODE subsystem parameters
    pub hybrid: HybridParameters,
    /// Reference host run parameters
    pub host: HostParameters,
}

impl Parameters {
    /// Load parameters from JSON files, or use defaults if files don't exist
    pub fn load_or_default() -> Self {
        Self::load_from_dir("data/parameters")
    }

    /// Load parameters from specific directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let hybrid = HybridParameters::load_or_default(dir.join("hybrid.json"));
        let host = HostParameters::load_or_default(dir.join("host.json"));

        Self { hybrid, host }
    }
}

/// Read a JSON parameter file, falling back to defaults on any failure
fn load_json_or_default<T, P>(path: P, label: &str) -> T
where
    T: Default + for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    match std::fs::read_to_string(path.as_ref()) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(params) => {
                log::info!("Loaded {} parameters from {:?}", label, path.as_ref());
                params
            }
            Err(e) => {
                log::warn!("Failed to parse {} parameters: {}, using defaults", label, e);
                T::default()
            }
        },
        Err(_) => {
            log::info!("{} parameters file not found, using defaults", label);
            T::default()
        }
    }
}

/// Parameters of the hybrid RDME/ODE coupling
///
/// Volumes are in liters, concentrations in mol/L, rate constants in
/// s⁻¹ (first order) or M⁻¹·s⁻¹ (second order).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridParameters {
    /// Cytoplasm volume (L)
    pub cytoplasm_volume_L: f64,
    /// Nucleoplasm volume (L)
    pub nucleoplasm_volume_L: f64,
    /// Plasma membrane volume (L)
    pub membrane_volume_L: f64,

    /// External galactose held constant outside the cell (M)
    /// Source: 2% galactose medium, 11.1 mM
    pub external_galactose_M: f64,

    /// Gal3p activation constant, multiplied by [GAI] to give the
    /// first-order G3 → G3* rate (M⁻¹·s⁻¹)
    /// Source: Bianchi et al. 2018, 7.45e-7 molecule⁻¹·min⁻¹
    pub gal3_activation_per_M_per_sec: f64,

    /// ODE integrator settings
    pub integrator: IntegratorParameters,
}

impl HybridParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        load_json_or_default(path, "hybrid")
    }

    /// Volume of the cell interior that the ODE subsystem lumps together (L)
    pub fn cell_volume_L(&self) -> f64 {
        self.cytoplasm_volume_L + self.nucleoplasm_volume_L + self.membrane_volume_L
    }

    /// Particle-count to molar conversion factor, N_A × V
    pub fn nav(&self) -> f64 {
        AVOGADRO * self.cell_volume_L()
    }

    /// Check that every value is physically meaningful
    pub fn validate(&self) -> Result<()> {
        let volumes = [
            ("cytoplasm_volume_L", self.cytoplasm_volume_L),
            ("nucleoplasm_volume_L", self.nucleoplasm_volume_L),
            ("membrane_volume_L", self.membrane_volume_L),
        ];
        for (name, value) in volumes {
            if !(value.is_finite() && value > 0.0) {
                return Err(HybridError::InvalidParameter {
                    name,
                    reason: format!("volume must be positive, got {value}"),
                });
            }
        }
        if !(self.external_galactose_M.is_finite() && self.external_galactose_M >= 0.0) {
            return Err(HybridError::InvalidParameter {
                name: "external_galactose_M",
                reason: format!("must be non-negative, got {}", self.external_galactose_M),
            });
        }
        if !(self.gal3_activation_per_M_per_sec.is_finite()
            && self.gal3_activation_per_M_per_sec >= 0.0)
        {
            return Err(HybridError::InvalidParameter {
                name: "gal3_activation_per_M_per_sec",
                reason: format!("must be non-negative, got {}", self.gal3_activation_per_M_per_sec),
            });
        }
        self.integrator.validate()
    }
}

impl Default for HybridParameters {
    fn default() -> Self {
        // Earnest et al. 2017: 3.57e-14 L total cell interior
        let cytoplasm_volume_L = 2.9e-14;
        let nucleoplasm_volume_L = 3.0e-15;
        let membrane_volume_L = 3.7e-15;
        let model_nav = AVOGADRO * 3.57e-14;

        Self {
            cytoplasm_volume_L,
            nucleoplasm_volume_L,
            membrane_volume_L,
            external_galactose_M: 11.1e-3,
            // 7.45e-7 /molecule/min converted to /M/s
            gal3_activation_per_M_per_sec: 7.45e-7 / 60.0 * model_nav,
            integrator: IntegratorParameters::default(),
        }
    }
}

/// ODE integrator settings as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorParameters {
    /// Largest RK4 substep (s)
    pub max_step_sec: f64,
    /// Minimum number of substeps per synchronization interval
    pub min_substeps: usize,
    /// Negative values above -tolerance are treated as round-off and zeroed (M)
    pub negative_tolerance_M: f64,
    /// Retries with halved substep size before giving up
    pub max_step_halvings: u32,
}

impl IntegratorParameters {
    fn validate(&self) -> Result<()> {
        if !(self.max_step_sec.is_finite() && self.max_step_sec > 0.0) {
            return Err(HybridError::InvalidParameter {
                name: "max_step_sec",
                reason: format!("must be positive, got {}", self.max_step_sec),
            });
        }
        if self.min_substeps == 0 {
            return Err(HybridError::InvalidParameter {
                name: "min_substeps",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.negative_tolerance_M.is_finite() && self.negative_tolerance_M >= 0.0) {
            return Err(HybridError::InvalidParameter {
                name: "negative_tolerance_M",
                reason: format!("must be non-negative, got {}", self.negative_tolerance_M),
            });
        }
        if self.max_step_halvings > MAX_STEP_HALVINGS {
            return Err(HybridError::InvalidParameter {
                name: "max_step_halvings",
                reason: format!(
                    "must be at most {}, got {}",
                    MAX_STEP_HALVINGS, self.max_step_halvings
                ),
            });
        }
        Ok(())
    }
}

impl Default for IntegratorParameters {
    fn default() -> Self {
        Self {
            // Fastest ODE channel is ~1e5 M⁻¹s⁻¹ × 11 mM ≈ 1.2e3 s⁻¹
            max_step_sec: 1e-4,
            min_substeps: 10,
            negative_tolerance_M: 1e-15,
            max_step_halvings: 4,
        }
    }
}

/// Run settings for the well-mixed reference host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostParameters {
    /// Total simulated time (s)
    pub simulation_time_sec: f64,
    /// Interval between hybrid synchronizations (s)
    pub hook_interval_sec: f64,
    /// Interval between recorded species counts (s)
    pub write_interval_sec: f64,
    /// RNG seed
    pub seed: u64,
}

impl HostParameters {
    /// Load from JSON file or return defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        load_json_or_default(path, "host")
    }

    /// Check that intervals are positive and finite
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("simulation_time_sec", self.simulation_time_sec),
            ("hook_interval_sec", self.hook_interval_sec),
            ("write_interval_sec", self.write_interval_sec),
        ];
        for (name, value) in intervals {
            if !(value.is_finite() && value > 0.0) {
                return Err(HybridError::InvalidParameter {
                    name,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for HostParameters {
    fn default() -> Self {
        Self {
            simulation_time_sec: 10.0,
            // 2000 × 50 μs RDME steps
            hook_interval_sec: 0.1,
            write_interval_sec: 0.1,
            seed: 42,
        }
    }
}

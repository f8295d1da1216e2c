//! Ready-made models.
//!
//! - `galactose_switch`: the part of the yeast GAL network that touches the
//!   hybrid layer (Gal1p, Gal2p, Gal3p, Gal80p dimer), with the fast
//!   galactose transport/metabolism handled by the ODE subsystem.
//! - `bimolecular`: A + B ⇌ C well-mixed CME test case.
//!
//! Rate constants: Bianchi et al., IET Syst Biol 2018 (appendix), given per
//! minute and converted to per second here.

use crate::config::{HybridParameters, AVOGADRO};
use crate::error::Result;
use crate::hybrid::{BoundSpec, ConservationSpec, Coupling, CouplingSpec, HybridStepper};
use crate::ode::{ReactionSpec, ReactionSystem};

use super::{ModelBuilder, ModelDefinition};

pub const CYTOPLASM: &str = "cytoplasm";
pub const NUCLEOPLASM: &str = "nucleoplasm";
pub const PLASMA_MEMBRANE: &str = "plasmaMembrane";

/// Name of the discrete reaction driven by internal galactose
pub const GAL3_ACTIVATION: &str = "gal3_activation";

const PER_MIN: f64 = 1.0 / 60.0;

/// Zero-order rate (M/s) that yields `per_sec` particles per second in `volume_L`
fn molecules_per_sec(per_sec: f64, volume_L: f64) -> f64 {
    per_sec / (AVOGADRO * volume_L)
}

/// Discrete part of the galactose switch.
///
/// Protein synthesis is lumped into constitutive zero-order production in
/// the cytoplasm; transcription and translation are not modelled here.
pub fn galactose_switch(params: &HybridParameters) -> Result<ModelDefinition> {
    params.validate()?;
    let cyto = params.cytoplasm_volume_L;
    // second-order conversion used by the published constants
    let model_nav = AVOGADRO * params.cell_volume_L();

    let dp_gal1 = 0.003851 * PER_MIN;
    let dp_gal2 = 0.003851 * PER_MIN;
    let dp_gal3 = 0.01155 * PER_MIN;

    ModelBuilder::new("Galactose switch, RDME/ODE hybrid")
        .region(CYTOPLASM, params.cytoplasm_volume_L)
        .region(NUCLEOPLASM, params.nucleoplasm_volume_L)
        .region(PLASMA_MEMBRANE, params.membrane_volume_L)
        .species("G1")
        .species("G2")
        .species("G3")
        .species("G3i")
        .species("G80d")
        .species("G80G3i")
        // Gal1p galactokinase
        .reaction("gal1_synthesis", &[], &["G1"], molecules_per_sec(0.05, cyto), &[CYTOPLASM])
        .reaction("gal1_degradation", &["G1"], &[], dp_gal1, &[])
        // Gal2p permease, made in the cytoplasm and inserted into the membrane
        .reaction("gal2_synthesis", &[], &["G2"], molecules_per_sec(0.2, cyto), &[CYTOPLASM])
        .transport("gal2_insertion", "G2", CYTOPLASM, PLASMA_MEMBRANE, 0.05)
        .reaction("gal2_degradation", &["G2"], &[], dp_gal2, &[])
        // Gal3p activation; rate set by the hybrid stepper from [GAI]
        .reaction("gal3_synthesis", &[], &["G3"], molecules_per_sec(0.1, cyto), &[CYTOPLASM])
        .reaction(GAL3_ACTIVATION, &["G3"], &["G3i"], 0.0, &[CYTOPLASM])
        .reaction("gal3_deactivation", &["G3i"], &["G3"], 890.0 * PER_MIN, &[CYTOPLASM])
        .reaction("gal3_degradation", &["G3"], &[], dp_gal3, &[CYTOPLASM])
        .reaction("gal3i_degradation", &["G3i"], &[], dp_gal3, &[CYTOPLASM])
        // Gal3p*/Gal80p sequestration
        .reaction(
            "gal3i_gal80_association",
            &["G3i", "G80d"],
            &["G80G3i"],
            0.025716 * PER_MIN * model_nav,
            &[CYTOPLASM],
        )
        .reaction(
            "gal3i_gal80_dissociation",
            &["G80G3i"],
            &["G3i", "G80d"],
            0.0159616 * PER_MIN,
            &[CYTOPLASM],
        )
        .reaction("gal3i_gal80_degradation", &["G80G3i"], &[], 0.5 * dp_gal3, &[CYTOPLASM])
        .initial_count("G1", CYTOPLASM, 100)
        .initial_count("G2", PLASMA_MEMBRANE, 300)
        .initial_count("G3", CYTOPLASM, 2000)
        .initial_count("G80d", CYTOPLASM, 500)
        .build()
}

/// Fast galactose transport and Gal1p binding, concentrations in mol/L.
///
/// GAE (external galactose) is a constant reservoir folded into the rate of
/// `G2 -> G2GAE`.
pub fn galactose_ode_reactions(external_galactose_M: f64) -> Vec<ReactionSpec> {
    vec![
        ReactionSpec::new(["G1", "GAI"], ["G1GAI"], 1.442e5),
        ReactionSpec::new(["G1GAI"], ["G1", "GAI"], 30.708),
        ReactionSpec::new(["G1GAI"], ["G1"], 55.833),
        ReactionSpec::new(["G2GAI"], ["G2GAE"], 72.5),
        ReactionSpec::new(["G2GAE"], ["G2GAI"], 72.5),
        ReactionSpec::new(["G2GAE"], ["G2"], 39.875),
        ReactionSpec::new(["G2"], ["G2GAE"], 1.123e5 * external_galactose_M),
        ReactionSpec::new(["G2", "GAI"], ["G2GAI"], 1.123e5),
        ReactionSpec::new(["G2GAI"], ["G2", "GAI"], 39.875),
    ]
}

/// How the galactose ODE variables map onto the discrete model
pub fn galactose_coupling_spec(params: &HybridParameters) -> CouplingSpec {
    CouplingSpec {
        conservation: vec![
            ConservationSpec {
                species: "G1".into(),
                region: None,
                free: "G1".into(),
                bound: vec![BoundSpec {
                    variable: "G1GAI".into(),
                    releases_to: Some("GAI".into()),
                }],
            },
            ConservationSpec {
                species: "G2".into(),
                region: Some(PLASMA_MEMBRANE.into()),
                free: "G2".into(),
                bound: vec![
                    BoundSpec {
                        variable: "G2GAI".into(),
                        releases_to: Some("GAI".into()),
                    },
                    // external galactose returns to the medium
                    BoundSpec {
                        variable: "G2GAE".into(),
                        releases_to: None,
                    },
                ],
            },
        ],
        exchange_species: vec!["G3i".into(), "G80G3i".into()],
        substrate: "GAI".into(),
        driver: "GAI".into(),
        feedback_reaction: GAL3_ACTIVATION.into(),
        feedback_rate_constant: params.gal3_activation_per_M_per_sec,
    }
}

/// Stepper wired for the galactose switch
pub fn galactose_stepper(model: &ModelDefinition, params: &HybridParameters) -> Result<HybridStepper> {
    params.validate()?;
    let system = ReactionSystem::build(&galactose_ode_reactions(params.external_galactose_M))?;
    let coupling = Coupling::resolve(&galactose_coupling_spec(params), &system, model, params.nav())?;
    HybridStepper::new(system, coupling, params.integrator.clone().into())
}

/// A + B ⇌ C in a 1 fL well-mixed volume, 1000 A and B at t = 0
pub fn bimolecular() -> Result<ModelDefinition> {
    ModelBuilder::new("Bimolecular A + B <-> C")
        .region(CYTOPLASM, 1.0e-15)
        .species("A")
        .species("B")
        .species("C")
        .reaction("association", &["A", "B"], &["C"], 1.07e5, &[])
        .reaction("dissociation", &["C"], &["A", "B"], 0.351, &[])
        .initial_count("A", CYTOPLASM, 1000)
        .initial_count("B", CYTOPLASM, 1000)
        .initial_count("C", CYTOPLASM, 0)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_galactose_model_builds() {
        let model = galactose_switch(&HybridParameters::default()).unwrap();
        assert_eq!(model.n_regions(), 3);
        assert!(model.reaction_id(GAL3_ACTIVATION).is_ok());
        let g2 = model.species_id("G2").unwrap();
        let mem = model.region_id(PLASMA_MEMBRANE).unwrap();
        assert_eq!(model.initial_count(g2, mem), 300);
    }

    #[test]
    fn test_galactose_ode_variables() {
        let system = ReactionSystem::build(&galactose_ode_reactions(11.1e-3)).unwrap();
        assert_eq!(system.names(), &["G1", "G1GAI", "G2", "G2GAE", "G2GAI", "GAI"]);
        assert_eq!(system.n_reactions(), 9);
    }

    #[test]
    fn test_galactose_stepper_resolves() {
        let params = HybridParameters::default();
        let model = galactose_switch(&params).unwrap();
        let stepper = galactose_stepper(&model, &params).unwrap();
        assert_eq!(stepper.coupling().rules.len(), 2);
        assert_eq!(stepper.feedback_reaction(), model.reaction_id(GAL3_ACTIVATION).unwrap());
    }

    #[test]
    fn test_bimolecular_model() {
        let model = bimolecular().unwrap();
        assert_eq!(model.species_names(), &["A", "B", "C"]);
        assert_eq!(model.reactions()[0].order(), 2);
    }
}

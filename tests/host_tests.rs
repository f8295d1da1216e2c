//! Integration tests for the well-mixed reference host.

use galswitch_hybrid::config::{HostParameters, HybridParameters};
use galswitch_hybrid::host::{run_hybrid, simulate, WellMixedHost};
use galswitch_hybrid::hybrid::LatticeView;
use galswitch_hybrid::model::presets;

fn short_run(seed: u64) -> HostParameters {
    HostParameters {
        simulation_time_sec: 1.0,
        hook_interval_sec: 0.1,
        write_interval_sec: 0.1,
        seed,
    }
}

// ============================================================================
// Bimolecular A + B <-> C
// ============================================================================

#[test]
fn test_bimolecular_conserves_monomers() {
    let model = presets::bimolecular().unwrap();
    let params = short_run(7);
    let mut host = WellMixedHost::new(&model, params.seed);
    let outcome = simulate(&mut host, &params, None).unwrap();

    assert_eq!(outcome.species.len(), 11);
    for row in &outcome.species.counts {
        let (a, b, c) = (row[0], row[1], row[2]);
        assert_eq!(a + c, 1000, "A + C must stay 1000, row {:?}", row);
        assert_eq!(b + c, 1000, "B + C must stay 1000, row {:?}", row);
    }
    assert!(outcome.event_count > 0);
}

#[test]
fn test_bimolecular_forms_complex() {
    // a = kf/(N_A·V) · A · B ≈ 178 s⁻¹ at t = 0
    let model = presets::bimolecular().unwrap();
    let params = short_run(3);
    let mut host = WellMixedHost::new(&model, params.seed);
    simulate(&mut host, &params, None).unwrap();

    let c = model.species_id("C").unwrap();
    let formed = host.counts().total_count(c).unwrap();
    assert!(formed > 50, "Expected substantial complex after 1 s, got {}", formed);
}

#[test]
fn test_same_seed_same_trajectory() {
    let model = presets::bimolecular().unwrap();
    let params = short_run(99);

    let mut a = WellMixedHost::new(&model, params.seed);
    let mut b = WellMixedHost::new(&model, params.seed);
    let ta = simulate(&mut a, &params, None).unwrap();
    let tb = simulate(&mut b, &params, None).unwrap();

    assert_eq!(ta.species, tb.species);
    assert_eq!(ta.event_count, tb.event_count);
}

// ============================================================================
// Galactose switch with the hybrid stepper attached
// ============================================================================

#[test]
fn test_galactose_hybrid_run() {
    let params = HybridParameters::default();
    let model = presets::galactose_switch(&params).unwrap();
    let mut stepper = presets::galactose_stepper(&model, &params).unwrap();
    let mut host = WellMixedHost::new(&model, 42);

    let run = run_hybrid(&mut host, &mut stepper, &short_run(42), None).unwrap();

    assert_eq!(run.outcome.hook_count, 11);
    assert_eq!(run.ode.len(), 11);
    assert!(run.sidecar.is_none());
    assert!(stepper.concentration("GAI").unwrap() > 0.0);

    // the host now carries the rate the stepper last produced
    let activation = model.reaction_id(presets::GAL3_ACTIVATION).unwrap();
    assert_eq!(host.rate_constant(activation), stepper.last_rate());
    assert!(stepper.last_rate() > 0.0);
}

#[test]
fn test_galactose_hybrid_run_is_reproducible() {
    let params = HybridParameters::default();
    let model = presets::galactose_switch(&params).unwrap();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut stepper = presets::galactose_stepper(&model, &params).unwrap();
        let mut host = WellMixedHost::new(&model, 5);
        runs.push(run_hybrid(&mut host, &mut stepper, &short_run(5), None).unwrap());
    }

    assert_eq!(runs[0].ode, runs[1].ode);
    assert_eq!(runs[0].outcome.species, runs[1].outcome.species);
}

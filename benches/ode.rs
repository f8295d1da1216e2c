//! ODE subsystem and hybrid stepper benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use galswitch_hybrid::config::HybridParameters;
use galswitch_hybrid::hybrid::CountSnapshot;
use galswitch_hybrid::model::presets;
use galswitch_hybrid::ode::{IntegratorConfig, OdeSolver, ReactionSystem};

fn galactose_system() -> ReactionSystem {
    ReactionSystem::build(&presets::galactose_ode_reactions(11.1e-3)).unwrap()
}

/// G1, G1GAI, G2, G2GAE, G2GAI, GAI
fn galactose_state() -> Vec<f64> {
    vec![4.6e-9, 0.0, 1.4e-8, 0.0, 0.0, 1.0e-6]
}

fn bench_rate_evaluation(c: &mut Criterion) {
    let system = galactose_system();
    let state = galactose_state();

    c.bench_function("galactose_rates", |b| {
        b.iter(|| system.evaluate_rates(black_box(&state)))
    });
}

fn bench_ode_advance(c: &mut Criterion) {
    let mut solver = OdeSolver::new(galactose_system(), IntegratorConfig::default());

    c.bench_function("galactose_advance_100ms", |b| {
        b.iter(|| {
            let mut state = galactose_state();
            solver.advance(black_box(&mut state), 0.1).unwrap();
            state
        })
    });
}

fn bench_synchronize(c: &mut Criterion) {
    let params = HybridParameters::default();
    let model = presets::galactose_switch(&params).unwrap();
    let snapshot = CountSnapshot::from_model(&model);

    c.bench_function("galactose_synchronize_100ms", |b| {
        b.iter_with_setup(
            || {
                let mut stepper = presets::galactose_stepper(&model, &params).unwrap();
                stepper.synchronize(0.0, &snapshot).unwrap();
                stepper
            },
            |mut stepper| stepper.synchronize(0.1, black_box(&snapshot)).unwrap(),
        )
    });
}

criterion_group!(benches, bench_rate_evaluation, bench_ode_advance, bench_synchronize);
criterion_main!(benches);

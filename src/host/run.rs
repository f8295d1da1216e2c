//! Checkpointed runs of the reference host.

use std::path::{Path, PathBuf};

use crate::config::HostParameters;
use crate::error::Result;
use crate::hybrid::{HybridStepper, OdeTrajectory};

use super::{HybridHook, SpeciesTrajectory, WellMixedHost};

const TIME_EPSILON: f64 = 1e-9;

/// Result of a host run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub species: SpeciesTrajectory,
    pub event_count: u64,
    pub hook_count: u64,
    pub final_time_sec: f64,
}

/// Run `host` to `params.simulation_time_sec`.
///
/// Species totals are recorded every `write_interval_sec` and the hook is
/// called every `hook_interval_sec`, both starting at t = 0. Rate updates
/// returned by the hook apply from that instant on.
pub fn simulate(
    host: &mut WellMixedHost<'_>,
    params: &HostParameters,
    mut hook: Option<&mut dyn HybridHook>,
) -> Result<RunOutcome> {
    params.validate()?;
    let t_end = params.simulation_time_sec;
    let mut species = SpeciesTrajectory::new(host.model().species_names().to_vec());
    let mut write_k: u64 = 0;
    let mut hook_k: u64 = 0;

    loop {
        let next_write = write_k as f64 * params.write_interval_sec;
        let next_hook = hook_k as f64 * params.hook_interval_sec;
        let target = next_write.min(next_hook);
        if target > t_end + TIME_EPSILON {
            break;
        }
        host.advance_until(target);

        if next_write <= target + TIME_EPSILON {
            species.push(target, host.counts().totals())?;
            write_k += 1;
        }
        if next_hook <= target + TIME_EPSILON {
            if let Some(hook) = hook.as_mut() {
                if let Some(update) = hook.on_hook(target, host.counts())? {
                    host.set_reaction_rate(update.reaction, update.rate_constant)?;
                }
            }
            hook_k += 1;
        }
    }

    host.advance_until(t_end);
    if species.times.last().map_or(true, |&t| t < t_end - TIME_EPSILON) {
        species.push(t_end, host.counts().totals())?;
    }

    log::info!(
        "Host run finished at t = {:.3} s: {} events, {} hook calls",
        host.time_sec(),
        host.event_count(),
        hook_k
    );

    Ok(RunOutcome {
        species,
        event_count: host.event_count(),
        hook_count: hook_k,
        final_time_sec: host.time_sec(),
    })
}

/// Outcome of a coupled run
#[derive(Debug, Clone)]
pub struct HybridRun {
    pub outcome: RunOutcome,
    pub ode: OdeTrajectory,
    /// Where the ODE sidecar was written, if an output path was given
    pub sidecar: Option<PathBuf>,
}

/// Run `host` with `stepper` attached as its hook.
///
/// When `output` is given the ODE sidecar is written whether or not the run
/// succeeds, so a failed run still leaves the trajectory up to the failure.
pub fn run_hybrid(
    host: &mut WellMixedHost<'_>,
    stepper: &mut HybridStepper,
    params: &HostParameters,
    output: Option<&Path>,
) -> Result<HybridRun> {
    let result = simulate(host, params, Some(&mut *stepper as &mut dyn HybridHook));

    let sidecar = match output {
        Some(path) => match stepper.trajectory().save_sidecar(path) {
            Ok(written) => Some(written),
            Err(e) => {
                log::error!("Failed to write ODE sidecar for {}: {}", path.display(), e);
                // a run error takes precedence over the save error
                result?;
                return Err(e);
            }
        },
        None => None,
    };

    let outcome = result?;
    Ok(HybridRun {
        outcome,
        ode: stepper.take_trajectory(),
        sidecar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RateUpdate;
    use crate::hybrid::CountSnapshot;
    use crate::model::{ModelBuilder, ModelDefinition};

    fn decay_model() -> ModelDefinition {
        ModelBuilder::new("decay")
            .region("cytoplasm", 1e-15)
            .species("A")
            .reaction("decay", &["A"], &[], 0.5, &[])
            .initial_count("A", "cytoplasm", 100)
            .build()
            .unwrap()
    }

    struct CountingHook {
        times: Vec<f64>,
    }

    impl HybridHook for CountingHook {
        fn on_hook(&mut self, time_sec: f64, _: &CountSnapshot) -> Result<Option<RateUpdate>> {
            self.times.push(time_sec);
            Ok(None)
        }
    }

    #[test]
    fn test_checkpoint_schedule() {
        let model = decay_model();
        let mut host = WellMixedHost::new(&model, 5);
        let params = HostParameters {
            simulation_time_sec: 1.0,
            hook_interval_sec: 0.25,
            write_interval_sec: 0.5,
            seed: 5,
        };
        let mut hook = CountingHook { times: Vec::new() };
        let outcome = simulate(&mut host, &params, Some(&mut hook)).unwrap();

        assert_eq!(hook.times.len(), 5);
        assert!((hook.times[4] - 1.0).abs() < 1e-9);
        assert_eq!(outcome.species.len(), 3);
        assert_eq!(outcome.species.counts[0], vec![100]);
        assert!((outcome.final_time_sec - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_final_row_when_off_grid() {
        let model = decay_model();
        let mut host = WellMixedHost::new(&model, 5);
        let params = HostParameters {
            simulation_time_sec: 1.1,
            hook_interval_sec: 0.5,
            write_interval_sec: 0.5,
            seed: 5,
        };
        let outcome = simulate(&mut host, &params, None).unwrap();
        assert_eq!(outcome.species.len(), 4);
        assert!((outcome.species.times[3] - 1.1).abs() < 1e-9);
        assert_eq!(outcome.hook_count, 3);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let model = decay_model();
        let mut host = WellMixedHost::new(&model, 5);
        let params = HostParameters {
            hook_interval_sec: 0.0,
            ..HostParameters::default()
        };
        assert!(simulate(&mut host, &params, None).is_err());
    }
}

//! Galactose switch hybrid simulator - Entry point
//!
//! CLI Usage:
//!   cargo run                                # Galactose switch, 10 s
//!   cargo run -- -t 60 --hook-interval 0.05  # Longer run, finer coupling
//!   cargo run -- --model bimolecular         # Pure CME test case
//!   cargo run -- --diagnose                  # Print the ODE table after the run

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use galswitch_hybrid::{
    config::Parameters,
    export::{export_ode_csv, export_species_csv},
    host::{run_hybrid, simulate, WellMixedHost},
    hybrid::{HybridStepper, OdeTrajectory, SyncDiagnostics},
    model::presets,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ModelChoice {
    Galactose,
    Bimolecular,
}

#[derive(Debug)]
struct CliArgs {
    model: ModelChoice,
    time_sec: Option<f64>,
    hook_interval_sec: Option<f64>,
    write_interval_sec: Option<f64>,
    seed: Option<u64>,
    output: PathBuf,
    params_dir: Option<PathBuf>,
    diagnose: bool,
}

/// `<output><suffix>`
fn with_suffix(output: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = output.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Print every `stride`-th ODE row, plus the last one
fn print_ode_table(stepper: &HybridStepper, traj: &OdeTrajectory) {
    if traj.is_empty() {
        return;
    }
    let stride = (traj.len() / 10).max(1);
    let feedback = &stepper.coupling().feedback;
    let row = |i: usize| SyncDiagnostics {
        time_sec: traj.times[i],
        ode: traj.names.iter().cloned().zip(traj.states[i].iter().copied()).collect(),
        rdme: Vec::new(),
        feedback_rate: feedback.rate(&traj.states[i]),
        exchange_deficit: 0.0,
    };

    row(0).print_row_header();
    for i in (0..traj.len()).step_by(stride) {
        row(i).print_row();
    }
    if (traj.len() - 1) % stride != 0 {
        row(traj.len() - 1).print_row();
    }
}

fn run_galactose(params: &Parameters, args: &CliArgs) -> Result<()> {
    println!("=== Galactose Switch: Hybrid RDME/ODE ===\n");

    let model = presets::galactose_switch(&params.hybrid).context("building galactose model")?;
    let mut stepper =
        presets::galactose_stepper(&model, &params.hybrid).context("building hybrid stepper")?;
    println!("Cell volume: {:.3e} L (N_A·V = {:.4e})", params.hybrid.cell_volume_L(), params.hybrid.nav());
    println!("External galactose: {:.2} mM", params.hybrid.external_galactose_M * 1e3);
    println!("ODE variables: {}", stepper.names().join(", "));
    println!(
        "Run: {:.2} s, hook every {:.3} s, seed {}\n",
        params.host.simulation_time_sec, params.host.hook_interval_sec, params.host.seed
    );

    let mut host = WellMixedHost::new(&model, params.host.seed);
    let start = Instant::now();
    let run = run_hybrid(&mut host, &mut stepper, &params.host, Some(args.output.as_path()))?;
    let elapsed = start.elapsed();

    let species_csv = export_species_csv(&run.outcome.species, &with_suffix(&args.output, ".csv"))?;
    let ode_csv = export_ode_csv(&run.ode, &with_suffix(&args.output, "_ode.csv"))?;

    if args.diagnose {
        print_ode_table(&stepper, &run.ode);
        println!();
    }

    stepper.diagnostics(&model, host.counts())?.print_summary();

    println!("\n=== Results ===");
    println!("Elapsed time: {:.2?}", elapsed);
    println!("Events: {}", run.outcome.event_count);
    println!("Synchronizations: {}", stepper.sync_count());
    println!("Species CSV: {}", species_csv.display());
    println!("ODE CSV: {}", ode_csv.display());
    if let Some(sidecar) = &run.sidecar {
        println!("ODE sidecar: {}", sidecar.display());
    }
    Ok(())
}

fn run_bimolecular(params: &Parameters, args: &CliArgs) -> Result<()> {
    println!("=== Bimolecular A + B <-> C (well-mixed CME) ===\n");

    let model = presets::bimolecular()?;
    let mut host = WellMixedHost::new(&model, params.host.seed);
    let start = Instant::now();
    let outcome = simulate(&mut host, &params.host, None)?;
    let elapsed = start.elapsed();

    let path = export_species_csv(&outcome.species, &with_suffix(&args.output, ".csv"))?;

    println!("Elapsed time: {:.2?}", elapsed);
    println!("Events: {}", outcome.event_count);
    if let Some(last) = outcome.species.counts.last() {
        for (name, count) in model.species_names().iter().zip(last) {
            println!("  {:<8}{:>8}", name, count);
        }
    }
    println!("Species CSV: {}", path.display());
    Ok(())
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T> {
    let Some(raw) = args.get(i) else {
        bail!("{} expects a value", flag);
    };
    raw.parse()
        .map_err(|_| anyhow::anyhow!("invalid value for {}: {}", flag, raw))
}

/// Parse CLI arguments
fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        model: ModelChoice::Galactose,
        time_sec: None,
        hook_interval_sec: None,
        write_interval_sec: None,
        seed: None,
        output: PathBuf::from("exports/galactose"),
        params_dir: None,
        diagnose: false,
    };
    let mut output_set = false;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--model" | "-m" => {
                i += 1;
                cli.model = match args.get(i).map(String::as_str) {
                    Some("galactose") => ModelChoice::Galactose,
                    Some("bimolecular") => ModelChoice::Bimolecular,
                    other => bail!("unknown model {:?} (expected galactose or bimolecular)", other),
                };
            }
            "-t" | "--time" => {
                i += 1;
                cli.time_sec = Some(parse_value(&args, i, flag)?);
            }
            "--hook-interval" => {
                i += 1;
                cli.hook_interval_sec = Some(parse_value(&args, i, flag)?);
            }
            "--write-interval" => {
                i += 1;
                cli.write_interval_sec = Some(parse_value(&args, i, flag)?);
            }
            "--seed" => {
                i += 1;
                cli.seed = Some(parse_value(&args, i, flag)?);
            }
            "-o" | "--output" => {
                i += 1;
                cli.output = PathBuf::from(parse_value::<String>(&args, i, flag)?);
                output_set = true;
            }
            "--params" => {
                i += 1;
                cli.params_dir = Some(PathBuf::from(parse_value::<String>(&args, i, flag)?));
            }
            "--diagnose" | "-d" => cli.diagnose = true,
            "--help" | "-h" => {
                println!("Galactose switch hybrid simulator");
                println!();
                println!("Usage: galswitch-hybrid [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -m, --model NAME       galactose (default) or bimolecular");
                println!("  -t, --time T           Simulated time in seconds");
                println!("  --hook-interval T      Seconds between hybrid synchronizations");
                println!("  --write-interval T     Seconds between recorded species counts");
                println!("  --seed N               RNG seed");
                println!("  -o, --output PATH      Output prefix (default: exports/<model>)");
                println!("  --params DIR           Parameter directory (default: data/parameters)");
                println!("  --diagnose, -d         Print the ODE time series after the run");
                println!("  --help, -h             Show this help");
                std::process::exit(0);
            }
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    if !output_set && cli.model == ModelChoice::Bimolecular {
        cli.output = PathBuf::from("exports/bimolecular");
    }
    Ok(cli)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;

    let mut params = match &args.params_dir {
        Some(dir) => Parameters::load_from_dir(dir),
        None => Parameters::load_or_default(),
    };
    if let Some(t) = args.time_sec {
        params.host.simulation_time_sec = t;
    }
    if let Some(t) = args.hook_interval_sec {
        params.host.hook_interval_sec = t;
    }
    if let Some(t) = args.write_interval_sec {
        params.host.write_interval_sec = t;
    }
    if let Some(seed) = args.seed {
        params.host.seed = seed;
    }
    params.host.validate()?;

    log::info!("Galactose switch hybrid simulator starting ({:?})", args.model);

    match args.model {
        ModelChoice::Galactose => run_galactose(&params, &args),
        ModelChoice::Bimolecular => run_bimolecular(&params, &args),
    }
}

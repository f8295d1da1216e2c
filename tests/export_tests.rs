//! Integration tests for CSV export and the ODE sidecar.

use galswitch_hybrid::config::{HostParameters, HybridParameters};
use galswitch_hybrid::export::{export_ode_csv, import_ode_json, CsvExporter};
use galswitch_hybrid::host::{run_hybrid, WellMixedHost};
use galswitch_hybrid::hybrid::OdeTrajectory;
use galswitch_hybrid::model::{presets, ModelBuilder};

fn sample_trajectory() -> OdeTrajectory {
    let mut traj = OdeTrajectory::new(vec!["G1".into(), "GAI".into()]);
    traj.push(0.0, &[4.6e-9, 0.0]).unwrap();
    traj.push(0.1, &[4.5e-9, 1.2e-7]).unwrap();
    traj
}

#[test]
fn test_sidecar_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("galactose");
    let traj = sample_trajectory();

    let path = traj.save_sidecar(&output).unwrap();
    assert_eq!(path, dir.path().join("galactose_ode.json"));

    let loaded = OdeTrajectory::load_sidecar(&path).unwrap();
    assert_eq!(loaded, traj);
}

fn assert_bitwise_equal(expected: &OdeTrajectory, actual: &OdeTrajectory) {
    assert_eq!(expected.names, actual.names);
    assert_eq!(expected.len(), actual.len());
    for (row, (a, b)) in expected.times.iter().zip(&actual.times).enumerate() {
        assert_eq!(a.to_bits(), b.to_bits(), "time of row {} changed: {:e} vs {:e}", row, a, b);
    }
    for (row, (sa, sb)) in expected.states.iter().zip(&actual.states).enumerate() {
        for (col, (a, b)) in sa.iter().zip(sb).enumerate() {
            assert_eq!(
                a.to_bits(),
                b.to_bits(),
                "`{}` in row {} changed: {:e} vs {:e}",
                expected.names[col],
                row,
                a,
                b
            );
        }
    }
}

#[test]
fn test_sidecar_preserves_every_bit() {
    let dir = tempfile::tempdir().unwrap();
    let mut traj = OdeTrajectory::new(vec!["A".into(), "B".into(), "C".into()]);
    let mut x = 1.0f64 / 3.0;
    for i in 0..500 {
        let t = i as f64 * 0.05;
        traj.push(t, &[x, x * 1e-9 / 7.0, (t + 0.1).sqrt() * 2.9e-14])
            .unwrap();
        x = (x * 3.7 + 0.123_456_789).fract();
    }

    let path = traj.save_sidecar(&dir.path().join("awkward")).unwrap();
    let loaded = OdeTrajectory::load_sidecar(&path).unwrap();
    assert_bitwise_equal(&traj, &loaded);
}

#[test]
fn test_hybrid_run_sidecar_preserves_every_bit() {
    let params = HybridParameters::default();
    let model = presets::galactose_switch(&params).unwrap();
    let mut stepper = presets::galactose_stepper(&model, &params).unwrap();
    let mut host = WellMixedHost::new(&model, 11);
    let host_params = HostParameters {
        simulation_time_sec: 2.0,
        hook_interval_sec: 0.05,
        write_interval_sec: 0.5,
        seed: 11,
    };

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("galactose");
    let run = run_hybrid(&mut host, &mut stepper, &host_params, Some(output.as_path())).unwrap();

    let sidecar = run.sidecar.as_ref().unwrap();
    let loaded = OdeTrajectory::load_sidecar(sidecar).unwrap();
    assert_eq!(loaded.len(), 41);
    assert_bitwise_equal(&run.ode, &loaded);
}

#[test]
fn test_sidecar_rejects_ragged_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad_ode.json");
    std::fs::write(
        &path,
        r#"{"exported_at":"","version":"1.0.0","names":["A","B"],"times":[0.0],"states":[[1.0]]}"#,
    )
    .unwrap();
    assert!(import_ode_json(&path).is_err());
}

#[test]
fn test_ode_csv_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = export_ode_csv(&sample_trajectory(), &dir.path().join("out/ode.csv")).unwrap();

    let text = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "time_sec,G1,GAI");
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("0.1,"));
}

#[test]
fn test_csv_row_width_checked() {
    let dir = tempfile::tempdir().unwrap();
    let mut exporter = CsvExporter::create(&dir.path().join("x.csv"), &["A".to_string()]).unwrap();
    assert!(exporter.record(0.0, &[1u64, 2u64]).is_err());
    exporter.record(0.0, &[1u64]).unwrap();
    exporter.finish().unwrap();
}

#[test]
fn test_sidecar_written_when_run_fails() {
    let params = HybridParameters::default();
    let galactose = presets::galactose_switch(&params).unwrap();
    let mut stepper = presets::galactose_stepper(&galactose, &params).unwrap();

    // host lattice lacks the species the stepper reads
    let other = ModelBuilder::new("unrelated")
        .region("cytoplasm", 1e-15)
        .species("A")
        .build()
        .unwrap();
    let mut host = WellMixedHost::new(&other, 1);

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("failed");
    let result = run_hybrid(&mut host, &mut stepper, &HostParameters::default(), Some(output.as_path()));

    assert!(result.is_err());
    let sidecar = OdeTrajectory::sidecar_path(&output);
    assert!(sidecar.exists(), "Sidecar must be written even when the run fails");
    assert!(OdeTrajectory::load_sidecar(&sidecar).unwrap().is_empty());
}

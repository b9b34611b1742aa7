use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[derive(Deserialize)]
struct Summary {
    channels: Vec<String>,
    channel_count: usize,
    sample_count: usize,
    sample_rate: f64,
    duration_s: f64,
}

fn sample_path(relative: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .join(relative)
        .to_string_lossy()
        .to_string()
}

fn info(args: &[&str]) -> Result<Summary, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("eegview");
    cmd.arg("info").args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

#[test]
fn info_summarises_csv_recording() -> Result<(), Box<dyn Error>> {
    let summary = info(&["--input", &sample_path("test_data/ramp_4ch.csv")])?;
    assert_eq!(summary.channels, vec!["AF3", "F7", "O1", "O2"]);
    assert_eq!(summary.channel_count, 4);
    assert_eq!(summary.sample_count, 1000);
    assert!((summary.sample_rate - 256.0).abs() < 1e-9);
    assert!((summary.duration_s - 1000.0 / 256.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn info_honours_config_picks() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = dir.path().join("viewer.toml");
    fs::write(&config, "channel_picks = [\"O2\", \"AF3\"]\n")?;
    let summary = info(&[
        "--input",
        &sample_path("test_data/ramp_4ch.csv"),
        "--config",
        config.to_str().expect("utf8 path"),
    ])?;
    assert_eq!(summary.channels, vec!["O2", "AF3"]);
    Ok(())
}

#[test]
fn synth_output_loads_back() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let out = dir.path().join("synth.csv");
    let out_str = out.to_str().expect("utf8 path");
    cargo_bin_cmd!("eegview")
        .args([
            "synth",
            "--out",
            out_str,
            "--channels",
            "3",
            "--fs",
            "128",
            "--seconds",
            "4",
        ])
        .assert()
        .success();
    assert!(out.exists());
    let summary = info(&["--input", out_str])?;
    assert_eq!(summary.channels, vec!["AF3", "F7", "F3"]);
    assert_eq!(summary.sample_count, 512);
    assert!((summary.sample_rate - 128.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn snapshot_writes_png() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let out = dir.path().join("window.png");
    cargo_bin_cmd!("eegview")
        .args([
            "snapshot",
            "--input",
            &sample_path("test_data/ramp_4ch.csv"),
            "--window-s",
            "2",
            "--seek",
            "100",
            "--out",
            out.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();
    let bytes = fs::read(&out)?;
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    Ok(())
}

#[test]
fn text_input_requires_sample_rate() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("series.txt");
    fs::write(&path, "1\n2\n3\n4\n")?;
    let path = path.to_str().expect("utf8 path");
    cargo_bin_cmd!("eegview")
        .args(["info", "--input", path])
        .assert()
        .failure();
    let summary = info(&["--input", path, "--fs", "2"])?;
    assert_eq!(summary.channels, vec!["CH1"]);
    assert_eq!(summary.sample_count, 4);
    Ok(())
}

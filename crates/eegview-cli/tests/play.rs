use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct TickLine {
    tick: usize,
    kind: String,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    wrapped: Option<bool>,
    #[serde(default)]
    time_s: Option<f64>,
    #[serde(default)]
    channels: Vec<ChannelWindow>,
}

#[derive(Debug, Deserialize)]
struct ChannelWindow {
    channel: usize,
    name: String,
    min: f64,
    max: f64,
    #[serde(default)]
    samples: Option<Vec<f64>>,
}

fn ramp_path() -> String {
    workspace_root()
        .join("test_data/ramp_4ch.csv")
        .to_string_lossy()
        .to_string()
}

fn run_play(args: &[&str]) -> Result<Vec<TickLine>, Box<dyn Error>> {
    let ramp = ramp_path();
    let mut cmd = cargo_bin_cmd!("eegview");
    cmd.args(["play", "--input", &ramp]).args(args);
    let out = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(out)?;
    let mut lines = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        lines.push(serde_json::from_str(line)?);
    }
    Ok(lines)
}

#[test]
fn play_serves_scrolling_windows() -> Result<(), Box<dyn Error>> {
    let lines = run_play(&[
        "--window-s",
        "1",
        "--step-fraction",
        "0.1",
        "--ticks",
        "2",
        "--channels",
        "AF3",
        "--full",
    ])?;
    assert_eq!(lines.len(), 2);

    let first = &lines[0];
    assert_eq!(first.tick, 1);
    assert_eq!(first.kind, "served");
    assert_eq!(first.offset, Some(0));
    assert_eq!(first.channels.len(), 1);
    assert_eq!(first.channels[0].name, "AF3");
    let samples = first.channels[0].samples.as_ref().expect("full samples");
    let expected: Vec<f64> = (0..256).map(|v| v as f64).collect();
    assert_eq!(samples, &expected);

    let second = &lines[1];
    assert_eq!(second.offset, Some(25));
    assert_eq!(second.channels[0].min, 25.0);
    assert_eq!(second.channels[0].max, 280.0);
    assert!((second.time_s.unwrap() - 25.0 / 256.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn play_reports_every_channel_in_order() -> Result<(), Box<dyn Error>> {
    let lines = run_play(&["--window-s", "1", "--ticks", "1"])?;
    let channels: Vec<usize> = lines[0].channels.iter().map(|c| c.channel).collect();
    assert_eq!(channels, vec![0, 1, 2, 3]);
    assert!(lines[0].channels.iter().all(|c| c.samples.is_none()));
    assert_eq!(lines[0].channels[3].max, -3.0);
    Ok(())
}

#[test]
fn play_wraps_to_the_start() -> Result<(), Box<dyn Error>> {
    // 100-sample window, 50-sample step at 256 Hz.
    let lines = run_play(&[
        "--window-s",
        "0.390625",
        "--step-fraction",
        "0.1953125",
        "--seek",
        "960",
        "--ticks",
        "2",
        "--channels",
        "AF3",
    ])?;
    assert_eq!(lines[0].offset, Some(0));
    assert_eq!(lines[0].wrapped, Some(true));
    assert_eq!(lines[0].channels[0].min, 0.0);
    assert_eq!(lines[0].channels[0].max, 99.0);
    assert_eq!(lines[1].offset, Some(50));
    assert_eq!(lines[1].wrapped, Some(false));
    Ok(())
}

#[test]
fn play_stops_at_end_with_stop_policy() -> Result<(), Box<dyn Error>> {
    let lines = run_play(&[
        "--window-s",
        "0.390625",
        "--wrap",
        "stop",
        "--seek",
        "950",
        "--ticks",
        "5",
    ])?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].kind, "ended");
    assert!(lines[0].channels.is_empty());
    Ok(())
}

#[test]
fn play_rejects_window_longer_than_recording() {
    let ramp = ramp_path();
    let mut cmd = cargo_bin_cmd!("eegview");
    cmd.args(["play", "--input", &ramp, "--window-s", "10"]);
    let out = cmd.assert().failure().get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&out);
    assert!(
        stderr.contains("invalid playback configuration"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn play_rejects_unrepresentable_step() {
    let ramp = ramp_path();
    let mut cmd = cargo_bin_cmd!("eegview");
    cmd.args(["play", "--input", &ramp, "--step-fraction", "1e300", "--ticks", "3"]);
    let out = cmd.assert().failure().get_output().stderr.clone();
    let stderr = String::from_utf8_lossy(&out);
    assert!(
        stderr.contains("invalid playback configuration"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn play_with_step_past_end_stays_in_range() -> Result<(), Box<dyn Error>> {
    let lines = run_play(&[
        "--window-s",
        "1",
        "--step-fraction",
        "10",
        "--ticks",
        "3",
        "--channels",
        "AF3",
    ])?;
    let offsets: Vec<Option<usize>> = lines.iter().map(|l| l.offset).collect();
    assert_eq!(offsets, vec![Some(0), Some(0), Some(0)]);
    assert_eq!(lines[1].wrapped, Some(true));
    Ok(())
}

fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .expect("crates dir")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

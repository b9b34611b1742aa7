use crate::config::EMOTIV_CHANNELS;
use crate::signal::{ChannelMetadata, Recording, SignalMatrix};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f64::consts::TAU;
use std::path::Path;

/// Parameters for a synthetic EEG-like recording.
#[derive(Debug, Clone, Copy)]
pub struct SynthConfig {
    pub channels: usize,
    pub sample_rate: f64,
    pub seconds: f64,
    pub seed: u64,
    /// Peak alpha amplitude (µV).
    pub amplitude_uv: f64,
    /// Uniform noise amplitude (µV).
    pub noise_uv: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            channels: EMOTIV_CHANNELS.len(),
            sample_rate: 128.0,
            seconds: 30.0,
            seed: 7,
            amplitude_uv: 40.0,
            noise_uv: 8.0,
        }
    }
}

/// Alpha-band sinusoids (8-12 Hz) plus uniform noise, one random frequency and
/// phase per channel. The same seed always yields the same samples.
pub fn synth_recording(cfg: &SynthConfig) -> Result<Recording> {
    if cfg.channels == 0 {
        anyhow::bail!("synthetic recording needs at least one channel");
    }
    let samples = (cfg.seconds * cfg.sample_rate).round();
    if !samples.is_finite() || samples < 1.0 {
        anyhow::bail!(
            "{} s at {} Hz does not yield any samples",
            cfg.seconds,
            cfg.sample_rate
        );
    }
    let samples = samples as usize;
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut rows = Vec::with_capacity(cfg.channels);
    for _ in 0..cfg.channels {
        let freq = rng.gen_range(8.0..12.0);
        let phase = rng.gen_range(0.0..TAU);
        let gain = rng.gen_range(0.5..1.0) * cfg.amplitude_uv;
        let row: Vec<f64> = (0..samples)
            .map(|i| {
                let t = i as f64 / cfg.sample_rate;
                let noise = if cfg.noise_uv > 0.0 {
                    rng.gen_range(-cfg.noise_uv..cfg.noise_uv)
                } else {
                    0.0
                };
                gain * (TAU * freq * t + phase).sin() + noise
            })
            .collect();
        rows.push(row);
    }
    let names = if cfg.channels <= EMOTIV_CHANNELS.len() {
        ChannelMetadata::new(
            EMOTIV_CHANNELS[..cfg.channels]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    } else {
        ChannelMetadata::numbered(cfg.channels)
    };
    let matrix = SignalMatrix::from_rows(rows)?;
    Ok(Recording::new(matrix, names, cfg.sample_rate)?)
}

/// Write `recording` in the CSV layout read by [`crate::io::csv::read_csv_recording`]:
/// a `time` column followed by one column per channel.
pub fn write_csv(recording: &Recording, path: &Path) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut header = vec!["time".to_string()];
    header.extend(recording.metadata.names.iter().cloned());
    writer.write_record(&header)?;
    let rows: Vec<&[f64]> = recording.matrix.rows().collect();
    for i in 0..recording.matrix.sample_count() {
        let mut record = Vec::with_capacity(rows.len() + 1);
        record.push((i as f64 / recording.sample_rate).to_string());
        record.extend(rows.iter().map(|row| row[i].to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

use crate::signal::{ChannelMetadata, Recording, SignalMatrix};
use anyhow::{Context, Result};
use std::path::Path;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Read a newline-delimited floating point series from disk.
pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Single-channel recording from a newline-delimited text file.
pub fn read_text_recording(path: &Path, sample_rate: f64) -> Result<Recording> {
    let samples = read_f64_series(path)?;
    let recording = Recording::new(
        SignalMatrix::from_rows(vec![samples])?,
        ChannelMetadata::numbered(1),
        sample_rate,
    )?;
    Ok(recording)
}

use crate::signal::{ChannelMetadata, Recording, SignalMatrix};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::path::Path;

const TIME_COLUMNS: [&str; 3] = ["time", "timestamp", "t"];

/// Load a multi-channel CSV/TSV: header row of channel names, one row per
/// sample. A leading `time`/`timestamp` column is used to infer the sample
/// rate when `sample_rate` is `None`; otherwise it is ignored.
pub fn read_csv_recording(path: &Path, sample_rate: Option<f64>) -> Result<Recording> {
    let delimiter = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers().context("reading header")?.clone();
    let time_idx = headers.iter().position(|h| {
        TIME_COLUMNS
            .iter()
            .any(|name| h.trim().eq_ignore_ascii_case(name))
    });
    let channel_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != time_idx)
        .map(|(idx, name)| (idx, name.trim().to_string()))
        .collect();
    if channel_cols.is_empty() {
        return Err(anyhow!("{} has no channel columns", path.display()));
    }

    let mut rows: Vec<Vec<f64>> = vec![Vec::new(); channel_cols.len()];
    let mut first_times: Vec<f64> = Vec::with_capacity(2);
    for (line, record) in reader.records().enumerate() {
        let record = record.context("reading record")?;
        if let Some(idx) = time_idx {
            if first_times.len() < 2 {
                let ts = record
                    .get(idx)
                    .ok_or_else(|| anyhow!("missing time column"))?
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("parsing time on row {}", line + 2))?;
                first_times.push(ts);
            }
        }
        for (row, (col, name)) in rows.iter_mut().zip(&channel_cols) {
            let value = record
                .get(*col)
                .ok_or_else(|| anyhow!("row {} is missing column {}", line + 2, name))?
                .trim()
                .parse::<f64>()
                .with_context(|| format!("parsing {} on row {}", name, line + 2))?;
            row.push(value);
        }
    }

    let fs = match sample_rate {
        Some(fs) => fs,
        None => match first_times.as_slice() {
            [a, b] if b > a => 1.0 / (b - a),
            _ => {
                return Err(anyhow!(
                    "cannot infer sample rate for {}; pass it explicitly",
                    path.display()
                ))
            }
        },
    };
    let names = channel_cols.into_iter().map(|(_, name)| name).collect();
    let recording = Recording::new(SignalMatrix::from_rows(rows)?, ChannelMetadata::new(names), fs)?;
    Ok(recording)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{synth_recording, write_csv, SynthConfig};
    use std::path::PathBuf;

    #[test]
    fn parses_sample_recording() {
        let rec = read_csv_recording(&sample_path("test_data/ramp_4ch.csv"), None).unwrap();
        assert_eq!(rec.metadata.names, vec!["AF3", "F7", "O1", "O2"]);
        assert_eq!(rec.matrix.sample_count(), 1000);
        assert!((rec.sample_rate - 256.0).abs() < 1e-6);
        assert_eq!(rec.matrix.row(0).unwrap()[999], 999.0);
        assert_eq!(rec.matrix.row(3).unwrap()[0], -3.0);
    }

    #[test]
    fn explicit_rate_wins_over_time_column() {
        let rec = read_csv_recording(&sample_path("test_data/ramp_4ch.csv"), Some(100.0)).unwrap();
        assert_eq!(rec.sample_rate, 100.0);
    }

    #[test]
    fn synthetic_csv_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synth.csv");
        let cfg = SynthConfig {
            channels: 3,
            seconds: 2.0,
            ..SynthConfig::default()
        };
        let rec = synth_recording(&cfg).unwrap();
        write_csv(&rec, &path).unwrap();
        let loaded = read_csv_recording(&path, None).unwrap();
        assert_eq!(loaded.metadata, rec.metadata);
        assert_eq!(loaded.matrix.sample_count(), 256);
        assert!((loaded.sample_rate - 128.0).abs() < 1e-3);
    }

    #[test]
    fn rate_is_required_without_time_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.csv");
        std::fs::write(&path, "Cz,Pz\n1,2\n3,4\n").unwrap();
        assert!(read_csv_recording(&path, None).is_err());
        let rec = read_csv_recording(&path, Some(10.0)).unwrap();
        assert_eq!(rec.matrix.row(1).unwrap(), &[2.0, 4.0]);
    }

    #[test]
    fn bad_numbers_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "Cz\n1\nx\n").unwrap();
        let err = read_csv_recording(&path, Some(10.0)).unwrap_err();
        assert!(format!("{:#}", err).contains("Cz"));
    }

    fn sample_path(relative: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join(relative)
    }
}

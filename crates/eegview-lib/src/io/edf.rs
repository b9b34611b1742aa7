use crate::signal::{ChannelMetadata, Recording, SignalMatrix};
use anyhow::{anyhow, Result};
use edf_reader::file_reader::SyncFileReader;
use edf_reader::sync_reader::SyncEDFReader;
use log::{info, warn};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Helper implementing the EDF reader trait for on-disk files.
struct DiskFileReader {
    path: PathBuf,
}

impl DiskFileReader {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SyncFileReader for DiskFileReader {
    fn read(&self, offset: u64, length: u64) -> Result<Vec<u8>, std::io::Error> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; length as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// Decode every sample of the selected EDF channels into a [`Recording`].
///
/// When any label in `picks` is present, only those channels are kept (in
/// pick order). Otherwise all channels sharing the first channel's sample rate
/// are kept, which skips EDF+ annotation channels.
pub fn load_edf_recording<S: AsRef<str>>(path: &Path, picks: &[S]) -> Result<Recording> {
    let reader = SyncEDFReader::init_with_file_reader(DiskFileReader::new(path))?;
    let header = &reader.edf_header;
    let labels: Vec<String> = header
        .channels
        .iter()
        .map(|channel| channel.label.trim().to_string())
        .collect();
    let rates: Vec<f64> = header
        .channels
        .iter()
        .map(|channel| {
            channel.number_of_samples_in_data_record as f64 * 1000.0
                / header.block_duration as f64
        })
        .collect();
    let selected = select_channels(&labels, &rates, picks)?;

    let total_duration = header.block_duration * header.number_of_blocks;
    let data_matrix = reader.read_data_window(0, total_duration)?;
    let mut rows = Vec::with_capacity(selected.len());
    let mut names = Vec::with_capacity(selected.len());
    for &idx in &selected {
        let channel_data = data_matrix
            .get(idx)
            .ok_or_else(|| anyhow!("missing data for channel {}", labels[idx]))?;
        rows.push(channel_data.iter().map(|value| *value as f64).collect());
        names.push(labels[idx].clone());
    }
    let fs = rates[selected[0]];
    let recording = Recording::new(
        SignalMatrix::from_rows(rows)?,
        ChannelMetadata::new(names),
        fs,
    )?;
    info!(
        "loaded {} ({} channels, {} samples @ {:.1} Hz)",
        path.display(),
        recording.matrix.channel_count(),
        recording.matrix.sample_count(),
        fs
    );
    Ok(recording)
}

/// Indices of the channels to load, given each channel's label and rate.
fn select_channels<S: AsRef<str>>(labels: &[String], rates: &[f64], picks: &[S]) -> Result<Vec<usize>> {
    if labels.is_empty() {
        return Err(anyhow!("EDF file has no channels"));
    }
    let picked: Vec<usize> = picks
        .iter()
        .filter_map(|pick| {
            labels
                .iter()
                .position(|label| label.eq_ignore_ascii_case(pick.as_ref().trim()))
        })
        .collect();
    if !picked.is_empty() {
        let fs = rates[picked[0]];
        if let Some(&odd) = picked.iter().find(|&&idx| rates[idx] != fs) {
            return Err(anyhow!(
                "channel {} is sampled at {} Hz but {} is at {} Hz",
                labels[odd],
                rates[odd],
                labels[picked[0]],
                fs
            ));
        }
        return Ok(picked);
    }

    let fs = rates[0];
    let (kept, skipped): (Vec<usize>, Vec<usize>) =
        (0..labels.len()).partition(|&idx| rates[idx] == fs);
    for idx in skipped {
        warn!(
            "skipping channel {} ({} Hz differs from {} Hz)",
            labels[idx], rates[idx], fs
        );
    }
    Ok(kept)
}

pub mod csv;
pub mod edf;
pub mod text;

use crate::signal::Recording;
use anyhow::{anyhow, Result};
use std::path::Path;

/// Load a recording, choosing the decoder from the file extension.
///
/// `edf`/`bdf` files carry their own sample rate and honour `picks`;
/// `csv`/`tsv` infer it from a time column unless `sample_rate` is given;
/// anything else is read as a single-channel text series and needs
/// `sample_rate`.
pub fn load_recording<S: AsRef<str>>(
    path: &Path,
    sample_rate: Option<f64>,
    picks: &[S],
) -> Result<Recording> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("edf") | Some("bdf") => edf::load_edf_recording(path, picks),
        Some("csv") | Some("tsv") => {
            Ok(csv::read_csv_recording(path, sample_rate)?.pick_channels(picks))
        }
        _ => {
            let fs = sample_rate.ok_or_else(|| {
                anyhow!(
                    "{} needs an explicit sample rate (text series)",
                    path.display()
                )
            })?;
            text::read_text_recording(path, fs)
        }
    }
}

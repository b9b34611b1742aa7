use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};

/// Dense channel-major sample matrix (`channel_count x sample_count`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMatrix {
    channel_count: usize,
    sample_count: usize,
    data: Vec<f64>,
}

impl SignalMatrix {
    /// Build a matrix from one `Vec` per channel. All rows must have the same,
    /// non-zero length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let channel_count = rows.len();
        if channel_count == 0 {
            return Err(PlaybackError::config("recording has no channels"));
        }
        let sample_count = rows[0].len();
        if sample_count == 0 {
            return Err(PlaybackError::config("recording has no samples"));
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != sample_count)
        {
            return Err(PlaybackError::Configuration(format!(
                "channel {} has {} samples, expected {}",
                idx,
                row.len(),
                sample_count
            )));
        }
        let mut data = Vec::with_capacity(channel_count * sample_count);
        for row in rows {
            data.extend(row);
        }
        Ok(Self {
            channel_count,
            sample_count,
            data,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Full row for `channel`, or `None` when the index is out of range.
    pub fn row(&self, channel: usize) -> Option<&[f64]> {
        if channel >= self.channel_count {
            return None;
        }
        let start = channel * self.sample_count;
        Some(&self.data[start..start + self.sample_count])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.sample_count)
    }
}

/// Channel labels aligned by index with the matrix rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub names: Vec<String>,
}

impl ChannelMetadata {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// `CH1`, `CH2`, ... for sources without channel labels.
    pub fn numbered(count: usize) -> Self {
        Self {
            names: (1..=count).map(|i| format!("CH{}", i)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|name| name.trim().eq_ignore_ascii_case(label.trim()))
    }
}

/// A decoded recording as handed over by a loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    pub matrix: SignalMatrix,
    pub metadata: ChannelMetadata,
    /// Uniform sampling frequency in Hz
    pub sample_rate: f64,
}

impl Recording {
    pub fn new(matrix: SignalMatrix, metadata: ChannelMetadata, sample_rate: f64) -> Result<Self> {
        if metadata.len() != matrix.channel_count() {
            return Err(PlaybackError::Configuration(format!(
                "{} channel names for {} channels",
                metadata.len(),
                matrix.channel_count()
            )));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(PlaybackError::Configuration(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        Ok(Self {
            matrix,
            metadata,
            sample_rate,
        })
    }

    pub fn duration(&self) -> f64 {
        self.matrix.sample_count() as f64 / self.sample_rate
    }

    /// Keep only the channels named in `picks`, in pick order. Labels missing
    /// from the recording are skipped. When none of the picks match, the
    /// recording is returned unchanged.
    pub fn pick_channels<S: AsRef<str>>(self, picks: &[S]) -> Self {
        let selected: Vec<usize> = picks
            .iter()
            .filter_map(|pick| self.metadata.position(pick.as_ref()))
            .collect();
        if selected.is_empty() {
            return self;
        }
        let mut rows = Vec::with_capacity(selected.len());
        let mut names = Vec::with_capacity(selected.len());
        for idx in selected {
            if let Some(row) = self.matrix.row(idx) {
                rows.push(row.to_vec());
                names.push(self.metadata.names[idx].clone());
            }
        }
        match SignalMatrix::from_rows(rows) {
            Ok(matrix) => Self {
                matrix,
                metadata: ChannelMetadata::new(names),
                sample_rate: self.sample_rate,
            },
            Err(_) => self,
        }
    }
}

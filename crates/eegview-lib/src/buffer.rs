use crate::error::{PlaybackError, Result};
use crate::signal::{ChannelMetadata, Recording, SignalMatrix};
use serde::Serialize;

/// Read-only view over a loaded recording with bounds-checked windowed reads.
///
/// The buffer never changes after construction, so it can be wrapped in an
/// `Arc` and read by several cursors at once.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    matrix: SignalMatrix,
    metadata: ChannelMetadata,
    sample_rate: f64,
}

/// Serializable overview of a buffer.
#[derive(Debug, Clone, Serialize)]
pub struct BufferSummary {
    pub channels: Vec<String>,
    pub channel_count: usize,
    pub sample_count: usize,
    pub sample_rate: f64,
    pub duration_s: f64,
}

impl SignalBuffer {
    pub fn new(recording: Recording) -> Self {
        Self {
            matrix: recording.matrix,
            metadata: recording.metadata,
            sample_rate: recording.sample_rate,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.matrix.channel_count()
    }

    pub fn sample_count(&self) -> usize {
        self.matrix.sample_count()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn duration(&self) -> f64 {
        self.sample_count() as f64 / self.sample_rate
    }

    pub fn channel_names(&self) -> &[String] {
        &self.metadata.names
    }

    pub fn channel_name(&self, channel: usize) -> Option<&str> {
        self.metadata.names.get(channel).map(String::as_str)
    }

    /// Whole row for one channel.
    pub fn channel(&self, channel: usize) -> Result<&[f64]> {
        self.matrix
            .row(channel)
            .ok_or(PlaybackError::ChannelOutOfRange {
                channel,
                channel_count: self.channel_count(),
            })
    }

    /// `length` consecutive samples of `channel` beginning at `start`.
    ///
    /// Fails when the channel does not exist or the window runs past the end
    /// of the recording; no wraparound is applied here.
    pub fn window(&self, channel: usize, start: usize, length: usize) -> Result<&[f64]> {
        let row = self.channel(channel)?;
        let end = start
            .checked_add(length)
            .filter(|end| *end <= row.len())
            .ok_or(PlaybackError::WindowOutOfRange {
                start,
                length,
                sample_count: row.len(),
            })?;
        Ok(&row[start..end])
    }

    pub fn summary(&self) -> BufferSummary {
        BufferSummary {
            channels: self.metadata.names.clone(),
            channel_count: self.channel_count(),
            sample_count: self.sample_count(),
            sample_rate: self.sample_rate,
            duration_s: self.duration(),
        }
    }
}

impl From<Recording> for SignalBuffer {
    fn from(recording: Recording) -> Self {
        Self::new(recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> SignalBuffer {
        let rows = vec![
            (0..10).map(|v| v as f64).collect(),
            (0..10).map(|v| -(v as f64)).collect(),
        ];
        let matrix = SignalMatrix::from_rows(rows).unwrap();
        let recording = Recording::new(matrix, ChannelMetadata::numbered(2), 5.0).unwrap();
        SignalBuffer::new(recording)
    }

    #[test]
    fn window_returns_requested_slice() {
        let buf = buffer();
        assert_eq!(buf.window(0, 3, 4).unwrap(), &[3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buf.window(1, 8, 2).unwrap(), &[-8.0, -9.0]);
        assert_eq!(buf.window(0, 0, 10).unwrap().len(), 10);
    }

    #[test]
    fn window_past_end_is_out_of_range() {
        let buf = buffer();
        let err = buf.window(0, 7, 4).unwrap_err();
        assert_eq!(
            err,
            PlaybackError::WindowOutOfRange {
                start: 7,
                length: 4,
                sample_count: 10
            }
        );
        assert!(err.is_out_of_range());
        assert!(buf.window(0, usize::MAX, 2).is_err());
    }

    #[test]
    fn unknown_channel_is_out_of_range() {
        let buf = buffer();
        let err = buf.window(2, 0, 1).unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::ChannelOutOfRange {
                channel: 2,
                channel_count: 2
            }
        ));
    }

    #[test]
    fn queries_report_fixed_shape() {
        let buf = buffer();
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.sample_count(), 10);
        assert_eq!(buf.sample_rate(), 5.0);
        assert!((buf.duration() - 2.0).abs() < 1e-12);
        assert_eq!(buf.channel_name(1), Some("CH2"));
        let summary = buf.summary();
        assert_eq!(summary.channels, vec!["CH1", "CH2"]);
    }
}

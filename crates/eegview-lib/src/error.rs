use thiserror::Error;

/// Errors raised by the signal buffer and the playback cursor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Construction-time problem: bad matrix shape, bad sample rate or a
    /// window/step that can never be satisfied.
    #[error("invalid playback configuration: {0}")]
    Configuration(String),
    #[error("channel {channel} is out of range (recording has {channel_count} channels)")]
    ChannelOutOfRange {
        channel: usize,
        channel_count: usize,
    },
    #[error("window of {length} samples at {start} exceeds recording length {sample_count}")]
    WindowOutOfRange {
        start: usize,
        length: usize,
        sample_count: usize,
    },
    #[error("offset {offset} is beyond recording length {sample_count}")]
    OffsetOutOfRange { offset: usize, sample_count: usize },
}

impl PlaybackError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PlaybackError::Configuration(msg.into())
    }

    /// True for the out-of-range family (bad channel or bad window bounds).
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            PlaybackError::ChannelOutOfRange { .. }
                | PlaybackError::WindowOutOfRange { .. }
                | PlaybackError::OffsetOutOfRange { .. }
        )
    }
}

pub type Result<T, E = PlaybackError> = std::result::Result<T, E>;

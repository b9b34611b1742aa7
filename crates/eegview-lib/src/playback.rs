use crate::buffer::SignalBuffer;
use crate::error::{PlaybackError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Slack applied before truncating the step so that e.g. `200 * 0.05` lands on 10.
const STEP_EPSILON: f64 = 1e-9;

/// What the cursor does when the next window would run past the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WrapPolicy {
    /// Jump back to the first sample and keep playing.
    #[default]
    Loop,
    /// Pause once the final full window has been served.
    Stop,
}

/// Playback parameters expressed in seconds; converted to sample counts with
/// the buffer's sample rate when a cursor is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Visible window length (seconds).
    pub window_length_seconds: f64,
    /// Fraction of one second the cursor advances per tick.
    pub refresh_step_fraction: f64,
    pub wrap: WrapPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            window_length_seconds: 5.0,
            refresh_step_fraction: 0.05,
            wrap: WrapPolicy::Loop,
        }
    }
}

impl PlaybackConfig {
    /// `round(window_length_seconds * sample_rate)`
    pub fn window_samples(&self, sample_rate: f64) -> Result<usize> {
        if !self.window_length_seconds.is_finite() || self.window_length_seconds <= 0.0 {
            return Err(PlaybackError::Configuration(format!(
                "window length must be positive, got {} s",
                self.window_length_seconds
            )));
        }
        let samples = (self.window_length_seconds * sample_rate).round();
        if samples < 1.0 {
            return Err(PlaybackError::Configuration(format!(
                "window of {} s at {} Hz is shorter than one sample",
                self.window_length_seconds, sample_rate
            )));
        }
        Ok(samples as usize)
    }

    /// `trunc(sample_rate * refresh_step_fraction)`
    pub fn step_samples(&self, sample_rate: f64) -> Result<usize> {
        if !self.refresh_step_fraction.is_finite() || self.refresh_step_fraction <= 0.0 {
            return Err(PlaybackError::Configuration(format!(
                "refresh step fraction must be positive, got {}",
                self.refresh_step_fraction
            )));
        }
        let samples = (sample_rate * self.refresh_step_fraction + STEP_EPSILON).floor();
        if samples < 1.0 {
            return Err(PlaybackError::Configuration(format!(
                "step fraction {} at {} Hz advances less than one sample",
                self.refresh_step_fraction, sample_rate
            )));
        }
        if samples >= usize::MAX as f64 {
            return Err(PlaybackError::Configuration(format!(
                "step fraction {} at {} Hz is too large",
                self.refresh_step_fraction, sample_rate
            )));
        }
        Ok(samples as usize)
    }
}

/// Mutable part of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackState {
    pub offset: usize,
    pub window_length: usize,
    pub step: usize,
    pub running: bool,
}

/// Receives one window per channel on every served tick, in ascending
/// channel order.
pub trait WindowSink {
    fn on_window(&mut self, channel: usize, samples: &[f64]);
}

impl<F> WindowSink for F
where
    F: FnMut(usize, &[f64]),
{
    fn on_window(&mut self, channel: usize, samples: &[f64]) {
        self(channel, samples)
    }
}

/// Sink that keeps a copy of everything it was handed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowLog {
    pub windows: Vec<(usize, Vec<f64>)>,
}

impl WindowLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Drain the recorded windows, leaving the log empty.
    pub fn take(&mut self) -> Vec<(usize, Vec<f64>)> {
        std::mem::take(&mut self.windows)
    }
}

impl WindowSink for WindowLog {
    fn on_window(&mut self, channel: usize, samples: &[f64]) {
        self.windows.push((channel, samples.to_vec()));
    }
}

/// Result of a single `tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Cursor is paused; nothing was delivered.
    Idle,
    /// Windows starting at `offset` were delivered for every channel.
    Served { offset: usize, wrapped: bool },
    /// End of recording under [`WrapPolicy::Stop`]; the cursor paused itself.
    Ended,
}

/// Fixed-step windowed traversal of a [`SignalBuffer`].
///
/// The cursor starts paused. Each `tick` while running first applies the
/// end-of-recording policy, then hands the window at the current offset to the
/// sink for every channel, then advances by `step` samples. A window shorter
/// than `window_length` is never delivered.
pub struct PlaybackCursor<S> {
    buffer: Arc<SignalBuffer>,
    sink: S,
    state: PlaybackState,
    wrap: WrapPolicy,
    last_served: Option<usize>,
    // The last advance ran off the end of the recording.
    past_end: bool,
}

impl<S: WindowSink> PlaybackCursor<S> {
    pub fn new(buffer: Arc<SignalBuffer>, config: &PlaybackConfig, sink: S) -> Result<Self> {
        let window_length = config.window_samples(buffer.sample_rate())?;
        let step = config.step_samples(buffer.sample_rate())?;
        Self::with_samples(buffer, window_length, step, config.wrap, sink)
    }

    /// Build a cursor from sample counts directly.
    pub fn with_samples(
        buffer: Arc<SignalBuffer>,
        window_length: usize,
        step: usize,
        wrap: WrapPolicy,
        sink: S,
    ) -> Result<Self> {
        if window_length == 0 {
            return Err(PlaybackError::config("window length must be at least one sample"));
        }
        if step == 0 {
            return Err(PlaybackError::config("step must be at least one sample"));
        }
        if window_length > buffer.sample_count() {
            return Err(PlaybackError::Configuration(format!(
                "window of {} samples is longer than the recording ({} samples)",
                window_length,
                buffer.sample_count()
            )));
        }
        debug!(
            "playback cursor: window={} step={} wrap={:?} over {} channels",
            window_length,
            step,
            wrap,
            buffer.channel_count()
        );
        Ok(Self {
            buffer,
            sink,
            state: PlaybackState {
                offset: 0,
                window_length,
                step,
                running: false,
            },
            wrap,
            last_served: None,
            past_end: false,
        })
    }

    pub fn start(&mut self) {
        self.state.running = true;
    }

    pub fn pause(&mut self) {
        self.state.running = false;
    }

    pub fn reset(&mut self) {
        self.state.offset = 0;
        self.past_end = false;
    }

    /// Move the cursor to `offset`. The end-of-recording policy is applied on
    /// the next tick as usual.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        let sample_count = self.buffer.sample_count();
        if offset >= sample_count {
            return Err(PlaybackError::OffsetOutOfRange {
                offset,
                sample_count,
            });
        }
        debug!("seek {} -> {}", self.state.offset, offset);
        self.state.offset = offset;
        self.past_end = false;
        Ok(())
    }

    /// Advance playback by one step.
    ///
    /// An `Err` here means the buffer and the cursor disagree about the
    /// recording's shape; callers should treat it as fatal.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if !self.state.running {
            return Ok(TickOutcome::Idle);
        }
        let sample_count = self.buffer.sample_count();
        let window_length = self.state.window_length;
        let mut wrapped = false;
        match self.wrap {
            WrapPolicy::Loop => {
                if self.past_end || self.state.offset + window_length >= sample_count {
                    wrapped = self.past_end || self.state.offset != 0;
                    if wrapped {
                        debug!("wrapping at offset {}", self.state.offset);
                    }
                    self.state.offset = 0;
                    self.past_end = false;
                }
            }
            WrapPolicy::Stop => {
                if self.past_end || self.state.offset + window_length > sample_count {
                    info!("end of recording at offset {}", self.state.offset);
                    self.state.running = false;
                    return Ok(TickOutcome::Ended);
                }
            }
        }

        let offset = self.state.offset;
        for channel in 0..self.buffer.channel_count() {
            let window = self.buffer.window(channel, offset, window_length)?;
            self.sink.on_window(channel, window);
        }
        self.last_served = Some(offset);
        self.advance(offset, sample_count);
        Ok(TickOutcome::Served { offset, wrapped })
    }

    /// Move one step past `offset`, keeping the offset inside the recording.
    /// Under `Loop` an advance past the end folds back to 0; under `Stop` the
    /// offset stays on the last served window.
    fn advance(&mut self, offset: usize, sample_count: usize) {
        match offset.checked_add(self.state.step) {
            Some(next) if next < sample_count => self.state.offset = next,
            _ => {
                self.past_end = true;
                if self.wrap == WrapPolicy::Loop {
                    self.state.offset = 0;
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn current_offset(&self) -> usize {
        self.state.offset
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn window_length(&self) -> usize {
        self.state.window_length
    }

    pub fn step(&self) -> usize {
        self.state.step
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.wrap
    }

    /// Start time (seconds) of the window most recently delivered.
    pub fn window_start_seconds(&self) -> Option<f64> {
        self.last_served
            .map(|offset| offset as f64 / self.buffer.sample_rate())
    }

    pub fn buffer(&self) -> &Arc<SignalBuffer> {
        &self.buffer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

use eegview_lib::{
    config::DisplayConfig,
    plot::{figure_from_points, figure_from_window, smooth_points, Figure},
    thresholds::Thresholds,
    WindowSink,
};

/// Demo confidence trace (time, percent) shown beside the waveforms.
const CONFIDENCE_KNOTS: [[f64; 2]; 11] = [
    [0.0, 50.0],
    [1.0, 55.0],
    [2.0, 45.0],
    [3.0, 70.0],
    [4.0, 85.0],
    [5.0, 80.0],
    [6.0, 95.0],
    [7.0, 90.0],
    [8.0, 92.0],
    [9.0, 85.0],
    [10.0, 88.0],
];
const CONFIDENCE_POINTS: usize = 200;
const CONFIDENCE_COLOR: u32 = 0x00FFFF;

/// Latest window per channel plus the figures derived from them.
///
/// Acts as the playback sink: windows are copied in on every tick and the
/// figures are rebuilt lazily in [`TraceStore::prepare`].
pub struct TraceStore {
    names: Vec<String>,
    windows: Vec<Vec<f64>>,
    figures: Vec<Figure>,
    dirty: bool,
    display: DisplayConfig,
    sample_rate: f64,
}

impl TraceStore {
    pub fn new(names: Vec<String>, sample_rate: f64, display: DisplayConfig) -> Self {
        let channels = names.len();
        Self {
            names,
            windows: vec![Vec::new(); channels],
            figures: Vec::new(),
            dirty: true,
            display,
            sample_rate,
        }
    }

    /// Rebuild the per-channel figures if new windows arrived since the last call.
    pub fn prepare(&mut self, offset: Option<usize>) {
        if !self.dirty {
            return;
        }
        let Some(offset) = offset else {
            return;
        };
        self.figures = self
            .windows
            .iter()
            .enumerate()
            .map(|(channel, samples)| {
                figure_from_window(
                    self.names.get(channel).map(String::as_str).unwrap_or("?"),
                    samples,
                    offset,
                    self.sample_rate,
                    self.display.max_points,
                    self.display.channel_color(channel),
                )
            })
            .collect();
        self.dirty = false;
    }

    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn window(&self, channel: usize) -> Option<&[f64]> {
        self.windows.get(channel).map(Vec::as_slice)
    }
}

impl WindowSink for TraceStore {
    fn on_window(&mut self, channel: usize, samples: &[f64]) {
        if channel >= self.windows.len() {
            self.windows.resize(channel + 1, Vec::new());
        }
        let slot = &mut self.windows[channel];
        slot.clear();
        slot.extend_from_slice(samples);
        self.dirty = true;
    }
}

/// Smoothed confidence curve with optional threshold lines.
pub fn confidence_figure(thresholds: Option<&Thresholds>) -> Figure {
    let points = smooth_points(&CONFIDENCE_KNOTS, CONFIDENCE_POINTS);
    let mut fig = figure_from_points(Some("Confidence".into()), "Confidence", points, CONFIDENCE_COLOR);
    if let Some(thresholds) = thresholds {
        thresholds.apply(&mut fig);
    }
    fig
}

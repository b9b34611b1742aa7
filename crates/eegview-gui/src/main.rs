use eegview_lib::{
    config::ViewerConfig,
    history::{HistoryLog, HISTORY_COLUMNS},
    io::load_recording,
    plot::{Color, Figure, Series, Style},
    synth::{synth_recording, SynthConfig},
    thresholds::Thresholds,
    PlaybackCursor, SignalBuffer, TickOutcome, WrapPolicy,
};
use eframe::{egui, egui::ViewportBuilder};
use egui_plot::{HLine, Line, LineStyle, Plot};
use rfd::FileDialog;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod store;
mod timer;

use store::{confidence_figure, TraceStore};
use timer::PlaybackTimer;

const CHANNEL_PLOT_HEIGHT: f32 = 70.0;
const CONFIDENCE_PLOT_HEIGHT: f32 = 180.0;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            log::warn!("{err:#}; using default viewer settings");
            ViewerConfig::default()
        }
    };
    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "EEG Viewer",
        native_options,
        Box::new(|_cc| Ok(Box::new(ViewerApp::new(config)))),
    )
}

/// Settings come from the TOML file named by `EEGVIEW_CONFIG`, if set.
fn load_config() -> anyhow::Result<ViewerConfig> {
    let path = env::var_os("EEGVIEW_CONFIG").map(PathBuf::from);
    ViewerConfig::load_or_default(path.as_deref())
}

/// Loaded recording and the cursor walking it.
struct Session {
    label: String,
    cursor: PlaybackCursor<TraceStore>,
    last_offset: Option<usize>,
}

struct ViewerApp {
    config: ViewerConfig,
    session: Option<Session>,
    timer: PlaybackTimer,
    history: HistoryLog,
    show_history: bool,
    recording: bool,
    threshold_inputs: [String; 2],
    thresholds: Option<Thresholds>,
    confidence: Figure,
    status: String,
}

impl ViewerApp {
    fn new(config: ViewerConfig) -> Self {
        let interval = Duration::from_millis(config.tick_interval_ms);
        Self {
            config,
            session: None,
            timer: PlaybackTimer::new(interval),
            history: HistoryLog::new(),
            show_history: false,
            recording: false,
            threshold_inputs: [String::new(), String::new()],
            thresholds: None,
            confidence: confidence_figure(None),
            status: "No recording loaded".into(),
        }
    }

    fn open_file(&mut self, path: &Path) -> Result<(), String> {
        let recording = load_recording(path, None, &self.config.channel_picks)
            .map_err(|err| format!("Failed to load {}: {err:#}", path.display()))?;
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.install(label, SignalBuffer::new(recording))
    }

    fn load_demo(&mut self) -> Result<(), String> {
        let recording = synth_recording(&SynthConfig::default())
            .map_err(|err| format!("Demo signal failed: {err:#}"))?;
        self.install("demo signal".into(), SignalBuffer::new(recording))
    }

    /// Replace the current session; the new cursor starts paused.
    fn install(&mut self, label: String, buffer: SignalBuffer) -> Result<(), String> {
        self.timer.stop();
        let buffer = Arc::new(buffer);
        let store = TraceStore::new(
            buffer.channel_names().to_vec(),
            buffer.sample_rate(),
            self.config.display.clone(),
        );
        let cursor = PlaybackCursor::new(Arc::clone(&buffer), &self.config.playback, store)
            .map_err(|err| format!("Cannot play {label}: {err}"))?;
        self.status = format!(
            "{label}: {} channels, {} samples @ {:.1} Hz",
            buffer.channel_count(),
            buffer.sample_count(),
            buffer.sample_rate()
        );
        log::info!("{}", self.status);
        self.history.success(format!("Loaded {label}"));
        self.session = Some(Session {
            label,
            cursor,
            last_offset: None,
        });
        Ok(())
    }

    fn toggle_stream(&mut self) {
        let Some(session) = self.session.as_mut() else {
            self.status = "Load a recording before streaming".into();
            return;
        };
        if session.cursor.is_running() {
            session.cursor.pause();
            self.timer.stop();
            self.history.success("Playback paused");
            self.status = format!("Paused {}", session.label);
        } else {
            session.cursor.start();
            self.timer.start();
            self.history.success("Playback started");
            self.status = format!("Streaming {}", session.label);
        }
    }

    /// Rewind to the first sample; a running stream keeps running.
    fn reset(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.cursor.reset();
            session.last_offset = None;
            self.history.success("Playback reset");
            self.status = format!("Reset {}", session.label);
        }
    }

    fn seek(&mut self, offset: usize) {
        if let Some(session) = self.session.as_mut() {
            if let Err(err) = session.cursor.seek(offset) {
                self.status = err.to_string();
                self.history.failure("Seek");
            }
        }
    }

    /// Recording to disk is not implemented; the toggle only logs intent.
    fn toggle_recording(&mut self) {
        self.recording = !self.recording;
        if self.recording {
            self.history.success("Recording armed");
            self.status = "Recording export is not available yet".into();
        } else {
            self.history.success("Recording stopped");
        }
    }

    fn display_thresholds(&mut self) {
        match Thresholds::parse(&self.threshold_inputs[0], &self.threshold_inputs[1]) {
            Ok(thresholds) => {
                thresholds.apply(&mut self.confidence);
                self.thresholds = Some(thresholds);
                self.history.success("Thresholds displayed");
            }
            Err(err) => {
                self.status = format!("Invalid threshold: {err:#}");
                self.history.failure("Thresholds displayed");
            }
        }
    }

    /// Apply the ticks the timer fired since the previous frame.
    fn advance(&mut self) {
        let pending = self.timer.poll();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        for _ in 0..pending {
            match session.cursor.tick() {
                Ok(TickOutcome::Idle) => {}
                Ok(TickOutcome::Served { offset, wrapped }) => {
                    session.last_offset = Some(offset);
                    if wrapped {
                        log::debug!("{} wrapped to the start", session.label);
                        self.history.success("Playback wrapped");
                    }
                }
                Ok(TickOutcome::Ended) => {
                    self.timer.stop();
                    self.history.success("End of recording");
                    self.status = format!("Reached the end of {}", session.label);
                }
                Err(err) => {
                    session.cursor.pause();
                    self.timer.stop();
                    log::warn!("playback stopped: {err}");
                    self.history.failure("Playback");
                    self.status = format!("Playback stopped: {err}");
                }
            }
        }
        let offset = session.last_offset;
        session.cursor.sink_mut().prepare(offset);
    }

    fn show_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open EDF/CSV").clicked() {
                    if let Some(path) = FileDialog::new()
                        .add_filter("Recordings", &["edf", "bdf", "csv", "tsv"])
                        .pick_file()
                    {
                        if let Err(err) = self.open_file(&path) {
                            self.history.failure("Load recording");
                            self.status = err;
                        }
                    }
                }
                if ui.button("Load demo signal").clicked() {
                    if let Err(err) = self.load_demo() {
                        self.history.failure("Load demo signal");
                        self.status = err;
                    }
                }

                ui.separator();
                let loaded = self.session.is_some();
                let running = self
                    .session
                    .as_ref()
                    .map(|s| s.cursor.is_running())
                    .unwrap_or(false);
                let stream_label = if running { "Pause" } else { "Stream" };
                if ui
                    .add_enabled(loaded, egui::Button::new(stream_label))
                    .clicked()
                {
                    self.toggle_stream();
                }
                if ui.add_enabled(loaded, egui::Button::new("Reset")).clicked() {
                    self.reset();
                }
                let record_label = if self.recording { "Stop recording" } else { "Record" };
                if ui.button(record_label).clicked() {
                    self.toggle_recording();
                }
                if ui.button("History").clicked() {
                    self.show_history = !self.show_history;
                }
            });

            let seek = self.session.as_ref().map(|s| {
                let max = last_playable_offset(
                    s.cursor.buffer().sample_count(),
                    s.cursor.window_length(),
                    s.cursor.wrap_policy(),
                );
                (s.cursor.current_offset().min(max), max)
            });
            if let Some((mut position, max)) = seek {
                let slider = ui.add(
                    egui::Slider::new(&mut position, 0..=max)
                        .text("Position (samples)")
                        .integer(),
                );
                if slider.changed() {
                    self.seek(position);
                }
                if slider.drag_stopped() {
                    self.history.success(format!("Seek to sample {position}"));
                }
            }
            ui.horizontal(|ui| {
                let mut interval_ms = self.config.tick_interval_ms;
                let drag = ui.add(
                    egui::DragValue::new(&mut interval_ms)
                        .range(10..=2000)
                        .suffix(" ms"),
                );
                ui.label("Tick interval");
                if drag.changed() {
                    self.config.tick_interval_ms = interval_ms;
                    self.timer.set_interval(Duration::from_millis(interval_ms));
                }
            });
            ui.label(format!("Status: {}", self.status));
        });
    }

    fn show_thresholds(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("thresholds").show(ctx, |ui| {
            ui.heading("Confidence");
            ui.horizontal(|ui| {
                ui.label("Threshold 1");
                ui.text_edit_singleline(&mut self.threshold_inputs[0]);
            });
            ui.horizontal(|ui| {
                ui.label("Threshold 2");
                ui.text_edit_singleline(&mut self.threshold_inputs[1]);
            });
            if ui.button("Display").clicked() {
                self.display_thresholds();
            }
            if let Some(t) = &self.thresholds {
                ui.label(format!("Showing {:.1} / {:.1}", t.first, t.second));
            }
            ui.separator();
            Plot::new("confidence_plot")
                .height(CONFIDENCE_PLOT_HEIGHT)
                .include_y(0.0)
                .include_y(100.0)
                .show(ui, |plot_ui| plot_figure(plot_ui, &self.confidence));
        });
    }

    fn show_history_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("History")
            .open(&mut self.show_history)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    egui::Grid::new("history_grid").striped(true).show(ui, |ui| {
                        for column in HISTORY_COLUMNS {
                            ui.strong(column);
                        }
                        ui.end_row();
                        for row in self.history.rows() {
                            for cell in row {
                                ui.label(cell);
                            }
                            ui.end_row();
                        }
                    });
                });
            });
    }

    fn show_channels(&mut self, ctx: &egui::Context) {
        let fill = color32(Color(self.config.display.background));
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(fill))
            .show(ctx, |ui| {
                let Some(session) = self.session.as_ref() else {
                    ui.centered_and_justified(|ui| {
                        ui.label("Open a recording or load the demo signal.");
                    });
                    return;
                };
                let store = session.cursor.sink();
                if store.figures().is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label("Press Stream to start playback.");
                    });
                    return;
                }
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for (channel, fig) in store.figures().iter().enumerate() {
                        let name = store.names().get(channel).map(String::as_str).unwrap_or("?");
                        let label = match store.window(channel).and_then(|w| w.last()) {
                            Some(value) => format!("{name}\n{value:.1}"),
                            None => name.to_string(),
                        };
                        ui.horizontal(|ui| {
                            ui.add_sized([56.0, CHANNEL_PLOT_HEIGHT], egui::Label::new(label));
                            Plot::new(("channel_plot", channel))
                                .height(CHANNEL_PLOT_HEIGHT)
                                .show_axes([channel + 1 == store.figures().len(), false])
                                .allow_drag(false)
                                .allow_zoom(false)
                                .allow_scroll(false)
                                .allow_boxed_zoom(false)
                                .show(ui, |plot_ui| plot_figure(plot_ui, fig));
                        });
                    }
                });
            });
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.advance();
        self.show_controls(ctx);
        self.show_thresholds(ctx);
        self.show_channels(ctx);
        self.show_history_window(ctx);
        if self.timer.is_active() {
            ctx.request_repaint_after(self.timer.interval());
        }
    }
}

/// Highest offset the next tick serves from instead of wrapping or ending.
fn last_playable_offset(sample_count: usize, window_length: usize, wrap: WrapPolicy) -> usize {
    let tail = sample_count.saturating_sub(window_length);
    match wrap {
        WrapPolicy::Loop => tail.saturating_sub(1),
        WrapPolicy::Stop => tail,
    }
}

fn plot_figure(plot_ui: &mut egui_plot::PlotUi, figure: &Figure) {
    for series in &figure.series {
        match series {
            Series::Line(line) => {
                plot_ui.line(
                    Line::new(line.points.clone())
                        .stroke(stroke_from_style(&line.style))
                        .name(line.name.clone()),
                );
            }
            Series::HLine(hline) => {
                plot_ui.hline(
                    HLine::new(hline.y)
                        .stroke(stroke_from_style(&hline.style))
                        .style(line_style(&hline.style))
                        .name(hline.name.clone()),
                );
            }
        }
    }
}

/// Long dashes map to a dashed line, short ones to dots.
fn line_style(style: &Style) -> LineStyle {
    match style.dash {
        Some([on, _]) if on >= 4.0 => LineStyle::Dashed { length: on },
        Some([_, gap]) => LineStyle::Dotted { spacing: gap },
        None => LineStyle::Solid,
    }
}

fn stroke_from_style(style: &Style) -> egui::Stroke {
    egui::Stroke::new(style.width, color32(style.color))
}

fn color32(color: Color) -> egui::Color32 {
    let (r, g, b) = color.rgb();
    egui::Color32::from_rgb(r, g, b)
}

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use eegview_lib::{
    config::ViewerConfig,
    io::load_recording,
    plot::{figure_from_window, Color as TraceColor, Figure, PlotBackend, Series},
    synth::{synth_recording, write_csv, SynthConfig},
    PlaybackCursor, SignalBuffer, TickOutcome, WindowLog, WindowSink, WrapPolicy,
};
use log::info;
use plotters::prelude::*;
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

#[derive(Parser)]
#[command(
    name = "eegview",
    version,
    about = "eegview: scrolling EEG playback from the command line"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum WrapArg {
    Loop,
    Stop,
}

impl From<WrapArg> for WrapPolicy {
    fn from(arg: WrapArg) -> Self {
        match arg {
            WrapArg::Loop => WrapPolicy::Loop,
            WrapArg::Stop => WrapPolicy::Stop,
        }
    }
}

/// Options shared by every command that reads a recording.
#[derive(Args)]
struct SourceArgs {
    /// EDF/BDF, CSV/TSV or newline-delimited text file
    #[arg(long)]
    input: PathBuf,
    /// Sample rate in Hz (required for text input, overrides CSV time column)
    #[arg(long)]
    fs: Option<f64>,
    /// Viewer config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated channel labels to keep (defaults to the config picks)
    #[arg(long, value_delimiter = ',')]
    channels: Vec<String>,
}

/// Playback overrides applied on top of the config file.
#[derive(Args)]
struct PlaybackArgs {
    /// Visible window length in seconds
    #[arg(long)]
    window_s: Option<f64>,
    /// Fraction of a second advanced per tick
    #[arg(long)]
    step_fraction: Option<f64>,
    #[arg(long)]
    wrap: Option<WrapArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a JSON summary of a recording
    Info {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Replay a recording headlessly, one JSON line per tick
    Play {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        playback: PlaybackArgs,
        #[arg(long, default_value_t = 10)]
        ticks: usize,
        /// Start offset in samples
        #[arg(long, default_value_t = 0)]
        seek: usize,
        /// Pause between ticks in milliseconds (0 = as fast as possible)
        #[arg(long, default_value_t = 0)]
        interval_ms: u64,
        /// Include the raw window samples in every line
        #[arg(long)]
        full: bool,
    },
    /// Render the stacked channel windows at an offset to a PNG via plotters
    Snapshot {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        playback: PlaybackArgs,
        #[arg(long, default_value_t = 0)]
        seek: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a synthetic multi-channel recording as CSV
    Synth {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 14)]
        channels: usize,
        #[arg(long, default_value_t = 128.0)]
        fs: f64,
        #[arg(long, default_value_t = 30.0)]
        seconds: f64,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Info { source } => cmd_info(&source)?,
        Commands::Play {
            source,
            playback,
            ticks,
            seek,
            interval_ms,
            full,
        } => cmd_play(&source, &playback, ticks, seek, interval_ms, full)?,
        Commands::Snapshot {
            source,
            playback,
            seek,
            out,
        } => cmd_snapshot(&source, &playback, seek, &out)?,
        Commands::Synth {
            out,
            channels,
            fs,
            seconds,
            seed,
        } => cmd_synth(&out, channels, fs, seconds, seed)?,
    }
    Ok(())
}

fn load_source(source: &SourceArgs) -> Result<(ViewerConfig, Arc<SignalBuffer>)> {
    let config = ViewerConfig::load_or_default(source.config.as_deref())?;
    let picks = if source.channels.is_empty() {
        &config.channel_picks
    } else {
        &source.channels
    };
    let recording = load_recording(&source.input, source.fs, picks)?;
    Ok((config, Arc::new(SignalBuffer::new(recording))))
}

fn apply_overrides(config: &mut ViewerConfig, playback: &PlaybackArgs) {
    if let Some(window_s) = playback.window_s {
        config.playback.window_length_seconds = window_s;
    }
    if let Some(fraction) = playback.step_fraction {
        config.playback.refresh_step_fraction = fraction;
    }
    if let Some(wrap) = playback.wrap {
        config.playback.wrap = wrap.into();
    }
}

fn cmd_info(source: &SourceArgs) -> Result<()> {
    let (_, buffer) = load_source(source)?;
    println!("{}", serde_json::to_string(&buffer.summary())?);
    Ok(())
}

#[derive(Debug, Serialize)]
struct ChannelWindow {
    channel: usize,
    name: String,
    min: f64,
    max: f64,
    mean: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<Vec<f64>>,
}

/// Sink that turns each delivered window into a JSON-ready summary.
struct JsonLineSink {
    names: Vec<String>,
    full: bool,
    pending: Vec<ChannelWindow>,
}

impl WindowSink for JsonLineSink {
    fn on_window(&mut self, channel: usize, samples: &[f64]) {
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let mean = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
        self.pending.push(ChannelWindow {
            channel,
            name: self.names.get(channel).cloned().unwrap_or_default(),
            min,
            max,
            mean,
            samples: self.full.then(|| samples.to_vec()),
        });
    }
}

#[derive(Serialize)]
struct TickLine {
    tick: usize,
    #[serde(flatten)]
    outcome: TickOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_s: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    channels: Vec<ChannelWindow>,
}

fn cmd_play(
    source: &SourceArgs,
    playback: &PlaybackArgs,
    ticks: usize,
    seek: usize,
    interval_ms: u64,
    full: bool,
) -> Result<()> {
    let (mut config, buffer) = load_source(source)?;
    apply_overrides(&mut config, playback);
    let sink = JsonLineSink {
        names: buffer.channel_names().to_vec(),
        full,
        pending: Vec::new(),
    };
    let mut cursor = PlaybackCursor::new(buffer, &config.playback, sink)?;
    cursor.seek(seek)?;
    info!(
        "playing {} ticks: window={} step={} wrap={:?}",
        ticks,
        cursor.window_length(),
        cursor.step(),
        cursor.wrap_policy()
    );
    cursor.start();
    for tick in 1..=ticks {
        let outcome = cursor.tick()?;
        let line = TickLine {
            tick,
            outcome,
            time_s: match outcome {
                TickOutcome::Served { .. } => cursor.window_start_seconds(),
                _ => None,
            },
            channels: std::mem::take(&mut cursor.sink_mut().pending),
        };
        println!("{}", serde_json::to_string(&line)?);
        if outcome == TickOutcome::Ended {
            break;
        }
        if interval_ms > 0 {
            std::thread::sleep(Duration::from_millis(interval_ms));
        }
    }
    cursor.pause();
    Ok(())
}

fn cmd_snapshot(source: &SourceArgs, playback: &PlaybackArgs, seek: usize, out: &Path) -> Result<()> {
    let (mut config, buffer) = load_source(source)?;
    apply_overrides(&mut config, playback);
    let mut cursor = PlaybackCursor::new(Arc::clone(&buffer), &config.playback, WindowLog::new())?;
    cursor.seek(seek)?;
    cursor.start();
    let offset = match cursor.tick()? {
        TickOutcome::Served { offset, .. } => offset,
        other => return Err(anyhow!("no window to draw at offset {} ({:?})", seek, other)),
    };
    let figures: Vec<Figure> = cursor
        .into_sink()
        .windows
        .into_iter()
        .map(|(channel, samples)| {
            figure_from_window(
                buffer.channel_name(channel).unwrap_or("?"),
                &samples,
                offset,
                buffer.sample_rate(),
                config.display.max_points,
                config.display.channel_color(channel),
            )
        })
        .collect();
    let mut backend = PngBackend {
        path: out.to_path_buf(),
        background: config.display.background,
    };
    backend.draw(&figures)?;
    info!("wrote {}", out.display());
    Ok(())
}

fn cmd_synth(out: &Path, channels: usize, fs: f64, seconds: f64, seed: u64) -> Result<()> {
    let cfg = SynthConfig {
        channels,
        sample_rate: fs,
        seconds,
        seed,
        ..SynthConfig::default()
    };
    let recording = synth_recording(&cfg)?;
    write_csv(&recording, out)?;
    info!(
        "wrote {} channels x {} samples to {}",
        recording.matrix.channel_count(),
        recording.matrix.sample_count(),
        out.display()
    );
    Ok(())
}

/// Plotters PNG output; one strip per figure, stacked top to bottom.
struct PngBackend {
    path: PathBuf,
    background: u32,
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, figures: &[Figure]) -> Result<()> {
        if figures.is_empty() {
            return Err(anyhow!("nothing to draw"));
        }
        let height = (80 * figures.len()).clamp(160, 2000) as u32;
        let root = BitMapBackend::new(&self.path, (1000, height)).into_drawing_area();
        root.fill(&rgb(TraceColor(self.background)))?;
        let strips = root.split_evenly((figures.len(), 1));
        for (area, fig) in strips.iter().zip(figures) {
            let Some((x_min, x_max, y_min, y_max)) = fig.bounds() else {
                continue;
            };
            let (y_min, y_max) = if y_max > y_min {
                (y_min, y_max)
            } else {
                (y_min - 1.0, y_max + 1.0)
            };
            let x_max = if x_max > x_min { x_max } else { x_min + 1.0 };
            let mut chart = ChartBuilder::on(area)
                .margin(4)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
            for series in &fig.series {
                match series {
                    Series::Line(line) => {
                        chart.draw_series(LineSeries::new(
                            line.points.iter().map(|p| (p[0], p[1])),
                            &rgb(line.style.color),
                        ))?;
                    }
                    Series::HLine(hline) => {
                        chart.draw_series(LineSeries::new(
                            [(x_min, hline.y), (x_max, hline.y)],
                            &rgb(hline.style.color),
                        ))?;
                    }
                }
            }
        }
        root.present()?;
        Ok(())
    }
}

fn rgb(color: TraceColor) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

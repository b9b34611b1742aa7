use crate::playback::PlaybackConfig;
use crate::plot::CHANNEL_PALETTE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Emotiv EPOC electrode labels picked from EDF recordings by default.
pub const EMOTIV_CHANNELS: [&str; 14] = [
    "AF3", "F7", "F3", "FC5", "T7", "P7", "O1", "O2", "P8", "T8", "FC6", "F4", "F8", "AF4",
];

/// Viewer settings, usually read from a TOML file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub playback: PlaybackConfig,
    /// Interval between playback ticks (milliseconds).
    pub tick_interval_ms: u64,
    /// Channel labels to keep when loading EDF files. Empty keeps everything.
    pub channel_picks: Vec<String>,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Upper bound on points per drawn trace.
    pub max_points: usize,
    /// Trace colours as 0xRRGGBB, cycled by channel index.
    pub palette: Vec<u32>,
    pub background: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            tick_interval_ms: 100,
            channel_picks: EMOTIV_CHANNELS.iter().map(|s| s.to_string()).collect(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_points: 2048,
            palette: CHANNEL_PALETTE.to_vec(),
            background: 0x1B1A1F,
        }
    }
}

impl DisplayConfig {
    pub fn channel_color(&self, channel: usize) -> u32 {
        if self.palette.is_empty() {
            return CHANNEL_PALETTE[channel % CHANNEL_PALETTE.len()];
        }
        self.palette[channel % self.palette.len()]
    }
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ViewerConfig = toml::from_str(text).context("parsing viewer config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Load `path` when given, otherwise fall back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be positive");
        }
        if self.display.max_points < 2 {
            anyhow::bail!("display.max_points must be at least 2");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::WrapPolicy;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.channel_picks.len(), 14);
        assert_eq!(config.playback.window_length_seconds, 5.0);
    }

    #[test]
    fn partial_tables_override_fields() {
        let config = ViewerConfig::from_toml_str(
            r#"
tick_interval_ms = 50
channel_picks = ["O1", "O2"]

[playback]
window_length_seconds = 2.5
wrap = "stop"

[display]
palette = [0xFF0000]
"#,
        )
        .unwrap();
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.channel_picks, vec!["O1", "O2"]);
        assert_eq!(config.playback.window_length_seconds, 2.5);
        assert_eq!(config.playback.refresh_step_fraction, 0.05);
        assert_eq!(config.playback.wrap, WrapPolicy::Stop);
        assert_eq!(config.display.channel_color(3), 0xFF0000);
        assert_eq!(config.display.max_points, 2048);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(ViewerConfig::from_toml_str("tick_interval_ms = 0").is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_ms = 250").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert!(ViewerConfig::load(Path::new("/definitely/missing.toml")).is_err());
    }

    #[test]
    fn palette_cycles_by_channel() {
        let display = DisplayConfig::default();
        assert_eq!(display.channel_color(0), display.channel_color(5));
    }
}

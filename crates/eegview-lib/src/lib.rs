pub mod buffer;
pub mod config;
pub mod error;
pub mod history;
pub mod io;
pub mod playback;
pub mod plot;
pub mod signal;
pub mod synth;
pub mod thresholds;

pub use buffer::*;
pub use error::PlaybackError;
pub use playback::*;
pub use signal::*;

use crossbeam_channel::{tick, Receiver};
use std::time::{Duration, Instant};

/// Fixed-interval trigger for playback ticks.
///
/// Backed by `crossbeam_channel::tick`, which holds at most one pending tick:
/// if the UI thread falls behind, missed ticks are dropped instead of queued,
/// so the cursor never runs a burst of catch-up ticks.
pub struct PlaybackTimer {
    interval: Duration,
    ticks: Option<Receiver<Instant>>,
}

impl PlaybackTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ticks: None,
        }
    }

    pub fn start(&mut self) {
        self.ticks = Some(tick(self.interval));
    }

    pub fn stop(&mut self) {
        self.ticks = None;
    }

    pub fn is_active(&self) -> bool {
        self.ticks.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval; an active timer restarts with the new period.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
        if self.is_active() {
            self.start();
        }
    }

    /// Number of ticks that fired since the last poll.
    pub fn poll(&self) -> usize {
        self.ticks
            .as_ref()
            .map(|rx| rx.try_iter().count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_never_fires() {
        let timer = PlaybackTimer::new(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(timer.poll(), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn running_timer_fires_at_most_once_per_poll() {
        let mut timer = PlaybackTimer::new(Duration::from_millis(2));
        timer.start();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(timer.poll(), 1);
        timer.stop();
        assert_eq!(timer.poll(), 0);
    }

    #[test]
    fn interval_change_keeps_state() {
        let mut timer = PlaybackTimer::new(Duration::from_millis(100));
        timer.set_interval(Duration::from_millis(50));
        assert!(!timer.is_active());
        timer.start();
        timer.set_interval(Duration::from_millis(20));
        assert!(timer.is_active());
        assert_eq!(timer.interval(), Duration::from_millis(20));
    }
}

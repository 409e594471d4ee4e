//! Wall-clock auto-advance through a sequence.

use web_time::{Duration, Instant};

use crate::options::AnimationOptions;

/// Fixed-interval sequencer: yields the next sequence index once per
/// elapsed interval while playing.
#[derive(Debug, Clone)]
pub struct AutoAdvance {
    interval: Duration,
    last_advance: Instant,
    playing: bool,
    looping: bool,
}

impl AutoAdvance {
    /// Scheduler with the given interval, starting its timer at `now`.
    #[must_use]
    pub const fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_advance: now,
            playing: true,
            looping: true,
        }
    }

    /// Scheduler configured from animation options.
    #[must_use]
    pub fn from_options(options: &AnimationOptions, now: Instant) -> Self {
        Self {
            interval: options.advance_interval(),
            last_advance: now,
            playing: options.autoplay,
            looping: options.looping,
        }
    }

    /// Next index to transition to, if an interval has elapsed since the
    /// last advance.
    ///
    /// `len` is the current sequence length and `current` the index shown.
    /// Past the last entry the index wraps to 0 when looping; otherwise the
    /// scheduler stops. Fewer than two entries never advance.
    pub fn poll(
        &mut self,
        now: Instant,
        len: usize,
        current: Option<usize>,
    ) -> Option<usize> {
        if !self.playing || len < 2 {
            return None;
        }
        if now.saturating_duration_since(self.last_advance) < self.interval {
            return None;
        }

        self.last_advance = now;

        let next = current.map_or(0, |c| c + 1);
        if next >= len {
            if self.looping {
                Some(0)
            } else {
                self.playing = false;
                None
            }
        } else {
            Some(next)
        }
    }

    /// Toggle between playing and paused states.
    pub fn toggle_playback(&mut self, now: Instant) {
        if self.playing {
            self.pause();
        } else {
            self.resume(now);
        }
    }

    /// Stop advancing.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Start advancing again, one full interval from `now`.
    pub fn resume(&mut self, now: Instant) {
        self.playing = true;
        // Reset advance timer so we don't immediately skip entries
        self.last_advance = now;
    }

    /// Restart the interval at `now` (e.g. after a manual jump).
    pub fn reset_timer(&mut self, now: Instant) {
        self.last_advance = now;
    }

    /// Set the interval between advances.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Enable or disable wrapping past the last entry.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Interval between advances.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the scheduler is advancing.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn advances_once_per_interval() {
        let t0 = Instant::now();
        let mut auto = AutoAdvance::new(3 * SECOND, t0);

        assert_eq!(auto.poll(t0 + SECOND, 3, Some(0)), None);
        assert_eq!(auto.poll(t0 + 3 * SECOND, 3, Some(0)), Some(1));
        // timer restarted at the advance
        assert_eq!(auto.poll(t0 + 5 * SECOND, 3, Some(1)), None);
        assert_eq!(auto.poll(t0 + 6 * SECOND, 3, Some(1)), Some(2));
    }

    #[test]
    fn wraps_when_looping() {
        let t0 = Instant::now();
        let mut auto = AutoAdvance::new(SECOND, t0);
        assert_eq!(auto.poll(t0 + SECOND, 3, Some(2)), Some(0));
    }

    #[test]
    fn stops_at_end_without_looping() {
        let t0 = Instant::now();
        let mut auto = AutoAdvance::new(SECOND, t0);
        auto.set_looping(false);
        assert_eq!(auto.poll(t0 + SECOND, 3, Some(2)), None);
        assert!(!auto.is_playing());
        assert_eq!(auto.poll(t0 + 10 * SECOND, 3, Some(0)), None);
    }

    #[test]
    fn short_sequences_never_advance() {
        let t0 = Instant::now();
        let mut auto = AutoAdvance::new(SECOND, t0);
        assert_eq!(auto.poll(t0 + 5 * SECOND, 1, Some(0)), None);
        assert_eq!(auto.poll(t0 + 5 * SECOND, 0, None), None);
    }

    #[test]
    fn resume_restarts_the_interval() {
        let t0 = Instant::now();
        let mut auto = AutoAdvance::new(2 * SECOND, t0);
        auto.toggle_playback(t0);
        assert!(!auto.is_playing());
        assert_eq!(auto.poll(t0 + 5 * SECOND, 3, Some(0)), None);

        auto.toggle_playback(t0 + 5 * SECOND);
        assert_eq!(auto.poll(t0 + 6 * SECOND, 3, Some(0)), None);
        assert_eq!(auto.poll(t0 + 7 * SECOND, 3, Some(0)), Some(1));
    }

    #[test]
    fn options_configure_scheduler() {
        let options = AnimationOptions {
            advance_interval_secs: 0.5,
            autoplay: false,
            looping: false,
            ..AnimationOptions::default()
        };
        let auto = AutoAdvance::from_options(&options, Instant::now());
        assert_eq!(auto.interval(), Duration::from_millis(500));
        assert!(!auto.is_playing());
    }
}

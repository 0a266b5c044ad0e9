use chrono::prelude::*;
use chrono::TimeDelta;

/// Pausable play timer.
///
/// Starts on the first reveal. Elapsed time excludes every completed pause as well as the one in
/// progress, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    started_at: Option<DateTime<Utc>>,
    paused_total: TimeDelta,
    paused_since: Option<DateTime<Utc>>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_since.is_some()
    }

    /// Starts the timer unless it already runs.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Pauses at `now`. Returns `false` when not started or already paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_started() || self.is_paused() {
            return false;
        }
        self.paused_since = Some(now);
        true
    }

    /// Pauses so that the elapsed time freezes at `shown` seconds, as displayed by the client.
    ///
    /// The pause point is clamped between the start of play and `now`.
    pub fn pause_showing(&mut self, now: DateTime<Utc>, shown: u64) -> bool {
        let Some(started_at) = self.started_at else {
            return false;
        };
        let origin = started_at
            .checked_add_signed(self.paused_total)
            .unwrap_or(now);
        let shown = i64::try_from(shown)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        let since = origin
            .checked_add_signed(shown)
            .unwrap_or(now)
            .clamp(origin.min(now), now);
        self.pause(since)
    }

    /// Folds the current pause into the paused total. Returns `false` when not paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> bool {
        let Some(since) = self.paused_since.take() else {
            return false;
        };
        self.paused_total += (now - since).max(TimeDelta::zero());
        true
    }

    /// Whole seconds of play at `now`, never negative.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let current_pause = self
            .paused_since
            .map_or(TimeDelta::zero(), |since| (now - since).max(TimeDelta::zero()));
        let played = now - started_at - self.paused_total - current_pause;
        played.num_seconds().max(0) as u64
    }
}

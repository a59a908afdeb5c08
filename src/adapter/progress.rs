//! Local playback-position simulation between authoritative updates.

use std::future::pending;
use std::time::Duration;

use futures::future::Either;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// How far (and how often) the held position advances between
/// authoritative provider updates.
pub(super) const STEP: Duration = Duration::from_millis(500);

/// A cancellable ticker that only exists while playback is running.
///
/// At most one underlying interval is ever live; re-arming an armed ticker
/// keeps the existing cadence instead of stacking a second timer.
#[derive(Debug, Default)]
pub(super) struct ProgressTicker {
    interval: Option<Interval>,
}

impl ProgressTicker {
    pub fn arm(&mut self) {
        if self.interval.is_some() {
            return;
        }
        let mut interval = interval_at(Instant::now() + STEP, STEP);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    pub fn disarm(&mut self) {
        self.interval = None;
    }

    /// Complete on the next tick, or never while disarmed.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => Either::Left(interval.tick()),
            None => Either::Right(pending()),
        }
        .await;
    }
}

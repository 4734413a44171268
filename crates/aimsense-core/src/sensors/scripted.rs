//! In-memory motion source that replays a queue of events

use alloc::collections::VecDeque;

use embassy_time::{Duration, Instant};

use super::{MotionEvent, MotionSource, RawAcceleration, SensorError};

/// Replays queued events in order, then reports [`SensorError::Closed`].
///
/// Used by the tests and the desktop simulator in place of a real feed.
#[derive(Debug, Default)]
pub struct ScriptedMotionSource {
    queue: VecDeque<Result<MotionEvent, SensorError>>,
    running: bool,
    start_count: usize,
    interval: Option<Duration>,
    start_error: Option<SensorError>,
}

impl ScriptedMotionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start` fail with `error`
    pub fn fail_start_with(mut self, error: SensorError) -> Self {
        self.start_error = Some(error);
        self
    }

    pub fn push(&mut self, event: MotionEvent) {
        self.queue.push_back(Ok(event));
    }

    pub fn push_error(&mut self, error: SensorError) {
        self.queue.push_back(Err(error));
    }

    /// Queue `count` identical samples spaced `interval` apart starting at `start`.
    ///
    /// Returns the timestamp just after the last queued sample.
    pub fn push_constant(
        &mut self,
        sample: RawAcceleration,
        start: Instant,
        interval: Duration,
        count: usize,
    ) -> Instant {
        let mut at = start;
        for _ in 0..count {
            self.push(MotionEvent::new(sample, at));
            at += interval;
        }
        at
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start_count(&self) -> usize {
        self.start_count
    }

    pub fn requested_interval(&self) -> Option<Duration> {
        self.interval
    }
}

impl MotionSource for ScriptedMotionSource {
    fn start(&mut self, interval: Duration) -> Result<(), SensorError> {
        if let Some(error) = self.start_error.take() {
            return Err(error);
        }
        self.running = true;
        self.start_count += 1;
        self.interval = Some(interval);
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    async fn next_event(&mut self) -> Result<MotionEvent, SensorError> {
        if !self.running {
            return Err(SensorError::Closed);
        }
        self.queue.pop_front().unwrap_or(Err(SensorError::Closed))
    }
}

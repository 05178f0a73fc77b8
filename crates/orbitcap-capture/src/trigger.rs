//! Triggers for freehand capture.
//!
//! A trigger is polled once per host tick with the elapsed session time and
//! the current camera position, and answers whether a frame should be taken.

use std::time::Duration;

use glam::DVec3;

use crate::session::CaptureSource;

/// Decides when a freehand frame is due.
pub trait CaptureTrigger {
    /// Returns true if a frame should be captured now.
    ///
    /// A `true` result counts as a capture; the trigger resets its state.
    fn poll(&mut self, now: Duration, position: DVec3) -> bool;

    /// The source recorded on frames this trigger produces.
    fn source(&self) -> CaptureSource;
}

/// Fires once for each call to [`request`](Self::request).
#[derive(Debug, Default, Clone)]
pub struct ManualTrigger {
    pending: bool,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a capture on the next poll. Repeated requests before a poll
    /// collapse into one.
    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl CaptureTrigger for ManualTrigger {
    fn poll(&mut self, _now: Duration, _position: DVec3) -> bool {
        std::mem::take(&mut self.pending)
    }

    fn source(&self) -> CaptureSource {
        CaptureSource::Manual
    }
}

/// Fires when enough time has passed and the camera has moved far enough
/// since the last capture.
#[derive(Debug, Clone)]
pub struct IntervalTrigger {
    interval: Duration,
    min_distance: f64,
    last_time: Duration,
    last_position: DVec3,
}

impl IntervalTrigger {
    /// Default interval between automatic captures.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
    /// Default minimum movement between automatic captures.
    pub const DEFAULT_MIN_DISTANCE: f64 = 1.0;

    /// Creates a trigger whose clock and position start at zero time and
    /// `start_position`.
    pub fn new(interval: Duration, min_distance: f64, start_position: DVec3) -> Self {
        Self {
            interval,
            min_distance: min_distance.max(0.0),
            last_time: Duration::ZERO,
            last_position: start_position,
        }
    }

    /// Resets the reference point after a capture taken by other means.
    pub fn record_capture(&mut self, now: Duration, position: DVec3) {
        self.last_time = now;
        self.last_position = position;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }
}

impl Default for IntervalTrigger {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_MIN_DISTANCE, DVec3::ZERO)
    }
}

impl CaptureTrigger for IntervalTrigger {
    fn poll(&mut self, now: Duration, position: DVec3) -> bool {
        let elapsed = now.saturating_sub(self.last_time);
        if elapsed < self.interval {
            return false;
        }
        if position.distance(self.last_position) < self.min_distance {
            return false;
        }
        self.record_capture(now, position);
        true
    }

    fn source(&self) -> CaptureSource {
        CaptureSource::Interval
    }
}

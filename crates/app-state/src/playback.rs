//! Playback state machine: `Stopped -> Playing -> Stopped`.
//!
//! While playing, the position is not stored per tick. It is derived from an
//! anchor (`anchor_time` at `anchor_instant`) plus elapsed wall time, so a
//! late tick never drifts the playhead. Seeking re-anchors without changing
//! the mode. All methods take `now` explicitly so callers and tests control
//! the clock.

use std::time::Instant;

use rk_common::{FrameNumber, Rational, TimeCode, TIME_EPSILON};

/// Current playback mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackMode {
    #[default]
    Stopped,
    Playing,
}

#[derive(Clone, Debug, Default)]
pub struct PlaybackState {
    mode: PlaybackMode,
    /// Playhead at `anchor_instant` (or the frozen playhead when stopped).
    anchor_time: TimeCode,
    anchor_instant: Option<Instant>,
}

impl PlaybackState {
    /// Create a new playback state in stopped mode at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playing
    }

    /// Start playback from the current playhead. Starting at the very end
    /// rewinds to zero first. Returns `false` if already playing.
    pub fn play(&mut self, now: Instant, duration: f64) -> bool {
        if self.is_playing() {
            return false;
        }
        if self.anchor_time.as_secs() >= duration - TIME_EPSILON {
            self.anchor_time = TimeCode::ZERO;
        }
        self.mode = PlaybackMode::Playing;
        self.anchor_instant = Some(now);
        tracing::debug!(time = %self.anchor_time, "Playback started");
        true
    }

    /// Stop playback, freezing the playhead where it is. Idempotent;
    /// returns `false` if already stopped.
    pub fn stop(&mut self, now: Instant, duration: f64) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.anchor_time = TimeCode::from_secs(self.position(now, duration));
        self.mode = PlaybackMode::Stopped;
        self.anchor_instant = None;
        tracing::debug!(time = %self.anchor_time, "Playback stopped");
        true
    }

    pub fn toggle(&mut self, now: Instant, duration: f64) {
        if self.is_playing() {
            self.stop(now, duration);
        } else {
            self.play(now, duration);
        }
    }

    /// Move the playhead to `time` (clamped). Keeps the current mode; while
    /// playing, the next tick continues from here.
    pub fn seek(&mut self, time: f64, now: Instant, duration: f64) {
        let time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, duration.max(0.0))
        };
        self.anchor_time = TimeCode::from_secs(time);
        if self.is_playing() {
            self.anchor_instant = Some(now);
        }
        tracing::debug!(time = %self.anchor_time, "Seeked");
    }

    /// Playhead position in seconds, clamped to `[0, duration]`.
    pub fn position(&self, now: Instant, duration: f64) -> f64 {
        let elapsed = match (self.mode, self.anchor_instant) {
            (PlaybackMode::Playing, Some(anchor)) => {
                now.saturating_duration_since(anchor).as_secs_f64()
            }
            _ => 0.0,
        };
        (self.anchor_time.as_secs() + elapsed).clamp(0.0, duration.max(0.0))
    }

    /// Position snapped to the start of its frame on the `fps` grid.
    pub fn quantized_position(&self, now: Instant, duration: f64, fps: Rational) -> TimeCode {
        TimeCode::from_secs(self.position(now, duration)).quantize(fps)
    }

    /// Frame number of the quantized position, as sent to the renderer.
    pub fn frame_position(&self, now: Instant, duration: f64, fps: Rational) -> FrameNumber {
        self.quantized_position(now, duration, fps).as_frame(fps)
    }

    /// Whether playback has run off the end of the timeline.
    pub fn is_finished(&self, now: Instant, duration: f64) -> bool {
        self.is_playing() && self.position(now, duration) >= duration - TIME_EPSILON
    }
}

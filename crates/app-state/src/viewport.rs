//! Timeline viewport transform: how many seconds are visible and where the
//! visible window starts.
//!
//! Pure view state over the timeline axis, independent of segment data.
//! Every setter re-clamps against the current timeline length:
//!
//! - `zoom` in `[min_zoom_in, min(total, zoom_out_limit)]`
//! - `position` in `[0, max(zoom_out_limit(total), total) + slack - zoom]`

use rk_common::ViewportLimits;

#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Visible seconds.
    zoom: f64,
    /// Leftmost visible second.
    position: f64,
    limits: ViewportLimits,
}

impl Viewport {
    /// A viewport showing as much of a `total`-second timeline as allowed.
    pub fn new(limits: ViewportLimits, total: f64) -> Self {
        let mut viewport = Self {
            zoom: limits.zoom_out_limit,
            position: 0.0,
            limits,
        };
        viewport.clamp(total);
        viewport
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn limits(&self) -> &ViewportLimits {
        &self.limits
    }

    /// Widest window allowed for a timeline of `total` seconds.
    pub fn zoom_out_limit(&self, total: f64) -> f64 {
        total.max(0.0).min(self.limits.zoom_out_limit)
    }

    fn zoom_bounds(&self, total: f64) -> (f64, f64) {
        let lo = self.limits.min_zoom_in;
        (lo, self.zoom_out_limit(total).max(lo))
    }

    fn max_position(&self, total: f64) -> f64 {
        let end = self.zoom_out_limit(total).max(total) + self.limits.slack;
        (end - self.zoom).max(0.0)
    }

    /// Re-apply both bounds, e.g. after the timeline length changed.
    pub fn clamp(&mut self, total: f64) {
        let (lo, hi) = self.zoom_bounds(total);
        self.zoom = if self.zoom.is_finite() {
            self.zoom.clamp(lo, hi)
        } else {
            hi
        };
        let max = self.max_position(total);
        self.position = if self.position.is_finite() {
            self.position.clamp(0.0, max)
        } else {
            0.0
        };
    }

    /// Change the visible span, keeping timeline time `anchor` at the same
    /// screen fraction.
    pub fn set_zoom(&mut self, visible: f64, anchor: f64, total: f64) {
        if !visible.is_finite() {
            return;
        }
        let fraction = if self.zoom > 0.0 {
            ((anchor - self.position) / self.zoom).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (lo, hi) = self.zoom_bounds(total);
        self.zoom = visible.clamp(lo, hi);
        self.position = anchor - fraction * self.zoom;
        self.clamp(total);
        tracing::debug!(zoom = self.zoom, position = self.position, "Viewport zoomed");
    }

    pub fn set_position(&mut self, position: f64, total: f64) {
        if position.is_finite() {
            self.position = position;
            self.clamp(total);
        }
    }

    pub fn scroll_by(&mut self, delta: f64, total: f64) {
        self.set_position(self.position + delta, total);
    }

    /// Seconds covered by one pixel of a `width`-pixel timeline strip.
    pub fn seconds_per_pixel(&self, width: f64) -> f64 {
        if width > 0.0 {
            self.zoom / width
        } else {
            0.0
        }
    }

    /// Timeline time under pixel `x` of a `width`-pixel strip.
    pub fn time_at(&self, x: f64, width: f64) -> f64 {
        self.position + x * self.seconds_per_pixel(width)
    }

    /// Pixel offset of timeline `time` in a `width`-pixel strip.
    pub fn x_at(&self, time: f64, width: f64) -> f64 {
        if self.zoom > 0.0 {
            (time - self.position) / self.zoom * width
        } else {
            0.0
        }
    }
}

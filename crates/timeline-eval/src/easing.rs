//! CSS-style cubic-bezier easing curves.
//!
//! A curve runs from `(0, 0)` to `(1, 1)` with two free control points.
//! `ease(x)` solves the x polynomial for its parameter, then evaluates y.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl CubicBezier {
    /// Used when a value ramps up (zooming in).
    pub const RAMP_UP: Self = Self::new(0.1, 0.0, 0.3, 1.0);
    /// Used when a value ramps down (zooming out).
    pub const RAMP_DOWN: Self = Self::new(0.5, 0.0, 0.5, 1.0);
    pub const EASE_IN_OUT: Self = Self::new(0.42, 0.0, 0.58, 1.0);
    pub const LINEAR: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Eased progress for linear progress `x` (clamped to `0..1`).
    pub fn ease(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        if x == 0.0 || x == 1.0 {
            return x;
        }
        // x control points outside 0..1 would make the curve non-monotonic in x.
        let t = solve_bezier_x(self.x1.clamp(0.0, 1.0), self.x2.clamp(0.0, 1.0), x);
        eval_cubic(0.0, self.y1, self.y2, 1.0, t)
    }

    /// Curve for moving from `from` to `to`.
    pub fn for_ramp(from: f64, to: f64) -> Self {
        if to >= from {
            Self::RAMP_UP
        } else {
            Self::RAMP_DOWN
        }
    }
}

/// Evaluate a cubic Bezier: B(t) = (1-t)^3*p0 + 3*(1-t)^2*t*p1 + 3*(1-t)*t^2*p2 + t^3*p3
fn eval_cubic(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let one_minus_t = 1.0 - t;
    let omt2 = one_minus_t * one_minus_t;
    let omt3 = omt2 * one_minus_t;
    let t2 = t * t;
    let t3 = t2 * t;
    omt3 * p0 + 3.0 * omt2 * t * p1 + 3.0 * one_minus_t * t2 * p2 + t3 * p3
}

/// Derivative of cubic Bezier: B'(t) = 3*(1-t)^2*(p1-p0) + 6*(1-t)*t*(p2-p1) + 3*t^2*(p3-p2)
fn eval_cubic_derivative(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * (p1 - p0)
        + 6.0 * one_minus_t * t * (p2 - p1)
        + 3.0 * t * t * (p3 - p2)
}

/// Solve for parametric t given x in a cubic Bezier where x0=0, x3=1.
/// Newton-Raphson with a bisection fallback.
fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = eval_cubic(0.0, x1, x2, 1.0, t) - target_x;
        if x.abs() < 1e-9 {
            return t;
        }
        let dx = eval_cubic_derivative(0.0, x1, x2, 1.0, t);
        if dx.abs() < 1e-12 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    let mut lo = 0.0_f64;
    let mut hi = 1.0_f64;
    t = target_x;

    for _ in 0..40 {
        let x = eval_cubic(0.0, x1, x2, 1.0, t);
        if (x - target_x).abs() < 1e-9 {
            return t;
        }
        if x < target_x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        for curve in [
            CubicBezier::RAMP_UP,
            CubicBezier::RAMP_DOWN,
            CubicBezier::EASE_IN_OUT,
        ] {
            assert_eq!(curve.ease(0.0), 0.0);
            assert_eq!(curve.ease(1.0), 1.0);
            assert_eq!(curve.ease(-1.0), 0.0);
            assert_eq!(curve.ease(2.0), 1.0);
        }
    }

    #[test]
    fn linear_curve_is_identity() {
        for i in 1..10 {
            let x = i as f64 / 10.0;
            assert!((CubicBezier::LINEAR.ease(x) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        let c = CubicBezier::EASE_IN_OUT;
        assert!((c.ease(0.5) - 0.5).abs() < 1e-6);
        assert!((c.ease(0.25) + c.ease(0.75) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ramp_up_leads_linear() {
        // Fast start, slow settle.
        assert!(CubicBezier::RAMP_UP.ease(0.3) > 0.3);
    }

    #[test]
    fn monotonic() {
        let c = CubicBezier::RAMP_DOWN;
        let mut prev = 0.0;
        for i in 1..=100 {
            let y = c.ease(i as f64 / 100.0);
            assert!(y >= prev - 1e-9);
            prev = y;
        }
    }

    #[test]
    fn ramp_direction_picks_curve() {
        assert_eq!(CubicBezier::for_ramp(1.0, 2.0), CubicBezier::RAMP_UP);
        assert_eq!(CubicBezier::for_ramp(2.0, 1.0), CubicBezier::RAMP_DOWN);
    }
}

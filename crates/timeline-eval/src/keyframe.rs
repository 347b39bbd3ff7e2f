//! Keyframe interpolation: linear and hold, with boundary clamping.
//!
//! Keyframe times are local to the owning segment (seconds from its start).
//! Before the first keyframe the first value is returned; after the last,
//! the last value. There is no extrapolation.

use serde::{Deserialize, Serialize};

use rk_common::{TIME_EPSILON, XY};

/// Values that can be linearly interpolated.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for XY<f64> {
    fn lerp(self, other: Self, t: f64) -> Self {
        XY::<f64>::lerp(self, other, t)
    }
}

/// How a keyframe moves to the next one.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Interpolation {
    #[default]
    Linear,
    /// Keep this keyframe's value until the next keyframe.
    Hold,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyframe<V> {
    /// Offset from segment start, seconds.
    pub time: f64,
    pub value: V,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl<V> Keyframe<V> {
    pub fn linear(time: f64, value: V) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Linear,
        }
    }

    pub fn hold(time: f64, value: V) -> Self {
        Self {
            time,
            value,
            interpolation: Interpolation::Hold,
        }
    }
}

/// Evaluate a sorted keyframe list at `local_time`.
///
/// Returns `base` when the list is empty.
pub fn evaluate_keyframes<V: Lerp>(keyframes: &[Keyframe<V>], local_time: f64, base: V) -> V {
    let (first, last) = match (keyframes.first(), keyframes.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return base,
    };

    if local_time <= first.time {
        return first.value;
    }
    if local_time >= last.time {
        return last.value;
    }

    // Index of the first keyframe strictly after local_time; always >= 1 here.
    let next = keyframes.partition_point(|k| k.time <= local_time);
    let kf_a = &keyframes[next - 1];
    let kf_b = &keyframes[next];
    interpolate(kf_a, kf_b, local_time)
}

fn interpolate<V: Lerp>(kf_a: &Keyframe<V>, kf_b: &Keyframe<V>, t: f64) -> V {
    let dt = kf_b.time - kf_a.time;
    if dt <= 0.0 {
        return kf_a.value;
    }

    match kf_a.interpolation {
        Interpolation::Hold => kf_a.value,
        Interpolation::Linear => {
            let frac = ((t - kf_a.time) / dt).clamp(0.0, 1.0);
            kf_a.value.lerp(kf_b.value, frac)
        }
    }
}

/// Split a keyframe list at local offset `at`.
///
/// Each half gets a keyframe at the cut carrying the interpolated value, so
/// both halves keep evaluating exactly as the original did. The right half
/// is re-based to start at zero. Empty lists stay empty.
pub fn split_keyframes<V: Lerp>(
    keyframes: &[Keyframe<V>],
    at: f64,
    base: V,
) -> (Vec<Keyframe<V>>, Vec<Keyframe<V>>) {
    if keyframes.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let boundary = evaluate_keyframes(keyframes, at, base);

    let mut left: Vec<Keyframe<V>> = keyframes
        .iter()
        .filter(|k| k.time < at - TIME_EPSILON)
        .copied()
        .collect();
    left.push(Keyframe::linear(at, boundary));

    let mut right = vec![Keyframe::linear(0.0, boundary)];
    right.extend(
        keyframes
            .iter()
            .filter(|k| k.time > at + TIME_EPSILON)
            .map(|k| Keyframe {
                time: k.time - at,
                ..*k
            }),
    );

    (left, right)
}

/// Insert or replace the keyframe at `time`, keeping the list sorted.
pub fn upsert_keyframe<V: Copy>(keyframes: &mut Vec<Keyframe<V>>, time: f64, value: V) {
    match keyframes
        .iter_mut()
        .find(|k| (k.time - time).abs() <= TIME_EPSILON)
    {
        Some(existing) => existing.value = value,
        None => {
            let index = keyframes.partition_point(|k| k.time < time);
            keyframes.insert(index, Keyframe::linear(time, value));
        }
    }
}

/// Drop keyframes outside `[0, duration]`, sort, and collapse duplicate times.
pub fn normalize_keyframes<V>(keyframes: &mut Vec<Keyframe<V>>, duration: f64) {
    keyframes.retain(|k| {
        k.time.is_finite() && k.time >= -TIME_EPSILON && k.time <= duration + TIME_EPSILON
    });
    keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
    keyframes.dedup_by(|b, a| (b.time - a.time).abs() <= TIME_EPSILON);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_track(times_values: &[(f64, f64)]) -> Vec<Keyframe<f64>> {
        times_values
            .iter()
            .map(|&(t, v)| Keyframe::linear(t, v))
            .collect()
    }

    #[test]
    fn empty_keyframes_return_base() {
        let keys: Vec<Keyframe<f64>> = vec![];
        assert_eq!(evaluate_keyframes(&keys, 1.0, 0.25), 0.25);
    }

    #[test]
    fn single_keyframe_returns_value() {
        let keys = linear_track(&[(0.0, 0.75)]);
        assert_eq!(evaluate_keyframes(&keys, 5.0, 0.0), 0.75);
    }

    #[test]
    fn linear_interpolation_midpoint() {
        let keys = linear_track(&[(0.0, 0.0), (1.0, 1.0)]);
        let val = evaluate_keyframes(&keys, 0.5, 0.0);
        assert!((val - 0.5).abs() < 1e-9);
    }

    #[test]
    fn linear_interpolation_quarter() {
        let keys = linear_track(&[(0.0, 0.0), (2.0, 4.0)]);
        let val = evaluate_keyframes(&keys, 0.5, 0.0);
        assert!((val - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hold_interpolation() {
        let keys = vec![Keyframe::hold(0.0, 1.0), Keyframe::hold(1.0, 0.0)];
        assert_eq!(evaluate_keyframes(&keys, 0.5, 9.0), 1.0);
        assert_eq!(evaluate_keyframes(&keys, 1.0, 9.0), 0.0);
    }

    #[test]
    fn before_first_keyframe_returns_first_value_exactly() {
        let keys = linear_track(&[(1.0, 5.0), (2.0, 10.0)]);
        assert_eq!(evaluate_keyframes(&keys, 0.0, 0.0), 5.0);
        assert_eq!(evaluate_keyframes(&keys, -3.0, 0.0), 5.0);
    }

    #[test]
    fn after_last_keyframe_returns_last_value_exactly() {
        let keys = linear_track(&[(0.0, 0.0), (1.0, 10.0)]);
        assert_eq!(evaluate_keyframes(&keys, 5.0, 0.0), 10.0);
    }

    #[test]
    fn multi_segment_linear() {
        let keys = linear_track(&[(0.0, 0.0), (1.0, 10.0), (2.0, 5.0)]);
        assert!((evaluate_keyframes(&keys, 0.5, 0.0) - 5.0).abs() < 1e-9);
        assert!((evaluate_keyframes(&keys, 1.5, 0.0) - 7.5).abs() < 1e-9);
        // Exactly on an interior keyframe
        assert!((evaluate_keyframes(&keys, 1.0, 0.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn vector_keyframes_interpolate_per_axis() {
        let keys = vec![
            Keyframe::linear(0.0, XY::new(0.0, 1.0)),
            Keyframe::linear(2.0, XY::new(1.0, 0.0)),
        ];
        let v = evaluate_keyframes(&keys, 0.5, XY::CENTER);
        assert!((v.x - 0.25).abs() < 1e-9);
        assert!((v.y - 0.75).abs() < 1e-9);
    }

    #[test]
    fn split_preserves_evaluation() {
        let keys = linear_track(&[(0.0, 0.0), (1.0, 10.0), (3.0, 0.0)]);
        let (left, right) = split_keyframes(&keys, 2.0, 0.0);

        for &t in &[0.0, 0.5, 1.0, 1.5, 2.0] {
            let a = evaluate_keyframes(&keys, t, 0.0);
            let b = evaluate_keyframes(&left, t, 0.0);
            assert!((a - b).abs() < 1e-9, "left half differs at {t}");
        }
        for &t in &[2.0, 2.5, 3.0, 4.0] {
            let a = evaluate_keyframes(&keys, t, 0.0);
            let b = evaluate_keyframes(&right, t - 2.0, 0.0);
            assert!((a - b).abs() < 1e-9, "right half differs at {t}");
        }
    }

    #[test]
    fn split_on_existing_keyframe_does_not_duplicate() {
        let keys = linear_track(&[(0.0, 0.0), (1.0, 10.0), (2.0, 0.0)]);
        let (left, right) = split_keyframes(&keys, 1.0, 0.0);
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 2);
        assert_eq!(right[0].value, 10.0);
    }

    #[test]
    fn upsert_replaces_or_inserts_sorted() {
        let mut keys = linear_track(&[(0.0, 0.0), (2.0, 2.0)]);
        upsert_keyframe(&mut keys, 1.0, 7.0);
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[1].time, 1.0);

        upsert_keyframe(&mut keys, 2.0, 9.0);
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[2].value, 9.0);
    }

    #[test]
    fn normalize_sorts_and_trims() {
        let mut keys = linear_track(&[(3.0, 1.0), (0.5, 2.0), (9.0, 3.0), (0.5, 4.0)]);
        normalize_keyframes(&mut keys, 4.0);
        let times: Vec<f64> = keys.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.5, 3.0]);
    }
}

//! Scene track: which of screen and camera the frame shows.
//!
//! Outside any scene segment the frame is in [`SceneMode::Default`]. A
//! segment is entered over the [`SCENE_TRANSITION`] seconds before its start
//! and left over the last [`SCENE_TRANSITION`] seconds inside it. Two
//! same-mode segments less than [`MIN_TRANSITION_GAP`] apart are bridged:
//! the mode holds through the gap instead of dipping back to the default.

use rk_common::{SceneMode, SceneState};

use crate::easing::CubicBezier;
use crate::types::SceneSegment;

/// Length of a scene change, seconds.
pub const SCENE_TRANSITION: f64 = 0.3;

/// Same-mode segments closer than this hold their mode through the gap.
pub const MIN_TRANSITION_GAP: f64 = 0.5;

/// Gaps at most this long count as back-to-back.
const ABUTTING_GAP: f64 = 0.01;

/// Resolve the scene at timeline `time`. Disabled segments are ignored.
pub fn evaluate_scene(track: &[SceneSegment], time: f64) -> SceneState {
    let enabled = || track.iter().filter(|s| s.enabled);
    let current = enabled().find(|s| s.contains(time));
    let next = enabled().find(|s| s.start > time);

    if let Some(segment) = current {
        let mode = segment.params.mode;
        let leave_at = segment.end - SCENE_TRANSITION;
        if time < leave_at {
            return SceneState::settled(mode);
        }
        let to = match next {
            Some(next) if bridged(segment, next) => return SceneState::settled(mode),
            Some(next) if next.start - segment.end <= ABUTTING_GAP => next.params.mode,
            _ => SceneMode::Default,
        };
        return transition(mode, to, time - leave_at);
    }

    let Some(next) = next else {
        return SceneState::DEFAULT;
    };
    let prev = track.iter().rev().find(|s| s.enabled && s.end <= time);
    let from = match prev {
        Some(prev) if bridged(prev, next) => return SceneState::settled(prev.params.mode),
        Some(prev) if next.start - prev.end <= ABUTTING_GAP => prev.params.mode,
        _ => SceneMode::Default,
    };
    let enter_at = next.start - SCENE_TRANSITION;
    if time < enter_at {
        return SceneState::DEFAULT;
    }
    transition(from, next.params.mode, time - enter_at)
}

fn bridged(before: &SceneSegment, after: &SceneSegment) -> bool {
    after.start - before.end < MIN_TRANSITION_GAP && before.params.mode == after.params.mode
}

fn transition(from: SceneMode, to: SceneMode, elapsed: f64) -> SceneState {
    let linear = (elapsed / SCENE_TRANSITION).clamp(0.0, 1.0);
    SceneState::between(from, to, CubicBezier::EASE_IN_OUT.ease(linear))
}

//! Keyboard overlay: recorded key presses shown briefly after they happen.
//!
//! Presses are stored on the source axis. At timeline time `t` the overlay
//! shows every key-down whose timeline position falls in `[t - linger, t]`,
//! skipping presses that were cut out of the edit.

use rk_common::KeyOverlay;

use crate::time_map::TimeMap;
use crate::types::KeyPressEvent;

/// Display symbol for a held modifier, or `None` if `name` is not one.
fn modifier_symbol(name: &str) -> Option<&'static str> {
    match name {
        "Ctrl" | "Control" | "ControlLeft" | "ControlRight" => Some("⌃"),
        "Alt" | "Option" | "Opt" | "AltGraph" | "AltLeft" | "AltRight" => Some("⌥"),
        "Shift" | "ShiftLeft" | "ShiftRight" => Some("⇧"),
        "Meta" | "MetaLeft" | "MetaRight" | "Command" | "Cmd" | "Super" | "Win" => Some("⌘"),
        _ => None,
    }
}

fn modifier_rank(symbol: &str) -> u8 {
    match symbol {
        "⌃" => 0,
        "⌥" => 1,
        "⇧" => 2,
        "⌘" => 3,
        _ => u8::MAX,
    }
}

pub fn is_modifier_key(key: &str) -> bool {
    modifier_symbol(key).is_some()
}

fn key_symbol(key: &str) -> String {
    match key {
        "Left" | "ArrowLeft" => "←".to_string(),
        "Right" | "ArrowRight" => "→".to_string(),
        "Up" | "ArrowUp" => "↑".to_string(),
        "Down" | "ArrowDown" => "↓".to_string(),
        "Enter" | "Return" => "Return".to_string(),
        "Escape" => "Esc".to_string(),
        "Backspace" => "Delete".to_string(),
        "Delete" => "Del".to_string(),
        "CapsLock" => "Caps".to_string(),
        "PageUp" => "Page Up".to_string(),
        "PageDown" => "Page Down".to_string(),
        " " | "Space" => "Space".to_string(),
        other => other.to_uppercase(),
    }
}

/// Overlay label for a press, e.g. `"⌃ + ⇧ + K"`. Bare modifiers have none.
pub fn key_label(event: &KeyPressEvent) -> Option<String> {
    if is_modifier_key(&event.key) {
        return None;
    }
    let mut parts: Vec<&'static str> = event
        .modifiers
        .iter()
        .filter_map(|m| modifier_symbol(m))
        .collect();
    parts.sort_by_key(|s| modifier_rank(s));
    parts.dedup();

    let mut label: Vec<String> = parts.into_iter().map(str::to_string).collect();
    label.push(key_symbol(&event.key));
    Some(label.join(" + "))
}

/// Presses visible at timeline `time`, oldest first.
///
/// `presses` must be sorted by source time.
pub fn visible_keys(
    map: &TimeMap,
    presses: &[KeyPressEvent],
    time: f64,
    linger: f64,
) -> Vec<KeyOverlay> {
    let mut keys = Vec::new();
    if presses.is_empty() || linger <= 0.0 {
        return keys;
    }

    let windows = map.source_windows(time - linger, time);
    let last = windows.len().saturating_sub(1);
    for (n, window) in windows.iter().enumerate() {
        let lo = presses.partition_point(|p| p.time < window.source_start);
        // Every window but the last runs to its clip's end, which is where
        // the next clip may start when a split left them source-contiguous.
        let hi = if n < last {
            presses.partition_point(|p| p.time < window.source_end)
        } else {
            presses.partition_point(|p| p.time <= window.source_end)
        };
        for press in presses[lo..hi].iter().filter(|p| p.down) {
            let Some(label) = key_label(press) else {
                continue;
            };
            let Some(shown_at) = map.source_to_timeline(window.segment_index, press.time) else {
                continue;
            };
            let age = time - shown_at;
            if !(0.0..=linger).contains(&age) {
                continue;
            }
            keys.push(KeyOverlay {
                label,
                age,
                opacity: (1.0 - age / linger).clamp(0.0, 1.0),
            });
        }
    }
    keys
}

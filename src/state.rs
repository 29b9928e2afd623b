//! Process-wide mutable configuration and live metadata — the single source
//! of truth the BLE endpoint, the status display, and the orchestrator all
//! read and write.
//!
//! Grounded on `notify/state.rs::NotificationStore`: one `Mutex`-guarded
//! record, a clamp-and-merge update function, and a `snapshot`-style read
//! that never hands out the lock itself.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capture/playback source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Mic,
    Bt,
}

/// Which effect is currently selected.
///
/// The state schema's `effect` field accepts both `"oscilloscope"` and
/// `"wave"` as input strings (see `parse_effect`), but they select the same
/// visual behavior, so there is a single `Wave` variant here rather than two
/// that would alias to one registry slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Bars,
    Wave,
    RadialPulse,
    SpectralFire,
    VuMeter,
    Plasma,
    Spiral,
    Ripple,
    Kaleidoscope,
}

/// How band energy maps to hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Auto,
    Rainbow,
    Mono,
}

const DEVICE_NAME_MAX: usize = 24;
const DEVICE_ADDR_MAX: usize = 24;
const TAG_MAX: usize = 32; // artist / title / album
const STATUS_LINE_MAX: usize = 64;

const GAIN_MIN: f32 = 0.05;
const GAIN_MAX: f32 = 6.0;
const SMOOTHING_MAX: f32 = 0.95;

/// A consistent, owned copy of the shared record. Cheap to clone and safe to
/// hold across a long operation, unlike the guarded record itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub mode: Mode,
    pub effect: EffectKind,
    pub intensity: f32,
    pub brightness: f32,
    pub gain: f32,
    pub smoothing: f32,
    pub color_mode: ColorMode,
    pub connected: bool,
    pub device_name: String,
    pub device_addr: String,
    pub artist: String,
    pub title: String,
    pub album: String,
    pub running: bool,
    pub passthrough: bool,
    pub status_line: String,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            mode: Mode::Mic,
            effect: EffectKind::Bars,
            intensity: 0.75,
            brightness: 0.55,
            gain: 1.0,
            smoothing: 0.65,
            color_mode: ColorMode::Auto,
            connected: false,
            device_name: String::new(),
            device_addr: String::new(),
            artist: String::new(),
            title: String::new(),
            album: String::new(),
            running: true,
            passthrough: false,
            status_line: String::new(),
        }
    }
}

/// Guarded shared record. Readers call `snapshot`; writers call `update`
/// with a JSON patch. Never blocks on I/O — the mutex is only ever held for
/// the duration of a field copy or merge.
pub struct SharedState {
    inner: Mutex<StateSnapshot>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateSnapshot::default()),
        }
    }

    /// Returns a consistent copy. No torn writes are ever visible: the whole
    /// record is copied under one lock acquisition.
    pub fn snapshot(&self) -> StateSnapshot {
        self.inner.lock().unwrap().clone()
    }

    /// Directly set `status_line`, used internally by the orchestrator to
    /// surface source-fallback and transient-fault messages. Not reachable
    /// from a BLE patch.
    pub fn set_status_line(&self, message: &str) {
        let mut state = self.inner.lock().unwrap();
        state.status_line = truncate(message, STATUS_LINE_MAX);
    }

    /// Directly set `mode`, used by the orchestrator to reflect a
    /// fallback-to-mic decision (spec.md §4.1) that didn't originate from a
    /// BLE patch.
    pub fn set_mode(&self, mode: Mode) {
        self.inner.lock().unwrap().mode = mode;
    }

    pub fn set_connected(&self, connected: bool, device_name: &str, device_addr: &str) {
        let mut state = self.inner.lock().unwrap();
        state.connected = connected;
        state.device_name = truncate(device_name, DEVICE_NAME_MAX);
        state.device_addr = truncate(device_addr, DEVICE_ADDR_MAX);
    }

    pub fn set_now_playing(&self, artist: &str, title: &str, album: &str) {
        let mut state = self.inner.lock().unwrap();
        state.artist = truncate(artist, TAG_MAX);
        state.title = truncate(title, TAG_MAX);
        state.album = truncate(album, TAG_MAX);
    }

    /// Apply a JSON patch object. Fields with recognized names are clamped
    /// and merged; unknown keys are ignored; a non-object patch is a no-op.
    /// Applying the same patch twice is idempotent.
    pub fn update(&self, patch: &Value) {
        let Some(object) = patch.as_object() else {
            return;
        };
        let mut state = self.inner.lock().unwrap();

        if let Some(v) = object.get("mode").and_then(Value::as_str) {
            match v {
                "mic" => state.mode = Mode::Mic,
                "bt" => state.mode = Mode::Bt,
                _ => {}
            }
        }
        if let Some(v) = object.get("effect").and_then(Value::as_str) {
            if let Some(effect) = parse_effect(v) {
                state.effect = effect;
            }
        }
        if let Some(v) = object.get("intensity").and_then(Value::as_f64) {
            apply_clamped(&mut state.intensity, v as f32, 0.0, 1.0);
        }
        if let Some(v) = object.get("brightness").and_then(Value::as_f64) {
            apply_clamped(&mut state.brightness, v as f32, 0.0, 1.0);
        }
        if let Some(v) = object.get("gain").and_then(Value::as_f64) {
            apply_clamped(&mut state.gain, v as f32, GAIN_MIN, GAIN_MAX);
        }
        if let Some(v) = object.get("smoothing").and_then(Value::as_f64) {
            apply_clamped(&mut state.smoothing, v as f32, 0.0, SMOOTHING_MAX);
        }
        if let Some(v) = object.get("color_mode").and_then(Value::as_str) {
            match v {
                "auto" => state.color_mode = ColorMode::Auto,
                "rainbow" => state.color_mode = ColorMode::Rainbow,
                "mono" => state.color_mode = ColorMode::Mono,
                _ => {}
            }
        }
        if let Some(v) = object.get("running").and_then(Value::as_bool) {
            state.running = v;
        }
        if let Some(v) = object.get("passthrough").and_then(Value::as_bool) {
            state.passthrough = v;
        }
    }
}

fn apply_clamped(field: &mut f32, value: f32, min: f32, max: f32) {
    if !value.is_finite() {
        return;
    }
    *field = value.clamp(min, max);
}

fn parse_effect(name: &str) -> Option<EffectKind> {
    Some(match name {
        "bars" => EffectKind::Bars,
        "oscilloscope" | "wave" => EffectKind::Wave,
        "radial_pulse" => EffectKind::RadialPulse,
        "spectral_fire" => EffectKind::SpectralFire,
        "vu_meter" => EffectKind::VuMeter,
        "plasma" => EffectKind::Plasma,
        "spiral" => EffectKind::Spiral,
        "ripple" => EffectKind::Ripple,
        "kaleidoscope" => EffectKind::Kaleidoscope,
        _ => return None,
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let snap = StateSnapshot::default();
        assert_eq!(snap.mode, Mode::Mic);
        assert_eq!(snap.effect, EffectKind::Bars);
        assert_eq!(snap.intensity, 0.75);
        assert_eq!(snap.brightness, 0.55);
        assert_eq!(snap.gain, 1.0);
        assert_eq!(snap.smoothing, 0.65);
        assert!(snap.running);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let state = SharedState::new();
        state.update(&serde_json::json!({"foo": 1, "intensity": 0.3}));
        let snap = state.snapshot();
        assert_eq!(snap.intensity, 0.3);
    }

    #[test]
    fn out_of_range_numeric_writes_are_clamped() {
        let state = SharedState::new();
        state.update(&serde_json::json!({"gain": 0.0, "smoothing": 1.0}));
        let snap = state.snapshot();
        assert_eq!(snap.gain, GAIN_MIN);
        assert_eq!(snap.smoothing, SMOOTHING_MAX);
    }

    #[test]
    fn nan_write_keeps_previous_value() {
        let state = SharedState::new();
        state.update(&serde_json::json!({"gain": 2.5}));
        state.update(&serde_json::json!({"gain": f64::NAN}));
        assert_eq!(state.snapshot().gain, 2.5);
    }

    #[test]
    fn applying_the_same_patch_twice_is_idempotent() {
        let state = SharedState::new();
        let patch = serde_json::json!({"mode": "bt", "effect": "spectral_fire", "intensity": 0.9, "gain": 2.5});
        state.update(&patch);
        let first = state.snapshot();
        state.update(&patch);
        let second = state.snapshot();
        assert_eq!(first.mode, second.mode);
        assert_eq!(first.intensity, second.intensity);
        assert_eq!(first.gain, second.gain);
    }

    #[test]
    fn scenario_ble_patch_sets_exact_fields() {
        let state = SharedState::new();
        state.update(&serde_json::json!({
            "mode": "bt",
            "effect": "spectral_fire",
            "intensity": 0.9,
            "gain": 2.5
        }));
        let snap = state.snapshot();
        assert_eq!(snap.mode, Mode::Bt);
        assert_eq!(snap.effect, EffectKind::SpectralFire);
        assert_eq!(snap.intensity, 0.9);
        assert_eq!(snap.gain, 2.5);
        assert_eq!(snap.smoothing, 0.65);
        assert_eq!(snap.brightness, 0.55);
    }

    #[test]
    fn non_object_patch_is_a_no_op() {
        let state = SharedState::new();
        state.update(&serde_json::json!([1, 2, 3]));
        assert_eq!(state.snapshot().intensity, 0.75);
    }
}

//! Source-switching policy: stop the old source, clear its buffer, start the
//! new one, and fall back to the microphone if the requested source fails to
//! start. Grounded on the teacher's device-open-with-fallback shape (open the
//! preferred device, and on failure fall back to a known-good default rather
//! than leaving the pipeline without a source).

use crate::bt::BluetoothSource;
use crate::error::AudioError;
use crate::mic::MicrophoneSource;
use crate::source::AudioSource;
use crate::types::{silent_block, Block, SourceKind};

/// Outcome of a `switch_to` call, carried back to the caller so it can update
/// `SharedState.status_line` without `viz-audio` knowing about `SharedState`.
pub struct SwitchOutcome {
    pub kind: SourceKind,
    pub fell_back_to_mic: bool,
    pub error: Option<String>,
}

/// Owns both backends and exposes whichever one is currently selected as a
/// single `AudioSource`-shaped surface.
pub struct SourceSwitch {
    active: SourceKind,
    mic: MicrophoneSource,
    bt: BluetoothSource,
}

impl SourceSwitch {
    pub fn new(mic_device_index: Option<usize>, bt_addr: Option<String>, passthrough: bool) -> Self {
        Self {
            active: SourceKind::Microphone,
            mic: MicrophoneSource::new(mic_device_index, passthrough),
            bt: BluetoothSource::new(bt_addr),
        }
    }

    /// Start the default (microphone) source. Call once at startup.
    pub fn start_default(&mut self) -> Result<(), AudioError> {
        self.mic.start()
    }

    /// Switching is atomic with respect to the orchestrator at block
    /// granularity: the caller only ever sees either the fully-stopped old
    /// source or the fully-started new one between `read_block` calls.
    pub fn switch_to(&mut self, kind: SourceKind) -> SwitchOutcome {
        if kind == self.active {
            return SwitchOutcome {
                kind,
                fell_back_to_mic: false,
                error: None,
            };
        }

        self.stop_active();

        let start_result = match kind {
            SourceKind::Microphone => self.mic.start(),
            SourceKind::Bluetooth => self.bt.start(),
        };

        match start_result {
            Ok(()) => {
                self.active = kind;
                SwitchOutcome {
                    kind,
                    fell_back_to_mic: false,
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, requested = ?kind, "source failed to start, falling back to microphone");
                let fallback_err = self.mic.start().err();
                self.active = SourceKind::Microphone;
                SwitchOutcome {
                    kind: SourceKind::Microphone,
                    fell_back_to_mic: true,
                    error: Some(fallback_err.map_or_else(|| err.to_string(), |e| e.to_string())),
                }
            }
        }
    }

    fn stop_active(&mut self) {
        match self.active {
            SourceKind::Microphone => self.mic.stop(),
            SourceKind::Bluetooth => self.bt.stop(),
        }
    }

    pub fn current_kind(&self) -> SourceKind {
        self.active
    }

    pub fn set_gain(&self, gain: f32) {
        self.mic.set_gain(gain);
    }

    pub fn set_passthrough(&self, enabled: bool) {
        self.mic.set_passthrough(enabled);
    }

    pub fn read_block(&mut self) -> Block {
        match self.active {
            SourceKind::Microphone => self.mic.read_block(),
            SourceKind::Bluetooth => self.bt.read_block(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self.active {
            SourceKind::Microphone => self.mic.is_active(),
            SourceKind::Bluetooth => self.bt.is_active(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self.active {
            SourceKind::Microphone => self.mic.sample_rate(),
            SourceKind::Bluetooth => self.bt.sample_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_to_same_kind_is_a_no_op() {
        let mut switch = SourceSwitch::new(None, None, false);
        let outcome = switch.switch_to(SourceKind::Microphone);
        assert_eq!(outcome.kind, SourceKind::Microphone);
        assert!(!outcome.fell_back_to_mic);
        assert!(outcome.error.is_none());
    }

    #[test]
    fn switching_to_bluetooth_without_address_falls_back_to_mic() {
        let mut switch = SourceSwitch::new(None, None, false);
        let outcome = switch.switch_to(SourceKind::Bluetooth);
        assert!(outcome.fell_back_to_mic);
        assert_eq!(outcome.kind, SourceKind::Microphone);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn read_block_before_start_is_silent() {
        let mut switch = SourceSwitch::new(None, None, false);
        assert_eq!(switch.read_block(), silent_block());
    }
}

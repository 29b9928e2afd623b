//! The `AudioSource` abstraction shared by the microphone and Bluetooth backends.

use crate::error::AudioError;
use crate::types::Block;

/// A source of continuous mono audio blocks.
///
/// `read_block` must never block the caller: when insufficient data has
/// accumulated it returns silence rather than waiting, matching the
/// real-time pacing the orchestrator's LED tick depends on.
pub trait AudioSource: Send {
    /// Activate capture. Idempotent — calling `start` while already active is a no-op.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Release OS resources. Subsequent reads produce silence.
    fn stop(&mut self);

    /// Pull the most recently available block of `BLOCK_LEN` mono samples.
    /// Returns a zero-filled block on underrun.
    fn read_block(&mut self) -> Block;

    /// Whether the underlying capture stream is currently running.
    fn is_active(&self) -> bool;

    /// The sample rate actually negotiated with the device, once started.
    fn sample_rate(&self) -> u32;
}

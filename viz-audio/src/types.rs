//! Shared constants and small data types for the audio source.

/// Fixed audio block length in samples (`N` in the pipeline's terms).
pub const BLOCK_LEN: usize = 1024;

/// Default capture sample rate in Hz, used when a device doesn't override it.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Roughly one second of audio at `DEFAULT_SAMPLE_RATE`, used to cap internal
/// ring buffers so a stalled consumer can't grow them unbounded.
pub const RING_CAP_SAMPLES: usize = DEFAULT_SAMPLE_RATE as usize;

/// One block of mono 32-bit-float audio, always exactly `BLOCK_LEN` long.
pub type Block = [f32; BLOCK_LEN];

/// Silence, the value `read_block` returns on underrun.
pub const fn silent_block() -> Block {
    [0.0f32; BLOCK_LEN]
}

/// Which physical source an `AudioSource` is currently bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Microphone,
    Bluetooth,
}

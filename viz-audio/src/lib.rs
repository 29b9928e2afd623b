//! Audio acquisition and source-switching for the visualizer.

mod bt;
mod error;
mod mic;
mod source;
mod switch;
mod types;

pub use bt::BluetoothSource;
pub use error::AudioError;
pub use mic::MicrophoneSource;
pub use source::AudioSource;
pub use switch::{SourceSwitch, SwitchOutcome};
pub use types::{silent_block, Block, SourceKind, BLOCK_LEN, DEFAULT_SAMPLE_RATE};

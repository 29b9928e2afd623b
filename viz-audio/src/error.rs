//! Audio source error types.

use thiserror::Error;

/// Errors that can occur while starting or running an audio source.
///
/// These never propagate to the orchestrator's per-block reads — a failed
/// source is marked inactive and yields silence instead. Callers only see
/// this type from `AudioSource::start`.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("no input device available")]
    NoInputDevice,

    #[error("failed to query device config: {0}")]
    DeviceConfig(String),

    #[error("failed to build audio stream: {0}")]
    StreamBuild(String),

    #[error("failed to start audio stream: {0}")]
    StreamStart(String),

    #[error("bluetooth source address not configured (AURAVIS_BT_ADDR unset)")]
    MissingBtAddress,

    #[error("failed to spawn capture process: {0}")]
    ProcessSpawn(#[source] std::io::Error),

    #[error("capture process exited")]
    ProcessExited,
}

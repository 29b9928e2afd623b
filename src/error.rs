//! Top-level error type for fatal startup failures.

use thiserror::Error;

/// Errors that can abort process startup before the orchestrator loop takes
/// over. Once the loop is running, failures are logged and handled per the
/// error-handling taxonomy instead of propagating here.
#[derive(Error, Debug)]
pub enum AuravisError {
    #[error("LED transport: {0}")]
    Led(#[from] viz_led::LedError),

    #[error("audio source: {0}")]
    Audio(#[from] viz_audio::AudioError),

    #[error("BLE peripheral setup failed: {0}")]
    Ble(#[from] zbus::Error),

    #[error("status display init failed: {0}")]
    Display(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

//! LED transport error types.

use thiserror::Error;

/// Errors that can occur while talking to the LED microcontroller.
#[derive(Error, Debug)]
pub enum LedError {
    #[error("serial port not found: {0}")]
    PortNotFound(String),

    #[error("failed to open serial port {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial write error: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("frame payload has wrong length: expected {expected}, got {actual}")]
    BadPayloadLength { expected: usize, actual: usize },

    #[error("transport is closed")]
    Closed,
}

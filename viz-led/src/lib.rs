//! Framed serial transport to the visualizer's LED matrix microcontroller.

mod error;
mod protocol;
mod transport;
mod types;

pub use error::LedError;
pub use protocol::{crc8, encode, WIRE_FRAME_LEN};
pub use transport::LedTransport;
pub use types::{Frame, FrameId, MATRIX_HEIGHT, MATRIX_LEN, MATRIX_WIDTH, PAYLOAD_LEN};

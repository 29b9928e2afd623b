//! Binary wire framing for the LED microcontroller link.
//!
//! ```text
//! byte 0      : 0xAA
//! byte 1      : 0x55
//! byte 2      : frame_id (monotonic mod 256)
//! byte 3..4   : payload length = 768 (little-endian)
//! byte 5..772 : 768 bytes of RGB payload, row-major (y*16 + x)
//! byte 773    : CRC-8 over the payload (poly 0x07, init 0x00, no reflect, no xor-out)
//! ```

use crate::types::{Frame, FrameId, PAYLOAD_LEN};

pub const SYNC1: u8 = 0xAA;
pub const SYNC2: u8 = 0x55;

/// Total wire frame length: 2 sync bytes + id + 2 length bytes + payload + crc.
pub const WIRE_FRAME_LEN: usize = 2 + 1 + 2 + PAYLOAD_LEN + 1;

/// CRC-8, polynomial 0x07, initial value 0x00, MSB-first, no input/output reflection.
pub fn crc8(data: &[u8]) -> u8 {
    const POLY: u8 = 0x07;
    let mut crc: u8 = 0x00;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Encode a frame into its complete wire representation.
pub fn encode(frame: &Frame, id: FrameId) -> [u8; WIRE_FRAME_LEN] {
    let mut buf = [0u8; WIRE_FRAME_LEN];
    buf[0] = SYNC1;
    buf[1] = SYNC2;
    buf[2] = id.value();
    let len = PAYLOAD_LEN as u16;
    buf[3] = (len & 0xFF) as u8;
    buf[4] = (len >> 8) as u8;
    buf[5..5 + PAYLOAD_LEN].copy_from_slice(frame.payload());
    buf[5 + PAYLOAD_LEN] = crc8(frame.payload());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MATRIX_LEN;

    #[test]
    fn crc8_of_empty_is_zero() {
        assert_eq!(crc8(&[]), 0);
    }

    #[test]
    fn crc8_is_deterministic() {
        let data = [1u8, 2, 3, 4, 5];
        assert_eq!(crc8(&data), crc8(&data));
    }

    #[test]
    fn encode_places_sync_and_length_correctly() {
        let frame = Frame::black();
        let wire = encode(&frame, FrameId::default());
        assert_eq!(wire[0], SYNC1);
        assert_eq!(wire[1], SYNC2);
        assert_eq!(wire[2], 0);
        assert_eq!(u16::from_le_bytes([wire[3], wire[4]]), PAYLOAD_LEN as u16);
        assert_eq!(wire.len(), WIRE_FRAME_LEN);
    }

    #[test]
    fn encode_crc_matches_payload() {
        let mut pixels = [(0u8, 0u8, 0u8); MATRIX_LEN];
        pixels[0] = (255, 10, 20);
        let frame = Frame::from_pixels(&pixels);
        let wire = encode(&frame, FrameId::default());
        let payload = &wire[5..5 + PAYLOAD_LEN];
        assert_eq!(wire[5 + PAYLOAD_LEN], crc8(payload));
    }

    #[test]
    fn frame_id_wraps_mod_256() {
        let mut id = FrameId::default();
        for _ in 0..256 {
            id = id.next();
        }
        assert_eq!(id.value(), 0);
    }
}

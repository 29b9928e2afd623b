//! Integration tests for the LED link's public wire-framing API.

use viz_led::{encode, Frame, FrameId, MATRIX_LEN, PAYLOAD_LEN, WIRE_FRAME_LEN};

#[test]
fn black_frame_round_trips_through_from_payload() {
    let wire = encode(&Frame::black(), FrameId::default());
    let payload = &wire[5..5 + PAYLOAD_LEN];
    assert!(payload.iter().all(|&b| b == 0));
}

#[test]
fn full_bright_frame_has_expected_wire_length_and_sync() {
    let pixels = [(255u8, 255u8, 255u8); MATRIX_LEN];
    let frame = Frame::from_pixels(&pixels);
    let wire = encode(&frame, FrameId::default());

    assert_eq!(wire.len(), WIRE_FRAME_LEN);
    assert_eq!(&wire[0..2], &[0xAA, 0x55]);
    assert_eq!(&wire[5..5 + PAYLOAD_LEN], &[255u8; PAYLOAD_LEN][..]);
}

#[test]
fn successive_frame_ids_advance_the_header_byte() {
    let frame = Frame::black();
    let id = FrameId::default();
    let wire_a = encode(&frame, id);
    let wire_b = encode(&frame, id.next());
    assert_eq!(wire_a[2], 0);
    assert_eq!(wire_b[2], 1);
}

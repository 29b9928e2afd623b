//! Integration tests for source switching.
//!
//! Most of these require a real input device or a `bluealsa` pairing and are
//! marked `#[ignore]`. Run with: cargo test -p viz-audio -- --ignored --nocapture

use std::time::Duration;

use viz_audio::{AudioSource, SourceKind, SourceSwitch, BLOCK_LEN};

#[test]
#[ignore] // requires a real input device
fn microphone_produces_nonzero_blocks_after_warmup() {
    let mut switch = SourceSwitch::new(None, None, false);
    switch.start_default().expect("microphone failed to start");
    std::thread::sleep(Duration::from_millis(200));

    let block = switch.read_block();
    assert_eq!(block.len(), BLOCK_LEN);
    assert!(switch.is_active());
}

#[test]
#[ignore] // requires AURAVIS_BT_ADDR and a paired A2DP source streaming audio
fn bluetooth_falls_back_when_device_unreachable() {
    let mut switch = SourceSwitch::new(None, Some("00:00:00:00:00:00".to_string()), false);
    let outcome = switch.switch_to(SourceKind::Bluetooth);
    assert_eq!(outcome.kind, SourceKind::Microphone);
}

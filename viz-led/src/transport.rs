//! Single-slot "latest frame wins" transport to the LED microcontroller.
//!
//! A dedicated sender thread owns the serial port exclusively and drains a
//! one-slot inbox. Submitting a new frame while one is still queued replaces
//! it — this guarantees at most one frame in flight and bounded latency even
//! when the downstream microcontroller is slow, per the framed-serial
//! transport's fire-and-forget pacing contract.

use std::io::Write;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::LedError;
use crate::protocol::{self, WIRE_FRAME_LEN};
use crate::types::{Frame, FrameId};

const WRITE_TIMEOUT: Duration = Duration::from_millis(200);

struct Inbox {
    slot: Mutex<Option<Frame>>,
    cond: Condvar,
    shutdown: Mutex<bool>,
}

impl Inbox {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            cond: Condvar::new(),
            shutdown: Mutex::new(false),
        }
    }

    fn submit(&self, frame: Frame) {
        let mut slot = self.slot.lock().unwrap();
        *slot = Some(frame);
        self.cond.notify_one();
    }

    fn request_shutdown(&self) {
        *self.shutdown.lock().unwrap() = true;
        self.cond.notify_one();
    }

    /// Block until a frame is available or shutdown is requested.
    /// Returns `None` only once shutdown has been requested and the inbox is empty.
    fn take(&self) -> Option<Frame> {
        let mut slot = self.slot.lock().unwrap();
        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }
            if *self.shutdown.lock().unwrap() {
                return None;
            }
            slot = self.cond.wait(slot).unwrap();
        }
    }
}

/// Owns the serial port to the LED microcontroller and a background sender
/// thread draining the single-slot inbox.
pub struct LedTransport {
    inbox: Arc<Inbox>,
    worker: Option<JoinHandle<()>>,
}

impl LedTransport {
    /// Open the serial port and start the sender worker.
    pub fn open(path: &str, baud: u32) -> Result<Self, LedError> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|source| LedError::OpenFailed {
                path: path.to_string(),
                source,
            })?;

        let inbox = Arc::new(Inbox::new());
        let worker_inbox = Arc::clone(&inbox);
        let worker = thread::spawn(move || sender_loop(port, worker_inbox));

        Ok(Self {
            inbox,
            worker: Some(worker),
        })
    }

    /// Submit a frame for transmission. Replaces any frame still queued.
    pub fn submit(&self, frame: Frame) {
        self.inbox.submit(frame);
    }

    /// Flush a single all-zero clear frame, then stop the worker and release the port.
    pub fn close(mut self) {
        self.inbox.submit(Frame::black());
        self.inbox.request_shutdown();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LedTransport {
    fn drop(&mut self) {
        self.inbox.request_shutdown();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

fn sender_loop(mut port: Box<dyn serialport::SerialPort>, inbox: Arc<Inbox>) {
    let mut frame_id = FrameId::default();
    while let Some(frame) = inbox.take() {
        let wire: [u8; WIRE_FRAME_LEN] = protocol::encode(&frame, frame_id);
        match port.write_all(&wire) {
            Ok(()) => frame_id = frame_id.next(),
            Err(err) => {
                tracing::warn!(error = %err, "LED serial write failed, dropping frame");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbox_replaces_queued_frame() {
        let inbox = Inbox::new();
        let mut pixels = [(0u8, 0u8, 0u8); crate::types::MATRIX_LEN];
        pixels[0] = (1, 1, 1);
        inbox.submit(Frame::from_pixels(&pixels));
        pixels[0] = (2, 2, 2);
        inbox.submit(Frame::from_pixels(&pixels));

        let taken = inbox.take().unwrap();
        assert_eq!(taken.payload()[0], 2);
    }

    #[test]
    fn take_returns_none_after_shutdown_with_empty_inbox() {
        let inbox = Inbox::new();
        inbox.request_shutdown();
        assert!(inbox.take().is_none());
    }

    #[test]
    fn take_drains_pending_frame_even_after_shutdown_requested() {
        let inbox = Inbox::new();
        inbox.submit(Frame::black());
        inbox.request_shutdown();
        assert!(inbox.take().is_some());
        assert!(inbox.take().is_none());
    }
}

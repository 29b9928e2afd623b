//! Bluetooth A2DP capture, backed by a `bluealsa`-fed `arecord` child process.
//!
//! Grounded on `examples/original_source/firmware/audio/bt_bluealsa.py`'s
//! `BlueAlsaInput`: spawn `arecord` against the BlueALSA PCM for the paired
//! device's address, read raw interleaved S16LE stereo from its stdout, and
//! downmix to mono float on each block request. Unlike the Python original
//! (single-threaded, non-blocking reads via `select`/`fcntl`), a dedicated
//! reader thread does blocking reads into a shared byte ring, the same shape
//! the microphone backend uses for its `cpal` callback.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::AudioError;
use crate::types::{silent_block, Block, BLOCK_LEN, DEFAULT_SAMPLE_RATE, RING_CAP_SAMPLES};

const CHANNELS: usize = 2;
const BYTES_PER_SAMPLE: usize = 2;
/// Cap the byte ring at roughly one second of stereo S16LE audio.
const RING_CAP_BYTES: usize = RING_CAP_SAMPLES * CHANNELS * BYTES_PER_SAMPLE;

struct ReaderHandle {
    thread: JoinHandle<()>,
    child: Child,
}

/// Bluetooth A2DP `AudioSource`, reading PCM from a `bluealsa` device address.
pub struct BluetoothSource {
    bt_addr: Option<String>,
    buf: Arc<Mutex<Vec<u8>>>,
    active: Arc<AtomicBool>,
    reader: Option<ReaderHandle>,
}

impl BluetoothSource {
    /// `bt_addr` is the paired device's MAC address, normally sourced from
    /// the `AURAVIS_BT_ADDR` environment variable.
    pub fn new(bt_addr: Option<String>) -> Self {
        Self {
            bt_addr,
            buf: Arc::new(Mutex::new(Vec::with_capacity(RING_CAP_BYTES))),
            active: Arc::new(AtomicBool::new(false)),
            reader: None,
        }
    }
}

impl crate::source::AudioSource for BluetoothSource {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.active.load(Ordering::SeqCst) {
            return Ok(());
        }

        let addr = self.bt_addr.clone().ok_or(AudioError::MissingBtAddress)?;
        let device_spec = format!("bluealsa:DEV={addr},PROFILE=a2dp,SRV=org.bluealsa");

        let mut child = Command::new("arecord")
            .args([
                "-D",
                &device_spec,
                "-f",
                "S16_LE",
                "-c",
                &CHANNELS.to_string(),
                "-r",
                &DEFAULT_SAMPLE_RATE.to_string(),
                "-t",
                "raw",
                "-q",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(AudioError::ProcessSpawn)?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            AudioError::ProcessSpawn(std::io::Error::other("arecord has no stdout"))
        })?;

        self.buf.lock().unwrap().clear();
        let buf = Arc::clone(&self.buf);
        let active = Arc::clone(&self.active);
        active.store(true, Ordering::SeqCst);

        let thread = thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            while active.load(Ordering::SeqCst) {
                match stdout.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        let mut b = buf.lock().unwrap();
                        b.extend_from_slice(&chunk[..n]);
                        if b.len() > RING_CAP_BYTES {
                            let drain_to = b.len() - RING_CAP_BYTES;
                            b.drain(..drain_to);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "bluetooth capture read failed");
                        break;
                    }
                }
            }
            active.store(false, Ordering::SeqCst);
        });

        self.reader = Some(ReaderHandle { thread, child });
        Ok(())
    }

    fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(mut handle) = self.reader.take() {
            let _ = handle.child.kill();
            let _ = handle.thread.join();
        }
        self.buf.lock().unwrap().clear();
    }

    fn read_block(&mut self) -> Block {
        if let Some(handle) = self.reader.as_mut() {
            if let Ok(Some(_)) = handle.child.try_wait() {
                self.active.store(false, Ordering::SeqCst);
                return silent_block();
            }
        }

        let need_bytes = BLOCK_LEN * CHANNELS * BYTES_PER_SAMPLE;
        let mut buf = self.buf.lock().unwrap();
        if buf.len() < need_bytes {
            return silent_block();
        }
        let raw: Vec<u8> = buf.drain(..need_bytes).collect();
        drop(buf);

        let mut block = silent_block();
        for i in 0..BLOCK_LEN {
            let mut sum = 0.0f32;
            for ch in 0..CHANNELS {
                let offset = (i * CHANNELS + ch) * BYTES_PER_SAMPLE;
                let sample = i16::from_le_bytes([raw[offset], raw[offset + 1]]);
                sum += sample as f32 / 32768.0;
            }
            block[i] = sum / CHANNELS as f32;
        }

        if block.iter().any(|s| !s.is_finite()) {
            return silent_block();
        }
        block
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }
}

impl Drop for BluetoothSource {
    fn drop(&mut self) {
        crate::source::AudioSource::stop(self);
    }
}

//! Microphone capture backed by the OS audio API via `cpal`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::error::AudioError;
use crate::types::{silent_block, Block, BLOCK_LEN, RING_CAP_SAMPLES};

/// Live, externally adjustable knobs the capture callback reads on every block.
/// Mirrors the teacher's `AudioState`: plain `Arc<Mutex<_>>`/atomics shared
/// between the stream callback thread and whoever owns the `MicrophoneSource`.
struct MicKnobs {
    gain: Mutex<f32>,
    passthrough: AtomicBool,
}

impl Default for MicKnobs {
    fn default() -> Self {
        Self {
            gain: Mutex::new(1.0),
            passthrough: AtomicBool::new(false),
        }
    }
}

/// Microphone-backed `AudioSource`.
///
/// A `cpal` input stream deposits samples into a bounded ring buffer from its
/// callback thread; `read_block` drains the most recent `BLOCK_LEN` samples
/// without blocking. When `passthrough` is enabled an output stream mirrors
/// the (gain-applied) input straight back out, matching
/// `examples/original_source/firmware/audio/passthrough.py`.
pub struct MicrophoneSource {
    device_index: Option<usize>,
    passthrough_enabled: bool,
    knobs: Arc<MicKnobs>,
    sample_rate: Arc<AtomicU32>,
    ring: Arc<Mutex<Vec<f32>>>,
    active: Arc<AtomicBool>,
    // cpal::Stream is not Send; held as an opaque owned box and dropped with the source.
    input_stream: Option<Box<dyn std::any::Any>>,
    output_stream: Option<Box<dyn std::any::Any>>,
}

impl MicrophoneSource {
    /// `device_index` selects a specific input device by its enumeration order
    /// (the `AURAVIS_MIC_DEVICE` override); `None` runs the preference search
    /// (`monitor`/`loopback` name match, then host default).
    pub fn new(device_index: Option<usize>, passthrough_enabled: bool) -> Self {
        Self {
            device_index,
            passthrough_enabled,
            knobs: Arc::new(MicKnobs::default()),
            sample_rate: Arc::new(AtomicU32::new(crate::types::DEFAULT_SAMPLE_RATE)),
            ring: Arc::new(Mutex::new(Vec::with_capacity(RING_CAP_SAMPLES))),
            active: Arc::new(AtomicBool::new(false)),
            input_stream: None,
            output_stream: None,
        }
    }

    /// Update the gain applied to the passthrough path. Has no effect on the
    /// feature-extraction path, which applies its own gain downstream.
    pub fn set_gain(&self, gain: f32) {
        *self.knobs.gain.lock().unwrap() = gain;
    }

    pub fn set_passthrough(&self, enabled: bool) {
        self.knobs.passthrough.store(enabled, Ordering::Relaxed);
    }

    fn find_input_device(&self, host: &cpal::Host) -> Result<cpal::Device, AudioError> {
        if let Some(index) = self.device_index {
            if let Ok(mut devices) = host.input_devices() {
                if let Some(device) = devices.nth(index) {
                    return Ok(device);
                }
            }
            tracing::warn!(index, "configured AURAVIS_MIC_DEVICE index not found, falling back");
        }

        if let Ok(devices) = host.input_devices() {
            for device in devices {
                if let Ok(name) = device.name() {
                    let lower = name.to_lowercase();
                    if lower.contains("monitor") || lower.contains("loopback") {
                        tracing::info!(%name, "selected monitor/loopback input device");
                        return Ok(device);
                    }
                }
            }
        }

        host.default_input_device().ok_or(AudioError::NoInputDevice)
    }
}

impl crate::source::AudioSource for MicrophoneSource {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.active.load(Ordering::SeqCst) {
            return Ok(());
        }

        let host = cpal::default_host();
        let device = self.find_input_device(&host)?;
        let input_config = device
            .default_input_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let rate = input_config.sample_rate().0;
        self.sample_rate.store(rate, Ordering::SeqCst);

        self.ring.lock().unwrap().clear();
        let ring = Arc::clone(&self.ring);

        let input_stream = device
            .build_input_stream(
                &input_config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = ring.lock() {
                        buf.extend_from_slice(data);
                        if buf.len() > RING_CAP_SAMPLES {
                            let drain_to = buf.len() - RING_CAP_SAMPLES;
                            buf.drain(..drain_to);
                        }
                    }
                },
                |err| tracing::warn!(error = %err, "microphone input stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        input_stream
            .play()
            .map_err(|e| AudioError::StreamStart(e.to_string()))?;

        let output_stream = if self.passthrough_enabled {
            self.build_passthrough_stream(&host).ok()
        } else {
            None
        };

        self.input_stream = Some(Box::new(input_stream));
        self.output_stream = output_stream;
        self.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        self.input_stream = None;
        self.output_stream = None;
        self.ring.lock().unwrap().clear();
    }

    fn read_block(&mut self) -> Block {
        if !self.active.load(Ordering::SeqCst) {
            return silent_block();
        }
        let mut buf = self.ring.lock().unwrap();
        if buf.len() < BLOCK_LEN {
            return silent_block();
        }
        let start = buf.len() - BLOCK_LEN;
        let mut block = silent_block();
        block.copy_from_slice(&buf[start..]);
        buf.clear();
        block
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::SeqCst)
    }
}

impl MicrophoneSource {
    /// Open an output stream that mirrors the input, gain-applied, when
    /// `passthrough` is set and `mode == mic`. Failure degrades to silence on
    /// the output side only; it never affects `read_block`.
    fn build_passthrough_stream(
        &self,
        host: &cpal::Host,
    ) -> Result<Box<dyn std::any::Any>, AudioError> {
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoInputDevice)?;
        let output_config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceConfig(e.to_string()))?;

        let ring = Arc::clone(&self.ring);
        let knobs = Arc::clone(&self.knobs);

        let stream = device
            .build_output_stream(
                &output_config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let gain = *knobs.gain.lock().unwrap();
                    let enabled = knobs.passthrough.load(Ordering::Relaxed);
                    let source = ring.lock().unwrap();
                    let available = source.len().min(data.len());
                    for (i, sample) in data.iter_mut().enumerate() {
                        *sample = if enabled && i < available {
                            source[source.len() - available + i] * gain
                        } else {
                            0.0
                        };
                    }
                },
                |err| tracing::warn!(error = %err, "passthrough output stream error"),
                None,
            )
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamStart(e.to_string()))?;
        Ok(Box::new(stream))
    }
}

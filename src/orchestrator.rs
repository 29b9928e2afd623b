//! The orchestrator (C8): the single-threaded main loop tying audio capture,
//! feature extraction, the effect registry, the LED transport, and the
//! status display together.
//!
//! Grounded on `notify::daemon::run`'s loop shape (load resources, a
//! `tokio::time::interval`-style render loop, a clear-frame-then-release
//! shutdown sequence) generalized from one render tick to this spec's
//! multi-tick loop (LED tick + LCD tick + watchdog) and from an async task to
//! a plain synchronous thread, per spec.md §5's concurrency model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use viz_audio::{SourceKind, SourceSwitch};
use viz_led::LedTransport;

use crate::config::Config;
use crate::display::{DisplaySink, StatusDisplay};
use crate::effect::{EffectParams, EffectRegistry};
use crate::features::FeatureExtractor;
use crate::state::{Mode, SharedState};

/// Cooperative shutdown flag, set by a signal handler; checked once per
/// iteration boundary alongside `SharedState.running`.
pub type ShutdownFlag = Arc<AtomicBool>;

pub struct Orchestrator<S: DisplaySink> {
    state: Arc<SharedState>,
    shutdown: ShutdownFlag,
    source: SourceSwitch,
    extractor: FeatureExtractor,
    effects: EffectRegistry,
    led: LedTransport,
    display: StatusDisplay<S>,
    bt_configured: bool,
    started_at: Instant,
    last_led_emit: Instant,
    last_lcd_emit: Instant,
}

impl<S: DisplaySink> Orchestrator<S> {
    pub fn new(
        state: Arc<SharedState>,
        shutdown: ShutdownFlag,
        config: &Config,
        led: LedTransport,
        display_sink: S,
    ) -> Self {
        let mut source = SourceSwitch::new(config.mic_device, config.bt_addr.clone(), config.passthrough);
        if let Err(err) = source.start_default() {
            tracing::warn!(error = %err, "microphone failed to start at boot, yielding silence until recovered");
        }

        let now = Instant::now();
        Self {
            extractor: FeatureExtractor::new(source.sample_rate()),
            effects: EffectRegistry::new(),
            led,
            display: StatusDisplay::new(display_sink),
            bt_configured: config.bt_addr.is_some(),
            source,
            state,
            shutdown,
            started_at: now,
            last_led_emit: now,
            last_lcd_emit: now,
        }
    }

    /// Drive the loop until `running` is cleared, either via a BLE patch or
    /// the process-level shutdown flag. Blocking; run this on its own
    /// thread, never inside the async runtime driving the BLE task.
    pub fn run(mut self) {
        let led_period = Duration::from_secs_f32(1.0 / crate::config::LED_FPS);
        let lcd_period = Duration::from_secs_f32(1.0 / crate::config::LCD_HZ);

        loop {
            let iteration_start = Instant::now();
            let snapshot = self.state.snapshot();

            if !snapshot.running || self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            self.reconcile_mode(&snapshot);

            self.source.set_gain(snapshot.gain);
            self.source
                .set_passthrough(matches!(snapshot.mode, Mode::Mic) && snapshot.passthrough);

            let block = self.source.read_block();
            let features = self.extractor.process(&block, snapshot.gain, snapshot.smoothing);

            let now = Instant::now();
            if now.duration_since(self.last_led_emit) >= led_period {
                let dt = now.duration_since(self.last_led_emit).as_secs_f32();
                self.last_led_emit = now;

                let params = EffectParams {
                    intensity: snapshot.intensity,
                    color_mode: snapshot.color_mode,
                    power: snapshot.brightness,
                };
                let frame = self.effects.update(snapshot.effect, &features, dt, &params);
                self.led.submit(frame);
            }

            if now.duration_since(self.last_lcd_emit) >= lcd_period {
                self.last_lcd_emit = now;
                self.display.render(&snapshot, &features);
            }

            std::thread::sleep(Duration::from_millis(1));

            let elapsed = iteration_start.elapsed();
            if elapsed > crate::config::WATCHDOG_WARN {
                tracing::warn!(
                    ?elapsed,
                    effect = ?snapshot.effect,
                    mode = ?snapshot.mode,
                    "orchestrator iteration exceeded watchdog threshold"
                );
            }
        }

        self.shutdown_sequence();
    }

    /// Switch the active audio source if the requested mode has changed.
    /// BT mode is only attempted when a device address is configured;
    /// otherwise the loop never leaves mic, matching spec.md §4.1/§8
    /// scenario 6 without even touching the source-switch machinery.
    fn reconcile_mode(&mut self, snapshot: &crate::state::StateSnapshot) {
        let desired = match snapshot.mode {
            Mode::Bt if self.bt_configured => SourceKind::Bluetooth,
            _ => SourceKind::Microphone,
        };

        if desired == self.source.current_kind() {
            return;
        }

        let outcome = self.source.switch_to(desired);
        if outcome.fell_back_to_mic {
            let message = outcome.error.unwrap_or_else(|| "source unavailable".to_string());
            tracing::warn!(error = %message, "falling back to microphone");
            self.state.set_status_line(&format!("BT unavailable: {message}"));
            self.state.set_mode(Mode::Mic);
        } else {
            self.state.set_status_line("");
        }
        self.extractor = FeatureExtractor::new(self.source.sample_rate());
    }

    fn shutdown_sequence(self) {
        tracing::info!("orchestrator shutting down");
        let Self { mut source, led, .. } = self;
        source.stop();
        led.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Features;
    use std::io;

    struct NullSink;
    impl DisplaySink for NullSink {
        fn push_frame(&mut self, _rgb565: &[u8]) -> io::Result<()> {
            Ok(())
        }
        fn width(&self) -> usize {
            crate::display::PANEL_WIDTH
        }
        fn height(&self) -> usize {
            crate::display::PANEL_HEIGHT
        }
    }

    fn silent_features() -> Features {
        Features {
            rms: 0.0,
            bands: [0.0; crate::features::NUM_BANDS],
            power_spectrum: vec![],
            bass: 0.0,
            mid: 0.0,
            treble: 0.0,
            sample_rate: 44_100,
            nfft: 1024,
        }
    }

    #[test]
    fn bt_mode_without_configured_address_never_leaves_mic() {
        let state = Arc::new(SharedState::new());
        state.update(&serde_json::json!({"mode": "bt"}));

        let config = Config {
            bt_addr: None,
            serial_port: "/dev/null".into(),
            serial_baud: 115_200,
            mic_device: None,
            fb_path: "/dev/null".into(),
            passthrough: false,
        };
        let mut source = SourceSwitch::new(config.mic_device, config.bt_addr.clone(), config.passthrough);
        let _ = source.start_default();

        let desired = match state.snapshot().mode {
            Mode::Bt if config.bt_addr.is_some() => SourceKind::Bluetooth,
            _ => SourceKind::Microphone,
        };
        assert_eq!(desired, SourceKind::Microphone);
        let _ = silent_features();
        let _ = source.read_block();
    }
}

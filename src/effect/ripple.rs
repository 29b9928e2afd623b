//! Concentric Gaussian wavefronts spawned on bass transients.
//!
//! Grounded on `examples/original_source/firmware/effects/ripple.py`'s
//! `RippleEffect`: a smoothed running-average of bass used as the rising-edge
//! baseline, a cooldown-gated trigger (rising edge over a delta, or a
//! combined bass+mid "beat" threshold), a bounded list of `(birth, strength)`
//! wavefronts each contributing a Gaussian ring that fades out over its TTL,
//! and the slow hue drift via `color_phase`.

use super::{hsv_to_rgb, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const COOLDOWN: f32 = 0.10;
const MIN_BASS: f32 = 0.18;
const RISE_DELTA: f32 = 0.06;
const BEAT_THRESHOLD: f32 = 0.28;
const TTL: f32 = 2.2;
const SPEED: f32 = 10.5;
const RING_WIDTH: f32 = 2.3;
const GAUSS: f32 = 0.55;
const MAX_WAVEFRONTS: usize = 16;

struct Wavefront {
    birth: f32,
    strength: f32,
}

pub struct Ripple {
    t: f32,
    last_bass: f32,
    last_trigger_t: f32,
    color_phase: f32,
    wavefronts: Vec<Wavefront>,
}

impl Ripple {
    pub fn new() -> Self {
        Self {
            t: 0.0,
            last_bass: 0.0,
            last_trigger_t: -999.0,
            color_phase: 0.0,
            wavefronts: Vec::new(),
        }
    }
}

impl Effect for Ripple {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        self.t += dt;
        self.color_phase += dt * 0.05;

        let bass = features.bass;
        let mid = features.mid;
        let beat = bass + 0.35 * mid;

        let prev_bass = self.last_bass;
        self.last_bass = 0.65 * self.last_bass + 0.35 * bass;

        if (self.t - self.last_trigger_t) > COOLDOWN
            && ((bass > prev_bass + RISE_DELTA && bass > MIN_BASS) || beat > BEAT_THRESHOLD)
        {
            if self.wavefronts.len() >= MAX_WAVEFRONTS {
                self.wavefronts.remove(0);
            }
            self.wavefronts.push(Wavefront {
                birth: self.t,
                strength: beat,
            });
            self.last_trigger_t = self.t;
        }

        let t = self.t;
        self.wavefronts.retain(|w| t - w.birth < TTL);

        let cx = (WIDTH - 1) as f32 / 2.0;
        let cy = (HEIGHT - 1) as f32 / 2.0;

        let mut grid = Grid::black();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let r = (dx * dx + dy * dy).sqrt();

                let mut val = 0.0f32;
                for w in &self.wavefronts {
                    let age = self.t - w.birth;
                    let ripple_r = age * SPEED;
                    let dist = (r - ripple_r).abs();
                    if dist < RING_WIDTH {
                        let wave = (-dist * dist / GAUSS).exp();
                        let fade = (1.0 - age / TTL).max(0.0);
                        val += wave * fade * w.strength;
                    }
                }
                val = val.min(1.0) * params.intensity;

                if val > 0.05 {
                    let base_hue = 0.5 + 0.35 * self.color_phase.sin();
                    let hue = ((base_hue + mid * 0.1).rem_euclid(1.0)) * 360.0;
                    let brightness = val * 0.3 * params.power;
                    grid.set(x, y, hsv_to_rgb(hue, 0.9, brightness));
                }
            }
        }
        grid.into_frame()
    }

    fn reset(&mut self) {
        self.t = 0.0;
        self.last_bass = 0.0;
        self.last_trigger_t = -999.0;
        self.color_phase = 0.0;
        self.wavefronts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ColorMode;

    fn features_with_bass(bass: f32, mid: f32) -> Features {
        Features {
            rms: 0.5,
            bands: [0.0; crate::features::NUM_BANDS],
            power_spectrum: vec![],
            bass,
            mid,
            treble: 0.0,
            sample_rate: 44_100,
            nfft: 1024,
        }
    }

    #[test]
    fn bass_transient_spawns_a_wavefront() {
        let mut ripple = Ripple::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        ripple.update(&features_with_bass(0.0, 0.0), 0.02, &params);
        ripple.update(&features_with_bass(0.5, 0.0), 0.02, &params);
        assert_eq!(ripple.wavefronts.len(), 1);
    }

    #[test]
    fn cooldown_blocks_back_to_back_triggers() {
        let mut ripple = Ripple::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        ripple.update(&features_with_bass(0.0, 0.0), 0.02, &params);
        ripple.update(&features_with_bass(0.5, 0.0), 0.01, &params);
        ripple.update(&features_with_bass(0.9, 0.0), 0.01, &params);
        assert_eq!(ripple.wavefronts.len(), 1);
    }

    #[test]
    fn wavefronts_expire_after_their_ttl() {
        let mut ripple = Ripple::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        ripple.update(&features_with_bass(0.0, 0.0), 0.02, &params);
        ripple.update(&features_with_bass(0.5, 0.0), 0.02, &params);
        assert_eq!(ripple.wavefronts.len(), 1);
        ripple.update(&features_with_bass(0.0, 0.0), TTL + 0.1, &params);
        assert!(ripple.wavefronts.is_empty());
    }

    #[test]
    fn reset_clears_wavefronts_and_phase() {
        let mut ripple = Ripple::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        ripple.update(&features_with_bass(0.0, 0.0), 0.02, &params);
        ripple.update(&features_with_bass(0.5, 0.0), 0.02, &params);
        ripple.reset();
        assert!(ripple.wavefronts.is_empty());
        assert_eq!(ripple.t, 0.0);
    }
}

//! Classic four-wave plasma field with audio-reactive hue shift.
//!
//! Grounded on `examples/original_source/firmware/effects/plasma.py`'s
//! `PlasmaEffect`: four offset sine waves averaged into a scalar, bass
//! controlling time speed, bass/mid shifting hue, and the deliberately dim
//! value range the original calls out as "DIMMED VERSION - nie oślepia".

use super::{hsv_to_rgb, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

pub struct Plasma {
    t: f32,
}

impl Plasma {
    pub fn new() -> Self {
        Self { t: 0.0 }
    }
}

impl Effect for Plasma {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        let speed = 1.2 + 5.0 * features.bass * params.intensity;
        self.t += dt * speed;

        let mut grid = Grid::black();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let xf = x as f32;
                let yf = y as f32;
                let v1 = (xf * 0.6 + self.t).sin();
                let v2 = (yf * 0.6 + self.t * 1.4).sin();
                let v3 = ((xf + yf) * 0.3 + self.t * 0.8).sin();
                let v4 = ((xf * xf + yf * yf).sqrt() * 0.4 + self.t * 1.6).sin();
                let plasma = (v1 + v2 + v3 + v4) / 4.0;

                let hue = ((plasma * 0.5 + 0.5 + features.bass * 0.4 + features.mid * 0.2).rem_euclid(1.0)) * 360.0;
                let sat = (0.85 + 0.15 * features.rms * 4.0).min(1.0);
                let val = (0.08 + 0.17 * params.intensity) * params.power;

                grid.set(x, y, hsv_to_rgb(hue, sat, val));
            }
        }
        grid.into_frame()
    }

    fn reset(&mut self) {
        self.t = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ColorMode;

    fn features() -> Features {
        Features {
            rms: 0.3,
            bands: [0.2; crate::features::NUM_BANDS],
            power_spectrum: vec![],
            bass: 0.4,
            mid: 0.2,
            treble: 0.1,
            sample_rate: 44_100,
            nfft: 1024,
        }
    }

    #[test]
    fn time_advances_faster_with_heavier_bass() {
        let mut quiet = Plasma::new();
        let mut loud = Plasma::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        let mut quiet_features = features();
        quiet_features.bass = 0.0;
        quiet.update(&quiet_features, 1.0, &params);

        let mut loud_features = features();
        loud_features.bass = 1.0;
        loud.update(&loud_features, 1.0, &params);

        assert!(loud.t > quiet.t);
    }

    #[test]
    fn stays_dim_even_at_full_intensity() {
        let mut plasma = Plasma::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        let frame = plasma.update(&features(), 0.02, &params);
        // max value channel should stay well below full brightness per the
        // deliberately dimmed formula (0.08 + 0.17 = 0.25 peak value).
        assert!(frame.payload().iter().all(|&b| b <= 90));
    }

    #[test]
    fn reset_zeroes_time() {
        let mut plasma = Plasma::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        plasma.update(&features(), 1.0, &params);
        plasma.reset();
        assert_eq!(plasma.t, 0.0);
    }
}

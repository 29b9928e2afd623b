//! 8-fold radial mandala: a ring pattern and a folded radial-line pattern
//! combined with a hard max, rotating with bass.
//!
//! Grounded on `examples/original_source/firmware/effects/kaleidoscope.py`'s
//! `KaleidoscopeEffect`: `n_folds = 8` angle folding, `ring_pattern` and
//! `radial_pattern` combined via `max(ring*0.7, radial*0.3)`, hue driven by
//! pattern/bass/mid/time, and the deliberately dim value cap the original
//! notes as "Ciemniej - było 0.4, teraz max 0.22".

use super::{hsv_to_rgb, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const N_FOLDS: f32 = 8.0;

pub struct Kaleidoscope {
    t: f32,
}

impl Kaleidoscope {
    pub fn new() -> Self {
        Self { t: 0.0 }
    }
}

impl Effect for Kaleidoscope {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        self.t += dt * (0.8 + 3.5 * features.bass);

        let cx = (WIDTH - 1) as f32 / 2.0;
        let cy = (HEIGHT - 1) as f32 / 2.0;
        let two_pi = 2.0 * std::f32::consts::PI;

        let mut grid = Grid::black();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let r = (dx * dx + dy * dy).sqrt();
                let theta = dy.atan2(dx);

                let theta_folded = (theta.rem_euclid(two_pi / N_FOLDS)) * N_FOLDS;

                let ring_pattern = (r * 1.2 + self.t).sin() * 0.5 + 0.5;
                let radial_pattern = (theta_folded * 4.0 + self.t * 0.6).sin() * 0.5 + 0.5;
                let pattern = (ring_pattern * 0.7).max(radial_pattern * 0.3);

                let hue = ((pattern * 0.6 + features.bass * 0.4 + features.mid * 0.2 + self.t * 0.1)
                    .rem_euclid(1.0))
                    * 360.0;
                let sat = (0.9 + 0.1 * features.treble).min(1.0);
                let val = pattern * 0.22 * params.intensity * params.power;

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
    fn heavier_bass_advances_time_faster() {
        let mut quiet = Kaleidoscope::new();
        let mut loud = Kaleidoscope::new();
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
    fn stays_dim_at_full_intensity() {
        let mut kaleidoscope = Kaleidoscope::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        let frame = kaleidoscope.update(&features(), 0.02, &params);
        assert!(frame.payload().iter().all(|&b| b <= 80));
    }

    #[test]
    fn reset_zeroes_time() {
        let mut kaleidoscope = Kaleidoscope::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        kaleidoscope.update(&features(), 1.0, &params);
        kaleidoscope.reset();
        assert_eq!(kaleidoscope.t, 0.0);
    }
}

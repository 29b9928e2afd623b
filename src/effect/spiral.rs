//! Rotating multi-armed spiral vortex.
//!
//! Grounded on `examples/original_source/firmware/effects/spiral.py`'s
//! `SpiralEffect`: polar-coordinate spiral phase `theta + r*0.6 - angle`,
//! rotation speed driven by bass/mid, a radial falloff window, a treble
//! pulsation multiplier, and hue tied to angle plus slow rotation drift.

use super::{hsv_to_rgb, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const ARMS: f32 = 5.0;

pub struct Spiral {
    angle: f32,
}

impl Spiral {
    pub fn new() -> Self {
        Self { angle: 0.0 }
    }
}

impl Effect for Spiral {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        let rotation_speed = 1.0 + 5.5 * features.bass * params.intensity + 2.0 * features.mid;
        self.angle += dt * rotation_speed;

        let cx = (WIDTH - 1) as f32 / 2.0;
        let cy = (HEIGHT - 1) as f32 / 2.0;

        let mut grid = Grid::black();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let r = (dx * dx + dy * dy).sqrt();
                let theta = dy.atan2(dx);

                let spiral = (theta + r * 0.6 - self.angle).rem_euclid(2.0 * std::f32::consts::PI);
                let mut brightness = ((spiral * ARMS).sin() * 0.5 + 0.5) * (1.0 - r / (WIDTH as f32 * 0.7));
                brightness = brightness.clamp(0.0, 1.0);
                brightness *= 0.8 + 0.2 * features.treble;

                let hue = ((theta / (2.0 * std::f32::consts::PI) + features.mid * 0.4 + self.angle * 0.05)
                    .rem_euclid(1.0))
                    * 360.0;
                let val = brightness * 0.28 * params.intensity * params.power;

                grid.set(x, y, hsv_to_rgb(hue, 0.9, val));
            }
        }
        grid.into_frame()
    }

    fn reset(&mut self) {
        self.angle = 0.0;
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
    fn heavy_bass_rotates_faster_than_silence() {
        let mut quiet = Spiral::new();
        let mut loud = Spiral::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        let mut quiet_features = features();
        quiet_features.bass = 0.0;
        quiet_features.mid = 0.0;
        quiet.update(&quiet_features, 1.0, &params);

        let mut loud_features = features();
        loud_features.bass = 1.0;
        loud.update(&loud_features, 1.0, &params);

        assert!(loud.angle > quiet.angle);
    }

    #[test]
    fn outer_corners_are_far_dimmer_than_the_brightest_pixel() {
        let mut spiral = Spiral::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        let frame = spiral.update(&features(), 0.02, &params);
        let payload = frame.payload();
        let corner_sum: u32 = payload[0..3].iter().map(|&b| b as u32).sum();
        let brightest = payload.chunks(3).map(|p| p.iter().map(|&b| b as u32).sum::<u32>()).max().unwrap();
        assert!(corner_sum <= brightest / 2);
    }

    #[test]
    fn reset_zeroes_angle() {
        let mut spiral = Spiral::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        spiral.update(&features(), 1.0, &params);
        spiral.reset();
        assert_eq!(spiral.angle, 0.0);
    }
}

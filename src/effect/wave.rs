//! A single sinusoidal line sweeping the matrix.
//!
//! Covers both `oscilloscope` and `wave` state values (spec.md §4.3.2
//! treats them as one visual behavior). Grounded on
//! `examples/original_source/firmware/effects/oscilloscope.py` and
//! `wave.py` (phase advances with mean band energy, amplitude scales with
//! RMS, hue drifts with x and elapsed time); the glow and edge-clamping are
//! this crate's own addition per spec.

use super::{hsv_to_rgb, scale_rgb, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const X_STEP: f32 = 0.6;
const GLOW_SCALE: f32 = 0.25;

pub struct Wave {
    phase: f32,
    elapsed: f32,
}

impl Wave {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            elapsed: 0.0,
        }
    }
}

impl Effect for Wave {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        self.elapsed += dt;
        let energy = mean(&features.bands);
        self.phase += dt * (2.0 + 6.0 * energy);

        let mid = (HEIGHT - 1) as f32 / 2.0;
        // Clamp amplitude so the curve never touches the top/bottom row.
        let max_amp = mid - 1.0;
        let amp = (max_amp * (features.rms * 12.0).min(1.0) * (0.5 + params.intensity)).max(0.0);

        let mut grid = Grid::black();
        for x in 0..WIDTH {
            let y_f = mid + amp * (self.phase + x as f32 * X_STEP).sin();
            let y = (y_f.round() as i32).clamp(0, HEIGHT as i32 - 1) as usize;

            let hue = ((x as f32 / (WIDTH - 1) as f32 + 0.05 * self.elapsed).rem_euclid(1.0)) * 360.0;
            let main = hsv_to_rgb(hue, 1.0, 0.9 * params.power.max(0.0).min(1.0));
            grid.set(x, y, main);

            let glow = scale_rgb(main, GLOW_SCALE);
            if y > 0 {
                grid.add(x, y - 1, glow);
            }
            if y + 1 < HEIGHT {
                grid.add(x, y + 1, glow);
            }
        }
        grid.into_frame()
    }

    fn reset(&mut self) {
        self.phase = 0.0;
        self.elapsed = 0.0;
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

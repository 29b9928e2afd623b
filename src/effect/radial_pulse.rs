//! Concentric ring expanding and contracting from the matrix center.
//!
//! Grounded on `examples/original_source/firmware/effects/radial_pulse.py`'s
//! `RadialPulseEffect` (ring radius driven by mean bass energy, ring band
//! width fixed, `color_for(v, t)` shading); the 0.05 visibility cutoff is
//! carried over unchanged.

use super::{color_for, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const CUTOFF: f32 = 0.05;

pub struct RadialPulse {
    elapsed: f32,
}

impl RadialPulse {
    pub fn new() -> Self {
        Self { elapsed: 0.0 }
    }
}

impl Effect for RadialPulse {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        self.elapsed += dt;

        let cx = (WIDTH - 1) as f32 / 2.0;
        let cy = (HEIGHT - 1) as f32 / 2.0;
        let r0 = 2.0 + 5.0 * features.bass * (0.5 + params.intensity);

        let mut grid = Grid::black();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let r = (dx * dx + dy * dy).sqrt();
                let v = (1.0 - (r - r0).abs()).max(0.0);
                if v > CUTOFF {
                    grid.set(x, y, color_for(v, self.elapsed, params.color_mode, params.power));
                }
            }
        }
        grid.into_frame()
    }

    fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

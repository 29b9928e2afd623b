//! 16-column scalar fire field: injected from the bands, diffused, cooled,
//! and scrolled upward each tick.
//!
//! The injection-and-shift mechanism is grounded on
//! `examples/original_source/firmware/effects/spectral_fire.py`'s
//! `SpectralFireEffect` (`field[1:] = field[:-1]`, `field[0]` reseeded from
//! `safe_bands` plus a small uniform flicker, `color_for(value, row*0.05)`
//! rendering); the horizontal 3-tap diffusion and height-scaled cooling are
//! this crate's own addition per specification.

use rand::Rng;

use super::{color_for, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const FLICKER: f32 = 0.02;
const DIFFUSE_SIDE: f32 = 0.55;
const DIFFUSE_CENTER: f32 = 1.0;
const COOL_BASE: f32 = 0.01;
const COOL_PER_ROW: f32 = 0.012;

pub struct SpectralFire {
    /// `field[y][x]`, `y = 0` is the freshly injected row.
    field: [[f32; WIDTH]; HEIGHT],
    elapsed: f32,
}

impl SpectralFire {
    pub fn new() -> Self {
        Self {
            field: [[0.0; WIDTH]; HEIGHT],
            elapsed: 0.0,
        }
    }
}

impl Effect for SpectralFire {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        self.elapsed += dt;
        let mut rng = rand::thread_rng();

        // Waterfall: each row's old value moves up one slot.
        for y in (1..HEIGHT).rev() {
            self.field[y] = self.field[y - 1];
        }
        for x in 0..WIDTH {
            let flicker = rng.gen_range(0.0..FLICKER);
            self.field[0][x] = (features.bands[x] * (0.6 + params.intensity) + flicker).clamp(0.0, 1.0);
        }

        // Diffuse and cool every row except the freshly injected bottom one.
        for y in 1..HEIGHT {
            let cool = (COOL_BASE + COOL_PER_ROW * y as f32).min(1.0);
            let mut row = [0.0f32; WIDTH];
            for x in 0..WIDTH {
                let left = if x > 0 { self.field[y][x - 1] } else { self.field[y][x] };
                let right = if x + 1 < WIDTH { self.field[y][x + 1] } else { self.field[y][x] };
                let blended =
                    (DIFFUSE_SIDE * left + DIFFUSE_CENTER * self.field[y][x] + DIFFUSE_SIDE * right)
                        / (2.0 * DIFFUSE_SIDE + DIFFUSE_CENTER);
                row[x] = (blended * (1.0 - cool)).max(0.0);
            }
            self.field[y] = row;
        }

        let mut grid = Grid::black();
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let v = self.field[y][x];
                if v > 0.02 {
                    grid.set(x, y, color_for(v, y as f32 * 0.05, params.color_mode, params.power));
                }
            }
        }
        grid.into_frame()
    }

    fn reset(&mut self) {
        self.field = [[0.0; WIDTH]; HEIGHT];
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ColorMode;

    fn loud_features() -> Features {
        Features {
            rms: 1.0,
            bands: [1.0; crate::features::NUM_BANDS],
            power_spectrum: vec![],
            bass: 1.0,
            mid: 1.0,
            treble: 1.0,
            sample_rate: 44_100,
            nfft: 1024,
        }
    }

    #[test]
    fn bottom_row_receives_injected_energy() {
        let mut effect = SpectralFire::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        effect.update(&loud_features(), 0.02, &params);
        assert!(effect.field[0].iter().all(|&v| v > 0.5));
    }

    #[test]
    fn energy_propagates_upward_after_several_ticks() {
        let mut effect = SpectralFire::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        for _ in 0..5 {
            effect.update(&loud_features(), 0.02, &params);
        }
        assert!(effect.field[4].iter().any(|&v| v > 0.0));
    }

    #[test]
    fn reset_clears_the_field() {
        let mut effect = SpectralFire::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Rainbow,
            power: 1.0,
        };
        effect.update(&loud_features(), 0.02, &params);
        effect.reset();
        assert!(effect.field.iter().all(|row| row.iter().all(|&v| v == 0.0)));
    }
}

//! 16 columns, one per band, rising from the bottom.
//!
//! Qualitative behavior grounded on
//! `examples/original_source/firmware/effects/bars.py`'s `BarsEffect`
//! (per-column level + peak state, attack/decay asymmetry, blank-frame
//! fallback); constants and the exact rise/decay/gradient formulas follow
//! this crate's own specification.

use super::{rise_or_decay, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const RISE_ALPHA: f32 = 0.6;
const DECAY_PX_PER_SEC: f32 = 3.8;
const PEAK_DECAY_PX_PER_SEC: f32 = 2.0;
const V_BASE: f32 = 0.14;
const V_TOP: f32 = 0.30;

pub struct Bars {
    level: [f32; WIDTH],
    peak: [f32; WIDTH],
    /// Optional discrete column permutation for physical strips that start
    /// mid-matrix; identity by default.
    column_order: [usize; WIDTH],
}

impl Bars {
    pub fn new() -> Self {
        let mut column_order = [0usize; WIDTH];
        for (i, slot) in column_order.iter_mut().enumerate() {
            *slot = i;
        }
        Self {
            level: [0.0; WIDTH],
            peak: [0.0; WIDTH],
            column_order,
        }
    }
}

impl Effect for Bars {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        let mut grid = Grid::black();

        for x in 0..WIDTH {
            let band = features.bands[x];
            let target = band * (HEIGHT - 1) as f32 * (0.75 + 1.25 * params.intensity);
            self.level[x] = rise_or_decay(self.level[x], target, RISE_ALPHA, DECAY_PX_PER_SEC, dt);
            self.peak[x] = rise_or_decay(self.peak[x], self.level[x], 1.0, PEAK_DECAY_PX_PER_SEC, dt);
        }

        let hue_slot = |x: usize| -> f32 {
            let slot = (x * super::SEVEN_HUES.len()) / WIDTH;
            super::SEVEN_HUES[slot.min(super::SEVEN_HUES.len() - 1)]
        };

        for src_x in 0..WIDTH {
            let x = self.column_order[src_x];
            let height = self.level[src_x].round() as usize;
            let hue = hue_slot(src_x);

            for y in 0..=height.min(HEIGHT - 1) {
                let v = V_BASE + (y as f32 / (HEIGHT - 1) as f32) * (V_TOP - V_BASE);
                let (r, g, b) = super::hsv_to_rgb(hue, 1.0, v * params.power);
                grid.set(x, y, (r, g, b));
            }

            let peak_y = (self.peak[src_x].round() as usize).min(HEIGHT - 1);
            let (r, g, b) = super::hsv_to_rgb(hue, 1.0, params.power);
            grid.set(x, peak_y, (r, g, b));
        }

        grid.into_frame()
    }

    fn reset(&mut self) {
        self.level = [0.0; WIDTH];
        self.peak = [0.0; WIDTH];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ColorMode;

    fn features_with_band0(value: f32) -> Features {
        let mut bands = [0.0f32; crate::features::NUM_BANDS];
        bands[0] = value;
        Features {
            rms: 0.5,
            bands,
            power_spectrum: vec![],
            bass: value,
            mid: 0.0,
            treble: 0.0,
            sample_rate: 44_100,
            nfft: 1024,
        }
    }

    #[test]
    fn loud_band_zero_lights_column_zero_not_column_fifteen() {
        let mut bars = Bars::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        let features = features_with_band0(1.0);
        let mut frame = viz_led::Frame::black();
        for _ in 0..10 {
            frame = bars.update(&features, 0.05, &params);
        }
        let payload = frame.payload();
        let col0_bottom = 0usize; // (0*16+0)*3
        let col15_bottom = 45usize; // (0*16+15)*3
        assert!(payload[col0_bottom] > 0 || payload[col0_bottom + 1] > 0 || payload[col0_bottom + 2] > 0);
        assert_eq!(&payload[col15_bottom..col15_bottom + 3], &[0, 0, 0]);
    }

    #[test]
    fn reset_clears_level_and_peak() {
        let mut bars = Bars::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        bars.update(&features_with_band0(1.0), 0.05, &params);
        bars.reset();
        assert_eq!(bars.level, [0.0; WIDTH]);
        assert_eq!(bars.peak, [0.0; WIDTH]);
    }
}

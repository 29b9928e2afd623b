//! Column-per-band VU meter with a green-to-red gradient and a bright peak
//! marker.
//!
//! Attack/decay smoothing is grounded on
//! `examples/original_source/firmware/effects/vu_meter.py`'s `VUMeterEffect`
//! (`attack = 0.7`, linear px/s decay, an RMS silence gate); this crate uses
//! the column-per-band layout and peak marker specified for this system
//! rather than the original's row-per-band layout.

use super::{rise_or_decay, Effect, EffectParams, Grid, HEIGHT, WIDTH};
use crate::features::Features;

const ATTACK: f32 = 0.7;
const DECAY_PX_PER_SEC: f32 = 2.2;
const PEAK_DECAY_PX_PER_SEC: f32 = 0.9;
const RMS_GATE: f32 = 0.003;
const V_BASE: f32 = 0.15;
const V_TOP: f32 = 0.40;

pub struct VuMeter {
    level: [f32; WIDTH],
    peak: [f32; WIDTH],
}

impl VuMeter {
    pub fn new() -> Self {
        Self {
            level: [0.0; WIDTH],
            peak: [0.0; WIDTH],
        }
    }
}

fn hue_for_column(x: usize) -> f32 {
    // green (120) at the low bands, red (0) at the high bands.
    120.0 * (1.0 - x as f32 / (WIDTH - 1) as f32)
}

impl Effect for VuMeter {
    fn update(&mut self, features: &Features, dt: f32, params: &EffectParams) -> viz_led::Frame {
        let mut grid = Grid::black();

        let gated = features.rms < RMS_GATE;
        for x in 0..WIDTH {
            let band = if gated { 0.0 } else { features.bands[x] };
            let target = band * (HEIGHT - 1) as f32 * (0.75 + 1.25 * params.intensity);
            self.level[x] = rise_or_decay(self.level[x], target, ATTACK, DECAY_PX_PER_SEC, dt);
            self.peak[x] = rise_or_decay(self.peak[x], self.level[x], 1.0, PEAK_DECAY_PX_PER_SEC, dt);
        }

        for x in 0..WIDTH {
            let hue = hue_for_column(x);
            let height = self.level[x].round() as usize;
            for y in 0..=height.min(HEIGHT - 1) {
                let v = V_BASE + (y as f32 / (HEIGHT - 1) as f32) * (V_TOP - V_BASE);
                let (r, g, b) = super::hsv_to_rgb(hue, 1.0, v * params.power);
                grid.set(x, y, (r, g, b));
            }

            let peak_y = (self.peak[x].round() as usize).min(HEIGHT - 1);
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

    fn features_with_band0(value: f32, rms: f32) -> Features {
        let mut bands = [0.0f32; crate::features::NUM_BANDS];
        bands[0] = value;
        Features {
            rms,
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
    fn silence_below_gate_collapses_levels() {
        let mut meter = VuMeter::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        for _ in 0..30 {
            meter.update(&features_with_band0(1.0, 0.001), 0.05, &params);
        }
        assert_eq!(meter.level[0], 0.0);
    }

    #[test]
    fn loud_band_rises_and_peak_trails_above_level() {
        let mut meter = VuMeter::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        for _ in 0..10 {
            meter.update(&features_with_band0(1.0, 0.5), 0.05, &params);
        }
        assert!(meter.level[0] > 0.0);
        assert!(meter.peak[0] >= meter.level[0]);
    }

    #[test]
    fn reset_clears_level_and_peak() {
        let mut meter = VuMeter::new();
        let params = EffectParams {
            intensity: 1.0,
            color_mode: ColorMode::Auto,
            power: 1.0,
        };
        meter.update(&features_with_band0(1.0, 0.5), 0.05, &params);
        meter.reset();
        assert_eq!(meter.level, [0.0; WIDTH]);
        assert_eq!(meter.peak, [0.0; WIDTH]);
    }
}

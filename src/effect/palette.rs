//! Shared color mapping used by every effect.
//!
//! The HSV→RGB conversion itself is grounded on `src/color.rs::hsv_to_rgb`;
//! `color_for` is the mode-dispatch function spec'd for the effect registry.

use crate::state::ColorMode;

/// `h`: hue in `[0, 360)`. `s`: saturation in `[0,1]`. `v`: value in `[0,1]`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        (((r + m) * 255.0).clamp(0.0, 255.0)) as u8,
        (((g + m) * 255.0).clamp(0.0, 255.0)) as u8,
        (((b + m) * 255.0).clamp(0.0, 255.0)) as u8,
    )
}

/// Map a normalized value `v` (and, for `auto`, the elapsed time `t` in
/// seconds) through the active color mode to an RGB pixel, with `power` as a
/// final multiplicative brightness cap.
pub fn color_for(v: f32, t: f32, mode: ColorMode, power: f32) -> (u8, u8, u8) {
    let v = v.clamp(0.0, 1.0);
    let (r, g, b) = match mode {
        ColorMode::Mono => {
            let level = v * power;
            let byte = (level.clamp(0.0, 1.0) * 255.0) as u8;
            (byte, byte, byte)
        }
        ColorMode::Rainbow => {
            let hue = v * 360.0;
            let value = v.max(0.08);
            hsv_to_rgb(hue, 1.0, value)
        }
        ColorMode::Auto => {
            let hue = ((0.15 + 0.55 * v + 0.06 * t).rem_euclid(1.0)) * 360.0;
            let value = v.max(0.08);
            hsv_to_rgb(hue, 1.0, value)
        }
    };

    if matches!(mode, ColorMode::Mono) {
        (r, g, b)
    } else {
        scale_rgb((r, g, b), power)
    }
}

/// 7-hue palette spread used by `bars`/`vu_meter` to pick a per-column hue.
pub const SEVEN_HUES: [f32; 7] = [0.0, 30.0, 60.0, 120.0, 180.0, 240.0, 300.0];

pub fn scale_rgb(pixel: (u8, u8, u8), scale: f32) -> (u8, u8, u8) {
    let scale = scale.clamp(0.0, 1.0);
    (
        (pixel.0 as f32 * scale) as u8,
        (pixel.1 as f32 * scale) as u8,
        (pixel.2 as f32 * scale) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues_round_trip() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), (0, 255, 0));
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), (0, 0, 255));
    }

    #[test]
    fn power_caps_brightness() {
        let (r, _, _) = color_for(1.0, 0.0, ColorMode::Rainbow, 0.5);
        assert!(r <= 128);
    }

    #[test]
    fn mono_is_grayscale() {
        let (r, g, b) = color_for(0.5, 0.0, ColorMode::Mono, 1.0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }
}

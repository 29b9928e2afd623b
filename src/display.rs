//! The TFT status display (C7): a passive bitmap composer plus a sink that
//! pushes the composed buffer out as RGB565.
//!
//! The panel's pixel-level initialization (SPI/GPIO sequencing) is out of
//! scope per spec.md §1 — only the display contract is specified here, the
//! same "write bytes to a path the kernel driver owns" shape `viz_led` uses
//! for the serial port. Layout, font, and two-mode behavior are grounded on
//! `examples/original_source/firmware/ui/lcd_ui.py`'s `LCDUI.render`.

mod font;

use std::fs::OpenOptions;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use crate::features::Features;
use crate::state::{Mode, StateSnapshot};

pub const PANEL_WIDTH: usize = 320;
pub const PANEL_HEIGHT: usize = 240;

const BG: (u8, u8, u8) = (0, 0, 0);
const ACCENT: (u8, u8, u8) = (30, 140, 255);
const TEXT: (u8, u8, u8) = (230, 240, 255);
const SUBTLE: (u8, u8, u8) = (110, 130, 150);
const GRID: (u8, u8, u8) = (0, 50, 90);

const GLYPH_SCALE: usize = 2;
const GLYPH_ADVANCE: usize = (font::GLYPH_WIDTH + 1) * GLYPH_SCALE;
const LINE_ADVANCE: usize = (font::GLYPH_HEIGHT + 2) * GLYPH_SCALE;

/// Anything that can accept a fully composed RGB565 frame for the panel's
/// native dimensions. The external adapter satisfies this; out of scope here
/// is how it turns those bytes into SPI transactions.
pub trait DisplaySink {
    fn push_frame(&mut self, rgb565: &[u8]) -> io::Result<()>;
    fn width(&self) -> usize;
    fn height(&self) -> usize;
}

/// Writes the composed buffer to a framebuffer device path, the common
/// Linux contract for SPI TFT HATs under the `fbtft`/`fbcon` driver family.
pub struct FramebufferSink {
    path: std::path::PathBuf,
}

impl FramebufferSink {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DisplaySink for FramebufferSink {
    fn push_frame(&mut self, rgb565: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(rgb565)
    }

    fn width(&self) -> usize {
        PANEL_WIDTH
    }

    fn height(&self) -> usize {
        PANEL_HEIGHT
    }
}

/// An RGB canvas the size of the panel, flattened to RGB565 bytes on demand.
struct Canvas {
    pixels: Vec<(u8, u8, u8)>,
}

impl Canvas {
    fn new() -> Self {
        Self {
            pixels: vec![BG; PANEL_WIDTH * PANEL_HEIGHT],
        }
    }

    fn set(&mut self, x: usize, y: usize, color: (u8, u8, u8)) {
        if x < PANEL_WIDTH && y < PANEL_HEIGHT {
            self.pixels[y * PANEL_WIDTH + x] = color;
        }
    }

    fn fill_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, color: (u8, u8, u8)) {
        for y in y0..(y0 + h).min(PANEL_HEIGHT) {
            for x in x0..(x0 + w).min(PANEL_WIDTH) {
                self.set(x, y, color);
            }
        }
    }

    fn stroke_rect(&mut self, x0: usize, y0: usize, w: usize, h: usize, color: (u8, u8, u8)) {
        if w == 0 || h == 0 {
            return;
        }
        let x1 = x0 + w - 1;
        let y1 = y0 + h - 1;
        for x in x0..=x1 {
            self.set(x, y0, color);
            self.set(x, y1, color);
        }
        for y in y0..=y1 {
            self.set(x0, y, color);
            self.set(x1, y, color);
        }
    }

    fn draw_char(&mut self, x0: usize, y0: usize, ch: char, color: (u8, u8, u8)) {
        let Some(rows) = font::glyph(ch) else {
            return;
        };
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_WIDTH {
                if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                    for sy in 0..GLYPH_SCALE {
                        for sx in 0..GLYPH_SCALE {
                            self.set(x0 + col * GLYPH_SCALE + sx, y0 + row * GLYPH_SCALE + sy, color);
                        }
                    }
                }
            }
        }
    }

    fn draw_text(&mut self, x0: usize, y0: usize, text: &str, color: (u8, u8, u8)) {
        let mut x = x0;
        for ch in text.chars() {
            self.draw_char(x, y0, ch, color);
            x += GLYPH_ADVANCE;
        }
    }

    /// Render `value` with `decimals` fixed digits after the point, reusing
    /// the font's digit/`.`/`-` glyphs rather than pulling in a formatting crate.
    fn draw_number(&mut self, x0: usize, y0: usize, label: &str, value: f32, decimals: usize, color: (u8, u8, u8)) {
        let text = format!("{label}{value:.decimals$}");
        self.draw_text(x0, y0, &text, color);
    }

    fn into_rgb565(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PANEL_WIDTH * PANEL_HEIGHT * 2);
        for (r, g, b) in self.pixels {
            let value: u16 = ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3);
            out.push((value >> 8) as u8);
            out.push((value & 0xFF) as u8);
        }
        out
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn effect_name(kind: crate::state::EffectKind) -> &'static str {
    use crate::state::EffectKind::*;
    match kind {
        Bars => "BARS",
        Wave => "WAVE",
        RadialPulse => "RADIAL",
        SpectralFire => "FIRE",
        VuMeter => "VU",
        Plasma => "PLASMA",
        Spiral => "SPIRAL",
        Ripple => "RIPPLE",
        Kaleidoscope => "KALEID",
    }
}

/// Compose one frame of the two-mode UI from a state snapshot and the
/// latest features, returning an RGB565 buffer covering the whole panel.
pub fn compose(state: &StateSnapshot, features: &Features) -> Vec<u8> {
    let mut canvas = Canvas::new();

    canvas.stroke_rect(0, 0, PANEL_WIDTH, 36, GRID);
    canvas.draw_text(10, 8, "VISUALIZER", TEXT);
    canvas.draw_text(
        PANEL_WIDTH - 14 * GLYPH_ADVANCE,
        8,
        &format!("FX:{}", effect_name(state.effect)),
        SUBTLE,
    );

    let tab_y0 = 42;
    let tab_h = 32;
    let mic_active = matches!(state.mode, Mode::Mic);
    canvas.stroke_rect(10, tab_y0, 90, tab_h, if mic_active { ACCENT } else { GRID });
    canvas.draw_text(28, tab_y0 + 10, "MIC", if mic_active { ACCENT } else { SUBTLE });
    canvas.stroke_rect(110, tab_y0, 90, tab_h, if mic_active { GRID } else { ACCENT });
    canvas.draw_text(128, tab_y0 + 10, "BT", if mic_active { SUBTLE } else { ACCENT });

    let body_y0 = 82;
    let body_h = PANEL_HEIGHT - 10 - body_y0;
    canvas.stroke_rect(10, body_y0, PANEL_WIDTH - 20, body_h, GRID);

    match state.mode {
        Mode::Mic => {
            canvas.draw_text(18, body_y0 + 8, "AUDIO", ACCENT);
            canvas.draw_number(18, body_y0 + 1 * LINE_ADVANCE + 8, "RMS ", features.rms, 3, TEXT);
            canvas.draw_number(18, body_y0 + 2 * LINE_ADVANCE + 8, "B ", features.bass, 2, SUBTLE);
            canvas.draw_number(18, body_y0 + 3 * LINE_ADVANCE + 8, "M ", features.mid, 2, SUBTLE);
            canvas.draw_number(18, body_y0 + 4 * LINE_ADVANCE + 8, "T ", features.treble, 2, SUBTLE);
        }
        Mode::Bt => {
            if state.connected {
                canvas.draw_text(18, body_y0 + 8, "NOW PLAYING", ACCENT);
                let artist = if state.artist.is_empty() { "UNKNOWN ARTIST" } else { &state.artist };
                canvas.draw_text(18, body_y0 + 1 * LINE_ADVANCE + 8, truncate(artist, 24), TEXT);
                let title = if state.title.is_empty() { "UNKNOWN TITLE" } else { &state.title };
                canvas.draw_text(18, body_y0 + 2 * LINE_ADVANCE + 8, truncate(title, 28), TEXT);
                if !state.album.is_empty() {
                    canvas.draw_text(18, body_y0 + 3 * LINE_ADVANCE + 8, truncate(&state.album, 28), SUBTLE);
                }
                canvas.draw_text(18, body_y0 + 5 * LINE_ADVANCE + 8, "DEVICE", ACCENT);
                canvas.draw_text(18, body_y0 + 6 * LINE_ADVANCE + 8, truncate(&state.device_name, 24), SUBTLE);
            } else {
                canvas.draw_text(18, body_y0 + 1 * LINE_ADVANCE + 8, "NOT CONNECTED", SUBTLE);
                if !state.status_line.is_empty() {
                    canvas.draw_text(18, body_y0 + 2 * LINE_ADVANCE + 8, truncate(&state.status_line, 36), SUBTLE);
                }
            }
        }
    }

    let footer_y0 = PANEL_HEIGHT - 34;
    canvas.stroke_rect(10, footer_y0, PANEL_WIDTH - 20, 24, GRID);
    canvas.draw_number(18, footer_y0 + 6, "INT ", state.intensity, 2, SUBTLE);
    canvas.draw_number(120, footer_y0 + 6, "GAIN ", state.gain, 2, SUBTLE);
    canvas.draw_number(230, footer_y0 + 6, "SM ", state.smoothing, 2, SUBTLE);

    canvas.into_rgb565()
}

/// Owns the sink and drives it from a periodic tick; invoked from the
/// orchestrator whenever the LCD tick has elapsed.
pub struct StatusDisplay<S: DisplaySink> {
    sink: S,
}

impl<S: DisplaySink> StatusDisplay<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn render(&mut self, state: &StateSnapshot, features: &Features) {
        let frame = compose(state, features);
        if let Err(err) = self.sink.push_frame(&frame) {
            tracing::warn!(error = %err, "status display push failed");
        }
    }
}

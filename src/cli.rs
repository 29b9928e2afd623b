//! CLI flag surface. Grounded on `iot_driver_linux::cli`'s `clap` derive
//! `Parser` shape, reduced to the flag set spec.md §6 / SPEC_FULL.md §6 name:
//! one flag per environment-variable override, `clap`'s `env` attribute
//! supplying the CLI-over-env-over-default layering directly.

use clap::Parser;

use crate::config::{DEFAULT_FB_PATH, DEFAULT_SERIAL_BAUD, DEFAULT_SERIAL_PORT};

#[derive(Parser, Debug)]
#[command(name = "auravis")]
#[command(author, version, about = "Audio-reactive LED matrix visualizer firmware")]
pub struct Cli {
    /// Paired Bluetooth A2DP source device address (e.g. AA:BB:CC:DD:EE:FF).
    #[arg(long, env = "AURAVIS_BT_ADDR")]
    pub bt_addr: Option<String>,

    /// Serial device path to the LED microcontroller.
    #[arg(long, env = "AURAVIS_SERIAL_PORT", default_value = DEFAULT_SERIAL_PORT)]
    pub serial_port: String,

    /// Serial baud rate, must match the microcontroller's firmware.
    #[arg(long, env = "AURAVIS_SERIAL_BAUD", default_value_t = DEFAULT_SERIAL_BAUD)]
    pub serial_baud: u32,

    /// Input device index to capture from; unset runs the preference search.
    #[arg(long, env = "AURAVIS_MIC_DEVICE")]
    pub mic_device: Option<usize>,

    /// Framebuffer device path the TFT status display writes RGB565 to.
    #[arg(long, env = "AURAVIS_FB_PATH", default_value = DEFAULT_FB_PATH)]
    pub fb_path: String,

    /// Mirror the (gain-applied) microphone input straight to the default
    /// output device while in mic mode.
    #[arg(long)]
    pub passthrough: bool,
}

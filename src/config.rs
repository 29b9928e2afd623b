//! Runtime configuration: CLI flags over the spec's environment-variable
//! override set over hardcoded defaults, the same three-tier layering
//! `iot_driver_linux::cli` applies to its own device/transport flags.

use std::path::PathBuf;

use crate::cli::Cli;

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_SERIAL_BAUD: u32 = 115_200;
pub const DEFAULT_FB_PATH: &str = "/dev/fb1";

pub const LED_FPS: f32 = 20.0;
pub const LCD_HZ: f32 = 5.0;
pub const WATCHDOG_WARN: std::time::Duration = std::time::Duration::from_millis(250);

/// Fully resolved configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bt_addr: Option<String>,
    pub serial_port: String,
    pub serial_baud: u32,
    pub mic_device: Option<usize>,
    pub fb_path: PathBuf,
    pub passthrough: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            bt_addr: cli.bt_addr.clone(),
            serial_port: cli.serial_port.clone(),
            serial_baud: cli.serial_baud,
            mic_device: cli.mic_device,
            fb_path: PathBuf::from(&cli.fb_path),
            passthrough: cli.passthrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_apply_with_no_flags_or_env() {
        let cli = Cli::parse_from(["auravis"]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.serial_port, DEFAULT_SERIAL_PORT);
        assert_eq!(config.serial_baud, DEFAULT_SERIAL_BAUD);
        assert!(config.bt_addr.is_none());
        assert!(config.mic_device.is_none());
        assert!(!config.passthrough);
    }

    #[test]
    fn explicit_flags_override_defaults() {
        let cli = Cli::parse_from([
            "auravis",
            "--serial-port",
            "/dev/ttyACM0",
            "--serial-baud",
            "921600",
            "--bt-addr",
            "AA:BB:CC:DD:EE:FF",
            "--mic-device",
            "2",
            "--passthrough",
        ]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.serial_port, "/dev/ttyACM0");
        assert_eq!(config.serial_baud, 921_600);
        assert_eq!(config.bt_addr.as_deref(), Some("AA:BB:CC:DD:EE:FF"));
        assert_eq!(config.mic_device, Some(2));
        assert!(config.passthrough);
    }
}

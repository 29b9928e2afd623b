//! `auravis` — firmware entry point. Parses configuration, opens the LED
//! transport, spawns the BLE control task, and hands the rest of the
//! process over to the synchronous orchestrator loop.
//!
//! Grounded on `iot_driver_linux::main`'s shape (parse CLI, open the
//! hardware transport, dispatch into the rest of the program) and
//! `notify::daemon::run`'s ctrlc-triggered graceful shutdown.

mod ble;
mod cli;
mod config;
mod display;
mod effect;
mod error;
mod features;
mod orchestrator;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use cli::Cli;
use config::Config;
use display::FramebufferSink;
use error::AuravisError;
use orchestrator::Orchestrator;
use state::SharedState;

/// Default local BlueZ adapter object path. Not yet exposed as a flag —
/// single-adapter boards are the only target hardware this firmware ships on.
const BLUEZ_ADAPTER_PATH: &str = "/org/bluez/hci0";

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli);

    let state = Arc::new(SharedState::new());
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            tracing::info!("shutdown signal received");
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    let led = viz_led::LedTransport::open(&config.serial_port, config.serial_baud)
        .map_err(AuravisError::Led)?;
    let display_sink = FramebufferSink::open(&config.fb_path);

    // BLE runs in its own task on the tokio runtime; a setup or transport
    // failure here is logged and the task exits, but the audio/LED pipeline
    // keeps running without the control plane (spec.md §7: BLE is the
    // control plane, not the hot path).
    let ble_state = Arc::clone(&state);
    let ble_task = tokio::spawn(async move {
        if let Err(err) = ble::run(ble_state, BLUEZ_ADAPTER_PATH.to_string()).await {
            tracing::error!(error = %err, "BLE peripheral task exited");
        }
    });

    let orchestrator = Orchestrator::new(
        Arc::clone(&state),
        Arc::clone(&shutdown),
        &config,
        led,
        display_sink,
    );

    // The orchestrator's loop is a plain synchronous thread, not a tokio
    // task (spec.md §5); `spawn_blocking` parks it on the blocking pool
    // while this task keeps driving the BLE future.
    let orchestrator_handle = tokio::task::spawn_blocking(move || orchestrator.run());

    orchestrator_handle.await?;

    // Release the BLE task's notify loop once the orchestrator has stopped,
    // regardless of which side of the shutdown (BLE patch or ctrlc) triggered it.
    state.update(&serde_json::json!({"running": false}));
    let _ = ble_task.await;

    Ok(())
}

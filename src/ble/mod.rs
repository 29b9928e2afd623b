//! The BLE control endpoint (C6): a BlueZ GATT peripheral exposing CMD
//! (write) and STATE (read/notify) characteristics, implemented directly
//! against `org.bluez`'s D-Bus API via `zbus`.
//!
//! Grounded on `notify::dbus`'s `#[interface]`-struct-per-bus-object shape
//! and `notify::daemon::run`'s `zbus::connection::Builder` usage, generalized
//! from the teacher's custom `org.monsgeek.Notify1` interface to BlueZ's own
//! `GattService1`/`GattCharacteristic1`/`LEAdvertisement1`/`ObjectManager`
//! interfaces. What methods/properties each needs is taken from
//! `examples/original_source/firmware/bt/gatt_server.py`, the Python
//! original's direct (`dbus-next`) implementation of the same contract.

mod advertisement;
mod gatt;

use std::sync::Arc;
use std::time::Duration;

use zbus::connection::Builder;
use zbus::Connection;

use crate::state::SharedState;
use advertisement::Advertisement;
use gatt::{Application, CmdCharacteristic, GattService1, StateCharacteristic};

pub const SERVICE_UUID: &str = "12345678-1234-5678-1234-56789abcdef0";
pub const CMD_CHAR_UUID: &str = "12345678-1234-5678-1234-56789abcdef9";
pub const STATE_CHAR_UUID: &str = "12345678-1234-5678-1234-56789abcdef8";
pub const LOCAL_NAME: &str = "Visualizer";

const APP_BASE_PATH: &str = "/org/auravis/visualizer";
const SERVICE_PATH: &str = "/org/auravis/visualizer/service0";
const CMD_CHAR_PATH: &str = "/org/auravis/visualizer/service0/cmd";
const STATE_CHAR_PATH: &str = "/org/auravis/visualizer/service0/state";
const ADVERTISEMENT_PATH: &str = "/org/auravis/visualizer/advertisement0";

const STATE_NOTIFY_PERIOD: Duration = Duration::from_millis(500);

/// Register the GATT application and LE advertisement on the given adapter
/// and run the periodic STATE notify timer until `state.running` is false.
///
/// Runs to completion inside its own `tokio` task; the orchestrator's main
/// loop never awaits it directly (spec.md §5: the BLE event handler is one
/// of the four long-lived activities, independent of the synchronous loop).
pub async fn run(state: Arc<SharedState>, adapter_path: String) -> zbus::Result<()> {
    // Fires immediately after a successful CMD write so STATE notifies don't
    // wait out the rest of the periodic tick (spec.md §4.6); the periodic
    // ticker below is what keeps clients converging if a notify is missed.
    let notify_wake = Arc::new(tokio::sync::Notify::new());

    let connection = Builder::system()?
        .serve_at(APP_BASE_PATH, Application::new())?
        .serve_at(SERVICE_PATH, GattService1::new(SERVICE_UUID))?
        .serve_at(
            CMD_CHAR_PATH,
            CmdCharacteristic::new(Arc::clone(&state), Arc::clone(&notify_wake)),
        )?
        .serve_at(STATE_CHAR_PATH, StateCharacteristic::new(Arc::clone(&state)))?
        .serve_at(
            ADVERTISEMENT_PATH,
            Advertisement::new(LOCAL_NAME.to_string(), vec![SERVICE_UUID.to_string()]),
        )?
        .build()
        .await?;

    register_application(&connection, &adapter_path).await?;
    register_advertisement(&connection, &adapter_path).await?;

    tracing::info!(adapter = %adapter_path, "BLE peripheral advertising as '{LOCAL_NAME}'");

    let mut ticker = tokio::time::interval(STATE_NOTIFY_PERIOD);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = notify_wake.notified() => {}
        }
        if !state.snapshot().running {
            break;
        }
        if let Err(err) = notify_state(&connection).await {
            tracing::warn!(error = %err, "STATE notify failed");
        }
    }

    unregister_best_effort(&connection, &adapter_path).await;
    Ok(())
}

async fn register_application(connection: &Connection, adapter_path: &str) -> zbus::Result<()> {
    let proxy = zbus::Proxy::new(
        connection,
        "org.bluez",
        adapter_path,
        "org.bluez.GattManager1",
    )
    .await?;
    let options: std::collections::HashMap<String, zbus::zvariant::Value> =
        std::collections::HashMap::new();
    proxy
        .call_method(
            "RegisterApplication",
            &(zbus::zvariant::ObjectPath::try_from(APP_BASE_PATH)?, options),
        )
        .await?;
    Ok(())
}

async fn register_advertisement(connection: &Connection, adapter_path: &str) -> zbus::Result<()> {
    let proxy = zbus::Proxy::new(
        connection,
        "org.bluez",
        adapter_path,
        "org.bluez.LEAdvertisingManager1",
    )
    .await?;
    let options: std::collections::HashMap<String, zbus::zvariant::Value> =
        std::collections::HashMap::new();
    proxy
        .call_method(
            "RegisterAdvertisement",
            &(
                zbus::zvariant::ObjectPath::try_from(ADVERTISEMENT_PATH)?,
                options,
            ),
        )
        .await?;
    Ok(())
}

async fn unregister_best_effort(connection: &Connection, adapter_path: &str) {
    if let Ok(proxy) =
        zbus::Proxy::new(connection, "org.bluez", adapter_path, "org.bluez.GattManager1").await
    {
        let _ = proxy
            .call_method(
                "UnregisterApplication",
                &(zbus::zvariant::ObjectPath::try_from(APP_BASE_PATH).unwrap(),),
            )
            .await;
    }
    if let Ok(proxy) = zbus::Proxy::new(
        connection,
        "org.bluez",
        adapter_path,
        "org.bluez.LEAdvertisingManager1",
    )
    .await
    {
        let _ = proxy
            .call_method(
                "UnregisterAdvertisement",
                &(zbus::zvariant::ObjectPath::try_from(ADVERTISEMENT_PATH).unwrap(),),
            )
            .await;
    }
}

async fn notify_state(connection: &Connection) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, StateCharacteristic>(STATE_CHAR_PATH)
        .await?;
    let iface = iface_ref.get().await;
    iface.notify_changed(iface_ref.signal_emitter()).await
}

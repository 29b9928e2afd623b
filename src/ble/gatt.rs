//! The GATT object tree: one `ObjectManager` root, one `GattService1`, and
//! the CMD/STATE `GattCharacteristic1` objects. Shapes follow
//! `notify::dbus::NotifyInterface` (a plain struct holding an `Arc<Mutex<_>>`
//! / `Arc<SharedState>`, `#[interface]`-annotated methods taking `&self`).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use zbus::object_server::SignalEmitter;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};
use zbus::{fdo, interface};

use crate::state::SharedState;

/// `org.freedesktop.DBus.ObjectManager` root. The managed-object tree is
/// fixed at construction (one service, two characteristics) — nothing here
/// is added or removed at runtime.
pub struct Application {
    objects: HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>>,
}

impl Application {
    pub fn new() -> Self {
        let mut objects = HashMap::new();

        let mut service_props = HashMap::new();
        service_props.insert(
            "UUID".to_string(),
            Value::from(super::SERVICE_UUID).try_to_owned().unwrap(),
        );
        service_props.insert("Primary".to_string(), Value::from(true).try_to_owned().unwrap());
        let mut service_ifaces = HashMap::new();
        service_ifaces.insert("org.bluez.GattService1".to_string(), service_props);
        objects.insert(path(super::SERVICE_PATH), service_ifaces);

        objects.insert(
            path(super::CMD_CHAR_PATH),
            characteristic_props(super::CMD_CHAR_UUID, &["write", "write-without-response"]),
        );
        objects.insert(
            path(super::STATE_CHAR_PATH),
            characteristic_props(super::STATE_CHAR_UUID, &["read", "notify"]),
        );

        Self { objects }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

fn path(s: &str) -> OwnedObjectPath {
    ObjectPath::try_from(s).unwrap().into()
}

fn characteristic_props(uuid: &str, flags: &[&str]) -> HashMap<String, HashMap<String, OwnedValue>> {
    let mut props = HashMap::new();
    props.insert("UUID".to_string(), Value::from(uuid).try_to_owned().unwrap());
    props.insert(
        "Service".to_string(),
        Value::from(ObjectPath::try_from(super::SERVICE_PATH).unwrap())
            .try_to_owned()
            .unwrap(),
    );
    let flag_strings: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
    props.insert("Flags".to_string(), Value::from(flag_strings).try_to_owned().unwrap());
    let mut ifaces = HashMap::new();
    ifaces.insert("org.bluez.GattCharacteristic1".to_string(), props);
    ifaces
}

#[interface(name = "org.freedesktop.DBus.ObjectManager")]
impl Application {
    async fn get_managed_objects(
        &self,
    ) -> HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>> {
        self.objects.clone()
    }
}

/// `org.bluez.GattService1`: the single primary service advertising the
/// control characteristics.
pub struct GattService1 {
    uuid: String,
}

impl GattService1 {
    pub fn new(uuid: &str) -> Self {
        Self { uuid: uuid.to_string() }
    }
}

#[interface(name = "org.bluez.GattService1")]
impl GattService1 {
    #[zbus(property)]
    fn uuid(&self) -> &str {
        &self.uuid
    }

    #[zbus(property)]
    fn primary(&self) -> bool {
        true
    }
}

/// CMD characteristic: write-only, applies a JSON patch directly to
/// `SharedState`. Grounded on `gatt_server.py`'s `_CmdCharacteristic.WriteValue`
/// — malformed or non-object payloads are silently dropped, never faulted.
pub struct CmdCharacteristic {
    state: Arc<SharedState>,
    notify_wake: Arc<Notify>,
}

impl CmdCharacteristic {
    pub fn new(state: Arc<SharedState>, notify_wake: Arc<Notify>) -> Self {
        Self { state, notify_wake }
    }
}

#[interface(name = "org.bluez.GattCharacteristic1")]
impl CmdCharacteristic {
    #[zbus(property)]
    fn uuid(&self) -> &str {
        super::CMD_CHAR_UUID
    }

    #[zbus(property)]
    fn service(&self) -> ObjectPath<'_> {
        ObjectPath::try_from(super::SERVICE_PATH).unwrap()
    }

    #[zbus(property)]
    fn flags(&self) -> Vec<String> {
        vec!["write".to_string(), "write-without-response".to_string()]
    }

    async fn read_value(&self, _options: HashMap<String, Value<'_>>) -> fdo::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn write_value(&self, value: Vec<u8>, _options: HashMap<String, Value<'_>>) -> fdo::Result<()> {
        let Ok(text) = std::str::from_utf8(&value) else {
            return Ok(());
        };
        let Ok(patch) = serde_json::from_str::<serde_json::Value>(text) else {
            return Ok(());
        };
        self.state.update(&patch);
        // spec.md §4.6: a successful CMD write schedules a STATE notify
        // rather than waiting for the periodic ~2 Hz timer.
        self.notify_wake.notify_one();
        Ok(())
    }
}

/// STATE characteristic: read/notify, serializes a `SharedState` snapshot as
/// compact JSON. The orchestrator's BLE task calls `notify_changed` both
/// right after a CMD write and on the periodic ~2 Hz timer (spec.md §4.6).
pub struct StateCharacteristic {
    state: Arc<SharedState>,
    notifying: Mutex<bool>,
}

impl StateCharacteristic {
    pub fn new(state: Arc<SharedState>) -> Self {
        Self {
            state,
            notifying: Mutex::new(false),
        }
    }

    fn state_json(&self) -> Vec<u8> {
        serde_json::to_vec(&self.state.snapshot()).unwrap_or_default()
    }

    /// Emit a `PropertiesChanged` signal for `Value`, the mechanism BlueZ
    /// uses to forward a GATT notify to subscribed clients.
    pub async fn notify_changed(&self, emitter: &SignalEmitter<'_>) -> zbus::Result<()> {
        self.value_changed(emitter).await
    }
}

#[interface(name = "org.bluez.GattCharacteristic1")]
impl StateCharacteristic {
    #[zbus(property)]
    fn uuid(&self) -> &str {
        super::STATE_CHAR_UUID
    }

    #[zbus(property)]
    fn service(&self) -> ObjectPath<'_> {
        ObjectPath::try_from(super::SERVICE_PATH).unwrap()
    }

    #[zbus(property)]
    fn flags(&self) -> Vec<String> {
        vec!["read".to_string(), "notify".to_string()]
    }

    #[zbus(property)]
    async fn notifying(&self) -> bool {
        *self.notifying.lock().await
    }

    #[zbus(property)]
    fn value(&self) -> Vec<u8> {
        self.state_json()
    }

    async fn read_value(&self, _options: HashMap<String, Value<'_>>) -> fdo::Result<Vec<u8>> {
        Ok(self.state_json())
    }

    async fn start_notify(&self) {
        *self.notifying.lock().await = true;
    }

    async fn stop_notify(&self) {
        *self.notifying.lock().await = false;
    }
}

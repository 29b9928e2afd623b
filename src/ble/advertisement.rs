//! `org.bluez.LEAdvertisement1`: a minimal peripheral advertisement carrying
//! the local name and service UUID list, per `gatt_server.py`'s
//! `_Advertisement`.

use zbus::interface;

pub struct Advertisement {
    local_name: String,
    service_uuids: Vec<String>,
}

impl Advertisement {
    pub fn new(local_name: String, service_uuids: Vec<String>) -> Self {
        Self {
            local_name,
            service_uuids,
        }
    }
}

#[interface(name = "org.bluez.LEAdvertisement1")]
impl Advertisement {
    #[zbus(property, name = "Type")]
    fn type_(&self) -> &str {
        "peripheral"
    }

    #[zbus(property, name = "LocalName")]
    fn local_name(&self) -> &str {
        &self.local_name
    }

    #[zbus(property, name = "ServiceUUIDs")]
    fn service_uuids(&self) -> Vec<String> {
        self.service_uuids.clone()
    }

    #[zbus(property, name = "Includes")]
    fn includes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Called by BlueZ when the advertisement is released (adapter reset,
    /// process shutdown via `UnregisterAdvertisement`).
    fn release(&self) {
        tracing::debug!("LE advertisement released by BlueZ");
    }
}

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;

use crate::polling::{PollingClient, SensorKind, Subscription};
use crate::utils::constants::{DOMAIN, MANUFACTURER, MODEL};

pub const UNIT_KILOWATT: &str = "kW";
pub const DEVICE_CLASS_POWER: &str = "power";
pub const STATE_UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeviceInfo {
    pub identifiers: Vec<(String, String)>,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

impl DeviceInfo {
    pub fn for_client(client: &PollingClient) -> Self {
        Self {
            identifiers: vec![(DOMAIN.to_owned(), client.unique_id().to_owned())],
            name: client.name().to_owned(),
            manufacturer: MANUFACTURER.to_owned(),
            model: MODEL.to_owned(),
        }
    }
}

/// State document of one entity, as served over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct EntityState {
    pub unique_id: String,
    pub name: String,
    pub sensor: SensorKind,
    /// kilowatts, or `"unknown"`
    pub state: Value,
    pub unit_of_measurement: &'static str,
    pub device_class: &'static str,
    pub icon: &'static str,
    pub device: DeviceInfo,
}

/// Passive view of one reading.
///
/// The displayed value only moves when the owning client signals new data.
#[derive(Debug)]
pub struct SensorEntity {
    kind: SensorKind,
    unique_id: String,
    name: String,
    device: DeviceInfo,
    state: Arc<RwLock<Option<f64>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl SensorEntity {
    pub fn attach(kind: SensorKind, client: &PollingClient) -> Arc<Self> {
        let state = Arc::new(RwLock::new(None));
        let subscription = {
            let state = state.clone();
            let readings = client.readings();
            client.subscribe(move || *state.write() = readings.get(kind))
        };

        Arc::new(Self {
            kind,
            unique_id: format!("{}-{}", client.unique_id(), kind.display_name()),
            name: format!("{} {}", client.name(), kind.display_name()),
            device: DeviceInfo::for_client(client),
            state,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    /// Stop following the client. Idempotent.
    pub fn detach(&self) {
        self.subscription.lock().take();
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.lock().is_some()
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn state(&self) -> Option<f64> {
        *self.state.read()
    }

    pub fn to_state(&self) -> EntityState {
        EntityState {
            unique_id: self.unique_id.clone(),
            name: self.name.clone(),
            sensor: self.kind,
            state: self
                .state()
                .map(Value::from)
                .unwrap_or_else(|| Value::from(STATE_UNKNOWN)),
            unit_of_measurement: UNIT_KILOWATT,
            device_class: DEVICE_CLASS_POWER,
            icon: self.kind.icon(),
            device: self.device.clone(),
        }
    }
}

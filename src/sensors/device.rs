use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::devices::DeviceConfig;
use crate::config::settings::PollingConfig;
use crate::helpers::time::Clock;
use crate::polling::{PeriodicUpdate, PollingClient, PollingOptions, SensorKind};
use crate::sensors::entity::SensorEntity;

/// One configured device: its client, its two entities and the driver ticking it.
#[derive(Debug)]
pub struct Device {
    client: Arc<PollingClient>,
    entities: Vec<Arc<SensorEntity>>,
    periodic: PeriodicUpdate,
}

impl Device {
    pub fn client_from_config(
        unique_id: &str,
        device: &DeviceConfig,
        polling: &PollingConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<PollingClient> {
        let credentials = device
            .credentials()
            .with_context(|| format!("device '{}': cannot resolve credentials", unique_id))?;
        let options = PollingOptions {
            phantom_interval_seconds: polling.phantom_interval_seconds,
            safety_margin_seconds: polling.safety_margin_seconds,
            http_timeout_ms: polling.http_timeout_ms,
        };
        PollingClient::new(
            unique_id,
            device.display_name(),
            credentials,
            device.endpoints(),
            options,
            clock,
        )
    }

    /// Attach the entities, run one update right away, then start ticking.
    pub async fn setup(client: Arc<PollingClient>, scan_interval: Duration) -> Self {
        let entities = SensorKind::ALL
            .iter()
            .map(|kind| SensorEntity::attach(*kind, &client))
            .collect();

        client.update().await;
        let periodic = PeriodicUpdate::start(client.clone(), scan_interval);
        info!(client = %client.unique_id(), signal = %client.signal_name(), "device set up");

        Self { client, entities, periodic }
    }

    pub fn client(&self) -> &Arc<PollingClient> {
        &self.client
    }

    pub fn entities(&self) -> &[Arc<SensorEntity>] {
        &self.entities
    }

    pub async fn unload(self) {
        self.periodic.stop().await;
        for entity in &self.entities {
            entity.detach();
        }
        info!(client = %self.client.unique_id(), "device unloaded");
    }
}

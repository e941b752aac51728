use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;
use crate::sensors::entity::SensorEntity;
use crate::server::sensor_routes::SensorsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub sensors_state: SensorsState,
}

/// Router serving `/metrics` (when enabled) and the sensor states.
pub async fn router(
    settings_config: &SettingsConfig,
    entities: Vec<Arc<SensorEntity>>,
) -> Result<Router> {
    let metrics = get_metrics().await;
    let state = AppState {
        metrics_state: MetricsState::new(metrics.registry.clone()),
        sensors_state: SensorsState::new(entities)?,
    };

    Ok(Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .merge(state.sensors_state.router())
        .with_state(state))
}

/// Start one Axum server and serve until the listener fails.
pub async fn start(
    settings_config: &SettingsConfig,
    entities: Vec<Arc<SensorEntity>>,
) -> Result<()> {
    let app = router(settings_config, entities).await?;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("http server listening on {}", bind_addr);

    get_metrics().await.up.set(1);
    axum::serve(listener, app).await.context("http server failed")?;
    Ok(())
}

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use crate::sensors::entity::{EntityState, SensorEntity};
use crate::server::server::AppState;

/// Read-only HTTP view of every registered sensor entity.
#[derive(Clone, Default)]
pub struct SensorsState {
    entities: Arc<Vec<Arc<SensorEntity>>>,
    by_id: Arc<HashMap<String, usize>>,
}

impl SensorsState {
    pub fn new(entities: Vec<Arc<SensorEntity>>) -> Result<Self> {
        let mut by_id = HashMap::new();
        for (index, entity) in entities.iter().enumerate() {
            if by_id.insert(entity.unique_id().to_owned(), index).is_some() {
                return Err(anyhow!("duplicate sensor unique id '{}'", entity.unique_id()));
            }
        }
        Ok(Self {
            entities: Arc::new(entities),
            by_id: Arc::new(by_id),
        })
    }

    pub fn router(&self) -> Router<AppState> {
        info!("serving {} sensors under /sensors", self.entities.len());
        Router::new()
            .route("/sensors", get(list_sensors))
            .route("/sensors/{unique_id}", get(get_sensor))
    }
}

async fn list_sensors(State(state): State<AppState>) -> Json<Vec<EntityState>> {
    Json(state.sensors_state.entities.iter().map(|e| e.to_state()).collect())
}

async fn get_sensor(State(state): State<AppState>, Path(unique_id): Path<String>) -> Response {
    let sensors = &state.sensors_state;
    match sensors.by_id.get(&unique_id).and_then(|index| sensors.entities.get(*index)) {
        Some(entity) => Json(entity.to_state()).into_response(),
        None => {
            debug!("sensor '{}' not found", unique_id);
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

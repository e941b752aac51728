#[cfg(test)]
mod test {

    use std::sync::Arc;

    use httpmock::MockServer;
    use reqwest::StatusCode;
    use serde_json::Value;

    use crate::config::settings::SettingsConfig;
    use crate::polling::SensorKind;
    use crate::sensors::entity::SensorEntity;
    use crate::server::server::router;
    use crate::tests::common::{
        build_client, endpoints_for, mock_password_auth, mock_power, power_body, spawn_axum,
        ManualClock, LIVE_PATH, PHANTOM_PATH, T0,
    };

    fn settings(metrics_enabled: bool) -> SettingsConfig {
        let yaml = format!(
            r#"
metrics:
  path: /metrics
  is_enabled: {}
"#,
            metrics_enabled
        );
        serde_yaml::from_str(&yaml).expect("settings yaml")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn serves_sensor_states_and_metrics() {
        let vendor = MockServer::start_async().await;
        mock_password_auth(&vendor, 200, 3600).await;
        mock_power(&vendor, PHANTOM_PATH, 200, &power_body(15.0)).await;
        mock_power(&vendor, LIVE_PATH, 200, &power_body(-250.0)).await;

        let client = build_client("routes-kitchen", endpoints_for(&vendor.base_url()), ManualClock::at(T0), 5000);
        let entities: Vec<Arc<SensorEntity>> = SensorKind::ALL
            .iter()
            .map(|kind| SensorEntity::attach(*kind, &client))
            .collect();
        client.update().await;

        let app = router(&settings(true), entities).await.expect("router");
        let (_handle, addr) = spawn_axum(app).await;
        let http = reqwest::Client::new();

        let list: Vec<Value> = http
            .get(format!("http://{}/sensors", addr))
            .send()
            .await
            .expect("list request")
            .json()
            .await
            .expect("list json");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["unique_id"], "routes-kitchen-Power Usage");
        assert_eq!(list[0]["state"], 0.25);
        assert_eq!(list[1]["state"], 0.015);

        let one = http
            .get(format!("http://{}/sensors/routes-kitchen-Phantom%20Load", addr))
            .send()
            .await
            .expect("get request");
        assert_eq!(one.status(), StatusCode::OK);
        let one: Value = one.json().await.expect("get json");
        assert_eq!(one["name"], "Loop Phantom Load");
        assert_eq!(one["unit_of_measurement"], "kW");

        let missing = http
            .get(format!("http://{}/sensors/nope", addr))
            .send()
            .await
            .expect("missing request");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let metrics = http
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .expect("metrics request");
        assert_eq!(metrics.status(), StatusCode::OK);
        let body = metrics.text().await.expect("metrics body");
        assert!(body.contains("loopagent_"));
        assert!(body.contains("routes-kitchen"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unknown_state_and_disabled_metrics() {
        let vendor = MockServer::start_async().await;
        let client = build_client("routes-idle", endpoints_for(&vendor.base_url()), ManualClock::at(T0), 5000);
        let entity = SensorEntity::attach(SensorKind::PowerUsage, &client);

        let app = router(&settings(false), vec![entity]).await.expect("router");
        let (_handle, addr) = spawn_axum(app).await;
        let http = reqwest::Client::new();

        let one: Value = http
            .get(format!("http://{}/sensors/routes-idle-Power%20Usage", addr))
            .send()
            .await
            .expect("get request")
            .json()
            .await
            .expect("get json");
        assert_eq!(one["state"], "unknown");

        let metrics = http
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .expect("metrics request");
        assert_eq!(metrics.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn duplicate_entity_ids_are_rejected() {
        let vendor = MockServer::start_async().await;
        let client = build_client("routes-dup", endpoints_for(&vendor.base_url()), ManualClock::at(T0), 5000);
        let entities = vec![
            SensorEntity::attach(SensorKind::PowerUsage, &client),
            SensorEntity::attach(SensorKind::PowerUsage, &client),
        ];

        let err = router(&settings(false), entities).await.expect_err("duplicate ids");
        assert!(err.to_string().contains("routes-dup-Power Usage"));
    }
}

//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks polling cadence, server, metrics and logging settings
//! - Checks every device: id, credentials and vendor endpoint overrides

use reqwest::Url;
use std::path::Path;
use tracing::{error, info};

use crate::config::devices::{DeviceConfig, SecretValue, ServiceConfig};
use crate::config::settings::{PollingConfig, SettingsConfig};
use crate::observability::metrics::get_metrics;

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    // Validate settings
    validate_settings(&cfg.settings, &mut errors);

    // Devices must not be empty
    if cfg.devices.is_empty() {
        errors.push("config: 'devices' is empty; at least one device required".to_string());
    }

    for (device_id, device_cfg) in &cfg.devices {
        validate_device(device_id, device_cfg, &mut errors);
    }

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc_by(errors.len() as u64);
        errors.sort();
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    validate_polling("settings.polling", &settings.polling, errors);

    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    // metrics endpoint start with '/'
    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    // logging level
    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_polling(path: &str, polling: &PollingConfig, errors: &mut Vec<String>) {
    if polling.scan_interval_seconds == 0 {
        errors.push(format!("{}.scan_interval_seconds must be > 0", path));
    }
    if polling.phantom_interval_seconds < polling.scan_interval_seconds {
        errors.push(format!(
            "{}.phantom_interval_seconds ({}) must be >= scan_interval_seconds ({})",
            path, polling.phantom_interval_seconds, polling.scan_interval_seconds
        ));
    }
    if polling.http_timeout_ms == 0 {
        errors.push(format!("{}.http_timeout_ms must be > 0", path));
    }
    if polling.safety_margin_seconds > 60 * 60 * 24 {
        errors.push(format!(
            "{}.safety_margin_seconds ({}) is unreasonably large",
            path, polling.safety_margin_seconds
        ));
    }
}

/// DEVICE BASICS
fn validate_device(device_id: &str, device: &DeviceConfig, errors: &mut Vec<String>) {
    if device_id.trim().is_empty() || device_id.chars().any(char::is_whitespace) {
        errors.push(format!(
            "devices['{}']: id must be non-empty and contain no whitespace",
            device_id
        ));
    }
    if let Some(name) = &device.name {
        if name.trim().is_empty() {
            errors.push(format!("devices['{}'].name cannot be empty", device_id));
        }
    }

    validate_secret_value(&format!("devices['{}'].username", device_id), &device.username, errors);
    validate_secret_value(&format!("devices['{}'].password", device_id), &device.password, errors);

    if let Some(vendor) = &device.vendor {
        if let Some(client_id) = &vendor.client_id {
            if client_id.trim().is_empty() {
                errors.push(format!("devices['{}'].vendor.client_id cannot be empty", device_id));
            }
        }
        for (field, url) in vendor.urls() {
            match Url::parse(url) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
                Ok(parsed) => errors.push(format!(
                    "devices['{}'].vendor.{}: unsupported scheme '{}'",
                    device_id,
                    field,
                    parsed.scheme()
                )),
                Err(e) => errors.push(format!(
                    "devices['{}'].vendor.{}: invalid url '{}': {}",
                    device_id, field, url, e
                )),
            }
        }
    }
}

fn validate_secret_value(path: &str, v: &SecretValue, errors: &mut Vec<String>) {
    match v {
        SecretValue::Plain(value) | SecretValue::Literal { value } => {
            if value.trim().is_empty() {
                errors.push(format!("{}: literal value cannot be empty", path));
            }
        }
        SecretValue::FromEnv { from_env } => {
            if from_env.trim().is_empty() {
                errors.push(format!("{}: env name cannot be empty", path));
            }
        }
        SecretValue::FromFile { path: p } => {
            if p.trim().is_empty() {
                errors.push(format!("{}: from_file path cannot be empty", path));
            } else if !Path::new(p).is_file() {
                errors.push(format!("{}: file '{}' does not exist", path, p));
            }
        }
    }
}

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::{env, fs};

use crate::config::settings::SettingsConfig;
use crate::polling::client::VendorEndpoints;
use crate::session::auth::IdentityEndpoint;
use crate::session::Credentials;
use crate::utils::constants::{CLIENT_ID, DEFAULT_DEVICE_NAME, IDENTITY_ENDPOINT, LIVE_ENDPOINT, PHANTOM_ENDPOINT};


/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    /// keyed by the stable unique id of each monitored device
    pub devices: HashMap<String, DeviceConfig>,
}

/// ================================
/// Devices
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    pub name: Option<String>,
    pub username: SecretValue,
    pub password: SecretValue,
    pub vendor: Option<VendorConfig>,
}

impl DeviceConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_DEVICE_NAME)
    }

    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials::new(self.username.resolve()?, self.password.resolve()?))
    }

    pub fn endpoints(&self) -> VendorEndpoints {
        self.vendor.clone().unwrap_or_default().into()
    }
}

/// Vendor endpoint overrides; anything left out falls back to the production API.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VendorConfig {
    pub identity_url: Option<String>,
    pub client_id: Option<String>,
    pub live_url: Option<String>,
    pub phantom_url: Option<String>,
}

impl VendorConfig {
    pub fn urls(&self) -> [(&'static str, &str); 3] {
        [
            ("identity_url", self.identity_url.as_deref().unwrap_or(IDENTITY_ENDPOINT)),
            ("live_url", self.live_url.as_deref().unwrap_or(LIVE_ENDPOINT)),
            ("phantom_url", self.phantom_url.as_deref().unwrap_or(PHANTOM_ENDPOINT)),
        ]
    }
}

impl From<VendorConfig> for VendorEndpoints {
    fn from(cfg: VendorConfig) -> Self {
        VendorEndpoints {
            identity: IdentityEndpoint {
                url: cfg.identity_url.unwrap_or_else(|| IDENTITY_ENDPOINT.to_owned()),
                client_id: cfg.client_id.unwrap_or_else(|| CLIENT_ID.to_owned()),
            },
            live_url: cfg.live_url.unwrap_or_else(|| LIVE_ENDPOINT.to_owned()),
            phantom_url: cfg.phantom_url.unwrap_or_else(|| PHANTOM_ENDPOINT.to_owned()),
        }
    }
}

/// Credential value sources
#[derive(Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretValue {
    Plain(String),
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretValue::Plain(_) | SecretValue::Literal { .. } => f.write_str("Literal(***)"),
            SecretValue::FromEnv { from_env } => f.debug_struct("FromEnv").field("from_env", from_env).finish(),
            SecretValue::FromFile { path } => f.debug_struct("FromFile").field("path", path).finish(),
        }
    }
}

impl SecretValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            SecretValue::Plain(value) | SecretValue::Literal { value } => Ok(value.to_owned()),
            SecretValue::FromEnv { from_env } => env::var(from_env)
                .map_err(|err| anyhow!("env var '{}': {}", from_env, err)),
            SecretValue::FromFile { path } => fs::read_to_string(path)
                .map(|content| content.trim().to_string())
                .map_err(|err| anyhow!("secret file '{}': {}", path, err)),
        }
    }
}

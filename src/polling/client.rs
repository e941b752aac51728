use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, IF_MODIFIED_SINCE};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::{FetchError, PollError};
use crate::helpers::time::{get_instant, http_date, Clock};
use crate::observability::metrics::get_metrics;
use crate::polling::readings::{watts_to_kilowatts, Readings, ReadingsHandle, SensorKind};
use crate::polling::subscribers::{Subscribers, Subscription};
use crate::session::auth::IdentityEndpoint;
use crate::session::{Credentials, TokenManager};
use crate::utils::constants::{
    CLIENT_ID, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_PHANTOM_INTERVAL_SECS, DEFAULT_SAFETY_MARGIN_SECS,
    IDENTITY_ENDPOINT, LIVE_ENDPOINT, PHANTOM_ENDPOINT, SIGNAL_NAME_PREFIX, USER_AGENT,
};

static LIVE_MSG: &str = "live";
static PHANTOM_MSG: &str = "phantom_load";

/// Where the vendor API lives.
#[derive(Debug, Clone)]
pub struct VendorEndpoints {
    pub identity: IdentityEndpoint,
    pub live_url: String,
    pub phantom_url: String,
}

impl Default for VendorEndpoints {
    fn default() -> Self {
        Self {
            identity: IdentityEndpoint {
                url: IDENTITY_ENDPOINT.to_owned(),
                client_id: CLIENT_ID.to_owned(),
            },
            live_url: LIVE_ENDPOINT.to_owned(),
            phantom_url: PHANTOM_ENDPOINT.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PollingOptions {
    pub phantom_interval_seconds: u64,
    pub safety_margin_seconds: u64,
    pub http_timeout_ms: u64,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            phantom_interval_seconds: DEFAULT_PHANTOM_INTERVAL_SECS,
            safety_margin_seconds: DEFAULT_SAFETY_MARGIN_SECS,
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DataEndpoint {
    Live,
    Phantom,
}

impl DataEndpoint {
    fn label(&self) -> &'static str {
        match self {
            DataEndpoint::Live => LIVE_MSG,
            DataEndpoint::Phantom => PHANTOM_MSG,
        }
    }
}

#[derive(Deserialize)]
struct PowerSample {
    power: f64,
}

/// Mutable per-tick state, only touched while a tick holds the lock.
#[derive(Debug)]
struct TickState {
    tokens: TokenManager,
    phantom_polled_at: Option<i64>,
    last_fetch_at: Option<i64>,
    outage: bool,
}

/// Polls one device and fans out fresh readings to its subscribers.
#[derive(Debug)]
pub struct PollingClient {
    unique_id: String,
    name: String,
    http: Client,
    endpoints: VendorEndpoints,
    phantom_interval_seconds: i64,
    clock: Arc<dyn Clock>,
    state: Mutex<TickState>,
    readings: ReadingsHandle,
    subscribers: Subscribers,
}

impl PollingClient {
    pub fn new(
        unique_id: impl Into<String>,
        name: impl Into<String>,
        credentials: Credentials,
        endpoints: VendorEndpoints,
        options: PollingOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let unique_id = unique_id.into();
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(options.http_timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        let tokens = TokenManager::new(
            unique_id.clone(),
            http.clone(),
            endpoints.identity.clone(),
            credentials,
            clock.clone(),
            options.safety_margin_seconds,
        );

        Ok(Self {
            subscribers: Subscribers::new(format!("{}_{}", SIGNAL_NAME_PREFIX, unique_id)),
            unique_id,
            name: name.into(),
            http,
            endpoints,
            phantom_interval_seconds: options.phantom_interval_seconds as i64,
            clock,
            state: Mutex::new(TickState {
                tokens,
                phantom_polled_at: None,
                last_fetch_at: None,
                outage: false,
            }),
            readings: ReadingsHandle::default(),
        })
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signal_name(&self) -> &str {
        self.subscribers.signal_name()
    }

    pub fn readings(&self) -> ReadingsHandle {
        self.readings.clone()
    }

    pub fn power_usage(&self) -> Option<f64> {
        self.readings.get(SensorKind::PowerUsage)
    }

    pub fn phantom_load(&self) -> Option<f64> {
        self.readings.get(SensorKind::PhantomLoad)
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.tokens.is_authenticated()
    }

    pub async fn last_fetch_at(&self) -> Option<i64> {
        self.state.lock().await.last_fetch_at
    }

    /// Run one tick. Never fails; every error ends up in the readings or the log.
    ///
    /// A call made while another tick is still running is dropped.
    pub async fn update(&self) {
        let metrics = get_metrics().await;
        let Ok(mut state) = self.state.try_lock() else {
            debug!(client = %self.unique_id, "previous tick still in flight, skipping");
            metrics.ticks.with_label_values(&[self.unique_id.as_str(), "skipped"]).inc();
            return;
        };

        let outcome = match self.poll(&mut state).await {
            Ok(()) => {
                if state.outage {
                    info!(client = %self.unique_id, "vendor API reachable again");
                }
                state.outage = false;
                "ok"
            }
            Err(PollError::Session(err)) if !err.is_transport() => {
                warn!(client = %self.unique_id, error = %err, "no valid session, skipping data requests");
                metrics.ticks.with_label_values(&[self.unique_id.as_str(), "session_failed"]).inc();
                return;
            }
            Err(err) => {
                self.readings.update(Readings::mark_unknown);
                state.phantom_polled_at = None;
                if !state.outage {
                    warn!("Updating the properties of '{}' failed: {}", self.unique_id, err);
                    metrics.outage_warnings.with_label_values(&[self.unique_id.as_str()]).inc();
                }
                state.outage = true;
                "unreachable"
            }
        };
        drop(state);

        metrics.ticks.with_label_values(&[self.unique_id.as_str(), outcome]).inc();
        self.publish_gauges().await;
        self.subscribers.notify();
    }

    async fn poll(&self, state: &mut TickState) -> Result<(), PollError> {
        let id_token = state.tokens.valid_id_token().await?;
        let bearer = format!("Bearer {}", id_token);

        let now = self.clock.now();
        let phantom_due = state
            .phantom_polled_at
            .map_or(true, |at| now - at > self.phantom_interval_seconds);

        if phantom_due {
            match self.fetch_power(DataEndpoint::Phantom, &bearer).await {
                Ok(watts) => {
                    self.readings
                        .update(|r| r.set(SensorKind::PhantomLoad, watts_to_kilowatts(watts), now));
                }
                Err(err) if err.is_transport() => return Err(PollError::Unreachable(err)),
                Err(err) => warn!(client = %self.unique_id, "{}", err),
            }
            state.phantom_polled_at = Some(now);
        }

        match self.fetch_power(DataEndpoint::Live, &bearer).await {
            Ok(watts) => {
                self.readings
                    .update(|r| r.set(SensorKind::PowerUsage, watts_to_kilowatts(watts.abs()), now));
            }
            Err(err) if err.is_transport() => return Err(PollError::Unreachable(err)),
            Err(err) => warn!(client = %self.unique_id, "{}", err),
        }

        state.last_fetch_at = Some(now);
        Ok(())
    }

    /// GET one data endpoint and return its `power` field in watts.
    async fn fetch_power(&self, endpoint: DataEndpoint, bearer: &str) -> Result<f64, FetchError> {
        let metrics = get_metrics().await;
        let label = endpoint.label();
        let url = match endpoint {
            DataEndpoint::Live => &self.endpoints.live_url,
            DataEndpoint::Phantom => &self.endpoints.phantom_url,
        };
        metrics.fetch_requests.with_label_values(&[self.unique_id.as_str(), label]).inc();
        let start = get_instant();

        let result = async {
            let transport = move |source: reqwest::Error| FetchError::Transport { endpoint: label, source };
            let response = self
                .http
                .get(url)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json")
                .header(AUTHORIZATION, bearer)
                .header(IF_MODIFIED_SINCE, http_date(self.clock.now()))
                .send()
                .await
                .map_err(transport)?;

            let status = response.status();
            let body = response.text().await.map_err(transport)?;
            if !status.is_success() {
                return Err(FetchError::Status { endpoint: label, status, body });
            }
            serde_json::from_str::<PowerSample>(&body)
                .map(|sample| sample.power)
                .map_err(|e| FetchError::Malformed { endpoint: label, reason: e.to_string() })
        }
        .await;

        metrics.fetch_duration.with_label_values(&[label]).observe(start.elapsed().as_secs_f64());
        match &result {
            Ok(watts) => debug!(client = %self.unique_id, endpoint = label, watts, "fetched"),
            Err(err) => metrics
                .fetch_failures
                .with_label_values(&[self.unique_id.as_str(), label, err.reason()])
                .inc(),
        }
        result
    }

    async fn publish_gauges(&self) {
        let metrics = get_metrics().await;
        let readings = self.readings.snapshot();
        for kind in SensorKind::ALL {
            let labels = [self.unique_id.as_str(), kind.key()];
            match readings.get(kind).value {
                Some(value) => metrics.reading_kilowatts.with_label_values(&labels).set(value),
                None => {
                    let _ = metrics.reading_kilowatts.remove_label_values(&labels);
                }
            }
        }
    }
}

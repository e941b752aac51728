// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use serde_json::Value;

use crate::helpers::time::Clock;
use crate::polling::{PollingClient, PollingOptions, Subscription, VendorEndpoints};
use crate::session::auth::IdentityEndpoint;
use crate::session::Credentials;
use crate::utils::constants::{AMZ_JSON_CONTENT_TYPE, AMZ_TARGET_INITIATE_AUTH};

pub const T0: i64 = 1_700_000_000;
pub const USERNAME: &str = "user@example.com";
pub const PASSWORD: &str = "correct horse";
pub const ACCESS_TOKEN: &str = "access-token-1";
pub const ID_TOKEN: &str = "id-token-1";
pub const REFRESH_TOKEN: &str = "refresh-token-1";
pub const LIVE_PATH: &str = "/Test/usage/live";
pub const PHANTOM_PATH: &str = "/Test/usage/phantom_load";

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(now: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(now)))
    }

    pub fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn endpoints_for(base_url: &str) -> VendorEndpoints {
    VendorEndpoints {
        identity: IdentityEndpoint {
            url: format!("{}/", base_url),
            client_id: "test-client".to_owned(),
        },
        live_url: format!("{}{}", base_url, LIVE_PATH),
        phantom_url: format!("{}{}", base_url, PHANTOM_PATH),
    }
}

pub fn build_client(
    unique_id: &str,
    endpoints: VendorEndpoints,
    clock: Arc<ManualClock>,
    http_timeout_ms: u64,
) -> Arc<PollingClient> {
    let options = PollingOptions { http_timeout_ms, ..PollingOptions::default() };
    Arc::new(
        PollingClient::new(
            unique_id,
            "Loop",
            Credentials::new(USERNAME, PASSWORD),
            endpoints,
            options,
            clock,
        )
        .expect("polling client"),
    )
}

/// Counts notifications of a client; dropping the subscription stops counting.
pub fn count_notifications(client: &PollingClient) -> (Arc<AtomicUsize>, Subscription) {
    let counter = Arc::new(AtomicUsize::new(0));
    let subscription = {
        let counter = counter.clone();
        client.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    };
    (counter, subscription)
}

pub fn auth_result(expires_in: i64, with_refresh_token: bool) -> Value {
    let mut result = json!({
        "AccessToken": ACCESS_TOKEN,
        "IdToken": ID_TOKEN,
        "ExpiresIn": expires_in,
        "TokenType": "Bearer"
    });
    if with_refresh_token {
        result["RefreshToken"] = json!(REFRESH_TOKEN);
    }
    json!({ "AuthenticationResult": result, "ChallengeParameters": {} })
}

pub async fn mock_password_auth(server: &MockServer, status: u16, expires_in: i64) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .header("content-type", AMZ_JSON_CONTENT_TYPE)
                .header("x-amz-target", AMZ_TARGET_INITIATE_AUTH)
                .body_includes("USER_PASSWORD_AUTH")
                .body_includes(USERNAME)
                .body_includes(PASSWORD);
            if status == 200 {
                then.status(200)
                    .header("content-type", AMZ_JSON_CONTENT_TYPE)
                    .json_body(auth_result(expires_in, true));
            } else {
                then.status(status)
                    .body(r#"{"__type":"NotAuthorizedException","message":"Incorrect username or password."}"#);
            }
        })
        .await
}

pub async fn mock_refresh_auth(server: &MockServer, status: u16, expires_in: i64) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/")
                .header("x-amz-target", AMZ_TARGET_INITIATE_AUTH)
                .body_includes("REFRESH_TOKEN_AUTH")
                .body_includes(REFRESH_TOKEN);
            if status == 200 {
                then.status(200)
                    .header("content-type", AMZ_JSON_CONTENT_TYPE)
                    .json_body(auth_result(expires_in, false));
            } else {
                then.status(status)
                    .body(r#"{"__type":"NotAuthorizedException","message":"Refresh Token has expired"}"#);
            }
        })
        .await
}

pub async fn mock_power<'a>(server: &'a MockServer, path: &str, status: u16, body: &str) -> Mock<'a> {
    let bearer = format!("Bearer {}", ID_TOKEN);
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(path)
                .header("authorization", bearer)
                .header_exists("if-modified-since");
            then.status(status)
                .header("content-type", "application/json")
                .body(body);
        })
        .await
}

pub fn power_body(watts: f64) -> String {
    json!({ "power": watts }).to_string()
}

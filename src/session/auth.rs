//! Identity endpoint exchange (Cognito `InitiateAuth`).
//!
//! Both the password and the refresh-token flows share one request shape and one
//! response shape; only `AuthFlow` and `AuthParameters` differ.

use std::collections::BTreeMap;
use std::fmt;

use http::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AuthError;
use crate::utils::constants::{AMZ_JSON_CONTENT_TYPE, AMZ_TARGET_INITIATE_AUTH, AMZ_USER_AGENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuthFlow {
    #[serde(rename = "USER_PASSWORD_AUTH")]
    UserPassword,
    #[serde(rename = "REFRESH_TOKEN_AUTH")]
    RefreshToken,
}

impl AuthFlow {
    pub fn as_str(&self) -> &'static str {
        match *self {
            AuthFlow::UserPassword => "USER_PASSWORD_AUTH",
            AuthFlow::RefreshToken => "REFRESH_TOKEN_AUTH",
        }
    }
}

impl fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum AuthParameters<'a> {
    Password {
        #[serde(rename = "USERNAME")]
        username: &'a str,
        #[serde(rename = "PASSWORD")]
        password: &'a str,
    },
    Refresh {
        #[serde(rename = "REFRESH_TOKEN")]
        refresh_token: &'a str,
    },
}

impl AuthParameters<'_> {
    pub fn flow(&self) -> AuthFlow {
        match self {
            AuthParameters::Password { .. } => AuthFlow::UserPassword,
            AuthParameters::Refresh { .. } => AuthFlow::RefreshToken,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: AuthFlow,
    client_id: &'a str,
    auth_parameters: AuthParameters<'a>,
    client_metadata: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
}

/// Tokens issued by a successful exchange.
///
/// The refresh flow does not return a new `RefreshToken`.
#[derive(Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

impl fmt::Debug for AuthenticationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationResult")
            .field("refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Identity endpoint location and the app client it authenticates as.
#[derive(Debug, Clone)]
pub struct IdentityEndpoint {
    pub url: String,
    pub client_id: String,
}

impl IdentityEndpoint {
    /// POST one `InitiateAuth` exchange. Any non-2xx status is a rejection.
    pub async fn initiate_auth(
        &self,
        http: &Client,
        parameters: AuthParameters<'_>,
    ) -> Result<AuthenticationResult, AuthError> {
        let flow = parameters.flow();
        let request = InitiateAuthRequest {
            auth_flow: flow,
            client_id: &self.client_id,
            auth_parameters: parameters,
            client_metadata: BTreeMap::new(),
        };
        let payload = serde_json::to_vec(&request).map_err(|e| AuthError::Malformed {
            flow,
            reason: e.to_string(),
        })?;

        debug!(flow = %flow, url = %self.url, "initiate auth");
        let response = http
            .post(&self.url)
            .header(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
            .header("x-amz-target", AMZ_TARGET_INITIATE_AUTH)
            .header("x-amz-user-agent", AMZ_USER_AGENT)
            .body(payload)
            .send()
            .await
            .map_err(|source| AuthError::Transport { flow, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AuthError::Transport { flow, source })?;
        if !status.is_success() {
            return Err(AuthError::Rejected { flow, status, body });
        }

        serde_json::from_str::<InitiateAuthResponse>(&body)
            .map_err(|e| AuthError::Malformed {
                flow,
                reason: e.to_string(),
            })?
            .authentication_result
            .ok_or_else(|| AuthError::Malformed {
                flow,
                reason: "missing AuthenticationResult".to_owned(),
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn password_request_matches_wire_shape() {
        let request = InitiateAuthRequest {
            auth_flow: AuthFlow::UserPassword,
            client_id: "client",
            auth_parameters: AuthParameters::Password {
                username: "user@example.com",
                password: "secret",
            },
            client_metadata: BTreeMap::new(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "AuthFlow": "USER_PASSWORD_AUTH",
                "ClientId": "client",
                "AuthParameters": {"USERNAME": "user@example.com", "PASSWORD": "secret"},
                "ClientMetadata": {}
            })
        );
    }

    #[test]
    fn refresh_response_without_refresh_token_parses() {
        let body = r#"{"AuthenticationResult":{"AccessToken":"a","IdToken":"i","ExpiresIn":3600,"TokenType":"Bearer"}}"#;
        let parsed: InitiateAuthResponse = serde_json::from_str(body).unwrap();
        let result = parsed.authentication_result.unwrap();
        assert_eq!(result.refresh_token, None);
        assert_eq!(result.expires_in, 3600);
    }
}

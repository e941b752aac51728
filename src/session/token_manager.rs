use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::errors::AuthError;
use crate::helpers::time::Clock;
use crate::observability::metrics::get_metrics;
use crate::session::auth::{AuthFlow, AuthParameters, IdentityEndpoint};
use crate::session::session::{Credentials, Session};

/// Owns the session of one client and keeps it valid.
///
/// States: empty (password flow on next use), live and unexpired (no-op),
/// live and expired (refresh flow). A rejected refresh drops back to empty so the
/// following call starts over with the password flow.
#[derive(Debug)]
pub struct TokenManager {
    client_label: String,
    http: Client,
    identity: IdentityEndpoint,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
    safety_margin_seconds: i64,
    session: Session,
}

impl TokenManager {
    pub fn new(
        client_label: impl Into<String>,
        http: Client,
        identity: IdentityEndpoint,
        credentials: Credentials,
        clock: Arc<dyn Clock>,
        safety_margin_seconds: u64,
    ) -> Self {
        Self {
            client_label: client_label.into(),
            http,
            identity,
            credentials,
            clock,
            safety_margin_seconds: safety_margin_seconds as i64,
            session: Session::Empty,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_live()
    }

    /// Bearer credential for data requests.
    pub fn id_token(&self) -> Option<&str> {
        self.session.id_token()
    }

    /// `true` when a usable session exists after the call.
    pub async fn ensure_valid_session(&mut self) -> bool {
        self.ensure_valid().await.is_ok()
    }

    /// Ensure a valid session and hand out the ID token used as bearer credential.
    pub async fn valid_id_token(&mut self) -> Result<String, AuthError> {
        self.ensure_valid().await?;
        self.session
            .id_token()
            .map(str::to_owned)
            .ok_or_else(|| AuthError::Malformed {
                flow: AuthFlow::UserPassword,
                reason: "no session after a successful exchange".to_owned(),
            })
    }

    pub async fn ensure_valid(&mut self) -> Result<(), AuthError> {
        let now = self.clock.now();
        let refresh_token = match &self.session {
            Session::Live(live) if now < live.expires_at => {
                debug!(client = %self.client_label, expires_at = live.expires_at, "session valid");
                return Ok(());
            }
            Session::Live(live) => Some(live.refresh_token.clone()),
            Session::Empty => None,
        };

        match refresh_token {
            Some(refresh_token) => self.refresh(&refresh_token).await,
            None => self.authenticate().await,
        }
    }

    async fn authenticate(&mut self) -> Result<(), AuthError> {
        let flow = AuthFlow::UserPassword;
        self.record_request(flow).await;

        let parameters = AuthParameters::Password {
            username: self.credentials.username(),
            password: self.credentials.password(),
        };
        let result = match self.identity.initiate_auth(&self.http, parameters).await {
            Ok(result) => result,
            Err(err) => {
                self.record_failure(&err).await;
                return Err(err);
            }
        };

        let issued_at = self.clock.now();
        match Session::establish(result, issued_at, self.safety_margin_seconds) {
            Ok(session) => self.session = session,
            Err(reason) => {
                let err = AuthError::Malformed { flow, reason };
                self.record_failure(&err).await;
                return Err(err);
            }
        }

        info!(
            client = %self.client_label,
            expires_at = ?self.session.expires_at(),
            "authenticated with password flow"
        );
        self.record_expiry().await;
        Ok(())
    }

    async fn refresh(&mut self, refresh_token: &str) -> Result<(), AuthError> {
        self.record_request(AuthFlow::RefreshToken).await;

        let parameters = AuthParameters::Refresh { refresh_token };
        match self.identity.initiate_auth(&self.http, parameters).await {
            Ok(result) => {
                let issued_at = self.clock.now();
                self.session.refresh(result, issued_at, self.safety_margin_seconds);
                info!(
                    client = %self.client_label,
                    expires_at = ?self.session.expires_at(),
                    "session refreshed"
                );
                self.record_expiry().await;
                Ok(())
            }
            // unreachable endpoint says nothing about the token, try it again next tick
            Err(err) if err.is_transport() => {
                self.record_failure(&err).await;
                Err(err)
            }
            Err(err) => {
                self.record_failure(&err).await;
                warn!(
                    client = %self.client_label,
                    error = %err,
                    "refresh rejected, session cleared; next attempt uses the password flow"
                );
                self.session.clear();
                self.record_expiry().await;
                Err(err)
            }
        }
    }

    async fn record_request(&self, flow: AuthFlow) {
        get_metrics()
            .await
            .auth_requests
            .with_label_values(&[self.client_label.as_str(), flow.as_str()])
            .inc();
    }

    async fn record_failure(&self, err: &AuthError) {
        let flow = match err {
            AuthError::Rejected { flow, .. }
            | AuthError::Malformed { flow, .. }
            | AuthError::Transport { flow, .. } => *flow,
        };
        get_metrics()
            .await
            .auth_failures
            .with_label_values(&[self.client_label.as_str(), flow.as_str(), err.reason()])
            .inc();
    }

    async fn record_expiry(&self) {
        get_metrics()
            .await
            .session_expiry_unix
            .with_label_values(&[self.client_label.as_str()])
            .set(self.session.expires_at().unwrap_or_default());
    }
}

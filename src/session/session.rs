use std::fmt;

use crate::session::auth::AuthenticationResult;

/// Username/password pair used for the password flow.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Tokens of an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct LiveSession {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    pub issued_at: i64,
    /// issue time + lifetime - safety margin, UNIX seconds
    pub expires_at: i64,
}

impl fmt::Debug for LiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSession")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Either no tokens at all, or all three tokens plus an expiry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Empty,
    Live(LiveSession),
}

pub fn expiry_from(issued_at: i64, expires_in: i64, safety_margin_seconds: i64) -> i64 {
    issued_at + expires_in - safety_margin_seconds
}

impl Session {
    /// Build a live session from a password-flow result.
    ///
    /// Fails when the result carries no refresh token, since such a session could
    /// never be renewed.
    pub fn establish(
        result: AuthenticationResult,
        issued_at: i64,
        safety_margin_seconds: i64,
    ) -> Result<Self, String> {
        let refresh_token = result
            .refresh_token
            .ok_or_else(|| "missing RefreshToken".to_owned())?;
        Ok(Session::Live(LiveSession {
            access_token: result.access_token,
            id_token: result.id_token,
            refresh_token,
            issued_at,
            expires_at: expiry_from(issued_at, result.expires_in, safety_margin_seconds),
        }))
    }

    /// Apply a refresh-flow result. A rotated refresh token replaces the old one.
    pub fn refresh(
        &mut self,
        result: AuthenticationResult,
        issued_at: i64,
        safety_margin_seconds: i64,
    ) {
        if let Session::Live(live) = self {
            live.access_token = result.access_token;
            live.id_token = result.id_token;
            if let Some(refresh_token) = result.refresh_token {
                live.refresh_token = refresh_token;
            }
            live.issued_at = issued_at;
            live.expires_at = expiry_from(issued_at, result.expires_in, safety_margin_seconds);
        }
    }

    pub fn clear(&mut self) {
        *self = Session::Empty;
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Session::Live(_))
    }

    pub fn is_expired(&self, now: i64) -> bool {
        match self {
            Session::Live(live) => now >= live.expires_at,
            Session::Empty => false,
        }
    }

    pub fn expires_at(&self) -> Option<i64> {
        match self {
            Session::Live(live) => Some(live.expires_at),
            Session::Empty => None,
        }
    }

    pub fn id_token(&self) -> Option<&str> {
        match self {
            Session::Live(live) => Some(live.id_token.as_str()),
            Session::Empty => None,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            Session::Live(live) => Some(live.refresh_token.as_str()),
            Session::Empty => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn result(refresh_token: Option<&str>, expires_in: i64) -> AuthenticationResult {
        AuthenticationResult {
            access_token: "access".into(),
            id_token: "id".into(),
            refresh_token: refresh_token.map(str::to_owned),
            expires_in,
        }
    }

    #[test]
    fn establish_applies_safety_margin() {
        let session = Session::establish(result(Some("refresh"), 3600), 1_000, 120).unwrap();
        assert_eq!(session.expires_at(), Some(1_000 + 3600 - 120));
        assert!(!session.is_expired(1_000 + 3479));
        assert!(session.is_expired(1_000 + 3480));
    }

    #[test]
    fn establish_requires_refresh_token() {
        assert!(Session::establish(result(None, 3600), 0, 120).is_err());
    }

    #[test]
    fn refresh_keeps_refresh_token_unless_rotated() {
        let mut session = Session::establish(result(Some("first"), 3600), 0, 120).unwrap();
        session.refresh(result(None, 1800), 4_000, 120);
        assert_eq!(session.refresh_token(), Some("first"));
        assert_eq!(session.expires_at(), Some(4_000 + 1800 - 120));

        session.refresh(result(Some("second"), 1800), 5_000, 120);
        assert_eq!(session.refresh_token(), Some("second"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let credentials = Credentials::new("user", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));

        let session = Session::establish(result(Some("refresh-secret"), 60), 0, 0).unwrap();
        assert!(!format!("{:?}", session).contains("refresh-secret"));
    }
}

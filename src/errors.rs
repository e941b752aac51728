use http::StatusCode;
use thiserror::Error;

use crate::session::auth::AuthFlow;

/// Failure of an identity exchange. Never mutates the session.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{flow} rejected with status {status}: {body}")]
    Rejected {
        flow: AuthFlow,
        status: StatusCode,
        body: String,
    },
    #[error("{flow} response is malformed: {reason}")]
    Malformed { flow: AuthFlow, reason: String },
    #[error("{flow} request failed: {source}")]
    Transport {
        flow: AuthFlow,
        #[source]
        source: reqwest::Error,
    },
}

impl AuthError {
    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Transport { .. })
    }

    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Rejected { .. } => "rejected",
            AuthError::Malformed { .. } => "malformed",
            AuthError::Transport { .. } => "transport",
        }
    }
}

/// Failure of a single data endpoint request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },
    #[error("{endpoint} body is malformed: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },
    #[error("{endpoint} request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. })
    }

    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => "status",
            FetchError::Malformed { .. } => "malformed",
            FetchError::Transport { .. } => "transport",
        }
    }
}

/// Reasons a tick could not complete. Only ever logged, never returned from `update`.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("no valid session: {0}")]
    Session(#[from] AuthError),
    #[error("vendor API unreachable: {0}")]
    Unreachable(FetchError),
}

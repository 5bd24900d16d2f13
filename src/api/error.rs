//! Error taxonomy for calls against a tenant's API

use thiserror::Error;

/// HTTP status the platform uses for "already exists" and version conflicts
pub const STATUS_CONFLICT: u16 = 422;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials were rejected or the exchange response carried no token
    #[error("authentication failed for tenant '{tenant}': {reason}")]
    Auth { tenant: String, reason: String },

    /// Connection, DNS, TLS or timeout failure before a response arrived
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The response body (or a fetched document) did not have the expected shape
    #[error("malformed JSON from {context}: {reason}")]
    MalformedJson { context: String, reason: String },
}

impl ApiError {
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedJson {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Status code for `Status` errors
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server refused a create because the resource already exists
    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(STATUS_CONFLICT)
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

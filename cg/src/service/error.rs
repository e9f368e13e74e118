//! Service error types

use thiserror::Error;

/// Errors that can occur talking to the storage, analysis or chat services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Service error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ServiceError {
    /// Whether the request reached the service and got a non-2xx answer
    pub fn is_api(&self) -> bool {
        matches!(self, ServiceError::Api { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ServiceError::MalformedResponse(_))
    }

    /// The HTTP status, for errors that carry one
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Api { status, .. } => Some(*status),
            ServiceError::Network(e) => e.status().map(|s| s.as_u16()),
            ServiceError::MalformedResponse(_) => None,
        }
    }

    /// User-facing detail: the response body when the service sent one,
    /// otherwise `fallback`
    pub fn detail_or(&self, fallback: &str) -> String {
        match self {
            ServiceError::Api { message, .. } if !message.trim().is_empty() => message.trim().to_string(),
            ServiceError::Api { .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

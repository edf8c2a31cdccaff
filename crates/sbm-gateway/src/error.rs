//! Error types for the gateways
//!
//! - Transport failures that survived the retry budget
//! - Application responses (4xx/5xx) with their status code
//! - Malformed response bodies
//! - Invalid client configuration

use sbm_model::MessageSetId;
use std::sync::Arc;

/// Gateway error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request never produced a response
    #[error("transport error after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    /// Service answered with a non-success status
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not have the expected shape
    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Client could not be built
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Create status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create decode error
    pub fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status code, when the service answered
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the service reported the resource missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

/// Schedule lookup failed
#[derive(Debug, Clone, thiserror::Error)]
#[error("could not fetch schedule of message set {message_set}: {source}")]
pub struct ScheduleError {
    pub message_set: MessageSetId,
    #[source]
    pub source: Arc<GatewayError>,
}

impl ScheduleError {
    /// HTTP status code of the underlying failure
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.source.status_code()
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = GatewayError::status(400, "bad lang");
        assert_eq!(err.to_string(), "request failed with status 400: bad lang");
        assert_eq!(err.status_code(), Some(400));
        assert!(!err.is_not_found());
    }

    #[test]
    fn schedule_error_carries_status() {
        let err = ScheduleError {
            message_set: MessageSetId(12),
            source: Arc::new(GatewayError::status(404, "")),
        };
        assert_eq!(err.status_code(), Some(404));
        assert!(err.to_string().starts_with("could not fetch schedule of message set 12"));
    }
}

//! Host bridge error types

use thiserror::Error;

/// Failures of host capability calls and the remote auth/payment endpoints
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No host runtime was detected at startup
    #[error("Not running in Mini App environment")]
    NotHostRuntime,

    /// The host rejected the auth code request
    #[error("Auth failed: {0}")]
    AuthFailed(String),

    /// A remote endpoint answered with a non-2xx status
    #[error("HTTP error! status: {0}")]
    HttpError(u16),

    /// The host pay UI reported a failure
    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    /// A response or scanned payload did not have the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The host does not expose the requested capability
    #[error("Host capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// The host scanner reported a failure
    #[error("Scan failed: {0}")]
    ScanFailed(String),

    /// The request never produced an HTTP response
    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for BridgeError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => BridgeError::HttpError(status.as_u16()),
            None => BridgeError::Transport(err.to_string()),
        }
    }
}

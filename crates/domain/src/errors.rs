//! Error types used throughout the sync client.

use thiserror::Error;

/// Main error type for Listonic operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport-level failure: DNS, TCP, TLS, or timeout. No HTTP response
    /// was received. Never conflated with an HTTP status error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials rejected or token irrecoverably invalid. The host should
    /// prompt for re-entry of credentials rather than retry on a timer.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success HTTP response other than 401. Carries status and body
    /// text for diagnostics.
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Backoff retries exhausted on 429/5xx. A specialization of the API
    /// error signaling the caller should back off longer than the built-in
    /// policy already attempted.
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Build an API error from a status code and response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api { status, body: body.into() }
    }

    /// True for errors that are fatal to the current session and require
    /// the host to re-collect credentials.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Result type alias for Listonic operations.
pub type Result<T> = std::result::Result<T, SyncError>;

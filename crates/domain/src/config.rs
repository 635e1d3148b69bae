//! Configuration consumed by the sync client.

use std::fmt;
use std::time::Duration;

use crate::constants::{MAX_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};
use crate::errors::{Result, SyncError};

/// Account credentials and polling configuration.
///
/// The password is sensitive: the `Debug` impl redacts it so it can never
/// leak through logs or diagnostic exports.
#[derive(Clone)]
pub struct SyncConfig {
    pub email: String,
    pub password: String,
    poll_interval_secs: u64,
}

impl SyncConfig {
    /// Build a validated configuration. The poll interval is clamped to the
    /// supported range; empty credentials are rejected.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        poll_interval_secs: u64,
    ) -> Result<Self> {
        let email = email.into();
        let password = password.into();
        if email.trim().is_empty() {
            return Err(SyncError::Config("email must not be empty".into()));
        }
        if password.is_empty() {
            return Err(SyncError::Config("password must not be empty".into()));
        }
        Ok(Self {
            email,
            password,
            poll_interval_secs: poll_interval_secs
                .clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn poll_interval_secs(&self) -> u64 {
        self.poll_interval_secs
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("email", &self.email)
            .field("password", &"**REDACTED**")
            .field("poll_interval_secs", &self.poll_interval_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_POLL_INTERVAL_SECS;

    #[test]
    fn accepts_valid_configuration() {
        let config =
            SyncConfig::new("user@example.com", "hunter2", DEFAULT_POLL_INTERVAL_SECS).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn clamps_poll_interval_to_bounds() {
        let config = SyncConfig::new("user@example.com", "hunter2", 1).unwrap();
        assert_eq!(config.poll_interval_secs(), MIN_POLL_INTERVAL_SECS);

        let config = SyncConfig::new("user@example.com", "hunter2", 1_000_000).unwrap();
        assert_eq!(config.poll_interval_secs(), MAX_POLL_INTERVAL_SECS);
    }

    #[test]
    fn rejects_empty_credentials() {
        assert!(SyncConfig::new("", "hunter2", 30).is_err());
        assert!(SyncConfig::new("user@example.com", "", 30).is_err());
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = SyncConfig::new("user@example.com", "hunter2", 30).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("user@example.com"));
    }
}

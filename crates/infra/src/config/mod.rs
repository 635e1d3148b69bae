//! Configuration loader.
//!
//! Loads the sync client configuration from environment variables.
//!
//! ## Environment Variables
//! - `LISTONIC_EMAIL`: account email (required)
//! - `LISTONIC_PASSWORD`: account password (required)
//! - `LISTONIC_POLL_INTERVAL`: poll interval in seconds (optional, default
//!   30, bounded to [10, 3600])

use listonic_domain::constants::DEFAULT_POLL_INTERVAL_SECS;
use listonic_domain::{Result, SyncConfig, SyncError};

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `SyncError::Config` if required variables are missing or the
/// poll interval is not a number. Credential validation (non-empty fields)
/// happens in [`SyncConfig::new`]; a rejected login at runtime surfaces as
/// an auth error instead, so setup failures and expired sessions stay
/// distinguishable.
pub fn load_from_env() -> Result<SyncConfig> {
    let email = env_var("LISTONIC_EMAIL")?;
    let password = env_var("LISTONIC_PASSWORD")?;
    let poll_interval = match std::env::var("LISTONIC_POLL_INTERVAL") {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|err| SyncError::Config(format!("invalid poll interval: {err}")))?,
        Err(_) => DEFAULT_POLL_INTERVAL_SECS,
    };

    let config = SyncConfig::new(email, password, poll_interval)?;
    tracing::info!("configuration loaded from environment variables");
    Ok(config)
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| SyncError::Config(format!("missing environment variable: {name}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    // Environment mutation is process-global; serialize these tests.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn loads_complete_environment() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("LISTONIC_EMAIL", "user@example.com");
        std::env::set_var("LISTONIC_PASSWORD", "hunter2");
        std::env::set_var("LISTONIC_POLL_INTERVAL", "60");

        let config = load_from_env().unwrap();
        assert_eq!(config.email, "user@example.com");
        assert_eq!(config.poll_interval_secs(), 60);

        std::env::remove_var("LISTONIC_EMAIL");
        std::env::remove_var("LISTONIC_PASSWORD");
        std::env::remove_var("LISTONIC_POLL_INTERVAL");
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("LISTONIC_EMAIL");
        std::env::remove_var("LISTONIC_PASSWORD");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn interval_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("LISTONIC_EMAIL", "user@example.com");
        std::env::set_var("LISTONIC_PASSWORD", "hunter2");
        std::env::remove_var("LISTONIC_POLL_INTERVAL");

        let config = load_from_env().unwrap();
        assert_eq!(config.poll_interval_secs(), DEFAULT_POLL_INTERVAL_SECS);

        std::env::remove_var("LISTONIC_EMAIL");
        std::env::remove_var("LISTONIC_PASSWORD");
    }

    #[test]
    fn garbage_interval_is_a_config_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("LISTONIC_EMAIL", "user@example.com");
        std::env::set_var("LISTONIC_PASSWORD", "hunter2");
        std::env::set_var("LISTONIC_POLL_INTERVAL", "soon");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));

        std::env::remove_var("LISTONIC_EMAIL");
        std::env::remove_var("LISTONIC_PASSWORD");
        std::env::remove_var("LISTONIC_POLL_INTERVAL");
    }
}

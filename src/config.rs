//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Onboarding subsystem configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Base URL of the backend, e.g. `https://api.example.com/api/v1`.
    pub api_base_url: String,
    /// Quiet period after the last form update before the sync flag is raised.
    pub debounce: Duration,
    /// Number of `get_token` calls made while waiting for a session token.
    pub token_attempts: u32,
    /// Delay between token polls.
    pub token_interval: Duration,
    /// Deadline for every remote call.
    pub request_timeout: Duration,
    /// Consecutive heartbeat failures before a diagnostic event is emitted.
    pub heartbeat_alert_after: u32,
    /// Number of steps in the flow the controller is initialized with.
    pub total_steps: u32,
    /// Local progress cache location.
    pub db_path: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            debounce: Duration::from_millis(500),
            token_attempts: 10,
            token_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(15),
            heartbeat_alert_after: 3,
            total_steps: 11,
            db_path: "./data/onboarding.db".to_string(),
        }
    }
}

impl OnboardingConfig {
    /// Build config from environment variables, falling back to defaults for
    /// anything absent or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_base_url = std::env::var("STRIDE_API_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let debounce = env_parse::<u64>("STRIDE_DEBOUNCE_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);

        let token_attempts = env_parse::<u32>("STRIDE_TOKEN_ATTEMPTS")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.token_attempts);

        let token_interval = env_parse::<u64>("STRIDE_TOKEN_INTERVAL_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.token_interval);

        let request_timeout = env_parse::<u64>("STRIDE_REQUEST_TIMEOUT_SECS")
            .filter(|n| *n > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let heartbeat_alert_after = env_parse::<u32>("STRIDE_HEARTBEAT_ALERT_AFTER")
            .filter(|n| *n > 0)
            .unwrap_or(defaults.heartbeat_alert_after);

        let db_path = std::env::var("STRIDE_DB_PATH").unwrap_or(defaults.db_path);

        Self {
            api_base_url,
            debounce,
            token_attempts,
            token_interval,
            request_timeout,
            heartbeat_alert_after,
            total_steps: defaults.total_steps,
            db_path,
        }
    }
}

impl OnboardingConfig {
    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                key: "STRIDE_API_BASE_URL".to_string(),
                message: format!("expected an http(s) URL, got {:?}", self.api_base_url),
            });
        }
        if self.db_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "STRIDE_DB_PATH".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

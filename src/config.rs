//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default polling budget: 15 attempts, 2 seconds apart. Backend jobs
/// are expected to finish in seconds, so a fixed interval beats adaptive
/// pacing here.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Bounds for one polling loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Maximum status queries before giving up with a timeout.
    pub max_attempts: u32,
    /// Fixed wait between status queries.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Wizard configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Base URL of the resume-builder backend.
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Document generation can take longer than a plain RPC.
    pub generate_timeout: Duration,
    /// Polling bounds shared by all stages.
    pub poll: PollConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: "https://core.tapmytalent.com/resumeBuilder-Dev".to_string(),
            request_timeout: Duration::from_secs(15),
            generate_timeout: Duration::from_secs(30),
            poll: PollConfig::default(),
        }
    }
}

impl WizardConfig {
    /// Load configuration from `RESUME_WIZARD_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("RESUME_WIZARD_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = read_u64("RESUME_WIZARD_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
            config.generate_timeout = Duration::from_secs(secs * 2);
        }
        if let Some(attempts) = read_u64("RESUME_WIZARD_POLL_ATTEMPTS")? {
            config.poll.max_attempts = attempts as u32;
        }
        if let Some(millis) = read_u64("RESUME_WIZARD_POLL_INTERVAL_MS")? {
            config.poll.interval = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn read_u64(key: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

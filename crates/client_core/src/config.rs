use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_JOBS_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid api base url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported api base url scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
    #[error("{name} must be greater than zero")]
    ZeroInterval { name: &'static str },
}

/// Parameters for one job list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub api_base_url: String,
    pub show_automation_controls: bool,
    pub show_stats: bool,
    pub jobs_refresh_interval: Duration,
    pub status_poll_interval: Duration,
    pub notification_ttl: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            show_automation_controls: true,
            show_stats: true,
            jobs_refresh_interval: DEFAULT_JOBS_REFRESH_INTERVAL,
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            notification_ttl: DEFAULT_NOTIFICATION_TTL,
        }
    }
}

impl ControllerConfig {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    /// Whether the status poll has anything to feed.
    pub fn polls_status(&self) -> bool {
        self.show_automation_controls || self.show_stats
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs_refresh_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "jobs_refresh_interval",
            });
        }
        if self.status_poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                name: "status_poll_interval",
            });
        }
        Ok(())
    }
}

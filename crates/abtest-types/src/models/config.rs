//! Client settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::error::AbError;

/// Config server used when no host is given.
pub const DEFAULT_AB_CONFIG_HOST: &str = "http://127.0.0.1:8090";
/// Path of the config-list endpoint, appended to the host.
pub const DEFAULT_AB_API_PATH: &str = "/abtest/config/list";
/// Seconds between background syncs.
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
/// Per-request timeout of the HTTP fetcher.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
/// Strategy used when neither whitelist nor partitions assign one.
pub const DEFAULT_STRATEGY_NAME: &str = "default";
/// Largest bucket space a client will materialize for one experiment.
pub const MAX_PARTITION_COUNT: u64 = 1 << 20;

/// Settings for one A/B client instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct AbClientConfig {
    /// Project the client is bound to; 0 is rejected
    pub project_id: i64,
    /// Scheme + host + optional port of the config server
    #[serde(default = "default_hostport")]
    pub hostport: String,
    /// Path of the config-list endpoint
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// Seconds between background syncs
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Per-request timeout in seconds
    #[validate(range(min = 1_u64))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_hostport() -> String {
    DEFAULT_AB_CONFIG_HOST.to_string()
}

fn default_api_path() -> String {
    DEFAULT_AB_API_PATH.to_string()
}

const fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL_SECS
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl AbClientConfig {
    /// Settings for `project_id` with every other field at its default.
    pub fn new(project_id: i64) -> Self {
        Self {
            project_id,
            hostport: default_hostport(),
            api_path: default_api_path(),
            interval_secs: DEFAULT_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn with_hostport(mut self, hostport: impl Into<String>) -> Self {
        self.hostport = hostport.into();
        self
    }

    pub fn with_interval_secs(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Replace an empty host or a zero interval/timeout with the defaults.
    pub fn normalized(mut self) -> Self {
        if self.hostport.trim().is_empty() {
            self.hostport = default_hostport();
        }
        if self.api_path.is_empty() {
            self.api_path = default_api_path();
        }
        if self.interval_secs == 0 {
            self.interval_secs = DEFAULT_INTERVAL_SECS;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        self
    }

    /// Normalize, then reject settings no client can run with.
    pub fn validated(self) -> Result<Self, AbError> {
        let config = self.normalized();
        if config.project_id == 0 {
            return Err(AbError::InvalidSetting {
                message: "client project_id is empty".to_string(),
            });
        }
        config
            .validate()
            .map_err(|e| AbError::InvalidSetting { message: e.to_string() })?;
        Ok(config)
    }

    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of the config-list endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.hostport.trim_end_matches('/'), self.api_path)
    }
}

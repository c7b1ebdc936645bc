//! Wire and settings models for the A/B test SDK.
//!
//! This module contains all shared data structures exchanged with the
//! experiment config server and used to configure a client.

mod config;
mod experiment;
mod lenient;
mod response;

// Re-export all models
pub use config::{
    AbClientConfig, DEFAULT_AB_API_PATH, DEFAULT_AB_CONFIG_HOST, DEFAULT_INTERVAL_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STRATEGY_NAME, MAX_PARTITION_COUNT,
};
pub use experiment::{ConfigMap, ExperimentStatus, ExperimentType, ExperimentWire};
pub use response::{ConfigListData, ConfigListRequest, ConfigListResponse, ProjectId, RET_OK};

//! Typed error definitions for the A/B test SDK.
//!
//! Lookup failures surface the precise kind through [`AbError`]; the client
//! facade's convenience getters recover from all of them by returning the
//! caller's default value.

mod fetch;
mod partition;

pub use fetch::FetchError;
pub use partition::PartitionError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for every user-visible SDK operation.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AbError {
    /// Operation invoked before `open` or after `close`
    #[error("client stopped")]
    NotRunning,

    /// No snapshot has ever been published
    #[error("client uninitialized")]
    Uninitialized,

    /// Client settings rejected (e.g. project id 0)
    #[error("invalid client setting: {message}")]
    InvalidSetting {
        /// Description of the rejected setting
        message: String,
    },

    /// Bound project is absent from the current snapshot
    #[error("project not found: {project_id}")]
    ProjectNotFound {
        /// Project the client is bound to
        project_id: i64,
    },

    /// Experiment name is absent from the project
    #[error("experiment not found: {name}")]
    ExperimentNotFound {
        /// Requested experiment name
        name: String,
    },

    /// Experiment exists but is switched off
    #[error("experiment disabled: {name}")]
    ExperimentDisabled {
        /// Requested experiment name
        name: String,
    },

    /// Neither whitelist nor partition table produced a strategy
    #[error("experiment not match: {name}")]
    ExperimentNotMatch {
        /// Requested experiment name
        name: String,
    },

    /// Resolved config has no such key
    #[error("key not found: {key}")]
    KeyNotFound {
        /// Requested key
        key: String,
    },

    /// Stored value cannot be converted into the requested kind
    #[error("cannot convert {key} into {expected}: {message}")]
    Conversion {
        /// Requested key
        key: String,
        /// Name of the requested value kind
        expected: String,
        /// Decoder description
        message: String,
    },

    /// Malformed partition spec
    #[error("partition error: {0}")]
    Partition(#[from] PartitionError),

    /// Remote fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

impl AbError {
    /// Steady-state outcome that callers expect and diagnostics never count.
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::ExperimentNotMatch { .. })
    }

    /// Failure caused by the experiment lookup path rather than the client lifecycle.
    pub const fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. }
                | Self::ExperimentNotFound { .. }
                | Self::ExperimentDisabled { .. }
                | Self::ExperimentNotMatch { .. }
                | Self::KeyNotFound { .. }
        )
    }
}

/// Standard Result type using AbError.
pub type AbResult<T> = std::result::Result<T, AbError>;

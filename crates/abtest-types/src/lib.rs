//! # A/B Test Types
//!
//! Wire models, client settings, and error definitions for the A/B test SDK.
//!
//! This crate provides the foundational type system for the SDK:
//!
//! - **`error`** - Typed error hierarchy for lookups, partition specs, and fetches
//! - **`models`** - Wire envelopes (`ExperimentWire`, `ConfigListResponse`) and `AbClientConfig`
//!
//! ## Architecture Role
//!
//! `abtest-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          abtest-types (this crate)
//!                  │
//!                  ▼
//!             abtest-core
//!                  │
//!                  ▼
//!            abtest-client
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for the wire protocol
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{AbError, AbResult, FetchError, PartitionError};

// Re-export core model types
pub use models::{
    AbClientConfig, ConfigListData, ConfigListRequest, ConfigListResponse, ConfigMap,
    ExperimentStatus, ExperimentType, ExperimentWire, ProjectId,
};

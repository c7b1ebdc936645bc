//! # A/B Test Core
//!
//! Client-side experiment assignment over a periodically synchronized config
//! snapshot.
//!
//! ## Architecture
//!
//! ```text
//! abtest-core/src/
//! ├── partitions/   # IntervalSet: partition spec grammar and set algebra
//! ├── hash.rs       # subject → bucket
//! ├── experiment/   # whitelist + partition table resolution
//! ├── snapshot.rs   # immutable project → experiment view
//! ├── sync/         # Fetcher trait, backoff, SyncEngine loop
//! ├── client/       # AbClient read API, typed config values
//! ├── diagnostics.rs# damped failure logging
//! └── logger.rs     # default tracing subscriber
//! ```
//!
//! Data flows one way: `Fetcher` → [`SyncEngine`] → [`Snapshot`] →
//! [`AbClient`] → caller.

#![allow(
    clippy::significant_drop_tightening,
    reason = "Writer lock intentionally spans the whole fetch-and-merge cycle"
)]
#![allow(clippy::implicit_clone, reason = "Explicit .clone() vs .to_string() is stylistic")]
#![allow(clippy::needless_continue, reason = "Explicit continue improves loop readability")]
// Test-only lints: allow panic!, println!, etc. in test code
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::float_cmp,
        clippy::needless_collect,
        clippy::assertions_on_result_states
    )
)]

pub mod client;
pub mod diagnostics;
pub mod experiment;
pub mod hash;
pub mod logger;
pub mod partitions;
pub mod snapshot;
pub mod sync;

// Re-export commonly used types
pub use abtest_types::{AbClientConfig, AbError, AbResult, ConfigMap, FetchError, PartitionError, ProjectId};
pub use client::{AbClient, ConfigValue};
pub use diagnostics::{ErrorTracker, TrackContext};
pub use experiment::Experiment;
pub use hash::bucket_index;
pub use partitions::{Interval, IntervalSet};
pub use snapshot::{ExperimentMap, Snapshot};
pub use sync::{ConfigUpdate, EngineState, Fetcher, SyncEngine, SyncOutcome, SyncStatus, TickOutcome};

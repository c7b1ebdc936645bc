#![doc = include_str!("../README.md")]

mod error;
mod fetcher;

pub use abtest_core::{AbClient, AbClientConfig, AbError, AbResult};
pub use error::ClientError;
pub use fetcher::HttpFetcher;

use std::sync::Arc;

/// Build an [`HttpFetcher`] from `config` and open an [`AbClient`] over it.
pub async fn open(config: AbClientConfig) -> AbResult<AbClient> {
    let config = config.validated()?;
    let fetcher = HttpFetcher::new(&config).map_err(|e| AbError::Fetch(e.into()))?;
    AbClient::open(config, Arc::new(fetcher)).await
}

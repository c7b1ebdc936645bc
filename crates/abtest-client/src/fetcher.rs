use abtest_core::{ConfigUpdate, Fetcher};
use abtest_types::{AbClientConfig, ConfigListRequest, ConfigListResponse, FetchError};
use async_trait::async_trait;
use reqwest::Client;

use crate::error::ClientError;

/// [`Fetcher`] that POSTs `{"time": watermark}` to the config-list endpoint.
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
}

impl HttpFetcher {
    /// Client with the per-request timeout from `config`.
    pub fn new(config: &AbClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Ok(Self { client, endpoint: config.endpoint() })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_once(&self, watermark: i64) -> Result<ConfigListResponse, ClientError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&ConfigListRequest { time: watermark })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError { status: status.as_u16(), message });
        }

        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, watermark: i64) -> Result<ConfigUpdate, FetchError> {
        let response = self.fetch_once(watermark).await?;
        let data = response.into_data()?;
        tracing::debug!(
            watermark,
            new_watermark = data.time,
            projects = data.config_list_map.len(),
            "Fetched A/B config list"
        );
        Ok(data.into())
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher").field("endpoint", &self.endpoint).finish_non_exhaustive()
    }
}

//! HTTP client for the portal scraper service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::model::ParsedTender;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0} from portal")]
    Status(u16),
}

/// Fetch-by-id collaborator the ingestion and reconciliation engines consume.
#[async_trait]
pub trait TenderSource: Send + Sync {
    /// `Ok(None)` means the portal has no tender with this id.
    async fn fetch_tender(&self, tender_id: i64) -> Result<Option<ParsedTender>, SourceError>;
}

/// Portal client over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTenderSource {
    client: Client,
    base_url: String,
}

impl HttpTenderSource {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TenderSource for HttpTenderSource {
    #[tracing::instrument(skip(self), fields(source.tender_id = tender_id))]
    async fn fetch_tender(&self, tender_id: i64) -> Result<Option<ParsedTender>, SourceError> {
        let url = format!("{}/tender/{}", self.base_url, tender_id);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json::<ParsedTender>().await?)),
            status => Err(SourceError::Status(status.as_u16())),
        }
    }
}

// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Source of page and archive bytes.
///
/// Every network read in the crate goes through this trait; timeouts and
/// retries are the implementor's business.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a URL, failing on transport errors and non-success statuses.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// GET a URL and decode the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let bytes = self.fetch(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// [`Fetcher`] backed by a reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &HttpConfig) -> Result<Self> {
        Ok(Self::new(create_async_client(config)?))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

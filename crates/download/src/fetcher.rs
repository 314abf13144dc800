//! Network fetch capability behind a trait seam.
//!
//! Tasks only ever see `Arc<dyn PageFetcher>`, so tests can swap in an
//! in-memory implementation and never touch the network.

use async_trait::async_trait;

use crate::error::{DownloadError, Result};

/// Retrieves one remote resource's bytes.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Reqwest-backed fetcher used outside of tests.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| DownloadError::transfer(url, &err))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|err| DownloadError::transfer(url, &err))?;

        Ok(bytes.to_vec())
    }
}

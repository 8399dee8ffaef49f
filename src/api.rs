use crate::error::{Result, TaskError};
use crate::models::{SeedDocument, SeedItem};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;

pub const DEFAULT_SEED_URL: &str = "https://dummyjson.com/todos";

/// Source of the tasks imported on first launch.
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Performs a single request; no retries and no caching.
    async fn fetch_seed(&self) -> Result<Vec<SeedItem>>;
}

pub struct HttpSeedSource {
    client: Client,
    url: String,
}

impl HttpSeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TaskError::NetworkUnavailable(e.to_string()))?;
        Ok(HttpSeedSource {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SeedSource for HttpSeedSource {
    async fn fetch_seed(&self) -> Result<Vec<SeedItem>> {
        let url = Url::parse(&self.url)
            .map_err(|e| TaskError::NetworkUnavailable(format!("{}: {}", self.url, e)))?;

        log::debug!("Fetching seed tasks from {}", url);
        let res = self.client.get(url).send().await?;

        if !res.status().is_success() {
            log::warn!("Seed endpoint replied with {}", res.status());
            return Err(TaskError::InvalidResponse(format!(
                "unexpected status {}",
                res.status()
            )));
        }

        let doc = res.json::<SeedDocument>().await?;
        log::info!("Fetched {} seed tasks", doc.todos.len());
        Ok(doc.todos)
    }
}

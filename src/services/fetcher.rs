use std::future::Future;

use anyhow::Context;
use reqwest::{header, Client};

use crate::configuration::ScraperSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Source of raw search-result pages.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<FetchedPage>> + Send;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &ScraperSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()
            .context("Failed to build scraper http client")?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html")
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;

        Ok(FetchedPage { status, body })
    }
}

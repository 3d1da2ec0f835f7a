use anyhow::{Context, Result};
use reqwest;
use std::time::Duration;
use tracing::{debug, trace};

const TIMEOUT: Duration = Duration::new(10, 0);

#[derive(Debug, Clone)]
pub struct Fetcher {
    url: String,
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// The node page with every line trimmed and joined, as the
    /// scrapers expect markup without layout whitespace.
    pub async fn fetch(&self) -> Result<String> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("http request {}", self.url))?
            .text()
            .await?;
        let content = squash(&body);
        debug!("http request successful: {} bytes", content.len());
        trace!("{content}");
        Ok(content)
    }
}

pub fn squash(body: &str) -> String {
    body.lines().map(str::trim).collect()
}

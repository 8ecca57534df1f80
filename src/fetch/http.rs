// src/fetch/http.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::{FetchResult, Fetcher};
use crate::normalize::strip_html;

/// Live fetcher: one GET per URL, fixed User-Agent, bounded timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, %url, "source fetch failed");
                return FetchResult::transport_error(e, url);
            }
        };

        let status = resp.status();
        if status.as_u16() >= 400 {
            tracing::warn!(status = status.as_u16(), %url, "source returned error status");
            return FetchResult::http_status(status.as_u16(), url);
        }

        match resp.text().await {
            Ok(body) => {
                let text = strip_html(&body);
                tracing::debug!(%url, chars = text.chars().count(), "source fetched");
                FetchResult::success(text)
            }
            Err(e) => {
                tracing::warn!(error = %e, %url, "reading source body failed");
                FetchResult::transport_error(e, url)
            }
        }
    }
}

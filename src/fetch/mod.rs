// src/fetch/mod.rs
//! Best-effort page retrieval. A fetch never errors: failures come back as
//! `ok = false` with a bracketed diagnostic that still reaches the prompt.

pub mod http;

use async_trait::async_trait;
use std::collections::HashMap;

pub use http::HttpFetcher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub ok: bool,
    /// Normalized page text, or a diagnostic when `ok` is false.
    pub text: String,
}

impl FetchResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    pub fn http_status(status: u16, url: &str) -> Self {
        Self {
            ok: false,
            text: format!("[HTTP {status}] {url}"),
        }
    }

    pub fn transport_error(cause: impl std::fmt::Display, url: &str) -> Self {
        Self {
            ok: false,
            text: format!("[FETCH ERROR: {cause}] {url}"),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Single attempt, no retries.
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// In-memory fetcher for tests and offline runs. Unknown URLs answer 404.
#[derive(Debug, Default, Clone)]
pub struct FixtureFetcher {
    pages: HashMap<String, FetchResult>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw HTML for `url`; it is normalized like a live page.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchResult::success(crate::normalize::strip_html(html)),
        );
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages
            .insert(url.to_string(), FetchResult::http_status(status, url));
        self
    }
}

#[async_trait]
impl Fetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| FetchResult::http_status(404, url))
    }
}

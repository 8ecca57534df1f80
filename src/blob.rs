// src/blob.rs
//! Per-region source blob: every configured source fetched once, cut to its
//! character budget, and serialized in priority order behind header lines.

use crate::config::{ForecastConfig, Region};
use crate::fetch::{FetchResult, Fetcher};
use crate::normalize::truncate_chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub source: String,
    pub url: String,
    pub rank: usize,
    pub result: FetchResult,
    /// `result.text` cut to the source's budget.
    pub excerpt: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlob {
    pub region: String,
    pub entries: Vec<BlobEntry>,
}

impl SourceBlob {
    /// Fetch every source configured for `region`, sequentially, in priority order.
    pub async fn collect(cfg: &ForecastConfig, region: &Region, fetcher: &dyn Fetcher) -> Self {
        let mut entries = Vec::new();
        for src in cfg.sources_for(region) {
            let result = fetcher.fetch(src.url).await;
            let excerpt = truncate_chars(&result.text, src.max_chars).to_string();
            tracing::debug!(
                region = %region.name,
                source = src.name,
                ok = result.ok,
                chars = excerpt.chars().count(),
                "source added to blob"
            );
            entries.push(BlobEntry {
                source: src.name.to_string(),
                url: src.url.to_string(),
                rank: src.rank,
                result,
                excerpt,
            });
        }
        Self {
            region: region.name.clone(),
            entries,
        }
    }

    pub fn ok_count(&self) -> usize {
        self.entries.iter().filter(|e| e.result.ok).count()
    }

    /// Plain-text form handed to the prompt. `slot` adds a day header line.
    pub fn render(&self, slot: Option<&str>) -> String {
        let mut parts = vec![format!("=== AREA: {} ===", self.region)];
        if let Some(label) = slot {
            parts.push(format!("=== DAY: {label} ==="));
        }
        for e in &self.entries {
            parts.push(format!(
                "--- SOURCE: {} URL: {} OK: {} ---",
                e.source.to_uppercase(),
                e.url,
                if e.result.ok { "True" } else { "False" }
            ));
            parts.push(e.excerpt.clone());
        }
        parts.join("\n")
    }
}

//! # Source Registry
//!
//! Regions, the sources scraped for each region, per-source character budgets
//! and the fixed priority order used for conflict resolution.
//!
//! - Loaded from TOML (`config/forecast.toml` or `$FORECAST_CONFIG_PATH`).
//! - Falls back to `ForecastConfig::default_seed()` when no file is present.
//! - Immutable after load; passed explicitly into the pipeline.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/forecast.toml";
pub const ENV_CONFIG_PATH: &str = "FORECAST_CONFIG_PATH";

/// Cap used for a source listed in a region but carrying no explicit budget.
pub const DEFAULT_MAX_CHARS: usize = 2000;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; MountainForecastBot/1.0; +https://github.com/)";

/// Which page layout (and therefore which cell contract) a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// Three days + outlook per region, fixed seven-line cells.
    #[default]
    Grid,
    /// Saturday + Sunday per region, free-form blocks with line prefixes.
    Weekend,
}

/// One entry of the priority list. Position in the list is the rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Display name, e.g. "The Peak District".
    pub name: String,
    /// Placeholder prefix in the page template, e.g. "PEAKS".
    pub key: String,
    /// source name -> URL
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

/// A source resolved for a particular region, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSource<'a> {
    pub rank: usize,
    pub name: &'a str,
    pub url: &'a str,
    pub max_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default)]
    pub schema: Schema,
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Upper bound on concurrent completion calls. 1 = strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Priority order: lower index wins conflicts.
    pub sources: Vec<SourceSpec>,
    pub regions: Vec<Region>,
}

fn default_template_path() -> PathBuf {
    PathBuf::from("page_template.html")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("index.html")
}
fn default_fetch_timeout_secs() -> u64 {
    20
}
fn default_completion_timeout_secs() -> u64 {
    120
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_concurrency() -> usize {
    1
}

impl ForecastConfig {
    /// Load from an explicit TOML file and validate it.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading forecast config from {}", path.display()))?;
        let cfg: ForecastConfig = toml::from_str(&content)
            .with_context(|| format!("parsing forecast config {}", path.display()))?;
        cfg.validated()
    }

    /// Load using env var + fallbacks:
    /// 1) $FORECAST_CONFIG_PATH (must exist)
    /// 2) config/forecast.toml
    /// 3) built-in seed
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default_seed())
    }

    fn validated(mut self) -> Result<Self> {
        let mut names = HashSet::new();
        for s in &self.sources {
            if !names.insert(s.name.to_ascii_lowercase()) {
                bail!("duplicate source in priority list: {}", s.name);
            }
        }
        let mut keys = HashSet::new();
        for r in &self.regions {
            if r.key.trim().is_empty() {
                bail!("region {:?} has an empty placeholder key", r.name);
            }
            if !keys.insert(r.key.clone()) {
                bail!("duplicate region key: {}", r.key);
            }
            let mut region_sources = HashSet::new();
            for name in r.sources.keys() {
                if !region_sources.insert(name.to_ascii_lowercase()) {
                    bail!("region {:?} lists source {name:?} twice", r.name);
                }
            }
        }
        if self.regions.is_empty() {
            bail!("forecast config defines no regions");
        }
        self.concurrency = self.concurrency.max(1);
        Ok(self)
    }

    /// Sources configured for `region`, in priority order. Sources the region
    /// lists but the priority list does not are ignored. Names match
    /// case-insensitively.
    pub fn sources_for<'a>(&'a self, region: &'a Region) -> Vec<RegionSource<'a>> {
        self.sources
            .iter()
            .enumerate()
            .filter_map(|(rank, spec)| {
                region
                    .sources
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(&spec.name))
                    .map(|(_, url)| RegionSource {
                        rank,
                        name: spec.name.as_str(),
                        url: url.as_str(),
                        max_chars: spec.max_chars,
                    })
            })
            .collect()
    }

    /// Source names in priority order.
    pub fn priority_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    /// Built-in registry: four UK hill regions, four sources.
    pub fn default_seed() -> Self {
        let sources = [
            ("mwis", 9000),
            ("metoffice", 9000),
            ("windy", 2000),
            ("mountainforecast", 2000),
        ]
        .into_iter()
        .map(|(name, max_chars)| SourceSpec {
            name: name.to_string(),
            max_chars,
        })
        .collect();

        let regions = [
            ("The Peak District", "PEAKS", "peak-district", "peak-district"),
            ("Eryri", "ERYRI", "snowdonia-national-park", "snowdonia"),
            ("Bannau Brycheiniog", "BANNAU", "brecon-beacons", "brecon-beacons"),
            ("The Lake District", "LAKES", "lake-district", "lake-district"),
        ]
        .into_iter()
        .map(|(name, key, mwis_slug, met_slug)| {
            let mut sources = BTreeMap::new();
            sources.insert(
                "mwis".to_string(),
                format!("https://www.mwis.org.uk/forecasts/english-and-welsh/{mwis_slug}"),
            );
            sources.insert(
                "metoffice".to_string(),
                format!(
                    "https://weather.metoffice.gov.uk/specialist-forecasts/mountain/{met_slug}"
                ),
            );
            sources.insert("windy".to_string(), "https://www.windy.com/".to_string());
            sources.insert(
                "mountainforecast".to_string(),
                "https://www.mountain-forecast.com/".to_string(),
            );
            Region {
                name: name.to_string(),
                key: key.to_string(),
                sources,
            }
        })
        .collect();

        Self {
            schema: Schema::Grid,
            template_path: default_template_path(),
            output_path: default_output_path(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            completion_timeout_secs: default_completion_timeout_secs(),
            user_agent: default_user_agent(),
            concurrency: default_concurrency(),
            sources,
            regions,
        }
    }
}

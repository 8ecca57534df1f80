// src/publish.rs
//! Failure-safe publisher. The page file is touched exactly once, and only
//! after everything upstream succeeded.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::compose::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Pending,
    Published,
}

#[derive(Debug)]
pub struct Publisher {
    template_path: PathBuf,
    output_path: PathBuf,
    state: PublishState,
}

impl Publisher {
    pub fn new(template_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            output_path: output_path.into(),
            state: PublishState::Pending,
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub async fn read_template(&self) -> Result<Template> {
        let raw = fs::read_to_string(&self.template_path)
            .await
            .with_context(|| format!("reading template {}", self.template_path.display()))?;
        Ok(Template::new(raw))
    }

    /// Whole-document write: temp file beside the target, then rename, so a
    /// reader sees either the old page or the new one.
    pub async fn publish(&mut self, html: &str) -> Result<()> {
        let file_name = self
            .output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("output path has no file name")?;
        let tmp = self.output_path.with_file_name(format!("{file_name}.tmp"));

        fs::write(&tmp, html.as_bytes())
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.output_path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("replacing {}", self.output_path.display()));
        }
        self.state = PublishState::Published;
        Ok(())
    }
}

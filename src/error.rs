// src/error.rs
//! Why a run did not publish.

use thiserror::Error;

/// Benign no-op: nothing was attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("{0} missing; leaving existing page unchanged")]
    MissingCredential(&'static str),
}

/// A run stopped before the page was written. The previous page stands.
#[derive(Debug, Error)]
pub enum AbortReason {
    #[error("forecast config unusable: {0:#}")]
    Config(anyhow::Error),
    #[error("client setup failed: {0:#}")]
    Setup(anyhow::Error),
    #[error("no completion for {region} / {slot}")]
    MissingCell { region: String, slot: String },
    #[error("completion for {region} / {slot} rejected: {reason}")]
    RejectedCell {
        region: String,
        slot: String,
        reason: String,
    },
    #[error("cell task failed: {0}")]
    Task(String),
    #[error("template unreadable: {0:#}")]
    Template(anyhow::Error),
    #[error("writing page failed: {0:#}")]
    Write(anyhow::Error),
}

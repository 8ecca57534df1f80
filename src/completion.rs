//! Completion client: provider abstraction over a text-completion service.
//!
//! Every failure (transport, non-2xx, missing choice, blank text) collapses
//! into `None`. Callers treat `None` as "cell absent"; nothing here invents
//! content.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const DEFAULT_MODEL: &str = "gpt-4.1";

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[async_trait]
pub trait Completer: Send + Sync {
    /// Prompt in, non-blank text out, or `None` on any failure.
    async fn complete(&self, prompt: &str) -> Option<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Credential + model picked up from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the key itself.
        f.debug_struct("Credentials")
            .field("key_len", &self.api_key.len())
            .field("model", &self.model)
            .finish()
    }
}

impl Credentials {
    /// `None` when `OPENAI_API_KEY` is unset or blank.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(ENV_API_KEY).ok()?.trim().to_string();
        if api_key.is_empty() {
            return None;
        }
        let model = std::env::var(ENV_MODEL)
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Some(Self { api_key, model })
    }
}

/// OpenAI Chat Completions, single user message.
pub struct OpenAiCompleter {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiCompleter {
    pub fn new(creds: &Credentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mountain-forecast/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("building completion http client")?;
        Ok(Self {
            http,
            api_key: creds.api_key.clone(),
            model: creds.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
}
#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}
#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}
#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

/// First choice's content, trimmed; `None` when absent or blank.
fn first_content(body: Resp) -> Option<String> {
    let text = body.choices.into_iter().next()?.message.content?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    async fn complete(&self, prompt: &str) -> Option<String> {
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let resp = match self
            .http
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "completion request failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            tracing::warn!(status = resp.status().as_u16(), "completion returned error status");
            return None;
        }
        let body: Resp = match resp.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "completion body did not parse");
                return None;
            }
        };
        let out = first_content(body);
        if out.is_none() {
            tracing::warn!(model = %self.model, "completion returned empty text");
        }
        out
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Returns `None` always.
pub struct DisabledCompleter;

#[async_trait]
impl Completer for DisabledCompleter {
    async fn complete(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Completer driven by a closure; used by tests and dry runs.
pub struct FnCompleter<F> {
    f: F,
}

impl<F> FnCompleter<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Completer for FnCompleter<F>
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    async fn complete(&self, prompt: &str) -> Option<String> {
        (self.f)(prompt).filter(|s| !s.trim().is_empty())
    }
    fn provider_name(&self) -> &'static str {
        "fn"
    }
}

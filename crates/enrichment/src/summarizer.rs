use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarizeError {
    /// The request never produced a response (connect, timeout, no runtime).
    Transport(String),
    /// Non-2xx status from the collaborator.
    Status(u16),
    /// 2xx response whose body could not be read.
    Decode(String),
    /// Nothing to summarize, or the collaborator returned a blank summary.
    Empty,
}

impl std::fmt::Display for SummarizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummarizeError::Transport(msg) => write!(f, "summarizer unreachable: {msg}"),
            SummarizeError::Status(code) => write!(f, "summarizer returned status {code}"),
            SummarizeError::Decode(msg) => write!(f, "bad summarizer response: {msg}"),
            SummarizeError::Empty => write!(f, "empty summary"),
        }
    }
}

impl std::error::Error for SummarizeError {}

/// External collaborator turning a cluster's member texts into one summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, texts: &[String]) -> Result<String, SummarizeError>;
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    texts: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// Upper bound on one summary request; a hung collaborator resolves as a
/// transport failure instead of staying `Loading`.
pub const DEFAULT_SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts `{"texts": [...]}` and expects `{"summary": "..."}` back.
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpSummarizer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            timeout: DEFAULT_SUMMARIZER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, texts: &[String]) -> Result<String, SummarizeError> {
        if texts.is_empty() {
            return Err(SummarizeError::Empty);
        }

        let resp = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&SummarizeRequest { texts })
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SummarizeError::Status(status.as_u16()));
        }

        let body: SummarizeResponse = resp
            .json()
            .await
            .map_err(|e| SummarizeError::Decode(e.to_string()))?;
        let summary = body.summary.trim();
        if summary.is_empty() {
            return Err(SummarizeError::Empty);
        }
        debug!(url = %self.url, members = texts.len(), "summary received");
        Ok(summary.to_string())
    }
}

/// Offline summarizer: the first sentence of the first few distinct texts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtractiveSummarizer {
    pub max_items: usize,
    /// Per-item cap in characters.
    pub max_chars: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self {
            max_items: 3,
            max_chars: 80,
        }
    }
}

impl ExtractiveSummarizer {
    pub fn summarize_now(&self, texts: &[String]) -> Result<String, SummarizeError> {
        let mut distinct: Vec<&str> = Vec::new();
        for text in texts {
            let t = text.trim();
            if !t.is_empty() && !distinct.contains(&t) {
                distinct.push(t);
            }
        }
        if distinct.is_empty() {
            return Err(SummarizeError::Empty);
        }

        let picked: Vec<String> = distinct
            .iter()
            .take(self.max_items.max(1))
            .map(|t| truncate_chars(first_sentence(t), self.max_chars))
            .collect();
        let mut out = picked.join(" / ");
        let rest = distinct.len().saturating_sub(picked.len());
        if rest > 0 {
            out.push_str(&format!(" (+{rest} more)"));
        }
        Ok(out)
    }
}

#[async_trait]
impl Summarizer for ExtractiveSummarizer {
    async fn summarize(&self, texts: &[String]) -> Result<String, SummarizeError> {
        self.summarize_now(texts)
    }
}

fn first_sentence(text: &str) -> &str {
    match text.find(['.', '!', '?']) {
        Some(end) => &text[..=end],
        None => text,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

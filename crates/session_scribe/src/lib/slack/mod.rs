use std::{future::Future, path::Path};

use reqwest::Client;
use serde::Deserialize;

/// Delivers finished summaries to the destination channel.
pub trait SummaryPoster {
    fn post_summary(&self, text: &str) -> impl Future<Output = Result<(), PostError>> + Send;

    fn upload_transcript(&self, path: &Path) -> impl Future<Output = Result<(), PostError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Slack API error: {0}")]
    Api(String),
    #[error("Missing permission: {0}")]
    Permission(String),
}

impl PostError {
    pub fn is_permission(&self) -> bool {
        matches!(self, PostError::Permission(_))
    }
}

/// Error codes Slack returns when the bot token lacks a scope or the
/// workspace forbids the action. These degrade instead of failing the run.
const PERMISSION_ERRORS: [&str; 3] = ["missing_scope", "not_allowed_token_type", "restricted_action"];

#[derive(Debug, Clone)]
pub struct SlackClient {
    client: Client,
    token: String,
    channel_id: String,
    base_url: String,
}

/// Slack's response envelope; on failure `ok` is false and `error` holds a
/// machine-readable code.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(token: impl Into<String>, channel_id: impl Into<String>) -> Self {
        SlackClient {
            client: Client::new(),
            token: token.into(),
            channel_id: channel_id.into(),
            base_url: "https://slack.com/api".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn check(resp: SlackResponse) -> Result<(), PostError> {
        if resp.ok {
            return Ok(());
        }
        let code = resp.error.unwrap_or_else(|| "unknown_error".into());
        if PERMISSION_ERRORS.contains(&code.as_str()) {
            Err(PostError::Permission(code))
        } else {
            Err(PostError::Api(code))
        }
    }
}

impl SummaryPoster for SlackClient {
    async fn post_summary(&self, text: &str) -> Result<(), PostError> {
        let body = serde_json::json!({
            "channel": self.channel_id,
            "text": text,
        });

        let resp = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        Self::check(resp.json::<SlackResponse>().await?)
    }

    async fn upload_transcript(&self, path: &Path) -> Result<(), PostError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("transcript.txt")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("text/plain")
            .unwrap();

        let form = reqwest::multipart::Form::new()
            .text("channels", self.channel_id.clone())
            .text("title", file_name)
            .part("file", part);

        let resp = self
            .client
            .post(format!("{}/files.upload", self.base_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        Self::check(resp.json::<SlackResponse>().await?)
    }
}

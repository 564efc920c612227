// Classifier Gateway
// Client for the proxy route that fronts the hosted completion model.
// One request per analysis, no retries: any failure sends the caller to the
// local fallback.

use crate::models::GatewayRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub const GATEWAY_DEFAULT_URL: &str = "http://127.0.0.1:3000/api/groq";

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(#[from] reqwest::Error),
    #[error("gateway error: {status} - {message}")]
    BadStatus { status: u16, message: String },
    #[error("gateway response unusable: {0}")]
    BadResponse(String),
    #[error("missing message content in gateway response")]
    MissingContent,
}

impl GatewayError {
    /// Transport failures versus everything the gateway said but we could not use.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Anything that can turn a system/user prompt pair into a parsed JSON verdict.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, GatewayError>;
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Option<Vec<CompletionChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

pub struct GatewayClient {
    client: Client,
    url: String,
}

impl GatewayClient {
    /// No timeout unless one is given; a hung request simply delays the fallback.
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Gateway for GatewayClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<Value, GatewayError> {
        let request = GatewayRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), latency_ms, "[GATEWAY] non-success status");
            return Err(GatewayError::BadStatus {
                status: status.as_u16(),
                message: body,
            });
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::BadResponse(e.to_string()))?;

        let content = data
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .ok_or(GatewayError::MissingContent)?;

        debug!(latency_ms, content_len = content.len(), "[GATEWAY] completion received");
        parse_content(&content)
    }
}

/// The message content must itself be a JSON object.
pub fn parse_content(content: &str) -> Result<Value, GatewayError> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| GatewayError::BadResponse(format!("content is not JSON: {}", e)))?;
    if !value.is_object() {
        return Err(GatewayError::BadResponse("content is not a JSON object".to_string()));
    }
    Ok(value)
}

/// Deserialize a gateway value into one of the verdict schemas.
pub fn parse_verdict<T: DeserializeOwned>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::BadResponse(e.to_string()))
}

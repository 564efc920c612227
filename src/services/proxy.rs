// Gateway Proxy
// The only place the upstream credential lives. Accepts the gateway request
// body, attaches the bearer token and relays the upstream response untouched.

use crate::models::GatewayRequest;
use crate::services::config_store::ProxyConfig;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::signal;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("missing upstream credential: set {API_KEY_ENV}")]
    MissingApiKey,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!("[PROXY] {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "proxy failure" })),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: i32,
    response_format: ResponseFormat,
}

struct ProxyInner {
    client: Client,
    upstream_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: i32,
}

#[derive(Clone)]
pub struct ProxyState {
    inner: Arc<ProxyInner>,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig, api_key: String) -> Result<Self, ProxyError> {
        if api_key.trim().is_empty() {
            return Err(ProxyError::MissingApiKey);
        }
        Ok(Self {
            inner: Arc::new(ProxyInner {
                client: Client::builder().build()?,
                upstream_url: config.upstream_url.clone(),
                api_key: api_key.trim().to_string(),
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            }),
        })
    }

    /// Credential from `GROQ_API_KEY`. There is no built-in fallback key.
    pub fn from_env(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let key = std::env::var(API_KEY_ENV).map_err(|_| ProxyError::MissingApiKey)?;
        Self::new(config, key)
    }

    fn chat_request(&self, req: GatewayRequest) -> ChatRequest {
        ChatRequest {
            model: self.inner.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: req.system_prompt,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: req.user_prompt,
                },
            ],
            temperature: self.inner.temperature,
            max_tokens: self.inner.max_tokens,
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
        }
    }
}

pub fn create_router(state: ProxyState, static_dir: Option<&std::path::Path>) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/api/groq", post(forward_completion))
        .with_state(state);

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

async fn health_check() -> &'static str {
    "OK"
}

/// Relay upstream JSON: 200 on success, the upstream status otherwise.
async fn forward_completion(
    State(state): State<ProxyState>,
    Json(req): Json<GatewayRequest>,
) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let body = state.chat_request(req);

    let response = state
        .inner
        .client
        .post(&state.inner.upstream_url)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", state.inner.api_key))
        .json(&body)
        .send()
        .await?;

    let upstream_status = response.status();
    let data: Value = response.json().await?;
    let latency_ms = start.elapsed().as_millis() as i64;

    let status = if upstream_status.is_success() {
        StatusCode::OK
    } else {
        warn!(status = upstream_status.as_u16(), latency_ms, "[PROXY] upstream error status");
        StatusCode::from_u16(upstream_status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
    };

    info!(status = status.as_u16(), latency_ms, "[PROXY] relayed completion");
    Ok((status, Json(data)).into_response())
}

/// Bind and serve until Ctrl-C or SIGTERM.
pub async fn serve(config: &ProxyConfig, state: ProxyState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let app = create_router(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("[PROXY] listening on http://{}", addr);
    if let Some(dir) = &config.static_dir {
        info!("[PROXY] serving static files from {}", dir.display());
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("[PROXY] shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("[PROXY] failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("[PROXY] failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("[PROXY] shutdown signal received");
}

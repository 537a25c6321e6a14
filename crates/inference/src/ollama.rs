//! Ollama backend implementation.
//!
//! Talks to the native Ollama API:
//! - `POST /api/generate` — completion (single JSON object, or NDJSON when streaming)
//! - `GET  /api/tags`     — installed models, also used as the health probe
//!
//! One client-wide timeout covers each generation call from connect to the
//! last body byte. Probes use the shorter probe timeout.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use llmgate_config::BackendConfig;
use llmgate_core::backend::{BackendRequest, Frame, FrameStream, InferenceBackend};
use llmgate_core::error::BackendError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ndjson;

/// An Ollama inference backend.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
    probe_timeout: Duration,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: i32,
}

/// Non-streaming response of `POST /api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    /// Create a client for `base_url` with the given generation and probe timeouts.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        probe_timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Connection(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            probe_timeout,
        })
    }

    /// Create a client from the `[backend]` configuration section.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.probe_timeout_secs),
        )
    }

    fn body<'a>(request: &'a BackendRequest, stream: bool) -> GenerateBody<'a> {
        GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            stream,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_length,
            },
        }
    }

    /// Send `POST /api/generate` and fail on any non-success status.
    async fn post_generate(
        &self,
        request: &BackendRequest,
        stream: bool,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(
            model = %request.model,
            stream,
            prompt_len = request.prompt.len(),
            "Sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .json(&Self::body(request, stream))
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Backend returned error");
            return Err(BackendError::Unavailable {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

/// Map a transport failure; timeouts keep their own wording.
fn connection_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Connection(format!("request timed out: {e}"))
    } else {
        BackendError::Connection(e.to_string())
    }
}

/// A well-formed frame that reports a backend failure ends the stream.
fn reject_error_frame(frame: Frame) -> Result<Frame, BackendError> {
    match frame.error {
        Some(message) => Err(BackendError::Generation(message)),
        None => Ok(frame),
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn generate(&self, request: BackendRequest) -> Result<String, BackendError> {
        let response = self.post_generate(&request, false).await?;

        let bytes = response.bytes().await.map_err(connection_error)?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes).map_err(|e| {
            BackendError::Generation(format!("Failed to parse backend response: {e}"))
        })?;

        if let Some(error) = parsed.error {
            return Err(BackendError::Generation(error));
        }

        Ok(parsed.response)
    }

    async fn generate_stream(&self, request: BackendRequest) -> Result<FrameStream, BackendError> {
        let response = self.post_generate(&request, true).await?;

        let body = Box::pin(response.bytes_stream());
        Ok(Box::pin(
            ndjson::frames(body).map(|frame| frame.and_then(reject_error_frame)),
        ))
    }

    async fn list_models(&self) -> Result<serde_json::Value, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Unavailable {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Generation(format!("Failed to parse model list: {e}")))
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(connection_error)?;
        Ok(response.status().is_success())
    }
}

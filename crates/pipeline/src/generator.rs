//! The generation service: compose, then call the backend.

use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use llmgate_core::backend::{BackendRequest, InferenceBackend};
use llmgate_core::error::Result;
use llmgate_core::message::{GenerationRequest, GenerationResponse, StreamChunk};
use tracing::{debug, info};

use crate::composer::PromptComposer;
use crate::relay::relay;

/// Outward chunks of one streamed generation.
pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// Runs generation requests end to end.
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn InferenceBackend>,
    composer: PromptComposer,
    default_model: String,
}

impl Generator {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        composer: PromptComposer,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            composer,
            default_model: default_model.into(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        &self.backend
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// The model a request runs on: its own override, or the default.
    pub fn resolve_model<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request
            .model
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model)
    }

    async fn backend_request(&self, request: &GenerationRequest) -> Result<BackendRequest> {
        let prompt = self.composer.compose(request).await?;
        Ok(BackendRequest {
            model: self.resolve_model(request).to_string(),
            prompt,
            temperature: request.temperature,
            max_length: request.max_length,
        })
    }

    /// Generate a complete answer.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let backend_request = self.backend_request(request).await?;
        let model = backend_request.model.clone();
        info!(model = %model, backend = self.backend.name(), "Generating");

        let generated_text = self.backend.generate(backend_request).await?;
        debug!(chars = generated_text.chars().count(), "Generation complete");

        Ok(GenerationResponse {
            generated_text,
            prompt: request.prompt.clone(),
            model,
        })
    }

    /// Start a streamed generation.
    ///
    /// The backend has already accepted the request when this returns `Ok`;
    /// everything after that arrives in-band as chunks.
    pub async fn stream(&self, request: &GenerationRequest) -> Result<ChunkStream> {
        let backend_request = self.backend_request(request).await?;
        info!(
            model = %backend_request.model,
            backend = self.backend.name(),
            "Streaming generation"
        );

        let frames = self.backend.generate_stream(backend_request).await?;
        Ok(Box::pin(relay(frames)))
    }
}

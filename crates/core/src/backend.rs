//! Inference backend trait — the abstraction over the LLM server.
//!
//! A backend knows how to turn a composed prompt into generated text,
//! either as one complete answer or as a stream of partial-result frames.
//!
//! Implementations: Ollama (`llmgate-inference`), scripted mocks in tests.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use crate::error::BackendError;

/// Parameters of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    /// The model to run (e.g., "llama3.2")
    pub model: String,

    /// The fully composed prompt
    pub prompt: String,

    /// Temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Maximum tokens to generate; negative values are passed through
    pub max_length: i32,
}

/// One partial result of a streaming generation.
///
/// Every field is optional on the wire; a frame without `response`
/// carries no text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Text fragment produced since the previous frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    /// Whether this is the final frame
    #[serde(default)]
    pub done: bool,

    /// Backend-reported failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Frame {
    /// A text frame.
    pub fn text(fragment: impl Into<String>, done: bool) -> Self {
        Self {
            response: Some(fragment.into()),
            done,
            error: None,
        }
    }
}

/// A lazily-read sequence of frames. Dropping it releases the backend connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, BackendError>> + Send>>;

/// The core InferenceBackend trait.
///
/// The pipeline calls `generate()` or `generate_stream()` without knowing
/// which server is behind it.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "ollama").
    fn name(&self) -> &str;

    /// The base URL requests are sent to, for diagnostics.
    fn base_url(&self) -> &str;

    /// Generate a complete answer and return its text.
    async fn generate(&self, request: BackendRequest) -> Result<String, BackendError>;

    /// Start a streaming generation.
    ///
    /// Fails before any frame is produced when the backend is unreachable
    /// or answers with a non-success status. Default implementation calls
    /// `generate()` and wraps the result as a single final frame.
    async fn generate_stream(&self, request: BackendRequest) -> Result<FrameStream, BackendError> {
        let text = self.generate(request).await?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(Frame::text(text, true))])))
    }

    /// The backend's model listing, passed through unchanged.
    async fn list_models(&self) -> Result<serde_json::Value, BackendError> {
        Ok(serde_json::json!({ "models": [] }))
    }

    /// Health check — can we reach the backend?
    async fn health_check(&self) -> Result<bool, BackendError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn frame_fields_are_optional() {
        let frame: Frame = serde_json::from_str("{}").unwrap();
        assert_eq!(frame, Frame::default());

        let frame: Frame =
            serde_json::from_str(r#"{"model":"llama3.2","response":"Hi","done":false}"#).unwrap();
        assert_eq!(frame, Frame::text("Hi", false));
    }

    struct EchoBackend;

    #[async_trait]
    impl InferenceBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        fn base_url(&self) -> &str {
            "memory://echo"
        }

        async fn generate(&self, request: BackendRequest) -> Result<String, BackendError> {
            Ok(request.prompt)
        }
    }

    #[tokio::test]
    async fn default_stream_wraps_complete_answer() {
        let request = BackendRequest {
            model: "m".into(),
            prompt: "echo me".into(),
            temperature: 0.0,
            max_length: 10,
        };
        let frames: Vec<_> = EchoBackend
            .generate_stream(request)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap(), &Frame::text("echo me", true));
    }
}

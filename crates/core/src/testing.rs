//! Scripted backend for tests of crates built on [`InferenceBackend`].
//!
//! Enabled with the `test-util` feature.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::backend::{BackendRequest, Frame, FrameStream, InferenceBackend};
use crate::error::BackendError;

/// A backend that replays scripted frames and records what it was sent.
pub struct ScriptedBackend {
    frames: Vec<Frame>,
    rejection: Option<BackendError>,
    trailing_error: Option<BackendError>,
    healthy: bool,
    requests: Mutex<Vec<BackendRequest>>,
    health_checks: AtomicUsize,
}

impl ScriptedBackend {
    /// Answer every request with `text`, as one final frame when streamed.
    pub fn answering(text: &str) -> Self {
        Self::streaming(vec![Frame::text(text, true)])
    }

    /// Stream `frames`; a complete answer is their concatenated text.
    pub fn streaming(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            rejection: None,
            trailing_error: None,
            healthy: true,
            requests: Mutex::new(Vec::new()),
            health_checks: AtomicUsize::new(0),
        }
    }

    /// Reject every generation before any frame.
    pub fn failing(error: BackendError) -> Self {
        Self {
            rejection: Some(error),
            ..Self::streaming(Vec::new())
        }
    }

    /// Stream `frames`, then break off with `error`.
    pub fn streaming_then_fail(frames: Vec<Frame>, error: BackendError) -> Self {
        Self {
            trailing_error: Some(error),
            ..Self::streaming(frames)
        }
    }

    /// Fail health checks and model listing.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn last_request(&self) -> Option<BackendRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_request().map(|r| r.prompt)
    }

    pub fn health_checks(&self) -> usize {
        self.health_checks.load(Ordering::SeqCst)
    }

    fn accept(&self, request: BackendRequest) -> Result<(), BackendError> {
        self.requests.lock().unwrap().push(request);
        match &self.rejection {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn base_url(&self) -> &str {
        "memory://scripted"
    }

    async fn generate(&self, request: BackendRequest) -> Result<String, BackendError> {
        self.accept(request)?;
        Ok(self.frames.iter().filter_map(|f| f.response.clone()).collect())
    }

    async fn generate_stream(&self, request: BackendRequest) -> Result<FrameStream, BackendError> {
        self.accept(request)?;
        let mut items: Vec<Result<Frame, BackendError>> =
            self.frames.iter().cloned().map(Ok).collect();
        if let Some(e) = &self.trailing_error {
            items.push(Err(e.clone()));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }

    async fn list_models(&self) -> Result<serde_json::Value, BackendError> {
        if !self.healthy {
            return Err(BackendError::Connection("connection refused".into()));
        }
        Ok(serde_json::json!({ "models": [{ "name": "test-model:latest" }] }))
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        if self.healthy {
            Ok(true)
        } else {
            Err(BackendError::Connection("connection refused".into()))
        }
    }
}

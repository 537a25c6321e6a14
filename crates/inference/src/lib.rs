//! Inference backend implementations for llmgate.
//!
//! All backends implement the `llmgate_core::InferenceBackend` trait.

pub mod ndjson;
pub mod ollama;

pub use ndjson::FrameDecoder;
pub use ollama::OllamaClient;

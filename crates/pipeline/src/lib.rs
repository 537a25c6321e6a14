//! The llmgate generation pipeline.
//!
//! A request flows through three stages:
//!
//! 1. **Compose** the prompt (system, stored knowledge, context, history)
//! 2. **Generate** on the inference backend
//! 3. **Relay** streamed frames to the caller as [`StreamChunk`](llmgate_core::StreamChunk)s
//!
//! The pipeline does not know which backend or store sits behind it.

pub mod composer;
pub mod generator;
pub mod labels;
pub mod relay;

pub use composer::{PromptComposer, render};
pub use generator::{ChunkStream, Generator};
pub use labels::PromptLabels;
pub use relay::relay;

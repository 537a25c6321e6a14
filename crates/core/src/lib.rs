//! # llmgate Core
//!
//! Domain types, traits, and error definitions for the llmgate inference
//! gateway. This crate has **no framework dependencies**: it defines the
//! domain model the storage, inference, pipeline and HTTP crates implement
//! against.
//!
//! Every external collaborator is a trait here ([`KnowledgeStore`],
//! [`InferenceBackend`]); implementations live in their own crates, and
//! tests swap in in-memory or scripted versions.

pub mod backend;
pub mod error;
pub mod knowledge;
pub mod message;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export key types at crate root for ergonomics
pub use backend::{BackendRequest, Frame, FrameStream, InferenceBackend};
pub use error::{BackendError, Error, KnowledgeError, Result};
pub use knowledge::{KnowledgeEntry, KnowledgeStore, NewKnowledge};
pub use message::{ChatMessage, GenerationRequest, GenerationResponse, Role, StreamChunk};

//! Gateway state for handler tests.

use std::sync::Arc;

use llmgate_config::AppConfig;
use llmgate_knowledge::InMemoryKnowledgeStore;

pub use llmgate_core::testing::ScriptedBackend;

use crate::{GatewayState, SharedState};

/// Gateway state over an in-memory store and `backend`.
pub async fn test_state(backend: Arc<ScriptedBackend>) -> SharedState {
    let mut config = AppConfig::default();
    config.backend.default_model = "test-model".into();
    config.knowledge.backend = "memory".into();

    let store = Arc::new(InMemoryKnowledgeStore::new());
    Arc::new(GatewayState::new(config, store, backend))
}

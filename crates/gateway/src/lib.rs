//! HTTP API gateway for llmgate.
//!
//! Exposes service info, health, the backend's model list, generation
//! (plain JSON or server-sent events) and knowledge management.
//!
//! Built on Axum; every route is wrapped in HTTP trace logging.

pub mod api;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use llmgate_config::AppConfig;
use llmgate_core::backend::InferenceBackend;
use llmgate_core::knowledge::KnowledgeStore;
use llmgate_inference::OllamaClient;
use llmgate_pipeline::{Generator, PromptComposer, PromptLabels};

pub use api::{ApiError, ErrorResponse};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub store: Arc<dyn KnowledgeStore>,
    pub generator: Generator,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Wire the pipeline for `config` around an opened store and backend.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn KnowledgeStore>,
        backend: Arc<dyn InferenceBackend>,
    ) -> Self {
        let composer = PromptComposer::new(
            store.clone(),
            PromptLabels::for_locale(&config.prompt.locale),
        );
        let generator = Generator::new(backend, composer, &config.backend.default_model);
        Self {
            config,
            store,
            generator,
        }
    }

    pub fn backend(&self) -> &Arc<dyn InferenceBackend> {
        self.generator.backend()
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/models", get(models_handler))
        .merge(api::api_router())
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Opens the knowledge store (fatal on failure), probes the backend
/// (never fatal), then serves until the process is stopped.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let store = llmgate_knowledge::open_store(&config.knowledge).await?;
    info!(store = store.name(), path = %config.knowledge.path.display(), "Knowledge store ready");

    let backend: Arc<dyn InferenceBackend> = Arc::new(OllamaClient::from_config(&config.backend)?);
    probe_backend(
        backend.as_ref(),
        config.startup.probe_attempts,
        Duration::from_secs(config.startup.probe_backoff_secs),
    )
    .await;

    let state = Arc::new(GatewayState::new(config, store, backend));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Wait for the backend to answer its health check.
///
/// Tries up to `attempts` times with a fixed `backoff` in between and logs
/// the installed models once it answers. Returns whether it ever did.
pub async fn probe_backend(
    backend: &dyn InferenceBackend,
    attempts: u32,
    backoff: Duration,
) -> bool {
    for attempt in 1..=attempts {
        match backend.health_check().await {
            Ok(true) => {
                info!(url = backend.base_url(), attempt, "Backend connected");
                log_models(backend).await;
                return true;
            }
            Ok(false) => warn!(attempt, attempts, "Backend not ready"),
            Err(e) => warn!(attempt, attempts, error = %e, "Backend unreachable"),
        }

        if attempt < attempts {
            tokio::time::sleep(backoff).await;
        }
    }

    warn!(
        url = backend.base_url(),
        "Backend not connected; serving anyway, generation will fail until it is up"
    );
    false
}

/// Names of the models in a `/api/tags` listing.
pub fn model_names(listing: &serde_json::Value) -> Vec<String> {
    listing["models"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn log_models(backend: &dyn InferenceBackend) {
    match backend.list_models().await {
        Ok(listing) => {
            let names = model_names(&listing);
            if names.is_empty() {
                warn!("No models installed on the backend");
            } else {
                info!(models = ?names, "Available models");
            }
        }
        Err(e) => warn!(error = %e, "Could not list models"),
    }
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend_connected: bool,
    pub backend_url: String,
    pub default_model: String,
}

async fn root_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "llmgate",
        "version": env!("CARGO_PKG_VERSION"),
        "backend_url": state.backend().base_url(),
        "default_model": state.generator.default_model(),
        "endpoints": {
            "/generate": "POST - generate text (stream, system, context, messages, use_knowledge)",
            "/health": "GET - health check",
            "/models": "GET - models installed on the backend",
            "/knowledge": "GET/POST - list or save knowledge entries",
            "/knowledge/categories": "GET - distinct knowledge categories",
            "/knowledge/{id}": "GET/DELETE - fetch or remove one entry"
        }
    }))
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let connected = state.backend().health_check().await.unwrap_or(false);
    Json(HealthResponse {
        status: if connected {
            "healthy".into()
        } else {
            "backend_not_connected".into()
        },
        backend_connected: connected,
        backend_url: state.backend().base_url().to_string(),
        default_model: state.generator.default_model().to_string(),
    })
}

async fn models_handler(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .backend()
        .list_models()
        .await
        .map(Json)
        .map_err(|e| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedBackend, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let app = build_router(test_state(Arc::new(ScriptedBackend::answering(""))).await);
        let (status, body) = get_json(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default_model"], "test-model");
        assert_eq!(body["backend_url"], "memory://scripted");
        assert!(body["endpoints"]["/generate"].is_string());
    }

    #[tokio::test]
    async fn health_reports_connected_backend() {
        let app = build_router(test_state(Arc::new(ScriptedBackend::answering(""))).await);
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        let health: HealthResponse = serde_json::from_value(body).unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.backend_connected);
    }

    #[tokio::test]
    async fn health_reports_unreachable_backend() {
        let backend = Arc::new(ScriptedBackend::answering("").unhealthy());
        let app = build_router(test_state(backend).await);
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "backend_not_connected");
        assert_eq!(body["backend_connected"], false);
    }

    #[tokio::test]
    async fn models_pass_through() {
        let app = build_router(test_state(Arc::new(ScriptedBackend::answering(""))).await);
        let (status, body) = get_json(app, "/models").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"][0]["name"], "test-model:latest");
    }

    #[tokio::test]
    async fn models_unreachable_is_503() {
        let backend = Arc::new(ScriptedBackend::answering("").unhealthy());
        let app = build_router(test_state(backend).await);
        let (status, body) = get_json(app, "/models").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].is_string());
    }

    #[test]
    fn model_names_from_listing() {
        let listing = serde_json::json!({
            "models": [{ "name": "a" }, { "size": 1 }, { "name": "b" }]
        });
        assert_eq!(model_names(&listing), vec!["a", "b"]);
        assert!(model_names(&serde_json::json!({})).is_empty());
    }

    #[tokio::test]
    async fn probe_succeeds_first_try() {
        let backend = ScriptedBackend::answering("");
        assert!(probe_backend(&backend, 3, Duration::from_millis(1)).await);
        assert_eq!(backend.health_checks(), 1);
    }

    #[tokio::test]
    async fn probe_gives_up_after_attempts() {
        let backend = ScriptedBackend::answering("").unhealthy();
        assert!(!probe_backend(&backend, 3, Duration::from_millis(1)).await);
        assert_eq!(backend.health_checks(), 3);
    }
}

//! Generation and knowledge endpoints.
//!
//! - `POST   /generate`               — complete answer, or SSE stream when `stream` is set
//! - `POST   /knowledge`              — save an entry
//! - `GET    /knowledge`              — list entries, optionally `?category=`
//! - `GET    /knowledge/categories`   — distinct categories
//! - `GET    /knowledge/{id}`         — one entry
//! - `DELETE /knowledge/{id}`         — remove an entry

use std::convert::Infallible;

use axum::{
    Router,
    extract::rejection::{JsonRejection, PathRejection},
    extract::{FromRequest, FromRequestParts, Query, State},
    http::StatusCode,
    response::sse::{Event as SseEvent, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use llmgate_core::error::{BackendError, Error, KnowledgeError};
use llmgate_core::knowledge::{KnowledgeEntry, NewKnowledge};
use llmgate_core::message::GenerationRequest;

use crate::SharedState;

/// Routes for generation and knowledge management.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/knowledge", post(save_knowledge_handler).get(list_knowledge_handler))
        .route("/knowledge/categories", get(categories_handler))
        .route(
            "/knowledge/{id}",
            get(get_knowledge_handler).delete(delete_knowledge_handler),
        )
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error answered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<KnowledgeError> for ApiError {
    fn from(e: KnowledgeError) -> Self {
        let status = match e {
            KnowledgeError::NotFound(_) => StatusCode::NOT_FOUND,
            KnowledgeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        let status = match &e {
            BackendError::Unavailable { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            BackendError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            BackendError::Generation(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::Knowledge(e) => e.into(),
            Error::Backend(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// `Json` whose rejection is answered as an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

/// `Path` whose rejection is answered as an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct ApiPath<T>(T);

// ── Generation ────────────────────────────────────────────────────────────

/// `POST /generate`
///
/// The backend is contacted before any response bytes are written, so a
/// rejected streaming request still gets a plain HTTP error.
async fn generate_handler(
    State(state): State<SharedState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> Result<Response, ApiError> {
    info!(
        stream = request.stream,
        use_knowledge = request.use_knowledge,
        prompt_len = request.prompt.len(),
        "generate request"
    );

    if !request.stream {
        let response = state.generator.generate(&request).await?;
        return Ok(Json(response).into_response());
    }

    let chunks = state.generator.stream(&request).await?;
    let events = chunks.map(|chunk| {
        let data = serde_json::to_string(&chunk).unwrap_or_default();
        Ok::<_, Infallible>(SseEvent::default().data(data))
    });

    Ok(Sse::new(events).into_response())
}

// ── Knowledge ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub category: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaveKnowledgeResponse {
    pub status: String,
    pub id: i64,
    pub item: KnowledgeItem,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KnowledgeListResponse {
    pub count: usize,
    pub items: Vec<KnowledgeEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteKnowledgeResponse {
    pub status: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    category: Option<String>,
}

/// `POST /knowledge`
async fn save_knowledge_handler(
    State(state): State<SharedState>,
    ApiJson(item): ApiJson<KnowledgeItem>,
) -> Result<(StatusCode, Json<SaveKnowledgeResponse>), ApiError> {
    if item.category.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "category must not be empty",
        ));
    }

    let id = state
        .store
        .save(NewKnowledge::new(&item.category, &item.title, &item.content))
        .await?;
    info!(id, category = %item.category, "Knowledge saved");

    Ok((
        StatusCode::CREATED,
        Json(SaveKnowledgeResponse {
            status: "saved".into(),
            id,
            item,
        }),
    ))
}

/// `GET /knowledge`
async fn list_knowledge_handler(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<KnowledgeListResponse>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let items = state.store.list(category).await?;
    Ok(Json(KnowledgeListResponse {
        count: items.len(),
        items,
    }))
}

/// `GET /knowledge/categories`
async fn categories_handler(
    State(state): State<SharedState>,
) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = state.store.categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// `GET /knowledge/{id}`
async fn get_knowledge_handler(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<KnowledgeEntry>, ApiError> {
    Ok(Json(state.store.get(id).await?))
}

/// `DELETE /knowledge/{id}`
async fn delete_knowledge_handler(
    State(state): State<SharedState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<DeleteKnowledgeResponse>, ApiError> {
    state.store.delete(id).await?;
    info!(id, "Knowledge deleted");
    Ok(Json(DeleteKnowledgeResponse {
        status: "deleted".into(),
        id,
    }))
}

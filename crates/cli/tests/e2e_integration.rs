//! End-to-end integration tests for llmgate.
//!
//! These tests drive the full path a request takes in production:
//! HTTP gateway → prompt composer (with knowledge) → Ollama client →
//! a throw-away Ollama-compatible server → relay → SSE/JSON response.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use tower::ServiceExt;

use llmgate_config::AppConfig;
use llmgate_core::message::StreamChunk;
use llmgate_gateway::{GatewayState, build_router};
use llmgate_inference::OllamaClient;
use llmgate_knowledge::InMemoryKnowledgeStore;

// ── Mock Ollama server ───────────────────────────────────────────────────

/// Request bodies received by the mock backend.
type Received = Arc<Mutex<Vec<serde_json::Value>>>;

/// `POST /api/generate`:
/// - model `missing` → 404
/// - model `crash`   → one frame, then an error frame
/// - otherwise       → "Hello world", streamed as NDJSON split mid-line when asked
async fn mock_generate(
    State(received): State<Received>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    received.lock().unwrap().push(body.clone());

    let model = body["model"].as_str().unwrap_or_default().to_string();
    if model == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "model 'missing' not found" })),
        )
            .into_response();
    }

    if body["stream"] != true {
        return Json(serde_json::json!({
            "model": model,
            "response": "Hello world",
            "done": true
        }))
        .into_response();
    }

    let parts: Vec<String> = if model == "crash" {
        vec![
            "{\"response\":\"Hel\",\"done\":false}\n".into(),
            "{\"error\":\"llama runner process has terminated\"}\n".into(),
        ]
    } else {
        vec![
            "{\"model\":\"m\",\"response\":\"Hel\",\"done\":false}\n{\"model\":\"m\",\"resp".into(),
            "onse\":\"lo\",\"done\":false}\nnot json at all\n".into(),
            "{\"response\":\" world\",\"done\":false}\n".into(),
            "{\"response\":\"\",\"done\":true,\"eval_count\":3}\n".into(),
        ]
    };
    let chunks = futures::stream::iter(parts.into_iter().map(Ok::<_, Infallible>));
    Body::from_stream(chunks).into_response()
}

async fn spawn_mock_backend() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/api/generate", post(mock_generate))
        .route(
            "/api/tags",
            get(|| async {
                Json(serde_json::json!({ "models": [{ "name": "llama3.2:latest" }] }))
            }),
        )
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

fn gateway(base_url: &str) -> Router {
    let mut config = AppConfig::default();
    config.backend.base_url = base_url.to_string();
    config.knowledge.backend = "memory".into();

    let backend = Arc::new(
        OllamaClient::new(base_url, Duration::from_secs(5), Duration::from_secs(1)).unwrap(),
    );
    let store = Arc::new(InMemoryKnowledgeStore::new());
    build_router(Arc::new(GatewayState::new(config, store, backend)))
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn read_body(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

fn sse_chunks(body: &[u8]) -> Vec<StreamChunk> {
    String::from_utf8_lossy(body)
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

// ── E2E ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_streaming_generation_with_knowledge() {
    let (url, received) = spawn_mock_backend().await;
    let app = gateway(&url);

    let response = app
        .clone()
        .oneshot(post_json(
            "/knowledge",
            serde_json::json!({
                "category": "team",
                "title": "Lead",
                "content": "Aiko leads the team"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_json(
            "/generate",
            serde_json::json!({
                "prompt": "Who leads the team?",
                "stream": true,
                "max_length": 64,
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" }
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let chunks = sse_chunks(&read_body(response).await);
    let texts: Vec<(String, String, bool)> = chunks
        .into_iter()
        .map(|c| match c {
            StreamChunk::Delta {
                text,
                full_text,
                done,
            } => (text, full_text, done),
            StreamChunk::Error { error } => panic!("unexpected error event: {error}"),
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            ("Hel".to_string(), "Hel".to_string(), false),
            ("lo".to_string(), "Hello".to_string(), false),
            (" world".to_string(), "Hello world".to_string(), false),
            (String::new(), "Hello world".to_string(), true),
        ]
    );

    let sent = received.lock().unwrap().last().cloned().unwrap();
    assert_eq!(sent["model"], "llama3.2");
    assert_eq!(sent["stream"], true);
    assert_eq!(sent["options"]["num_predict"], 64);
    assert_eq!(
        sent["prompt"],
        "Stored knowledge base:\n- [team] Lead: Aiko leads the team\n\n\
         user: hi\nassistant: hello\nuser: Who leads the team?\nassistant:"
    );
}

#[tokio::test]
async fn e2e_complete_generation() {
    let (url, received) = spawn_mock_backend().await;

    let response = gateway(&url)
        .oneshot(post_json(
            "/generate",
            serde_json::json!({
                "prompt": "Say hello",
                "use_knowledge": false,
                "temperature": 0.1
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(body["generated_text"], "Hello world");
    assert_eq!(body["prompt"], "Say hello");
    assert_eq!(body["model"], "llama3.2");

    let sent = received.lock().unwrap().last().cloned().unwrap();
    assert_eq!(sent["prompt"], "Say hello");
    assert_eq!(sent["stream"], false);
}

#[tokio::test]
async fn e2e_unknown_model_is_http_error_even_when_streaming() {
    let (url, _) = spawn_mock_backend().await;

    let response = gateway(&url)
        .oneshot(post_json(
            "/generate",
            serde_json::json!({ "prompt": "x", "model": "missing", "stream": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("model 'missing' not found"));
}

#[tokio::test]
async fn e2e_mid_stream_failure_ends_with_error_event() {
    let (url, _) = spawn_mock_backend().await;

    let response = gateway(&url)
        .oneshot(post_json(
            "/generate",
            serde_json::json!({ "prompt": "x", "model": "crash", "stream": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let chunks = sse_chunks(&read_body(response).await);
    assert_eq!(chunks.len(), 2);
    assert!(matches!(
        &chunks[1],
        StreamChunk::Error { error } if error.contains("llama runner process has terminated")
    ));
}

#[tokio::test]
async fn e2e_health_and_models() {
    let (url, _) = spawn_mock_backend().await;
    let app = gateway(&url);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["backend_url"], url.as_str());

    let response = app
        .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let models: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(models["models"][0]["name"], "llama3.2:latest");
}

#[tokio::test]
async fn e2e_backend_down() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let app = gateway(&url);

    let response = app
        .clone()
        .oneshot(post_json("/generate", serde_json::json!({ "prompt": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(health["status"], "backend_not_connected");
    assert_eq!(health["backend_connected"], false);

    let response = app
        .oneshot(Request::builder().uri("/models").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

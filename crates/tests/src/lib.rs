use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use careconnect_client::ChatRequest;
use careconnect_storage::fixture_services;
use parking_lot::Mutex;
use serde_json::json;

#[derive(Clone, Default)]
pub struct StubBackend {
    received: Arc<Mutex<Vec<ChatRequest>>>,
}

impl StubBackend {
    pub fn received(&self) -> Vec<ChatRequest> {
        self.received.lock().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/chat", post(chat))
            .route("/api/services/:id", get(service))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub backend");
        let addr: SocketAddr = listener.local_addr().expect("stub address");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub backend");
        });
        format!("http://{addr}")
    }
}

pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}

async fn chat(State(state): State<StubBackend>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.contains("boom") {
        return (StatusCode::INTERNAL_SERVER_ERROR, "assistant crashed").into_response();
    }
    if request.message.contains("garbled") {
        return (StatusCode::OK, Json(json!({ "text": "wrong shape" }))).into_response();
    }

    let reply = format!("Nearby help for: {}", request.message);
    state.received.lock().push(request);
    (StatusCode::OK, Json(json!({ "reply": reply }))).into_response()
}

async fn service(Path(id): Path<String>) -> Response {
    match fixture_services().into_iter().find(|record| record.id == id) {
        Some(record) => (StatusCode::OK, Json(record)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "service not found" })),
        )
            .into_response(),
    }
}

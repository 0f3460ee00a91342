use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use docchat_api::{create_router, AppState};
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{ChunkId, ChunkMetadata, ChunkSource, EmbeddedChunk, TextChunk};
use docchat_llm::ports::{Embedder, Generator};
use docchat_store::{MemoryVectorStore, VectorStore};
use serde_json::Value;
use tower::ServiceExt;

struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct CannedGenerator {
    fail: bool,
}

#[async_trait]
impl Generator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.fail {
            return Err(DocchatError::GenerationFailed("quota exceeded".to_string()));
        }
        Ok("The Transformer relies entirely on attention.".to_string())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

async fn seeded_store() -> Arc<MemoryVectorStore> {
    let store = Arc::new(MemoryVectorStore::new("papers"));
    store.create_collection(2).await.unwrap();
    store
        .insert(&[EmbeddedChunk::new(
            TextChunk {
                id: ChunkId::new(),
                content: "The Transformer is based solely on attention mechanisms.".to_string(),
                source: ChunkSource {
                    document_path: "attention.pdf".to_string(),
                    page: Some(1),
                    offset: 0,
                },
                metadata: ChunkMetadata { size: 56, ingested_at: Utc::now() },
            },
            vec![1.0, 0.0],
        )])
        .await
        .unwrap();
    store
}

fn app(store: Arc<MemoryVectorStore>, fail: bool) -> Router {
    let state = AppState::new(
        store,
        Arc::new(FixedEmbedder),
        Arc::new(CannedGenerator { fail }),
        2,
    );
    create_router(Arc::new(state))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_chat_returns_query_and_response() {
    let (status, body) =
        get_json(app(seeded_store().await, false), "/chat?query=What%20is%20attention%3F").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "What is attention?");
    assert_eq!(body["response"], "The Transformer relies entirely on attention.");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_chat_on_empty_collection_returns_error_only() {
    let store = Arc::new(MemoryVectorStore::new("papers"));
    store.create_collection(2).await.unwrap();

    let (status, body) = get_json(app(store, false), "/chat?query=hello").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("papers"));
    assert!(body.get("response").is_none());
}

#[tokio::test]
async fn test_chat_on_missing_collection_returns_error() {
    let store = Arc::new(MemoryVectorStore::new("papers"));

    let (status, body) = get_json(app(store, false), "/chat?query=hello").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert!(body.get("response").is_none());
}

#[tokio::test]
async fn test_chat_surfaces_generation_error_verbatim() {
    let (status, body) = get_json(app(seeded_store().await, true), "/chat?query=hello").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Generation failed: quota exceeded");
}

#[tokio::test]
async fn test_chat_without_query_is_bad_request() {
    let store = seeded_store().await;

    let (status, body) = get_json(app(store.clone(), false), "/chat").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(body.get("response").is_none());

    let (status, _) = get_json(app(store, false), "/chat?query=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_with_malformed_query_string_returns_json_error() {
    let response = app(seeded_store().await, false)
        .oneshot(Request::builder().uri("/chat?query=a&query=b").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].as_str().unwrap().contains("query"));
    assert!(body.get("response").is_none());
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json(app(seeded_store().await, false), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "docchat-api");
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = app(seeded_store().await, false)
        .oneshot(
            Request::builder()
                .uri("/chat?query=hello")
                .header(header::ORIGIN, "https://example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

//! Milvus / Zilliz Cloud vector store over the RESTful v2 API.

use async_trait::async_trait;
use docchat_core::config::MilvusSettings;
use docchat_core::error::{DocchatError, Result};
use docchat_core::models::{ChunkId, ChunkSource, EmbeddedChunk, ScoredChunk};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ports::VectorStore;

const VECTOR_FIELD: &str = "embedding";
const COLLECTION_NOT_FOUND: i64 = 100;
const OUTPUT_FIELDS: [&str; 4] = ["text", "document_path", "page", "offset"];

/// Milvus-backed VectorStore bound to one collection
pub struct MilvusStore {
    endpoint: String,
    token: String,
    collection: String,
    client: reqwest::Client,
}

impl MilvusStore {
    /// Create a store handle without touching the network
    pub fn new(settings: &MilvusSettings) -> Self {
        Self {
            endpoint: settings.endpoint(),
            token: settings.token.clone(),
            collection: settings.collection_name.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a store handle and verify the endpoint accepts our token
    pub async fn connect(settings: &MilvusSettings) -> Result<Self> {
        let store = Self::new(settings);
        let collections: Vec<String> = store.post("collections/list", &json!({})).await?;
        tracing::info!(
            endpoint = %store.endpoint,
            collections = collections.len(),
            "Connected to Milvus"
        );
        Ok(store)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let url = format!("{}/v2/vectordb/{}", self.endpoint, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| DocchatError::VectorStore(format!("Failed to reach Milvus: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocchatError::VectorStore(format!(
                "Milvus returned {} for {}: {}",
                status, path, error_text
            )));
        }

        let envelope: MilvusResponse<T> = response.json().await.map_err(|e| {
            DocchatError::Serialization(format!("Invalid Milvus response for {}: {}", path, e))
        })?;

        if envelope.code == COLLECTION_NOT_FOUND {
            return Err(DocchatError::CollectionNotFound { name: self.collection.clone() });
        }

        if envelope.code != 0 {
            return Err(DocchatError::VectorStore(envelope.message.unwrap_or_else(|| {
                format!("Milvus request {} failed with code {}", path, envelope.code)
            })));
        }

        Ok(envelope.data.unwrap_or_default())
    }

    fn collection_body(&self) -> Value {
        json!({ "collectionName": self.collection })
    }
}

#[async_trait]
impl VectorStore for MilvusStore {
    fn collection_name(&self) -> &str {
        &self.collection
    }

    async fn has_collection(&self) -> Result<bool> {
        let data: HasData = self.post("collections/has", &self.collection_body()).await?;
        Ok(data.has)
    }

    async fn create_collection(&self, dimensions: usize) -> Result<()> {
        let body = json!({
            "collectionName": self.collection,
            "dimension": dimensions,
            "metricType": "IP",
            "idType": "VarChar",
            "primaryFieldName": "id",
            "vectorFieldName": VECTOR_FIELD,
            "params": { "max_length": "64" },
        });
        let _: Value = self.post("collections/create", &body).await?;
        tracing::info!(collection = %self.collection, dimensions, "Created collection");
        Ok(())
    }

    async fn drop_collection(&self) -> Result<()> {
        let _: Value = self.post("collections/drop", &self.collection_body()).await?;
        tracing::info!(collection = %self.collection, "Dropped collection");
        Ok(())
    }

    async fn insert(&self, chunks: &[EmbeddedChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let rows: Vec<InsertRow<'_>> = chunks.iter().map(InsertRow::from).collect();
        let body = json!({ "collectionName": self.collection, "data": rows });
        let data: InsertData = self.post("entities/insert", &body).await?;

        tracing::debug!(collection = %self.collection, inserted = data.insert_count, "Inserted rows");
        Ok(data.insert_count)
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let body = json!({
            "collectionName": self.collection,
            "data": [query],
            "annsField": VECTOR_FIELD,
            "limit": top_k,
            "outputFields": OUTPUT_FIELDS,
        });
        let hits: Vec<SearchHit> = self.post("entities/search", &body).await?;
        hits.into_iter().map(SearchHit::into_scored).collect()
    }

    async fn row_count(&self) -> Result<usize> {
        let data: StatsData = self.post("collections/get_stats", &self.collection_body()).await?;
        Ok(data.row_count)
    }
}

/// Envelope shared by every v2 endpoint
#[derive(Debug, Deserialize)]
struct MilvusResponse<T> {
    code: i64,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct HasData {
    has: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertData {
    insert_count: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsData {
    row_count: usize,
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    id: String,
    embedding: &'a [f32],
    text: &'a str,
    document_path: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
    offset: usize,
    ingested_at: String,
}

impl<'a> From<&'a EmbeddedChunk> for InsertRow<'a> {
    fn from(row: &'a EmbeddedChunk) -> Self {
        let chunk = &row.chunk;
        Self {
            id: chunk.id.to_string(),
            embedding: &row.vector,
            text: &chunk.content,
            document_path: &chunk.source.document_path,
            page: chunk.source.page,
            offset: chunk.source.offset,
            ingested_at: chunk.metadata.ingested_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
    distance: f32,
    #[serde(default)]
    text: String,
    #[serde(default)]
    document_path: String,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    offset: usize,
}

impl SearchHit {
    fn into_scored(self) -> Result<ScoredChunk> {
        let id = Uuid::parse_str(&self.id).map_err(|e| {
            DocchatError::Serialization(format!("Invalid chunk id '{}': {}", self.id, e))
        })?;

        Ok(ScoredChunk {
            chunk_id: ChunkId(id),
            score: self.distance,
            content: self.text,
            source: ChunkSource {
                document_path: self.document_path,
                page: self.page,
                offset: self.offset,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docchat_core::models::{ChunkMetadata, TextChunk};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> MilvusSettings {
        MilvusSettings {
            host: server.uri(),
            port: 443,
            token: "db-token".to_string(),
            collection_name: "papers".to_string(),
        }
    }

    fn chunk(content: &str, page: Option<usize>) -> EmbeddedChunk {
        EmbeddedChunk::new(
            TextChunk {
                id: ChunkId::new(),
                content: content.to_string(),
                source: ChunkSource { document_path: "attention.pdf".to_string(), page, offset: 12 },
                metadata: ChunkMetadata { size: content.len(), ingested_at: Utc::now() },
            },
            vec![0.1, 0.2],
        )
    }

    #[tokio::test]
    async fn test_connect_lists_collections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/collections/list"))
            .and(header("authorization", "Bearer db-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": ["papers"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = MilvusStore::connect(&settings(&server)).await.unwrap();
        assert_eq!(store.collection_name(), "papers");
    }

    #[tokio::test]
    async fn test_has_collection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/collections/has"))
            .and(body_partial_json(json!({"collectionName": "papers"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 0, "data": {"has": true}})),
            )
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        assert!(store.has_collection().await.unwrap());
    }

    #[tokio::test]
    async fn test_create_collection_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/collections/create"))
            .and(body_partial_json(json!({
                "collectionName": "papers",
                "dimension": 768,
                "metricType": "IP",
                "idType": "VarChar",
                "vectorFieldName": "embedding",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {}})))
            .expect(1)
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        store.create_collection(768).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_sends_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/entities/insert"))
            .and(body_partial_json(json!({
                "collectionName": "papers",
                "data": [{"text": "attention", "document_path": "attention.pdf", "page": 3, "offset": 12}],
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 0, "data": {"insertCount": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        let inserted = store.insert(&[chunk("attention", Some(3))]).await.unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_insert_empty_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        assert_eq!(store.insert(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_parses_hits() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/entities/search"))
            .and(body_partial_json(json!({"annsField": "embedding", "limit": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 0,
                "data": [{
                    "id": id.to_string(),
                    "distance": 0.83,
                    "text": "Scaled dot-product attention",
                    "document_path": "attention.pdf",
                    "page": 4,
                    "offset": 0,
                }],
            })))
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        let hits = store.search(&[0.1, 0.2], 2).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, ChunkId(id));
        assert_eq!(hits[0].content, "Scaled dot-product attention");
        assert_eq!(hits[0].source.page, Some(4));
    }

    #[tokio::test]
    async fn test_nonzero_code_becomes_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/collections/get_stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 1100,
                "message": "invalid parameter[expected=valid collection name]",
            })))
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        match store.row_count().await {
            Err(DocchatError::VectorStore(message)) => {
                assert_eq!(message, "invalid parameter[expected=valid collection name]")
            }
            other => panic!("expected vector store error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_collection_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/vectordb/entities/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 100,
                "message": "collection not found[collection=papers]",
            })))
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        let result = store.search(&[0.1, 0.2], 2).await;
        assert!(matches!(result, Err(DocchatError::CollectionNotFound { .. })));
    }

    #[tokio::test]
    async fn test_http_error_becomes_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let store = MilvusStore::new(&settings(&server));
        let result = store.has_collection().await;
        assert!(matches!(result, Err(DocchatError::VectorStore(_))));
    }
}

use async_trait::async_trait;
use docchat_core::error::{DocchatError, Result};
use serde::{Deserialize, Serialize};

use crate::ports::{Embedder, Generator};

/// Base URL of the Gemini REST API
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini embedder implementation (`embedContent` / `batchEmbedContents`)
pub struct GeminiEmbedder {
    /// Base URL for the Gemini API
    base_url: String,

    /// API key sent with every request
    api_key: String,

    /// Model name, e.g. "models/embedding-001"
    model: String,

    /// Embedding dimensions (model-specific)
    dimensions: usize,

    /// HTTP client
    client: reqwest::Client,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder against the public endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            base_url: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: qualified_model(model.into()),
            dimensions,
            client: reqwest::Client::new(),
        }
    }

    /// Point the embedder at a different API base (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, self.model, method)
    }

    fn request_for<'a>(&'a self, text: &'a str, task_type: TaskType) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.model,
            content: Content::user_text(text),
            task_type,
        }
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .client
            .post(self.endpoint(method))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| DocchatError::EmbedderUnavailable {
                reason: format!("Failed to reach Gemini API: {}", e),
                remediation: "Check network connectivity to generativelanguage.googleapis.com"
                    .to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocchatError::EmbedderUnavailable {
                reason: format!("Gemini API error ({}): {}", status, error_text),
                remediation: format!(
                    "Verify GOOGLE_API_KEY and that the model '{}' is available",
                    self.model
                ),
            });
        }

        response.json().await.map_err(|e| DocchatError::EmbedderUnavailable {
            reason: format!("Failed to parse Gemini response: {}", e),
            remediation: "Check Gemini API compatibility".to_string(),
        })
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchEmbedContentsRequest {
            requests: texts
                .iter()
                .map(|text| self.request_for(text, TaskType::RetrievalDocument))
                .collect(),
        };

        let response: BatchEmbedContentsResponse =
            self.post("batchEmbedContents", &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(DocchatError::EmbedderUnavailable {
                reason: format!(
                    "Gemini returned {} embeddings for {} inputs",
                    response.embeddings.len(),
                    texts.len()
                ),
                remediation: "Retry the ingestion".to_string(),
            });
        }

        tracing::debug!(count = texts.len(), model = %self.model, "Embedded document batch");

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let request = self.request_for(text, TaskType::RetrievalQuery);
        let response: EmbedContentResponse = self.post("embedContent", &request).await?;
        Ok(response.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Gemini text generation (`generateContent`)
pub struct GeminiGenerator {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: qualified_model(model.into()),
            temperature: 0.1,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text(prompt)],
            generation_config: GenerationConfig { temperature: self.temperature },
        };

        let response = self
            .client
            .post(format!("{}/{}:generateContent", self.base_url, self.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocchatError::GenerationFailed(format!("Failed to reach Gemini API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocchatError::GenerationFailed(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            DocchatError::GenerationFailed(format!("Failed to parse Gemini response: {}", e))
        })?;

        body.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Gemini model names are addressed as "models/<name>"
fn qualified_model(model: String) -> String {
    if model.starts_with("models/") {
        model
    } else {
        format!("models/{}", model)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user_text(text: &'a str) -> Self {
        Self { role: Some("user"), parts: vec![Part { text }] }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(DocchatError::GenerationFailed(format!(
                "Gemini returned no answer: {}",
                reason
            )));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(DocchatError::GenerationFailed(format!(
                "Gemini returned an empty answer (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_gemini_embedder_creation() {
        let embedder = GeminiEmbedder::new("key", "embedding-001", 768);
        assert_eq!(embedder.model_name(), "models/embedding-001");
        assert_eq!(embedder.dimensions(), 768);
        assert_eq!(
            embedder.endpoint("embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent"
        );
    }

    #[test]
    fn test_gemini_embedder_custom_url() {
        let embedder =
            GeminiEmbedder::new("key", "models/embedding-001", 768).with_base_url("http://proxy/");
        assert_eq!(embedder.base_url, "http://proxy");
    }

    #[tokio::test]
    async fn test_embed_documents_batches_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/embedding-001:batchEmbedContents"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(json!({
                "requests": [
                    {
                        "model": "models/embedding-001",
                        "content": { "parts": [{ "text": "first chunk" }] },
                        "taskType": "RETRIEVAL_DOCUMENT"
                    },
                    {
                        "model": "models/embedding-001",
                        "content": { "parts": [{ "text": "second chunk" }] },
                        "taskType": "RETRIEVAL_DOCUMENT"
                    }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [
                    { "values": [0.1, 0.2, 0.3] },
                    { "values": [0.4, 0.5, 0.6] }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder =
            GeminiEmbedder::new("secret", "models/embedding-001", 3).with_base_url(server.uri());

        let vectors = embedder.embed_documents(&["first chunk", "second chunk"]).await.unwrap();

        assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
    }

    #[tokio::test]
    async fn test_embed_documents_empty_input_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new("secret", "embedding-001", 3).with_base_url(server.uri());

        assert!(embedder.embed_documents(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_embed_query_uses_query_task_type() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/embedding-001:embedContent"))
            .and(body_partial_json(json!({ "taskType": "RETRIEVAL_QUERY" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "embedding": { "values": [1.0, 0.0] } })),
            )
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new("secret", "embedding-001", 2).with_base_url(server.uri());

        let vector = embedder.embed_query("what is attention?").await.unwrap();
        assert_eq!(vector, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embed_api_error_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new("bad", "embedding-001", 2).with_base_url(server.uri());

        let err = embedder.embed_query("hello").await.unwrap_err();
        assert!(matches!(err, DocchatError::EmbedderUnavailable { .. }));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_embed_documents_count_mismatch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "embeddings": [{ "values": [0.1] }] })),
            )
            .mount(&server)
            .await;

        let embedder = GeminiEmbedder::new("secret", "embedding-001", 1).with_base_url(server.uri());

        let result = embedder.embed_documents(&["a", "b"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generate_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Say hi" }] }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Hi" }, { "text": " there" }] },
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let generator =
            GeminiGenerator::new("secret", "models/gemini-1.5-flash").with_base_url(server.uri());

        assert_eq!(generator.generate("Say hi").await.unwrap(), "Hi there");
    }

    #[tokio::test]
    async fn test_generate_blocked_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let generator = GeminiGenerator::new("secret", "gemini-1.5-flash").with_base_url(server.uri());

        let err = generator.generate("something").await.unwrap_err();
        assert!(matches!(err, DocchatError::GenerationFailed(_)));
        assert!(err.to_string().contains("SAFETY"));
    }
}

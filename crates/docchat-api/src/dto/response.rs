use serde::Serialize;

/// Successful chat answer
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub query: String,
    pub response: String,
}

/// Error payload; never carries a `response` field
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "docchat-api" }
    }
}

use serde::Deserialize;

/// Query string of `GET /chat`
#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub query: Option<String>,
}

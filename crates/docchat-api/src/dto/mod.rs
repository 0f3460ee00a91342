mod request;
mod response;

pub use request::ChatQuery;
pub use response::{ChatResponse, ErrorResponse, HealthResponse};

//! docchat LLM - embedding and generation ports
//!
//! This crate defines the ports for embedding and text generation,
//! along with the Gemini REST adapters.

pub mod gemini;
pub mod ports;

pub use gemini::{GeminiEmbedder, GeminiGenerator};
pub use ports::{Embedder, Generator};

//! docchat store - vector database adapters
//!
//! `MilvusStore` talks to Milvus / Zilliz Cloud over the v2 REST API.
//! `MemoryVectorStore` keeps vectors in process for development and tests.

pub mod memory;
pub mod milvus;
pub mod ports;

pub use memory::MemoryVectorStore;
pub use milvus::MilvusStore;
pub use ports::VectorStore;

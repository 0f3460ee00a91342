//! docchat core - domain models, configuration and document processing
//!
//! This crate contains the pieces shared by the ingestion CLI and the query
//! service: the error type, layered configuration, chunk models, the PDF
//! reader and the text chunker.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod processing;

pub use config::{LayeredConfig, Settings};
pub use error::{DocchatError, Result};

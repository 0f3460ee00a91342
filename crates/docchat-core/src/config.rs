use crate::error::{DocchatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_COLLECTION_NAME: &str = "milvus_chatbot_vectordb";
pub const DEFAULT_MILVUS_PORT: u16 = 443;
pub const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_LLM_MODEL: &str = "models/gemini-1.5-flash";
pub const DEFAULT_EMBEDDING_DIM: usize = 768;
pub const DEFAULT_CONFIG_FILE: &str = "docchat.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable (including `.env`)
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

impl<T> ConfigValue<Option<T>> {
    fn update_some(&mut self, value: T, source: ConfigSource) {
        self.update(Some(value), source);
    }
}

/// Layered configuration: defaults < file < environment < CLI
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub google_api_key: ConfigValue<Option<String>>,
    pub milvus_host: ConfigValue<Option<String>>,
    pub milvus_port: ConfigValue<u16>,
    pub milvus_token: ConfigValue<Option<String>>,
    pub collection_name: ConfigValue<String>,
    pub embedding_model: ConfigValue<String>,
    pub embedding_dim: ConfigValue<usize>,
    pub llm_model: ConfigValue<String>,
    pub chunk_size: ConfigValue<usize>,
    pub chunk_overlap: ConfigValue<usize>,
    pub top_k: ConfigValue<usize>,
    pub embed_batch_size: ConfigValue<usize>,
    pub document_path: ConfigValue<PathBuf>,
    pub server_port: ConfigValue<u16>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let default = ConfigSource::Default;
        Self {
            google_api_key: ConfigValue::new(None, default),
            milvus_host: ConfigValue::new(None, default),
            milvus_port: ConfigValue::new(DEFAULT_MILVUS_PORT, default),
            milvus_token: ConfigValue::new(None, default),
            collection_name: ConfigValue::new(DEFAULT_COLLECTION_NAME.to_string(), default),
            embedding_model: ConfigValue::new(DEFAULT_EMBEDDING_MODEL.to_string(), default),
            embedding_dim: ConfigValue::new(DEFAULT_EMBEDDING_DIM, default),
            llm_model: ConfigValue::new(DEFAULT_LLM_MODEL.to_string(), default),
            chunk_size: ConfigValue::new(1000, default),
            chunk_overlap: ConfigValue::new(200, default),
            top_k: ConfigValue::new(2, default),
            embed_batch_size: ConfigValue::new(100, default),
            document_path: ConfigValue::new(PathBuf::from("attention.pdf"), default),
            server_port: ConfigValue::new(8000, default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| DocchatError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| DocchatError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let source = ConfigSource::File;
        if let Some(key) = file_config.google_api_key {
            self.google_api_key.update_some(key, source);
        }
        if let Some(host) = file_config.milvus_host {
            self.milvus_host.update_some(host, source);
        }
        if let Some(port) = file_config.milvus_port {
            self.milvus_port.update(port, source);
        }
        if let Some(token) = file_config.milvus_token {
            self.milvus_token.update_some(token, source);
        }
        if let Some(name) = file_config.collection_name {
            self.collection_name.update(name, source);
        }
        if let Some(model) = file_config.embedding_model {
            self.embedding_model.update(model, source);
        }
        if let Some(dim) = file_config.embedding_dim {
            self.embedding_dim.update(dim, source);
        }
        if let Some(model) = file_config.llm_model {
            self.llm_model.update(model, source);
        }
        if let Some(size) = file_config.chunk_size {
            self.chunk_size.update(size, source);
        }
        if let Some(overlap) = file_config.chunk_overlap {
            self.chunk_overlap.update(overlap, source);
        }
        if let Some(top_k) = file_config.top_k {
            self.top_k.update(top_k, source);
        }
        if let Some(batch) = file_config.embed_batch_size {
            self.embed_batch_size.update(batch, source);
        }
        if let Some(path) = file_config.document_path {
            self.document_path.update(path, source);
        }
        if let Some(port) = file_config.server_port {
            self.server_port.update(port, source);
        }

        Ok(self)
    }

    /// Load the TOML file if it exists, otherwise keep the current layers
    pub fn load_from_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        if path.as_ref().is_file() {
            tracing::debug!(path = %path.as_ref().display(), "Loading configuration file");
            self.load_from_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let source = ConfigSource::Environment;

        if let Some(key) = non_empty_var("GOOGLE_API_KEY") {
            self.google_api_key.update_some(key, source);
        }
        if let Some(host) = non_empty_var("MILVUS_HOST") {
            self.milvus_host.update_some(host, source);
        }
        if let Some(token) = non_empty_var("MILVUS_TOKEN") {
            self.milvus_token.update_some(token, source);
        }
        if let Some(name) = non_empty_var("MILVUS_COLLECTION_NAME") {
            self.collection_name.update(name, source);
        }
        if let Some(model) = non_empty_var("DOCCHAT_EMBEDDING_MODEL") {
            self.embedding_model.update(model, source);
        }
        if let Some(model) = non_empty_var("DOCCHAT_LLM_MODEL") {
            self.llm_model.update(model, source);
        }
        if let Some(path) = non_empty_var("DOCCHAT_DOCUMENT_PATH") {
            self.document_path.update(PathBuf::from(path), source);
        }

        parse_env_into("MILVUS_PORT", &mut self.milvus_port);
        parse_env_into("DOCCHAT_EMBEDDING_DIM", &mut self.embedding_dim);
        parse_env_into("DOCCHAT_CHUNK_SIZE", &mut self.chunk_size);
        parse_env_into("DOCCHAT_CHUNK_OVERLAP", &mut self.chunk_overlap);
        parse_env_into("DOCCHAT_TOP_K", &mut self.top_k);
        parse_env_into("DOCCHAT_EMBED_BATCH_SIZE", &mut self.embed_batch_size);
        parse_env_into("DOCCHAT_PORT", &mut self.server_port);

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let source = ConfigSource::Cli;

        if let Some(name) = overrides.collection_name {
            self.collection_name.update(name, source);
        }
        if let Some(path) = overrides.document_path {
            self.document_path.update(path, source);
        }
        if let Some(size) = overrides.chunk_size {
            self.chunk_size.update(size, source);
        }
        if let Some(overlap) = overrides.chunk_overlap {
            self.chunk_overlap.update(overlap, source);
        }
        if let Some(top_k) = overrides.top_k {
            self.top_k.update(top_k, source);
        }
        if let Some(port) = overrides.server_port {
            self.server_port.update(port, source);
        }
    }

    /// Validate the layers and produce the settings used at runtime.
    ///
    /// Fails on the first missing required key, in the order
    /// `GOOGLE_API_KEY`, `MILVUS_HOST`, `MILVUS_TOKEN`.
    pub fn resolve(&self) -> Result<Settings> {
        let google_api_key = required(&self.google_api_key, "GOOGLE_API_KEY")?;
        let milvus_host = required(&self.milvus_host, "MILVUS_HOST")?;
        let milvus_token = required(&self.milvus_token, "MILVUS_TOKEN")?;

        if self.chunk_size.value == 0 {
            return Err(DocchatError::ConfigInvalid {
                key: "chunk_size".to_string(),
                reason: "chunk_size must be greater than zero".to_string(),
            });
        }

        if self.chunk_overlap.value >= self.chunk_size.value {
            return Err(DocchatError::ConfigInvalid {
                key: "chunk_overlap".to_string(),
                reason: format!(
                    "overlap ({}) must be less than chunk_size ({})",
                    self.chunk_overlap.value, self.chunk_size.value
                ),
            });
        }

        if self.top_k.value == 0 {
            return Err(DocchatError::ConfigInvalid {
                key: "top_k".to_string(),
                reason: "top_k must be at least 1".to_string(),
            });
        }

        if self.embed_batch_size.value == 0 {
            return Err(DocchatError::ConfigInvalid {
                key: "embed_batch_size".to_string(),
                reason: "embed_batch_size must be at least 1".to_string(),
            });
        }

        Ok(Settings {
            google_api_key,
            milvus: MilvusSettings {
                host: milvus_host,
                port: self.milvus_port.value,
                token: milvus_token,
                collection_name: self.collection_name.value.clone(),
            },
            embedding_model: self.embedding_model.value.clone(),
            embedding_dim: self.embedding_dim.value,
            llm_model: self.llm_model.value.clone(),
            chunk_size: self.chunk_size.value,
            chunk_overlap: self.chunk_overlap.value,
            top_k: self.top_k.value,
            embed_batch_size: self.embed_batch_size.value,
            document_path: self.document_path.value.clone(),
            server_port: self.server_port.value,
        })
    }

    /// Get all configuration values as a map for inspection.
    ///
    /// Secrets are masked, unset values render as `<unset>`.
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "google_api_key".to_string(),
            (display_secret(&self.google_api_key.value), self.google_api_key.source),
        );
        map.insert(
            "milvus_host".to_string(),
            (
                self.milvus_host.value.clone().unwrap_or_else(|| "<unset>".to_string()),
                self.milvus_host.source,
            ),
        );
        map.insert(
            "milvus_port".to_string(),
            (self.milvus_port.value.to_string(), self.milvus_port.source),
        );
        map.insert(
            "milvus_token".to_string(),
            (display_secret(&self.milvus_token.value), self.milvus_token.source),
        );
        map.insert(
            "collection_name".to_string(),
            (self.collection_name.value.clone(), self.collection_name.source),
        );
        map.insert(
            "embedding_model".to_string(),
            (self.embedding_model.value.clone(), self.embedding_model.source),
        );
        map.insert(
            "embedding_dim".to_string(),
            (self.embedding_dim.value.to_string(), self.embedding_dim.source),
        );
        map.insert("llm_model".to_string(), (self.llm_model.value.clone(), self.llm_model.source));
        map.insert(
            "chunk_size".to_string(),
            (self.chunk_size.value.to_string(), self.chunk_size.source),
        );
        map.insert(
            "chunk_overlap".to_string(),
            (self.chunk_overlap.value.to_string(), self.chunk_overlap.source),
        );
        map.insert("top_k".to_string(), (self.top_k.value.to_string(), self.top_k.source));
        map.insert(
            "embed_batch_size".to_string(),
            (self.embed_batch_size.value.to_string(), self.embed_batch_size.source),
        );
        map.insert(
            "document_path".to_string(),
            (self.document_path.value.display().to_string(), self.document_path.source),
        );
        map.insert(
            "server_port".to_string(),
            (self.server_port.value.to_string(), self.server_port.source),
        );

        map
    }
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub google_api_key: String,
    pub milvus: MilvusSettings,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub llm_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embed_batch_size: usize,
    pub document_path: PathBuf,
    pub server_port: u16,
}

/// Connection settings for the Milvus / Zilliz Cloud endpoint
#[derive(Debug, Clone)]
pub struct MilvusSettings {
    pub host: String,
    pub port: u16,
    pub token: String,
    pub collection_name: String,
}

impl MilvusSettings {
    /// Base URL of the REST endpoint.
    ///
    /// A host that already carries a scheme is used as-is. Otherwise HTTPS is
    /// assumed and the default port is left out of the URL.
    pub fn endpoint(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            return host.to_string();
        }
        if self.port == DEFAULT_MILVUS_PORT {
            format!("https://{}", host)
        } else {
            format!("https://{}:{}", host, self.port)
        }
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Default, Deserialize, Serialize)]
struct FileConfig {
    google_api_key: Option<String>,
    milvus_host: Option<String>,
    milvus_port: Option<u16>,
    milvus_token: Option<String>,
    collection_name: Option<String>,
    embedding_model: Option<String>,
    embedding_dim: Option<usize>,
    llm_model: Option<String>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    top_k: Option<usize>,
    embed_batch_size: Option<usize>,
    document_path: Option<PathBuf>,
    server_port: Option<u16>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub collection_name: Option<String>,
    pub document_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub top_k: Option<usize>,
    pub server_port: Option<u16>,
}

/// Load a `.env` file from the working directory into the process environment.
///
/// A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_into<T: FromStr>(name: &str, target: &mut ConfigValue<T>) {
    if let Some(raw) = non_empty_var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => target.update(value, ConfigSource::Environment),
            Err(_) => tracing::warn!("Invalid {} value '{}': ignoring", name, raw),
        }
    }
}

fn required(value: &ConfigValue<Option<String>>, key: &str) -> Result<String> {
    value
        .value
        .clone()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DocchatError::ConfigMissing { key: key.to_string() })
}

fn display_secret(value: &Option<String>) -> String {
    match value {
        None => "<unset>".to_string(),
        Some(secret) => {
            let tail: String = {
                let mut chars: Vec<char> = secret.chars().rev().take(4).collect();
                chars.reverse();
                chars.into_iter().collect()
            };
            if secret.chars().count() <= 8 {
                "****".to_string()
            } else {
                format!("****{}", tail)
            }
        }
    }
}

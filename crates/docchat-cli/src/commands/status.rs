//! Status command implementation

use crate::cli::StatusArgs;
use crate::output::OutputWriter;
use anyhow::Result;
use docchat_core::config::{ConfigSource, LayeredConfig};
use docchat_store::{MilvusStore, VectorStore};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct ConfigRow {
    key: String,
    value: String,
    source: String,
}

#[derive(Serialize, Default)]
struct CollectionStatus {
    name: String,
    reachable: bool,
    exists: Option<bool>,
    row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct StatusOutput {
    config: Vec<ConfigRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    collection: Option<CollectionStatus>,
}

pub async fn execute(args: StatusArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = super::load_config(config_path, Default::default())?;
    let rows = config_rows(&config);

    let collection = if args.offline { None } else { Some(collection_status(&config).await) };

    if output.is_json() {
        return output.result(StatusOutput { config: rows, collection });
    }

    output.section("Configuration");
    output.table(rows)?;

    if let Some(status) = collection {
        output.section("Collection");
        output.kv("Name", &status.name);
        match (&status.error, status.exists) {
            (Some(error), _) => output.warning(error),
            (None, Some(true)) => {
                output.kv("Status", "Exists");
                if let Some(count) = status.row_count {
                    output.kv("Rows", count);
                }
            }
            _ => output.info("Collection does not exist yet. Run 'docchat ingest' to create it"),
        }
    }

    Ok(())
}

fn config_rows(config: &LayeredConfig) -> Vec<ConfigRow> {
    config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: source_label(source).to_string() })
        .collect()
}

fn source_label(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "env",
        ConfigSource::Cli => "cli",
    }
}

async fn collection_status(config: &LayeredConfig) -> CollectionStatus {
    let mut status = CollectionStatus { name: config.collection_name.value.clone(), ..Default::default() };

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            status.error = Some(e.to_string());
            return status;
        }
    };

    let store = match MilvusStore::connect(&settings.milvus).await {
        Ok(store) => store,
        Err(e) => {
            status.error = Some(e.to_string());
            return status;
        }
    };
    status.reachable = true;

    match store.has_collection().await {
        Ok(true) => {
            status.exists = Some(true);
            match store.row_count().await {
                Ok(count) => status.row_count = Some(count),
                Err(e) => status.error = Some(e.to_string()),
            }
        }
        Ok(false) => status.exists = Some(false),
        Err(e) => status.error = Some(e.to_string()),
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_rows_mask_secrets() {
        let mut config = LayeredConfig::with_defaults();
        config.google_api_key.update(Some("AIzaSyExampleKey1234".to_string()), ConfigSource::Environment);

        let rows = config_rows(&config);
        let key_row = rows.iter().find(|r| r.key == "google_api_key").unwrap();

        assert_eq!(key_row.value, "****1234");
        assert_eq!(key_row.source, "env");
        assert!(rows.iter().any(|r| r.key == "collection_name" && r.source == "default"));
    }
}

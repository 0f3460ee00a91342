//! Ingest command implementation

use crate::cli::IngestArgs;
use crate::output::OutputWriter;
use crate::progress::IngestProgressBar;
use anyhow::{Context, Result};
use docchat_core::config::CliConfigOverrides;
use docchat_core::processing::ChunkConfig;
use docchat_llm::GeminiEmbedder;
use docchat_retrieval::{prepare_document, IngestPipeline};
use docchat_store::MilvusStore;
use std::path::Path;
use std::sync::Arc;

pub async fn execute(args: IngestArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = super::load_config(
        config_path,
        CliConfigOverrides {
            collection_name: args.collection,
            document_path: args.path,
            chunk_size: args.chunk_size,
            chunk_overlap: args.chunk_overlap,
            ..Default::default()
        },
    )?;
    let settings = config.resolve().context("Invalid configuration")?;
    let chunk_config = ChunkConfig::new(settings.chunk_size, settings.chunk_overlap)?;

    tracing::info!(
        document = %settings.document_path.display(),
        collection = %settings.milvus.collection_name,
        "Starting ingestion"
    );

    let mut progress = IngestProgressBar::new(output.is_json());

    // Load and chunk before connecting so a bad document fails fast
    let loaded =
        prepare_document(&settings.document_path, &chunk_config, &mut |update| progress.update(update))
            .await;
    let document = match loaded {
        Ok(document) => document,
        Err(e) => {
            progress.fail("Could not load document");
            return Err(e.into());
        }
    };

    let store = match MilvusStore::connect(&settings.milvus).await {
        Ok(store) => store,
        Err(e) => {
            progress.fail("Could not connect to Milvus");
            return Err(e)
                .with_context(|| format!("Failed to connect to Milvus at {}", settings.milvus.endpoint()));
        }
    };

    let embedder = GeminiEmbedder::new(
        settings.google_api_key.clone(),
        settings.embedding_model.clone(),
        settings.embedding_dim,
    );

    let pipeline = IngestPipeline::new(Arc::new(store), Arc::new(embedder), chunk_config)
        .with_batch_size(settings.embed_batch_size)
        .with_recreate(args.recreate);

    let result = pipeline
        .ingest_prepared_with_progress(document, |update| progress.update(update))
        .await;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress.fail("Ingestion failed");
            return Err(e.into());
        }
    };
    progress.finish(report.inserted);

    if output.is_json() {
        output.result(&report)?;
    } else {
        if report.recreated {
            output.warning(format!("Dropped and recreated collection '{}'", report.collection));
        } else if report.collection_created {
            output.info(format!("Created collection '{}'", report.collection));
        }
        output.success("Ingestion Complete");
        output.kv("Document", &report.document_path);
        output.kv("Collection", &report.collection);
        output.kv("Pages", report.pages);
        output.kv("Chunks", report.chunks);
        output.kv("Vectors inserted", report.inserted);
    }

    Ok(())
}

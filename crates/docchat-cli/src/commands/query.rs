//! Query command implementation

use crate::cli::QueryArgs;
use crate::output::OutputWriter;
use crate::progress::create_spinner;
use anyhow::{Context, Result};
use docchat_core::config::CliConfigOverrides;
use docchat_llm::{GeminiEmbedder, GeminiGenerator};
use docchat_retrieval::{QueryResult, RagPipeline, SourceReference};
use docchat_store::MilvusStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tabled::Tabled;

#[derive(Serialize)]
struct QueryOutput {
    query: String,
    response: String,
    sources: Vec<SourceReference>,
}

#[derive(Tabled, Serialize)]
struct SourceRow {
    #[tabled(rename = "#")]
    rank: usize,
    page: String,
    score: String,
    excerpt: String,
}

pub async fn execute(args: QueryArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = super::load_config(
        config_path,
        CliConfigOverrides {
            collection_name: args.collection,
            top_k: args.top_k,
            ..Default::default()
        },
    )?;
    let settings = config.resolve().context("Invalid configuration")?;

    let store = MilvusStore::connect(&settings.milvus)
        .await
        .with_context(|| format!("Failed to connect to Milvus at {}", settings.milvus.endpoint()))?;
    let embedder = GeminiEmbedder::new(
        settings.google_api_key.clone(),
        settings.embedding_model.clone(),
        settings.embedding_dim,
    );
    let generator = GeminiGenerator::new(settings.google_api_key.clone(), settings.llm_model.clone());

    let pipeline =
        RagPipeline::new(Arc::new(store), Arc::new(embedder), Arc::new(generator), settings.top_k);

    let spinner = (!output.is_json()).then(|| create_spinner("Thinking..."));
    let result = pipeline.answer(&args.text).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let QueryResult { answer, sources } = result?;

    if output.is_json() {
        return output.result(QueryOutput { query: args.text, response: answer, sources });
    }

    output.section("Answer");
    println!("{}", answer.trim());

    if args.sources {
        output.section("Sources");
        output.table(source_rows(&sources))?;
    }

    Ok(())
}

fn source_rows(sources: &[SourceReference]) -> Vec<SourceRow> {
    sources
        .iter()
        .enumerate()
        .map(|(idx, source)| SourceRow {
            rank: idx + 1,
            page: source.page.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            score: format!("{:.3}", source.score),
            excerpt: excerpt(&source.excerpt, 80),
        })
        .collect()
}

/// First `max_chars` characters on one line
fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

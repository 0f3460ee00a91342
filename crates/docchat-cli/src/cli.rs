use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docchat - chat with a PDF through a Milvus collection
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(about = "Ingest a PDF into Milvus and ask it questions", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to ./docchat.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a PDF, embed its chunks and insert them into the collection
    Ingest(IngestArgs),

    /// Answer a question from the indexed document
    Query(QueryArgs),

    /// Show effective configuration and collection status
    Status(StatusArgs),
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Path to the PDF (defaults to the configured document_path)
    pub path: Option<PathBuf>,

    /// Drop the collection before ingesting instead of appending
    #[arg(long)]
    pub recreate: bool,

    /// Collection name override
    #[arg(long)]
    pub collection: Option<String>,

    /// Chunk size in words
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Words shared between consecutive chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Question to ask
    pub text: String,

    /// Number of chunks to retrieve
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Collection name override
    #[arg(long)]
    pub collection: Option<String>,

    /// Print the retrieved chunks with the answer
    #[arg(long)]
    pub sources: bool,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Only show configuration, do not contact Milvus
    #[arg(long)]
    pub offline: bool,
}

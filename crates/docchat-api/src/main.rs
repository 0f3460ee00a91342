use std::sync::Arc;

use anyhow::Context;
use docchat_llm::{GeminiEmbedder, GeminiGenerator};
use docchat_store::{MilvusStore, VectorStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docchat_api::{create_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docchat_api=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ApiConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            tracing::error!(
                "Remediation:\n\
                1. Set GOOGLE_API_KEY, MILVUS_HOST and MILVUS_TOKEN\n\
                2. Or put them in a .env file in the working directory"
            );
            std::process::exit(1);
        }
    };
    let settings = &config.settings;

    tracing::info!(
        port = settings.server_port,
        collection = %settings.milvus.collection_name,
        embedding_model = %settings.embedding_model,
        llm_model = %settings.llm_model,
        top_k = settings.top_k,
        "Starting docchat API server"
    );

    let vector_store = MilvusStore::connect(&settings.milvus)
        .await
        .with_context(|| format!("Failed to connect to Milvus at {}", settings.milvus.endpoint()))?;

    match vector_store.has_collection().await {
        Ok(true) => tracing::info!(collection = %settings.milvus.collection_name, "Using existing collection"),
        Ok(false) => tracing::warn!(
            collection = %settings.milvus.collection_name,
            "Collection does not exist yet; queries will fail until 'docchat ingest' has run"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not check collection"),
    }

    let embedder = GeminiEmbedder::new(
        settings.google_api_key.clone(),
        settings.embedding_model.clone(),
        settings.embedding_dim,
    );
    let generator = GeminiGenerator::new(settings.google_api_key.clone(), settings.llm_model.clone());

    let state = Arc::new(AppState::new(
        Arc::new(vector_store),
        Arc::new(embedder),
        Arc::new(generator),
        settings.top_k,
    ));

    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

//! Command implementations

mod ingest;
mod query;
mod status;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use docchat_core::config::{load_dotenv, CliConfigOverrides, LayeredConfig, DEFAULT_CONFIG_FILE};
use std::path::Path;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ingest(args) => ingest::execute(args, config_path, &output).await,
        Commands::Query(args) => query::execute(args, config_path, &output).await,
        Commands::Status(args) => status::execute(args, config_path, &output).await,
    }
}

/// Build the layered configuration: defaults, file, `.env` + environment, CLI flags.
///
/// An explicit `--config` path must exist; the default `docchat.toml` is optional.
pub(crate) fn load_config(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    load_dotenv();

    let config = LayeredConfig::with_defaults();
    let config = match config_path {
        Some(path) => config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => config.load_from_optional_file(DEFAULT_CONFIG_FILE)?,
    };

    let mut config = config.load_from_env();
    config.update_from_cli(overrides);
    Ok(config)
}

use docchat_core::config::{load_dotenv, LayeredConfig, DEFAULT_CONFIG_FILE};
use docchat_core::error::Result;
use docchat_core::Settings;

/// Query service configuration: `.env`, then `docchat.toml`, then environment
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub settings: Settings,
}

impl ApiConfig {
    /// Load and resolve configuration, failing on missing required keys
    pub fn load() -> Result<Self> {
        load_dotenv();

        let settings = LayeredConfig::with_defaults()
            .load_from_optional_file(DEFAULT_CONFIG_FILE)?
            .load_from_env()
            .resolve()?;

        Ok(Self { settings })
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.settings.server_port)
    }
}

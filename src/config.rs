//! Configuration management

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// GraphQL endpoint for the httpEvents query
    pub endpoint: String,
    /// Bearer token for the Authorization header. Usually left empty in the
    /// file and supplied via HTTPLOG_API_TOKEN; prompted for when absent.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Rolling query window in days
    #[serde(default = "default_days_to_retrieve")]
    pub days_to_retrieve: i64,
    /// Row limit on the httpEvents query
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Length of the ranked remote address / request URI tables
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_days_to_retrieve() -> i64 {
    30
}

fn default_limit() -> u32 {
    10000
}

fn default_top_n() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";

        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .add_source(config::Environment::with_prefix("HTTPLOG").separator("__"));

        let settings = builder.build()?;
        let mut config: Config = settings.try_deserialize()?;

        config.api.token = resolve_token(config.api.token)?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate server config
        if self.server.port == 0 {
            anyhow::bail!("Invalid port: 0 is not allowed");
        }
        if self.server.host.is_empty() {
            anyhow::bail!("Server host cannot be empty");
        }

        // Validate API config
        if self.api.endpoint.is_empty() {
            anyhow::bail!("API endpoint cannot be empty");
        }
        url::Url::parse(&self.api.endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid API endpoint '{}': {}", self.api.endpoint, e))?;

        // Validate dashboard config
        if self.dashboard.days_to_retrieve <= 0 {
            anyhow::bail!("days_to_retrieve must be positive");
        }
        if self.dashboard.limit == 0 {
            anyhow::bail!("limit must be positive");
        }
        if self.dashboard.top_n == 0 {
            anyhow::bail!("top_n must be positive");
        }

        // Validate logging level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid logging level '{}'. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            );
        }

        Ok(())
    }
}

/// Token resolution order: HTTPLOG_API_TOKEN env var, then the config file,
/// then an interactive prompt.
fn resolve_token(from_file: String) -> Result<String> {
    if let Ok(token) = std::env::var("HTTPLOG_API_TOKEN") {
        let token = token.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }
    if !from_file.is_empty() {
        return Ok(from_file);
    }
    prompt_for_token()
}

fn prompt_for_token() -> Result<String> {
    use std::io::{self, BufRead, Write};

    print!("API token: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let token = line.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("No API token provided");
    }
    Ok(token)
}

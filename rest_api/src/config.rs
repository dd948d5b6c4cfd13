// rest_api/src/config.rs

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Runtime settings for the REST API server.
///
/// Values resolve in three layers: built-in defaults, then the YAML file
/// (`config.yaml`, or the path named by `HOMEVISIT_CONFIG`), then
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: String,
    pub jwt_secret: String,
    pub cors_origins: String,
    pub op_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8001,
            data_dir: "./data".to_string(),
            jwt_secret: "nurse-visit-secret-key-2024".to_string(),
            cors_origins: "*".to_string(),
            op_timeout_ms: 2_000,
        }
    }
}

impl ApiConfig {
    /// Socket address the server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

// Wrapper struct to match the 'api:' key in the YAML config.
#[derive(Debug, Deserialize)]
struct ApiConfigWrapper {
    api: ApiConfig,
}

/// Loads the server configuration. A missing config file is not an error;
/// the defaults (plus any environment overrides) are used instead.
pub fn load_config() -> Result<ApiConfig> {
    let path = env::var("HOMEVISIT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yaml"));

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        parse_config(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    } else {
        ApiConfig::default()
    };

    apply_env(&mut config)?;
    Ok(config)
}

fn parse_config(content: &str) -> Result<ApiConfig> {
    let wrapper: ApiConfigWrapper =
        serde_yaml2::from_str(content).map_err(|e| anyhow::anyhow!("invalid YAML: {}", e))?;
    Ok(wrapper.api)
}

fn apply_env(config: &mut ApiConfig) -> Result<()> {
    if let Ok(host) = env::var("HOST") {
        config.host = host;
    }
    if let Ok(port) = env::var("PORT") {
        config.port = port
            .parse()
            .with_context(|| format!("invalid PORT value: {port}"))?;
    }
    if let Ok(dir) = env::var("DATA_DIR") {
        config.data_dir = dir;
    }
    if let Ok(secret) = env::var("JWT_SECRET") {
        config.jwt_secret = secret;
    }
    if let Ok(origins) = env::var("CORS_ORIGINS") {
        config.cors_origins = origins;
    }
    if let Ok(timeout) = env::var("OP_TIMEOUT_MS") {
        config.op_timeout_ms = timeout
            .parse()
            .with_context(|| format!("invalid OP_TIMEOUT_MS value: {timeout}"))?;
    }
    Ok(())
}

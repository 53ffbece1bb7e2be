use std::path::Path;
use std::time::Duration;

use apix_core::{parse_str, DocumentFormat, ParseError};
use apix_proxy::ProxyConfig;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },
    #[error("invalid config: {0}")]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen address handed to the HTTP layer.
    pub bind_addr: String,
    /// Deadline for http forwards.
    pub http_timeout_ms: u64,
    pub proxy: ProxyConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            http_timeout_ms: DEFAULT_HTTP_TIMEOUT_MS,
            proxy: ProxyConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Parses YAML or JSON. Missing keys keep their defaults.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let (config, _) = parse_str(input, DocumentFormat::Auto)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

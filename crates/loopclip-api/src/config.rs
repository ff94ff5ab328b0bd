//! API configuration.

use std::time::Duration;

use loopclip_media::MetadataOptions;

/// API server configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Metadata fetch timeout
    pub metadata_timeout: Duration,
    /// Additional metadata fetch attempts after the first failure
    pub metadata_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 64 * 1024, // request bodies are tiny JSON
            metadata_timeout: Duration::from_secs(30),
            metadata_retries: 1,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            metadata_timeout: Duration::from_secs(
                std::env::var("METADATA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.metadata_timeout.as_secs()),
            ),
            metadata_retries: std::env::var("METADATA_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.metadata_retries),
        }
    }

    /// Metadata resolution policy derived from this config.
    pub fn metadata_options(&self) -> MetadataOptions {
        MetadataOptions {
            timeout: self.metadata_timeout,
            retries: self.metadata_retries,
        }
    }
}

use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerConfig,
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// The single origin allowed by CORS.
    pub allowed_origin: String,
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub key: String,
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Keeps the subscription key out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &"<redacted>")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            server: ServerConfig {
                bind_addr: DEFAULT_BIND_ADDR.to_string(),
                allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            },
            provider: ProviderConfig {
                endpoint: String::new(),
                key: String::new(),
                request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
        }
    }
}

impl AppConfig {
    /// Read configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let key = value("AZ_AI_RESOURCE_KEY").context("AZ_AI_RESOURCE_KEY is not set")?;
        let endpoint =
            value("AZ_AI_RESOURCE_ENDPOINT").context("AZ_AI_RESOURCE_ENDPOINT is not set")?;

        let request_timeout_secs = match value("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PROVIDER_TIMEOUT_SECS is not a number: {raw}"))?,
            None => defaults.provider.request_timeout_secs,
        };

        Ok(Self {
            environment: value("environment").unwrap_or(defaults.environment),
            server: ServerConfig {
                bind_addr: value("BIND_ADDR").unwrap_or(defaults.server.bind_addr),
                allowed_origin: value("CORS_ALLOWED_ORIGIN")
                    .unwrap_or(defaults.server.allowed_origin),
            },
            provider: ProviderConfig {
                endpoint,
                key,
                request_timeout_secs,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

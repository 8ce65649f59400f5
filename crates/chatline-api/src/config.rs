use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::ApiError;

/// Name of the server-side credential, as reported when it is missing
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub upstream: UpstreamConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,

    // Secret (from ENV only)
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the hosted API
    pub api_base: String,
    /// Base URL the client-side library and its assets are served from
    pub cdn_base: String,
    /// Value of the `OpenAI-Beta` header on conversation and session calls
    pub chatkit_beta: String,
    /// Inbound headers copied onto proxied API requests
    pub passthrough_headers: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            cdn_base: "https://cdn.platform.openai.com".to_string(),
            chatkit_beta: "chatkit_beta=v1".to_string(),
            passthrough_headers: vec![
                "OpenAI-Beta".to_string(),
                "OpenAI-Organization".to_string(),
                "OpenAI-Project".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Asset paths containing any of these get their URLs rewritten
    pub rewrite_markers: Vec<String>,
    pub rewrites: Vec<UrlRewrite>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlRewrite {
    pub from: String,
    pub to: String,
}

impl UrlRewrite {
    fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            rewrite_markers: vec!["chatkit.js".to_string(), "chatkit/index-".to_string()],
            rewrites: vec![
                UrlRewrite::new("https://api.openai.com", "/api/proxy/openai"),
                UrlRewrite::new("https://eu.api.openai.com", "/api/proxy/openai"),
                UrlRewrite::new("https://cdn.platform.openai.com", "/api/proxy/chatkit"),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. built-in defaults
    /// 2. config/default.toml
    /// 3. config/{ENV}.toml (if ENV is set)
    /// 4. Environment variables (`CHATLINE_` prefix, `__` between nested keys,
    ///    e.g. `CHATLINE_SERVER__PORT`)
    ///
    /// A missing `OPENAI_API_KEY` is not fatal here; requests that need it
    /// fail with a configuration error instead.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("CHATLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upstream.passthrough_headers")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        cfg.openai_api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.is_empty());

        Ok(cfg)
    }

    /// The server-side credential, or the configuration error to answer with
    pub fn api_key(&self) -> Result<&str, ApiError> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingApiKey(API_KEY_VAR))
    }
}

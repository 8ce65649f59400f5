use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Origin of the chatline proxy
    pub proxy_url: String,
    pub workflow_id: String,
    /// Directory the thread store is written to
    pub state_dir: PathBuf,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl ClientConfig {
    /// Load configuration from defaults, `config/client.toml` and
    /// `CHATLINE_*` environment variables (`__` separates nested keys, e.g.
    /// `CHATLINE_LOGGING__LEVEL`).
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .set_default("proxy_url", "http://127.0.0.1:3000")?
            .set_default("state_dir", ".chatline")?
            .set_default("logging.level", "warn")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/client").required(false))
            .add_source(
                Environment::with_prefix("CHATLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            proxy_url = "http://localhost:8080"
            workflow_id = "wf_123"
            state_dir = "/tmp/chatline"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: ClientConfig = ConfigLoader::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.proxy_url, "http://localhost:8080");
        assert_eq!(config.workflow_id, "wf_123");
        assert_eq!(config.state_dir, PathBuf::from("/tmp/chatline"));
        assert_eq!(config.logging.format, "json");
    }
}

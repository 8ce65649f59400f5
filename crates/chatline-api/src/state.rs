use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// One `reqwest::Client` is reused for every upstream call so connections
/// are pooled across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("chatline-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            http_client,
        })
    }
}

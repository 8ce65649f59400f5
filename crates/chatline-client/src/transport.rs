use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Raw response body of a conversation turn
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Body of the conversation send endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub client_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub message: OutgoingMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub role: String,
    pub content: String,
}

impl SendRequest {
    pub fn new(
        client_secret: impl Into<String>,
        thread_id: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            client_secret: client_secret.into(),
            thread_id,
            message: OutgoingMessage {
                role: "user".to_string(),
                content: content.into(),
            },
        }
    }
}

/// Body of the session issuance endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub workflow: WorkflowRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chatkit_configuration: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRef {
    pub id: String,
}

impl SessionRequest {
    /// Session for `workflow_id` with file uploads enabled
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow: WorkflowRef {
                id: workflow_id.into(),
            },
            chatkit_configuration: Some(serde_json::json!({
                "file_upload": { "enabled": true }
            })),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    client_secret: Option<String>,
}

/// Network side of a chat session
#[async_trait]
pub trait ConversationTransport: Send + Sync {
    /// Obtain the short-lived credential that authorizes conversations
    async fn create_session(&self, request: &SessionRequest) -> Result<String>;

    /// Send one user message and return the streamed reply body
    async fn open_stream(&self, request: &SendRequest) -> Result<ByteStream>;
}

/// Transport talking to a chatline proxy over HTTP
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the proxy origin, e.g. `http://127.0.0.1:3000`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http_client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "Proxy returned an error");
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl ConversationTransport for HttpTransport {
    async fn create_session(&self, request: &SessionRequest) -> Result<String> {
        let response = self.post("/api/create-session", request).await?;
        let session: SessionResponse = response.json().await?;

        session
            .client_secret
            .ok_or_else(|| ClientError::Session("response has no client_secret".to_string()))
    }

    async fn open_stream(&self, request: &SendRequest) -> Result<ByteStream> {
        let response = self.post("/api/chat", request).await?;
        // a failure after the headers arrived is a broken stream, not a failed request
        Ok(Box::pin(
            response
                .bytes_stream()
                .map_err(|e| ClientError::Stream(e.to_string())),
        ))
    }
}

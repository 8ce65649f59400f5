use axum::{
    extract::{rejection::JsonRejection, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderMap, HeaderValue,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{error::ApiResult, proxy, state::AppState};

const CONVERSATION_PATH: &str = "v1/chatkit/conversation";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub client_secret: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "default_role")]
    pub role: String,
    pub content: String,
}

fn default_role() -> String {
    "user".to_string()
}

/// Body of a conversation call. A follow-up carries the remote thread id;
/// the operation type stays `threads.create` either way.
pub fn conversation_request(content: &str, thread_id: Option<&str>) -> Value {
    let mut params = json!({
        "input": {
            "content": [{ "type": "input_text", "text": content }],
            "quoted_text": "",
            "attachments": [],
            "inference_options": {}
        }
    });
    if let Some(thread_id) = thread_id {
        params["thread_id"] = json!(thread_id);
    }

    json!({
        "type": "threads.create",
        "params": params
    })
}

/// Send a user message and stream the reply back unmodified.
///
/// Authenticates upstream with the session credential from the body. The
/// server key is still required so a misconfigured deployment fails fast.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Response> {
    state.config.api_key()?;
    let Json(req) = payload?;

    let upstream = &state.config.upstream;
    let body = conversation_request(&req.message.content, req.thread_id.as_deref());
    tracing::debug!(
        thread_id = ?req.thread_id,
        role = %req.message.role,
        "Forwarding conversation request"
    );

    let response = state
        .http_client
        .post(proxy::upstream_url(&upstream.api_base, CONVERSATION_PATH, None))
        .bearer_auth(&req.client_secret)
        .header("OpenAI-Beta", &upstream.chatkit_beta)
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    tracing::info!(status = %status, "Conversation upstream responded");

    if !status.is_success() {
        let text = response.text().await?;
        tracing::error!(status = %status, body = %text, "Conversation upstream error");
        return Ok((status, [(CONTENT_TYPE, "application/json")], text).into_response());
    }

    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(proxy::relay_response(response, "text/event-stream", headers))
}

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::{error::ApiResult, proxy, state::AppState};

const SESSIONS_PATH: &str = "v1/chatkit/sessions";

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub workflow: WorkflowRef,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub chatkit_configuration: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct WorkflowRef {
    pub id: String,
}

pub fn session_request(req: CreateSessionRequest) -> Value {
    let user = req.user.unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut body = json!({
        "workflow": { "id": req.workflow.id },
        "user": user
    });
    if let Some(configuration) = req.chatkit_configuration {
        body["chatkit_configuration"] = configuration;
    }
    body
}

/// Issue a short-lived client secret using the server credential.
/// The upstream JSON (including `client_secret`) is relayed verbatim.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let api_key = state.config.api_key()?;
    let Json(req) = payload?;
    let upstream = &state.config.upstream;

    tracing::info!(workflow_id = %req.workflow.id, "Creating session");
    let body = session_request(req);

    let response = state
        .http_client
        .post(proxy::upstream_url(&upstream.api_base, SESSIONS_PATH, None))
        .bearer_auth(api_key)
        .header("OpenAI-Beta", &upstream.chatkit_beta)
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "Session upstream error");
    }

    Ok(proxy::relay_response(response, "application/json", HeaderMap::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_request_defaults_user() {
        let req: CreateSessionRequest =
            serde_json::from_str(r#"{"workflow":{"id":"wf_1"}}"#).unwrap();
        let body = session_request(req);

        assert_eq!(body["workflow"]["id"], "wf_1");
        let user = body["user"].as_str().unwrap();
        assert!(Uuid::parse_str(user).is_ok());
        assert!(body.get("chatkit_configuration").is_none());
    }

    #[test]
    fn test_session_request_keeps_configuration() {
        let req: CreateSessionRequest = serde_json::from_str(
            r#"{"workflow":{"id":"wf_1"},"user":"u_1","chatkit_configuration":{"file_upload":{"enabled":true}}}"#,
        )
        .unwrap();
        let body = session_request(req);

        assert_eq!(body["user"], "u_1");
        assert_eq!(body["chatkit_configuration"]["file_upload"]["enabled"], true);
    }
}

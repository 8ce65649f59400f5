use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    error::ApiResult,
    proxy::{self, API_METHODS},
    state::AppState,
};

/// Forward any API call under `/api/proxy/openai/*path` with the server
/// credential substituted. Status and body are relayed as they stream.
pub async fn proxy_api(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let api_key = state.config.api_key()?;
    let upstream = &state.config.upstream;

    let url = proxy::upstream_url(&upstream.api_base, &path, query.as_deref());
    tracing::info!(method = %method, path = %path, "Proxying API request");

    let with_body = method == Method::POST;
    let outbound =
        proxy::forward_headers(&headers, api_key, &upstream.passthrough_headers, with_body)?;

    let mut request = state.http_client.request(method, &url).headers(outbound);
    if with_body {
        request = request.body(body);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), path = %path, "API upstream error");
    }

    let cors = proxy::cors_headers(&state.config.cors.allow_origin, API_METHODS);
    Ok(proxy::relay_response(response, "application/json", cors))
}

pub async fn preflight(State(state): State<Arc<AppState>>) -> Response {
    (
        StatusCode::NO_CONTENT,
        proxy::cors_headers(&state.config.cors.allow_origin, API_METHODS),
    )
        .into_response()
}

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{
        header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, USER_AGENT},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::{
    error::ApiResult,
    proxy::{self, ASSET_METHODS},
    state::AppState,
};

/// Serve the client library and its assets from the CDN.
///
/// Bundles matching a rewrite marker are fetched whole and have their
/// embedded upstream origins pointed back at this server. Everything else is
/// streamed through byte for byte.
pub async fn proxy_asset(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let url = proxy::upstream_url(&state.config.upstream.cdn_base, &path, query.as_deref());
    tracing::info!(path = %path, "Fetching asset");

    let user_agent = headers
        .get(USER_AGENT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("ChatKit-Proxy"));
    let accept = headers
        .get(ACCEPT)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*/*"));

    let response = state
        .http_client
        .get(&url)
        .header(USER_AGENT, user_agent)
        .header(ACCEPT, accept)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(status = %status, path = %path, "Asset upstream error");
        let reason = status.canonical_reason().unwrap_or("Upstream error");
        return Ok((status, format!("Proxy error: {reason}")).into_response());
    }

    let mut out_headers = proxy::cors_headers(&state.config.cors.allow_origin, ASSET_METHODS);
    out_headers.insert(
        CONTENT_TYPE,
        response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream")),
    );
    out_headers.insert(
        CACHE_CONTROL,
        response
            .headers()
            .get(CACHE_CONTROL)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("public, max-age=3600")),
    );

    let assets = &state.config.assets;
    let body = if proxy::is_rewritable_asset(&path, &assets.rewrite_markers) {
        let bytes = response.bytes().await?;
        let rewritten =
            proxy::rewrite_asset_urls(&String::from_utf8_lossy(&bytes), &assets.rewrites);
        tracing::debug!(path = %path, "Rewrote upstream origins in asset");
        Body::from(rewritten)
    } else {
        Body::from_stream(response.bytes_stream())
    };

    let mut out = Response::new(body);
    *out.status_mut() = StatusCode::OK;
    out.headers_mut().extend(out_headers);
    Ok(out)
}

pub async fn preflight(State(state): State<Arc<AppState>>) -> Response {
    (
        StatusCode::NO_CONTENT,
        proxy::cors_headers(&state.config.cors.allow_origin, ASSET_METHODS),
    )
        .into_response()
}

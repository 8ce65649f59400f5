//! Request and response plumbing shared by the proxy handlers.

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE,
        },
        HeaderMap, HeaderName, HeaderValue,
    },
    response::Response,
};

use crate::config::UrlRewrite;
use crate::error::{ApiError, ApiResult};

pub const API_METHODS: &str = "GET, POST, OPTIONS";
pub const ASSET_METHODS: &str = "GET, OPTIONS";

/// Join an upstream base, a captured wildcard path and the raw query string.
pub fn upstream_url(base: &str, path: &str, query: Option<&str>) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    match query {
        Some(q) if !q.is_empty() => format!("{base}/{path}?{q}"),
        _ => format!("{base}/{path}"),
    }
}

/// Headers for a proxied API request.
///
/// The inbound `Authorization` is never forwarded; it is replaced by the
/// server credential. Only allow-listed headers are copied through.
pub fn forward_headers(
    inbound: &HeaderMap,
    api_key: &str,
    passthrough: &[String],
    with_body: bool,
) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .map_err(|_| ApiError::Config("API key is not a valid header value".to_string()))?;
    headers.insert(AUTHORIZATION, bearer);

    if with_body {
        let content_type = inbound
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, content_type);
    }

    for name in passthrough {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = %name, "Ignoring invalid passthrough header name");
            continue;
        };
        if name == AUTHORIZATION {
            continue;
        }
        if let Some(value) = inbound.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    Ok(headers)
}

/// Permissive CORS headers for the proxy routes.
pub fn cors_headers(allow_origin: &str, methods: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_str(allow_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(methods));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers
}

pub fn is_rewritable_asset(path: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| path.contains(marker.as_str()))
}

/// Point embedded upstream origins back at this server. Rules apply in order.
pub fn rewrite_asset_urls(content: &str, rewrites: &[UrlRewrite]) -> String {
    rewrites
        .iter()
        .fold(content.to_string(), |text, rule| text.replace(&rule.from, &rule.to))
}

/// Relay an upstream response as-is: status, content type and a streamed
/// body. Nothing is buffered.
pub fn relay_response(
    upstream: reqwest::Response,
    default_content_type: &'static str,
    extra_headers: HeaderMap,
) -> Response {
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(default_content_type));

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response.headers_mut().extend(extra_headers);
    response
}

//! Request/response exchange logging.
//!
//! [`log_exchange`] buffers both bodies so they can be logged at `debug`
//! level, then hands the buffered bytes on unchanged. Install it with
//! [`axum::middleware::from_fn_with_state`] and a [`BodyLogLimit`].

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::HOST, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::time::Instant;

/// Largest body, in bytes, written to the log for either side of the
/// exchange. Longer bodies are still forwarded in full.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyLogLimit(pub usize);

impl Default for BodyLogLimit {
    fn default() -> Self {
        Self(64 * 1024)
    }
}

/// Logs request headers, body and URL, then the response's elapsed time,
/// headers, status and body.
///
/// Both bodies reach their destination byte for byte whatever their size;
/// only the logged text is cut at the limit. A request body that fails to
/// arrive is a `400`, a response body that fails to stream is a `500`.
pub async fn log_exchange(
    State(BodyLogLimit(limit)): State<BodyLogLimit>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url = %request_url(&parts), "request body could not be read: {e}");
            return (StatusCode::BAD_REQUEST, "request body could not be read").into_response();
        }
    };

    tracing::debug!(
        "\n<Headers>\n{}\n<Body>\n{}\n<ETC>\nrequest url: {}\n",
        format_headers(&parts.headers),
        body_text(&body, limit),
        request_url(&parts),
    );

    let start = Instant::now();
    let response = next.run(Request::from_parts(parts, Body::from(body))).await;
    let elapsed = start.elapsed();

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(status = %parts.status, "response body could not be read: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::debug!(
        "\n<Response>\ntime: {}ms\nHeaders\n{}\nResponse Status: {}\nResponse Body: {}\n",
        elapsed.as_millis(),
        format_headers(&parts.headers),
        parts.status.as_u16(),
        body_text(&body, limit),
    );

    Response::from_parts(parts, Body::from(body))
}

/// One `name: value` line per header, in map order.
pub fn format_headers(headers: &HeaderMap) -> String {
    let mut out = String::new();
    for (name, value) in headers {
        let _ = writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    out
}

/// Full URL of a server-side request.
///
/// Server requests only carry path and query, so scheme and authority are
/// rebuilt from the `Host` header. The listener speaks plain HTTP.
fn request_url(parts: &Parts) -> String {
    if parts.uri.authority().is_some() {
        return parts.uri.to_string();
    }
    let path = parts
        .uri
        .path_and_query()
        .map_or("/", |path| path.as_str());
    match parts.headers.get(HOST).and_then(|host| host.to_str().ok()) {
        Some(host) => format!("http://{host}{path}"),
        None => path.to_owned(),
    }
}

/// Lossy UTF-8 of at most `limit` bytes of `body`.
fn body_text(body: &Bytes, limit: usize) -> Cow<'_, str> {
    if body.len() <= limit {
        return String::from_utf8_lossy(body);
    }
    let shown = String::from_utf8_lossy(&body[..limit]);
    Cow::Owned(format!("{shown}...<{} bytes omitted>", body.len() - limit))
}

//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::Response,
};

use crate::problem::render_problem;

/// The number of characters of a body that are logged at the `info` level.
const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level. Bodies that are
/// not text, e.g. PDF documents, are logged by size only.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return render_problem(StatusCode::BAD_REQUEST, "Could not read request body");
        }
    };

    log_body(
        &format!("Received request: {parts:#?}"),
        &parts.headers,
        &body_bytes,
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return render_problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not read response body",
            );
        }
    };

    log_body(
        &format!("Sending response: {parts:#?}"),
        &parts.headers,
        &body_bytes,
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn log_body(prefix: &str, headers: &HeaderMap, body: &Bytes) {
    match body_text(headers, body) {
        Some(text) => match truncate(text, LOG_BODY_LENGTH_LIMIT) {
            Some(truncated) => {
                tracing::info!("{prefix}\nbody: {truncated}...");
                tracing::debug!("Full body: {text:?}");
            }
            None => tracing::info!("{prefix}\nbody: {text:?}"),
        },
        None => tracing::info!("{prefix}\nbody: <{} bytes>", body.len()),
    }
}

/// Get the body as text if it is UTF-8 and the content type is not binary.
fn body_text<'a>(headers: &HeaderMap, body: &'a Bytes) -> Option<&'a str> {
    let is_binary = headers
        .get(CONTENT_TYPE)
        .and_then(|content_type| content_type.to_str().ok())
        .is_some_and(|content_type| {
            content_type.starts_with("application/pdf")
                || content_type.starts_with("application/octet-stream")
        });

    if is_binary {
        return None;
    }

    std::str::from_utf8(body).ok()
}

/// Cut `text` after `limit` characters, or return `None` if it is short enough.
fn truncate(text: &str, limit: usize) -> Option<&str> {
    text.char_indices()
        .nth(limit)
        .map(|(byte_index, _)| &text[..byte_index])
}

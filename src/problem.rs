//! Problem responses sent to the client when a request fails.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// The content type of problem responses.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// The body of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// A short, human-readable summary of the status code, e.g. "Not Found".
    pub title: String,
    /// The HTTP status code.
    pub status: u16,
    /// The error message explaining what went wrong.
    pub detail: String,
}

/// Render a problem response with `status` and the error message `detail`.
pub fn render_problem(status: StatusCode, detail: &str) -> Response {
    let problem = Problem {
        title: status.canonical_reason().unwrap_or("Error").to_owned(),
        status: status.as_u16(),
        detail: detail.to_owned(),
    };

    let mut response = (status, Json(problem)).into_response();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(PROBLEM_CONTENT_TYPE),
    );

    response
}

/// The fallback handler for routes that do not exist.
pub async fn get_404_not_found() -> Response {
    render_problem(StatusCode::NOT_FOUND, "The requested route does not exist")
}

//! Response construction.
//!
//! # Responsibilities
//! - Turn a resolved stub into status, `Content-Type` and body
//! - Map `NotFound` outcomes to 404 / 405 plain-text errors
//!
//! # Design Decisions
//! - Config values are not validated at load time, so an unrepresentable
//!   status code or content type surfaces here as a 500 for that request only

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::routing::{NotFound, ResolvedResponse};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Build the HTTP response for a dispatch outcome.
pub fn stub_response(outcome: Result<ResolvedResponse, NotFound>) -> Response {
    match outcome {
        Ok(resolved) => resolved_response(resolved),
        Err(not_found) => not_found_response(not_found),
    }
}

fn resolved_response(resolved: ResolvedResponse) -> Response {
    let Ok(status) = StatusCode::from_u16(resolved.status) else {
        tracing::error!(status = resolved.status, "Configured status code is not a valid HTTP status");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid status code in configuration");
    };

    let Ok(content_type) = HeaderValue::from_str(&resolved.content_type) else {
        tracing::error!(content_type = %resolved.content_type, "Configured content type is not a valid header value");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Invalid content type in configuration");
    };

    (
        status,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(resolved.body),
    )
        .into_response()
}

fn not_found_response(not_found: NotFound) -> Response {
    let status = StatusCode::from_u16(not_found.status_code()).unwrap_or(StatusCode::NOT_FOUND);
    error_response(status, &not_found.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN))],
        format!("{message}\n"),
    )
        .into_response()
}

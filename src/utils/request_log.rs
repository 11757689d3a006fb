use std::net::SocketAddr;

use axum::body::{Body, to_bytes};
use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;

/// Request bodies above this size are rejected before they reach a handler.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Logs who called what, with the body, then hands the request on untouched.
pub async fn log_request(request: Request, next: Next) -> Result<Response, ApiError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let uri = request.uri().clone();

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large."))?;

    tracing::info!(
        client = %client,
        uri = %uri,
        body = %String::from_utf8_lossy(&bytes),
        "incoming request"
    );

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

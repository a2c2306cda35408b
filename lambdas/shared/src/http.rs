//! HTTP response helpers shared by the handler binaries
//!
//! Every endpoint speaks JSON and answers browser preflights with the
//! same permissive CORS header set.

use lambda_http::{Body, Error as LambdaError, Response};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::errors::Error;
use crate::models::ErrorResponse;

/// JSON response with CORS headers.
pub fn json_response<T: Serialize>(status: u16, body: &T) -> Result<Response<Body>, LambdaError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Access-Control-Allow-Methods", "POST, OPTIONS")
        .body(Body::from(serde_json::to_string(body)?))?)
}

/// Error response built from the core error type. Server-side failures
/// keep their detail in the logs and return a generic message.
pub fn error_response(e: Error) -> Result<Response<Body>, LambdaError> {
    error!(error = %e, code = e.code(), "request failed");
    let status = e.status_code();
    let body = if status >= 500 {
        ErrorResponse::new(e.code(), "Internal server error")
    } else {
        ErrorResponse::new(e.code(), e.to_string())
    };
    json_response(status, &body)
}

/// 200 response for CORS preflight (OPTIONS) requests.
pub fn preflight_response() -> Result<Response<Body>, LambdaError> {
    json_response(200, &json!({"message": "CORS preflight"}))
}

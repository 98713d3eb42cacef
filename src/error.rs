//! Boundary errors and the rejection handler
//!
//! Requests that fail validation, auth or rate limiting never reach the relay.
//! Filters reject with an [`ApiError`]; [`handle_rejection`] turns every
//! rejection into a JSON body of the form `{"error": "..."}`.

use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{debug, error};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

/// Errors surfaced to the client as an HTTP status
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unsupported provider")]
    UnsupportedProvider,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many requests")]
    TooManyRequests,

    #[error("{0}")]
    NotFound(String),

    /// Internal failure; the detail is logged, never returned
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::UnsupportedProvider => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl warp::reject::Reject for ApiError {}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build a JSON error reply
pub fn error_reply(status: StatusCode, message: impl Into<String>) -> warp::reply::Response {
    let body = ErrorBody {
        error: message.into(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Convert any rejection into a JSON error response
pub async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    if let Some(api_error) = err.find::<ApiError>() {
        if let ApiError::Internal(detail) = api_error {
            error!(error = %detail, "internal server error");
        }
        return Ok(error_reply(api_error.status(), api_error.to_string()));
    }

    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "Not found"));
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        debug!(error = %e, "rejected request body");
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            format!("Invalid request body: {}", e),
        ));
    }

    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "Invalid request body: expected application/json",
        ));
    }

    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
        ));
    }

    // Empty and chunked bodies carry no Content-Length
    if err.find::<warp::reject::LengthRequired>().is_some() {
        return Ok(error_reply(
            StatusCode::BAD_REQUEST,
            "Invalid request body: missing Content-Length",
        ));
    }

    if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        debug!(error = %e, "rejected request header");
        return Ok(error_reply(StatusCode::BAD_REQUEST, e.to_string()));
    }

    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed",
        ));
    }

    error!(rejection = ?err, "unhandled rejection");
    Ok(error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error",
    ))
}

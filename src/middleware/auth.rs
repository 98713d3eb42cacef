//! Shared-secret check on the `X-API-Key` header

use std::sync::Arc;
use tracing::warn;
use warp::http::HeaderMap;
use warp::{Filter, Rejection};

use crate::error::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests whose `X-API-Key` differs from `expected`
///
/// The comparison is exact and case-sensitive. A header value that is not
/// valid UTF-8 never matches. With no key configured every request passes.
pub fn require_api_key(
    expected: Option<Arc<str>>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::header::headers_cloned()
        .and_then(move |headers: HeaderMap| {
            let expected = expected.clone();
            async move {
                let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
                if is_authorized(expected.as_deref(), provided) {
                    Ok(())
                } else {
                    warn!(
                        header_present = headers.contains_key(API_KEY_HEADER),
                        "rejected request with bad or missing API key"
                    );
                    Err(warp::reject::custom(ApiError::Unauthorized))
                }
            }
        })
        .untuple_one()
}

fn is_authorized(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => provided == Some(expected),
    }
}

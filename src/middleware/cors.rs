//! CORS policy built from `CORS_ALLOWED_ORIGINS`

use std::time::Duration;
use tracing::warn;
use warp::http::uri::Authority;

use super::auth::API_KEY_HEADER;

const ALLOWED_METHODS: [&str; 7] = ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];
const ALLOWED_HEADERS: [&str; 5] = [
    "origin",
    "content-length",
    "content-type",
    "authorization",
    API_KEY_HEADER,
];
const MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Build the CORS wrapper
///
/// With no origins configured, or with `*` in the list, any origin is allowed
/// without credentials. Credentials are only allowed for an explicit list.
/// Entries that are not `scheme://host[:port]` are skipped with a warning.
pub fn cors(allowed_origins: Option<&[String]>) -> warp::cors::Builder {
    let builder = warp::cors()
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(ALLOWED_HEADERS)
        .max_age(MAX_AGE);

    let origins = match allowed_origins {
        Some(origins) if !origins.iter().any(|o| o == "*") => valid_origins(origins),
        _ => Vec::new(),
    };

    if origins.is_empty() {
        builder.allow_any_origin()
    } else {
        builder
            .allow_origins(origins.iter().map(String::as_str))
            .allow_credentials(true)
    }
}

fn valid_origins(origins: &[String]) -> Vec<String> {
    origins
        .iter()
        .filter(|origin| {
            let valid = is_valid_origin(origin);
            if !valid {
                warn!(origin = %origin, "ignoring invalid CORS origin");
            }
            valid
        })
        .cloned()
        .collect()
}

fn is_valid_origin(origin: &str) -> bool {
    match origin.split_once("://") {
        Some((scheme, rest)) => {
            matches!(scheme, "http" | "https") && rest.parse::<Authority>().is_ok()
        }
        None => false,
    }
}

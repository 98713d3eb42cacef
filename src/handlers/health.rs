// GET /api/health and /api/health/ready handlers

use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::warn;
use warp::http::StatusCode;

use crate::store::ConversationStore;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

/// Liveness: the process is up and serving
pub async fn health_handler() -> Result<impl warp::Reply, Infallible> {
    Ok(warp::reply::json(&HealthResponse {
        status: "ok",
        database: None,
    }))
}

/// Readiness: the conversation store answers a ping
pub async fn readiness_handler(
    store: Arc<dyn ConversationStore>,
) -> Result<impl warp::Reply, Infallible> {
    let (status, body) = match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            HealthResponse {
                status: "ok",
                database: Some("ok"),
            },
        ),
        Err(e) => {
            warn!(error = %e, "conversation store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    status: "unavailable",
                    database: Some("unavailable"),
                },
            )
        }
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

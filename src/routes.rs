// Route definitions

use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

use crate::error::handle_rejection;
use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use crate::store::ConversationStore;

/// Chat request bodies carry inline images, so allow generous payloads
const MAX_BODY_BYTES: u64 = 16 * 1024 * 1024;

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let api = warp::path("api");

    // GET /api/health
    let health = api
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handlers::health_handler);

    // GET /api/health/ready
    let ready = api
        .and(warp::path("health"))
        .and(warp::path("ready"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_store(Arc::clone(&state.store)))
        .and_then(handlers::readiness_handler);

    // POST /api/chat/stream
    let chat_stream = api
        .and(warp::path("chat"))
        .and(warp::path("stream"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_stream_handler);

    // GET /api/conversations/{conversationId}
    let get_conversation = api
        .and(warp::path("conversations"))
        .and(warp::path::param::<String>())
        .and(warp::path::end())
        .and(warp::get())
        .and(with_store(Arc::clone(&state.store)))
        .and_then(handlers::get_conversation_handler);

    // Auth first, then the rate limit, then routing
    let guard = middleware::require_api_key(state.api_key.clone())
        .and(middleware::rate_limit(Arc::clone(&state.limiter)));

    let cors = middleware::cors(state.cors_allowed_origins.as_deref());

    guard
        .and(health.or(ready).or(chat_stream).or(get_conversation))
        .recover(handle_rejection)
        .with(cors)
        .with(warp::trace::request())
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_store(
    store: Arc<dyn ConversationStore>,
) -> impl Filter<Extract = (Arc<dyn ConversationStore>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&store))
}

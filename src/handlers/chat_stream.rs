// POST /api/chat/stream handler

use futures_util::stream::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info_span, warn, Instrument};

use crate::error::ApiError;
use crate::models::ChatRequest;
use crate::relay::RelayEvent;
use crate::state::AppState;

/// Events buffered between the relay task and the response body
const EVENT_BUFFER: usize = 32;

pub async fn chat_stream_handler(
    request: ChatRequest,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    if request.conversation_id.trim().is_empty() {
        return Err(ApiError::BadRequest("conversationId is required".to_string()).into());
    }

    let Some((kind, provider)) = state.providers.resolve(&request.provider) else {
        warn!(provider = %request.provider, "rejected unsupported provider");
        return Err(ApiError::UnsupportedProvider.into());
    };

    let span = info_span!(
        "chat_turn",
        conversation_id = %request.conversation_id,
        provider = %kind,
        model = %request.model,
    );

    // The response body owns the receiver; dropping it cancels the turn.
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(
        async move {
            orchestrator.run(provider, request, tx).await;
        }
        .instrument(span),
    );

    let event_stream = ReceiverStream::new(rx).map(RelayEvent::into_sse_event);
    Ok(warp::sse::reply(
        warp::sse::keep_alive().stream(event_stream),
    ))
}

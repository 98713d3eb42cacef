// GET /api/conversations/{id} handler

use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::models::ConversationResponse;
use crate::store::{ConversationStore, StoreError};

pub async fn get_conversation_handler(
    conversation_id: String,
    store: Arc<dyn ConversationStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    debug!(conversation_id = %conversation_id, "loading conversation");

    let conversation = store
        .get_conversation(&conversation_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;
    let messages = store
        .list_messages(&conversation_id)
        .await
        .map_err(internal)?;

    Ok(warp::reply::json(&ConversationResponse {
        conversation,
        messages,
    }))
}

fn internal(err: StoreError) -> ApiError {
    ApiError::Internal(err.to_string())
}

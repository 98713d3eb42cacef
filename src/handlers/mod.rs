// Handlers module

pub mod chat_stream;
pub mod conversations;
pub mod health;

pub use chat_stream::chat_stream_handler;
pub use conversations::get_conversation_handler;
pub use health::{health_handler, readiness_handler};

// HTTP server modules
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod sse;
pub mod state;

// Runtime configuration
pub mod config;

// Chat turn orchestration
pub mod relay;

// Conversation persistence
pub mod store;

// LLM abstraction layer
pub mod llm;

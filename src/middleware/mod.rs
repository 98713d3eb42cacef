//! Request guards applied ahead of every route.
//!
//! [`auth::require_api_key`] runs first, then [`rate_limit::rate_limit`]; a
//! rejected request never reaches a handler. [`cors::cors`] wraps the whole
//! route tree.

pub mod auth;
pub mod cors;
pub mod rate_limit;

pub use auth::require_api_key;
pub use cors::cors;
pub use rate_limit::{rate_limit, RateLimiter};

//! Greeting server with a per-client fixed-window rate limit.
//!
//! Clients are told apart by [`client_key::resolve_client_key`]; each one
//! may make `quota` requests per window before getting a 429. The window is
//! global and restarts for everybody at once when the reset task fires.

pub mod client_key;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod server;
pub mod state;

pub use config::{Args, RateLimitConfig};
pub use error::{Result, ServerError};
pub use rate_limit::{RateLimiter, ResetTask, spawn_reset_task};

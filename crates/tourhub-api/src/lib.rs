//! # tourhub-api
//!
//! HTTP API layer for TourHub built on Axum.
//!
//! Provides the order and notification endpoints, middleware (rate
//! limiting, CORS, tracing), the gateway-header auth extractor, DTOs, and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::ApiError;
pub use middleware::rate_limit::RateLimiter;
pub use state::AppState;

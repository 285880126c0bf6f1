//! Axum HTTP API server.
//!
//! This crate provides:
//! - Photo and logo uploads into per-session directories
//! - Listing extraction from listing URLs (feature `scrape`)
//! - Synchronous reel, carousel and sold renders with file download
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::SessionStore;
pub use state::AppState;

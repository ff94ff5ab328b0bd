//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /api/download`: stream an MP3 clip of a YouTube time range
//! - Health and readiness probes
//! - Security headers, request ids, request logging, CORS

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;

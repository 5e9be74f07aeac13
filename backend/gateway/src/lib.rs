//! InkCalc Gateway HTTP API Server
//!
//! Serves the calculate endpoint plus liveness and health reporting.

pub mod error;
pub mod handler;
pub mod health_api;
pub mod server;

pub use error::ApiError;
pub use handler::{normalize_records, process_request};
pub use server::{AppState, build_router, start_server};

//! HTTP API for the CAA auth core
//!
//! Library exports for the binary and for integration tests.

pub mod app;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod telemetry;

pub use app::create_app;
pub use routes::AppState;

//! Web API module for minidrive.
//!
//! A JSON REST API under `/api` with bearer-token authentication,
//! multipart uploads and streamed file delivery.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;

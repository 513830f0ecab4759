//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, single fallback handler)
//!     → request.rs (request ID, tracing span)
//!     → routing::Dispatcher (resolve against current table, apply delay)
//!     → response.rs (status, Content-Type, body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};

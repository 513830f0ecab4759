//! Configuration-driven HTTP stub server library.
//!
//! Serves canned responses for routes declared in a TOML file, picks among
//! per-route variants by query parameters, injects artificial latency, and
//! hot-reloads the routing table when the file changes without dropping
//! in-flight requests.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod routing;

pub use config::{ConfigurationSnapshot, RouteDeclaration, ResponseVariant};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use reload::ReloadCoordinator;
pub use routing::{DispatchTable, Dispatcher};

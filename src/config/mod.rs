//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → ConfigurationSnapshot (immutable)
//!     → routing::compile
//!
//! On change:
//!     watcher.rs detects change (or SIGHUP / admin request)
//!     → reload coordinator loads the new snapshot
//!     → compiles and atomically publishes a new DispatchTable
//! ```
//!
//! # Design Decisions
//! - Snapshots are immutable once loaded; changes require full reload
//! - Only structural checks: duplicates and odd values are kept as declared
//! - Omitted route fields take file-format defaults

pub mod loader;
pub mod schema;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ConfigurationSnapshot, QueryMatch, ResponseVariant, RouteDeclaration};
pub use watcher::{ConfigWatcher, WatchError, WatchEvent, WatchState, DEFAULT_SETTLE_DELAY};

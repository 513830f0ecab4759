//! Hot-reload subsystem.
//!
//! # Data Flow
//! ```text
//! Triggers:
//!     config/watcher.rs (file modified / renamed / recreated)
//!     lifecycle/signals.rs (SIGHUP)
//!     admin API (POST /admin/reload)
//!         → coordinator.rs (serialized reload)
//!         → config::load_config → routing::compile
//!         → Dispatcher::publish (atomic swap)
//! ```
//!
//! # Design Decisions
//! - The new table is built off to the side; readers never see a partial one
//! - Last-known-good wins: failed reloads only log
//! - Only the very first load may stop the process

pub mod coordinator;

pub use coordinator::{ReloadCoordinator, ReloadOutcome, ReloadState, ReloadStatus, ReloadTrigger};

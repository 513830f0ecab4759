//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (startup and every reload):
//!     ConfigurationSnapshot
//!     → router.rs (group declarations by path, keep file order)
//!     → Freeze as immutable DispatchTable
//!     → dispatcher.rs (atomic publish)
//!
//! Incoming Request (path, method, query):
//!     → dispatcher.rs (load current table)
//!     → router.rs (exact path lookup)
//!     → selector.rs (first method match, then first variant match)
//!     → matcher.rs (evaluate query conditions)
//!     → Return: ResolvedResponse or NotFound
//! ```
//!
//! # Design Decisions
//! - Tables are never mutated once visible; reload builds a new one
//! - Deterministic: same snapshot always compiles to the same table
//! - First match wins at both levels (method, then variant)

pub mod dispatcher;
pub mod matcher;
pub mod router;
pub mod selector;

pub use dispatcher::Dispatcher;
pub use matcher::{EmptyQueryPolicy, QueryParams};
pub use router::{compile, CompileOptions, CompiledRouteGroup, DispatchTable, RouteSummary};
pub use selector::{select, NotFound, ResolvedResponse};

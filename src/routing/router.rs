//! Route compilation and lookup.
//!
//! # Responsibilities
//! - Compile a configuration snapshot into an immutable dispatch table
//! - Group declarations by exact path, preserving file order
//! - Look up the group for a request path
//!
//! # Design Decisions
//! - Compilation is a pure function: snapshot in, table out, no I/O
//! - Immutable after construction (thread-safe without locks)
//! - O(1) path lookup via HashMap, O(n) method scan inside a group
//! - Strings become `Arc<str>` and bodies `Bytes`, so resolved responses
//!   share the table's buffers and outlive it cheaply

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;

use crate::config::{ConfigurationSnapshot, QueryMatch, ResponseVariant, RouteDeclaration};
use crate::routing::matcher::{EmptyQueryPolicy, QueryParams};
use crate::routing::selector::{select, NotFound, ResolvedResponse};

/// Options that shape how a snapshot is compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub empty_query: EmptyQueryPolicy,
}

/// A compiled response variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledVariant {
    pub query: QueryMatch,
    pub status_code: Option<u16>,
    pub content_type: Option<Arc<str>>,
    pub body: Option<Bytes>,
    pub delay_ms: Option<u64>,
}

impl From<&ResponseVariant> for CompiledVariant {
    fn from(v: &ResponseVariant) -> Self {
        Self {
            query: v.query.clone(),
            status_code: v.status_code,
            content_type: v.content_type.as_deref().map(Arc::from),
            body: v.body.clone().map(Bytes::from),
            delay_ms: v.delay_ms,
        }
    }
}

/// A compiled route declaration (one method on one path).
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRoute {
    pub method: String,
    pub status_code: u16,
    pub content_type: Arc<str>,
    pub delay_ms: u64,
    pub body: Bytes,
    pub variants: Vec<CompiledVariant>,
}

impl From<&RouteDeclaration> for CompiledRoute {
    fn from(d: &RouteDeclaration) -> Self {
        Self {
            method: d.method.clone(),
            status_code: d.status_code,
            content_type: Arc::from(d.content_type.as_str()),
            delay_ms: d.delay_ms,
            body: Bytes::from(d.body.clone()),
            variants: d.variants.iter().map(CompiledVariant::from).collect(),
        }
    }
}

/// All declarations sharing one path, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRouteGroup {
    path: String,
    routes: Vec<CompiledRoute>,
}

impl CompiledRouteGroup {
    fn new(path: String) -> Self {
        Self {
            path,
            routes: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// Declared methods in order (duplicates included).
    pub fn methods(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.method.clone()).collect()
    }
}

/// Summary of one path for diagnostics.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteSummary {
    pub path: String,
    pub methods: Vec<String>,
}

/// The compiled, immutable structure used to answer requests.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTable {
    groups: HashMap<String, CompiledRouteGroup>,
    empty_query: EmptyQueryPolicy,
    generation: u64,
}

impl DispatchTable {
    /// A table that answers every request with `UnknownPath`.
    pub fn empty() -> Self {
        compile(&ConfigurationSnapshot::default(), CompileOptions::default())
    }

    /// Find the group registered for `path`.
    pub fn group(&self, path: &str) -> Option<&CompiledRouteGroup> {
        self.groups.get(path)
    }

    /// Resolve a request against this table.
    pub fn resolve(
        &self,
        path: &str,
        method: &str,
        params: &QueryParams,
    ) -> Result<ResolvedResponse, NotFound> {
        let group = self.group(path).ok_or(NotFound::UnknownPath)?;
        select(group, method, params, self.empty_query)
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of declarations across all paths.
    pub fn route_count(&self) -> usize {
        self.groups.values().map(|g| g.routes.len()).sum()
    }

    pub fn empty_query_policy(&self) -> EmptyQueryPolicy {
        self.empty_query
    }

    /// Publication sequence number; 0 until published.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stamp the publication sequence number. Only the dispatcher calls this,
    /// before the table becomes visible to readers.
    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Paths and their methods, sorted by path.
    pub fn routes(&self) -> Vec<RouteSummary> {
        let mut summaries: Vec<RouteSummary> = self
            .groups
            .values()
            .map(|g| RouteSummary {
                path: g.path.clone(),
                methods: g.methods(),
            })
            .collect();
        summaries.sort_by(|a, b| a.path.cmp(&b.path));
        summaries
    }
}

/// Compile a snapshot into a dispatch table.
pub fn compile(snapshot: &ConfigurationSnapshot, options: CompileOptions) -> DispatchTable {
    let mut groups: HashMap<String, CompiledRouteGroup> = HashMap::new();

    for declaration in &snapshot.routes {
        groups
            .entry(declaration.path.clone())
            .or_insert_with(|| {
                tracing::debug!(path = %declaration.path, "Registering route");
                CompiledRouteGroup::new(declaration.path.clone())
            })
            .routes
            .push(CompiledRoute::from(declaration));
    }

    DispatchTable {
        groups,
        empty_query: options.empty_query,
        generation: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ConfigurationSnapshot {
        ConfigurationSnapshot::new(vec![
            RouteDeclaration::new("/resource", "GET").with_body("get"),
            RouteDeclaration::new("/health", "GET").with_body("ok"),
            RouteDeclaration::new("/resource", "POST")
                .with_status(201)
                .with_body("post"),
            RouteDeclaration::new("/resource", "GET").with_body("shadowed"),
        ])
    }

    #[test]
    fn test_groups_by_path_in_order() {
        let table = compile(&snapshot(), CompileOptions::default());

        assert_eq!(table.len(), 2);
        assert_eq!(table.route_count(), 4);

        let group = table.group("/resource").unwrap();
        assert_eq!(group.methods(), vec!["GET", "POST", "GET"]);
        assert_eq!(group.routes()[0].body, "get");
        assert_eq!(group.routes()[2].body, "shadowed");
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compile(&snapshot(), CompileOptions::default());
        let b = compile(&snapshot(), CompileOptions::default());
        assert_eq!(a, b);

        let params = QueryParams::default();
        for path in ["/resource", "/health", "/absent"] {
            for method in ["GET", "POST", "PUT"] {
                assert_eq!(
                    a.resolve(path, method, &params),
                    b.resolve(path, method, &params)
                );
            }
        }
    }

    #[test]
    fn test_exact_path_lookup() {
        let table = compile(&snapshot(), CompileOptions::default());
        let params = QueryParams::default();

        assert!(table.resolve("/health", "GET", &params).is_ok());
        assert_eq!(
            table.resolve("/health/", "GET", &params),
            Err(NotFound::UnknownPath)
        );
        assert_eq!(
            table.resolve("/HEALTH", "GET", &params),
            Err(NotFound::UnknownPath)
        );
    }

    #[test]
    fn test_route_summaries_sorted() {
        let table = compile(&snapshot(), CompileOptions::default());
        let routes = table.routes();
        assert_eq!(routes[0].path, "/health");
        assert_eq!(routes[1].path, "/resource");
        assert_eq!(routes[1].methods, vec!["GET", "POST", "GET"]);
    }

    #[test]
    fn test_empty_table() {
        let table = DispatchTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.generation(), 0);
        assert_eq!(
            table.resolve("/", "GET", &QueryParams::default()),
            Err(NotFound::UnknownPath)
        );
    }
}

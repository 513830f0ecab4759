//! Response selection within a route group.
//!
//! Two-level first-match-wins search: the first declaration whose method
//! equals the request method, then the first of its variants whose query
//! condition holds. Fields a variant leaves unset fall back to the
//! declaration one by one.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::routing::matcher::{query_matches, EmptyQueryPolicy, QueryParams};
use crate::routing::router::{CompiledRoute, CompiledRouteGroup, CompiledVariant};

/// The response chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResponse {
    pub status: u16,
    pub content_type: Arc<str>,
    pub delay: Duration,
    pub body: Bytes,
}

impl ResolvedResponse {
    fn from_route(route: &CompiledRoute) -> Self {
        Self {
            status: route.status_code,
            content_type: route.content_type.clone(),
            delay: Duration::from_millis(route.delay_ms),
            body: route.body.clone(),
        }
    }

    fn from_variant(route: &CompiledRoute, variant: &CompiledVariant) -> Self {
        Self {
            status: variant.status_code.unwrap_or(route.status_code),
            content_type: variant
                .content_type
                .clone()
                .unwrap_or_else(|| route.content_type.clone()),
            delay: Duration::from_millis(variant.delay_ms.unwrap_or(route.delay_ms)),
            body: variant.body.clone().unwrap_or_else(|| route.body.clone()),
        }
    }
}

/// Why a request could not be answered from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFound {
    #[error("No matching route found")]
    UnknownPath,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("No matching response found")]
    NoMatchingResponse,
}

impl NotFound {
    /// HTTP status this outcome is surfaced as.
    pub fn status_code(&self) -> u16 {
        match self {
            NotFound::UnknownPath | NotFound::NoMatchingResponse => 404,
            NotFound::MethodNotAllowed => 405,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            NotFound::UnknownPath => "unknown_path",
            NotFound::MethodNotAllowed => "method_not_allowed",
            NotFound::NoMatchingResponse => "no_matching_response",
        }
    }
}

/// Pick the response for `method` + `params` from `group`.
pub fn select(
    group: &CompiledRouteGroup,
    method: &str,
    params: &QueryParams,
    policy: EmptyQueryPolicy,
) -> Result<ResolvedResponse, NotFound> {
    let route = group
        .routes()
        .iter()
        .find(|r| r.method == method)
        .ok_or(NotFound::MethodNotAllowed)?;

    if route.variants.is_empty() {
        return Ok(ResolvedResponse::from_route(route));
    }

    route
        .variants
        .iter()
        .find(|v| query_matches(&v.query, params, policy))
        .map(|v| ResolvedResponse::from_variant(route, v))
        .ok_or(NotFound::NoMatchingResponse)
}

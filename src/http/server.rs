//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: one fallback handler for every method and path
//! - Wire up middleware (request ID, tracing)
//! - Dispatch requests against the current table
//! - Serve until the shutdown signal

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::{Method, Uri},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::http::response::stub_response;
use crate::observability::metrics;
use crate::routing::{Dispatcher, QueryParams};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server answering requests from the stub table.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server serving whatever `dispatcher` currently holds.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let router = Self::build_router(AppState { dispatcher });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(stub_handler)
            .with_state(state)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(set_request_id_layer())
    }

    /// The router, for serving on a custom transport or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Answer any request from the current dispatch table.
async fn stub_handler(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let start = Instant::now();
    let params = QueryParams::parse(uri.query());

    let outcome = state.dispatcher.serve(uri.path(), method.as_str(), &params).await;
    if let Err(not_found) = &outcome {
        tracing::debug!(path = %uri.path(), reason = not_found.reason(), "No stub for request");
    }

    let response = stub_response(outcome);
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigurationSnapshot, ResponseVariant, RouteDeclaration};
    use crate::routing::{compile, CompileOptions};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> (Router, Arc<Dispatcher>) {
        let snapshot = ConfigurationSnapshot::new(vec![
            RouteDeclaration::new("/health", "GET")
                .with_content_type("application/json")
                .with_body(r#"{"status":"healthy"}"#),
            RouteDeclaration::new("/resource", "GET").with_body("got"),
            RouteDeclaration::new("/resource", "POST").with_status(201).with_body("created"),
            RouteDeclaration::new("/users", "GET")
                .with_status(404)
                .with_body("none")
                .with_variant(ResponseVariant::matching([("type", "active")]).with_status(200).with_body("A")),
        ]);
        let dispatcher = Arc::new(Dispatcher::new(compile(&snapshot, CompileOptions::default())));
        let router = HttpServer::new(dispatcher.clone()).router();
        (router, dispatcher)
    }

    async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = router
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (router, _) = router();
        let (status, content_type, body) = send(router, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, r#"{"status":"healthy"}"#);
    }

    #[tokio::test]
    async fn test_method_routing() {
        let (router, _) = router();
        assert_eq!(send(router.clone(), "GET", "/resource").await.2, "got");

        let (status, _, body) = send(router.clone(), "POST", "/resource").await;
        assert_eq!((status, body.as_str()), (StatusCode::CREATED, "created"));

        let (status, _, _) = send(router, "PUT", "/resource").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_query_variants() {
        let (router, _) = router();
        let (status, _, body) = send(router.clone(), "GET", "/users?type=active").await;
        assert_eq!((status, body.as_str()), (StatusCode::OK, "A"));

        let (status, _, body) = send(router, "GET", "/users?type=missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "No matching response found\n");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (router, _) = router();
        let (status, _, body) = send(router, "GET", "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "No matching route found\n");
    }

    #[tokio::test]
    async fn test_request_id_is_returned() {
        let (router, _) = router();
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_router_follows_publish() {
        let (router, dispatcher) = router();
        dispatcher.publish(compile(
            &ConfigurationSnapshot::new(vec![RouteDeclaration::new("/health", "GET").with_body("v2")]),
            CompileOptions::default(),
        ));

        let (_, content_type, body) = send(router.clone(), "GET", "/health").await;
        assert_eq!(body, "v2");
        assert_eq!(content_type.as_deref(), Some("text/plain"));
        assert_eq!(send(router, "GET", "/resource").await.0, StatusCode::NOT_FOUND);
    }
}

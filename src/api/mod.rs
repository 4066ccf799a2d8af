//! HTTP surface of deploy-info.
//!
//! | Method | Path      | Handler            |
//! |--------|-----------|--------------------|
//! | GET    | `/health` | [`health::health`] |
//! | GET    | `/info`   | [`info::info`]     |
//!
//! Routes are registered with [`axum::routing::get`], so any other method on
//! a known path is answered with `405 Method Not Allowed` before the handler
//! runs. Unknown paths get `404`.

use std::{sync::Arc, time::Duration};

use axum::{http::StatusCode, routing::get, Router};

use crate::version::VersionSource;

pub mod health;
pub mod info;
pub mod request_id;

/// Shared handler state. Read-only; every request resolves its own version.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub version: VersionSource,
}

impl AppState {
    pub fn new(version: VersionSource) -> Self {
        Self { version }
    }
}

/// Bare route table, no middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/info", get(info::info))
        .with_state(state)
}

/// Route table wrapped in the production middleware stack.
pub fn app(state: Arc<AppState>, request_timeout: Duration) -> Router {
    with_middleware(router(state), request_timeout)
}

/// Layer order (outermost first): trace → request id → timeout → routes.
///
/// A request still running after `request_timeout` is answered with
/// `408 Request Timeout`.
fn with_middleware(routes: Router, request_timeout: Duration) -> Router {
    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO));

    routes
        .layer(tower_http::timeout::TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(trace_layer)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use tower::ServiceExt; // oneshot

    use super::*;

    // -----------------------------------------------------------------------
    // Test helpers
    // -----------------------------------------------------------------------

    fn test_app() -> Router {
        let state = Arc::new(AppState::new(VersionSource::new(
            "DEPLOY_INFO_TEST_ROUTER_VERSION",
            "/nonexistent/deploy-info/VERSION",
        )));
        app(state, Duration::from_secs(5))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Method filtering
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn post_health_is_method_not_allowed() {
        let resp = test_app().oneshot(request(Method::POST, "/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn post_info_is_method_not_allowed() {
        let resp = test_app().oneshot(request(Method::POST, "/info")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn other_write_methods_are_rejected_too() {
        for method in [Method::PUT, Method::DELETE, Method::PATCH] {
            for path in ["/health", "/info"] {
                let resp = test_app()
                    .oneshot(request(method.clone(), path))
                    .await
                    .unwrap();
                assert_eq!(
                    resp.status(),
                    StatusCode::METHOD_NOT_ALLOWED,
                    "{method} {path}"
                );
            }
        }
    }

    #[tokio::test]
    async fn method_not_allowed_advertises_get() {
        let resp = test_app().oneshot(request(Method::POST, "/info")).await.unwrap();
        let allow = resp
            .headers()
            .get(header::ALLOW)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(allow.contains("GET"), "Allow header: {allow:?}");
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let resp = test_app().oneshot(request(Method::GET, "/version")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn full_stack_serves_health() {
        let resp = test_app().oneshot(request(Method::GET, "/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    // -----------------------------------------------------------------------
    // Request timeout
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn slow_request_is_answered_with_408() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let app = with_middleware(slow, Duration::from_millis(50));

        let resp = app.oneshot(request(Method::GET, "/slow")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(resp.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn fast_request_is_not_affected_by_timeout() {
        let state = Arc::new(AppState::default());
        let app = app(state, Duration::from_millis(500));

        let resp = app.oneshot(request(Method::GET, "/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn full_stack_serves_unknown_version_without_sources() {
        let resp = test_app().oneshot(request(Method::GET, "/info")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["version"], "unknown");
    }
}

//! `X-Request-ID` propagation.
//!
//! A caller-supplied non-empty `X-Request-ID` is kept; otherwise a UUID v4
//! is minted. The ID is stored as a request extension, echoed on the
//! response, and attached to a tracing span so the `/info` log line and the
//! access log can be correlated with what the caller saw.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument as _;
use uuid::Uuid;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The ID assigned to the current request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_request(req: &Request) -> Self {
        let id = req
            .headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self(id)
    }
}

/// Axum middleware assigning a [`RequestId`] to every request.
///
/// Must sit inside `TraceLayer` so the span nests under the HTTP span.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_request(&req);
    req.extensions_mut().insert(id.clone());

    let span = tracing::debug_span!("request", id = %id.0);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&id.0) {
        response.headers_mut().insert(X_REQUEST_ID.clone(), value);
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get, Extension, Router};
    use tower::ServiceExt;

    use super::*;

    fn echo_app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    fn response_id(resp: &Response) -> String {
        resp.headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    async fn caller_supplied_id_is_echoed() {
        let req = Request::builder()
            .uri("/")
            .header("x-request-id", "deploy-abc-123")
            .body(Body::empty())
            .unwrap();

        let resp = echo_app().oneshot(req).await.unwrap();
        assert_eq!(response_id(&resp), "deploy-abc-123");
    }

    #[tokio::test]
    async fn missing_id_is_generated_as_uuid() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let resp = echo_app().oneshot(req).await.unwrap();
        let id = response_id(&resp);
        assert!(Uuid::parse_str(&id).is_ok(), "not a uuid: {id:?}");
    }

    #[tokio::test]
    async fn empty_header_is_replaced() {
        let req = Request::builder()
            .uri("/")
            .header("x-request-id", "")
            .body(Body::empty())
            .unwrap();

        let resp = echo_app().oneshot(req).await.unwrap();
        assert!(!response_id(&resp).is_empty());
    }

    #[tokio::test]
    async fn handler_sees_the_same_id_as_the_response_header() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let resp = echo_app().oneshot(req).await.unwrap();
        let header_id = response_id(&resp);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(String::from_utf8(body.to_vec()).unwrap(), header_id);
    }
}

//! Application router.

use axum::{routing::get, Json, Router};
use http::{HeaderValue, Method};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::sse::sse_router;
use crate::adapters::streaming::StreamHub;
use crate::adapters::websocket::websocket_router;

/// Reported by the health check.
pub const SERVICE_NAME: &str = "slurm-stream";

/// Build the router with all routes and middleware.
///
/// An empty `cors_origins` allows any origin.
pub fn build_router(hub: StreamHub, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(websocket_router())
        .merge(sse_router())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySnapshotSource;
    use crate::adapters::streaming::StreamSettings;
    use crate::domain::watch::{Job, Node, Partition};
    use axum::body::Body;
    use http::{header, Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn hub() -> StreamHub {
        StreamHub::new(
            Arc::new(InMemorySnapshotSource::<Job>::new()),
            Arc::new(InMemorySnapshotSource::<Node>::new()),
            Arc::new(InMemorySnapshotSource::<Partition>::new()),
            StreamSettings::default(),
        )
    }

    #[tokio::test]
    async fn health_reports_service() {
        let response = build_router(hub(), &[])
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok", "service": "slurm-stream"}));
    }

    #[tokio::test]
    async fn any_origin_when_unconfigured() {
        let response = build_router(hub(), &[])
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://dashboard.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn configured_origins_are_enforced() {
        let origins = vec!["http://dashboard.example".to_string()];

        let allowed = build_router(hub(), &origins)
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://dashboard.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://dashboard.example"
        );

        let denied = build_router(hub(), &origins)
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(denied.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let response = build_router(hub(), &[])
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

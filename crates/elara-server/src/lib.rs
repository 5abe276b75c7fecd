pub mod handlers;
pub mod ratelimit;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use state::AppState;

/// Build the REST router (spec §4.7). CORS/tracing middleware mirrors the
/// teacher's `tower`/`tower-http` usage in `RpcServer::start`.
pub fn build_router(state: std::sync::Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any);

    Router::new()
        .route("/status", get(handlers::status))
        .route("/ping", get(handlers::ping))
        .route("/records", post(handlers::submit_record).get(handlers::query_records))
        .route("/witness", post(handlers::request_witness))
        .route("/attestations", get(handlers::query_attestations))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use elara_core::{CryptoProfile, EntityType, NodeType};
    use elara_crypto::Identity;
    use elara_dag::LocalDAG;
    use elara_witness::WitnessStore;
    use ratelimit::PeerRateLimiter;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let dir = tempfile::tempdir().unwrap();
        Arc::new(AppState {
            identity: Identity::generate(EntityType::Ai, CryptoProfile::Single),
            dag: LocalDAG::open(dir.path().join("dag")).unwrap(),
            witness_store: WitnessStore::open(dir.path().join("witness")).unwrap(),
            rate_limiter: PeerRateLimiter::new(100, 60.0),
            port: 9000,
            node_type: NodeType::Leaf,
        })
    }

    fn with_connect_info(router: Router) -> Router {
        router
    }

    #[tokio::test]
    async fn status_reports_identity_and_zero_records() {
        let app = with_connect_info(build_router(test_state()));
        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["pong"], true);
    }

    #[tokio::test]
    async fn attestations_without_record_id_is_bad_request() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/attestations").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[allow(dead_code)]
    fn unused(_addr: SocketAddr) {}
}

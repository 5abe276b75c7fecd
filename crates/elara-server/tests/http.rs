//! Integration tests driving the real HTTP surface end-to-end, including the
//! `ConnectInfo` peer-IP extraction that `oneshot`-style unit tests can't
//! exercise (mirrors the teacher's subprocess+reqwest smoke-test style).

use std::net::SocketAddr;
use std::sync::Arc;

use elara_core::{Classification, CryptoProfile, EntityType, NodeType};
use elara_crypto::Identity;
use elara_dag::{LocalDAG, ValidationRecord};
use elara_server::{build_router, AppState};
use elara_server::ratelimit::PeerRateLimiter;
use elara_witness::WitnessStore;

async fn spawn_server() -> (String, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState {
        identity: Identity::generate(EntityType::Ai, CryptoProfile::Single),
        dag: LocalDAG::open(dir.path().join("dag")).unwrap(),
        witness_store: WitnessStore::open(dir.path().join("witness")).unwrap(),
        rate_limiter: PeerRateLimiter::new(100, 60.0),
        port: 0,
        node_type: NodeType::Leaf,
    });

    let router = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });

    (format!("http://{addr}"), state)
}

fn signed_wire_bytes(identity: &Identity) -> Vec<u8> {
    let mut record = ValidationRecord::create(
        b"hello".to_vec(),
        identity.primary_public_key.clone(),
        vec![],
        Classification::Sovereign,
        Default::default(),
        1_700_000_000,
    );
    record.finalize_id();
    record.signature = identity.sign(&record.signable_bytes());
    record.to_bytes()
}

#[tokio::test]
async fn status_and_ping_round_trip() {
    let (base, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    let status: serde_json::Value = client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    assert_eq!(status["dag_records"], 0);

    let ping: serde_json::Value = client.get(format!("{base}/ping")).send().await.unwrap().json().await.unwrap();
    assert_eq!(ping["pong"], true);
}

#[tokio::test]
async fn submit_then_query_record() {
    let (base, _state) = spawn_server().await;
    let client = reqwest::Client::new();
    let identity = Identity::generate(EntityType::Ai, CryptoProfile::Single);
    let wire = signed_wire_bytes(&identity);

    let submit: serde_json::Value =
        client.post(format!("{base}/records")).body(wire).send().await.unwrap().json().await.unwrap();
    assert_eq!(submit["accepted"], true);

    let records: serde_json::Value =
        client.get(format!("{base}/records?since=0&limit=10")).send().await.unwrap().json().await.unwrap();
    assert_eq!(records["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn submit_empty_body_is_bad_request() {
    let (base, _state) = spawn_server().await;
    let client = reqwest::Client::new();
    let resp = client.post(format!("{base}/records")).body(Vec::<u8>::new()).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn witness_then_query_attestations() {
    let (base, _state) = spawn_server().await;
    let client = reqwest::Client::new();
    let identity = Identity::generate(EntityType::Ai, CryptoProfile::Single);
    let wire = signed_wire_bytes(&identity);

    let witness_resp: serde_json::Value =
        client.post(format!("{base}/witness")).body(wire.clone()).send().await.unwrap().json().await.unwrap();
    assert!(witness_resp.get("signature").is_some());
    let record_id = witness_resp["record_id"].as_str().unwrap().to_string();

    let attestations: serde_json::Value = client
        .get(format!("{base}/attestations?record_id={record_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(attestations["attestations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rate_limited_submissions_return_429() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState {
        identity: Identity::generate(EntityType::Ai, CryptoProfile::Single),
        dag: LocalDAG::open(dir.path().join("dag")).unwrap(),
        witness_store: WitnessStore::open(dir.path().join("witness")).unwrap(),
        rate_limiter: PeerRateLimiter::new(1, 60.0),
        port: 0,
        node_type: NodeType::Leaf,
    });
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
    });
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    let identity = Identity::generate(EntityType::Ai, CryptoProfile::Single);

    let first = client.post(format!("{base}/records")).body(signed_wire_bytes(&identity)).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);

    let second = client.post(format!("{base}/records")).body(signed_wire_bytes(&identity)).send().await.unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
}

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::body::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use elara_dag::{RecordId, ValidationRecord};
use elara_witness::WitnessAttestation;

use crate::state::SharedState;

fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock before epoch").as_secs() as i64
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub async fn status(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "identity": state.identity.identity_hash.to_hex(),
        "entity_type": format!("{:?}", state.identity.entity_type),
        "dag_records": state.dag.stats().record_count,
        "port": state.port,
        "node_type": state.node_type.to_string(),
        "public_key": hex::encode(&state.identity.primary_public_key),
    }))
}

pub async fn ping(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "pong": true,
        "identity": state.identity.identity_hash.to_hex(),
        "ts": now_secs(),
    }))
}

fn peer_ip(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

pub async fn submit_record(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> axum::response::Response {
    if !state.rate_limiter.allow(&peer_ip(&addr)) {
        return error_response(StatusCode::TOO_MANY_REQUESTS, "rate limited");
    }
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty body");
    }

    let record = match ValidationRecord::from_bytes(&body) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "failed to parse submitted record");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    match state.dag.insert(&record, true) {
        Ok(()) => Json(json!({ "accepted": true, "record_id": hex::encode(record.id) })).into_response(),
        Err(e) => {
            warn!(error = %e, "record rejected");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[derive(Deserialize)]
pub struct RecordsQuery {
    #[serde(default)]
    since: i64,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn query_records(State(state): State<SharedState>, Query(q): Query<RecordsQuery>) -> axum::response::Response {
    let limit = q.limit.unwrap_or(elara_core::constants::DEFAULT_RECORDS_QUERY_LIMIT);
    match state.dag.query_since(None, q.since, limit) {
        Ok(records) => {
            let records: Vec<_> = records
                .iter()
                .map(|r| {
                    json!({
                        "record_id": hex::encode(r.id),
                        "wire_hex": hex::encode(r.to_bytes()),
                        "timestamp": r.timestamp,
                        "creator_public_key": hex::encode(&r.creator_public_key),
                    })
                })
                .collect();
            Json(json!({ "records": records })).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

pub async fn request_witness(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> axum::response::Response {
    if !state.rate_limiter.allow(&peer_ip(&addr)) {
        return error_response(StatusCode::TOO_MANY_REQUESTS, "rate limited");
    }
    if body.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty body");
    }

    let record = match ValidationRecord::from_bytes(&body) {
        Ok(r) => r,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let signable = record.signable_bytes();
    if elara_crypto::verify_primary(&record.creator_public_key, &signable, &record.signature).is_err() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "creator signature verification failed");
    }

    let witness_signature = state.identity.sign(&signable);
    let timestamp = now_secs();

    let attestation = WitnessAttestation {
        record_id: record.id,
        witness_identity_hash: state.identity.identity_hash,
        witness_signature: witness_signature.clone(),
        timestamp,
    };

    if let Err(e) = state.witness_store.add_attestation(attestation) {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    Json(json!({
        "witness": state.identity.identity_hash.to_hex(),
        "record_id": hex::encode(record.id),
        "signature": hex::encode(witness_signature),
        "timestamp": timestamp,
    }))
    .into_response()
}

#[derive(Deserialize)]
pub struct AttestationsQuery {
    record_id: Option<String>,
}

pub async fn query_attestations(
    State(state): State<SharedState>,
    Query(q): Query<AttestationsQuery>,
) -> axum::response::Response {
    let Some(record_id_hex) = q.record_id else {
        return error_response(StatusCode::BAD_REQUEST, "missing record_id");
    };
    let Ok(bytes) = hex::decode(&record_id_hex) else {
        return error_response(StatusCode::BAD_REQUEST, "invalid record_id");
    };
    if bytes.len() != 32 {
        return error_response(StatusCode::BAD_REQUEST, "invalid record_id");
    }
    let mut record_id: RecordId = [0u8; 32];
    record_id.copy_from_slice(&bytes);

    match state.witness_store.get_attestations(&record_id) {
        Ok(attestations) => {
            let attestations: Vec<_> = attestations
                .iter()
                .map(|a| {
                    json!({
                        "record_id": hex::encode(a.record_id),
                        "witness_identity_hash": a.witness_identity_hash.to_hex(),
                        "witness_signature": hex::encode(&a.witness_signature),
                        "timestamp": a.timestamp,
                    })
                })
                .collect();
            Json(json!({ "attestations": attestations })).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

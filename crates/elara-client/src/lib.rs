//! Async HTTP facade for talking to remote Elara nodes (spec §4.8).
//! Every transport failure is caught and reported as a structured
//! `{"error": ...}` JSON value — nothing is ever propagated as a panic or
//! unhandled `Result::Err` to the caller.

use std::time::Duration;

use elara_core::constants::{
    CLIENT_DEFAULT_TIMEOUT_SECS, CLIENT_PING_TIMEOUT_SECS, DEFAULT_RECORDS_QUERY_LIMIT,
};
use serde_json::{json, Value};
use tracing::error;

/// Thin async HTTP client with a shared connection pool and default timeout.
pub struct NetworkClient {
    client: reqwest::Client,
}

impl NetworkClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(CLIENT_DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builder is infallible with only a timeout set");
        Self { client }
    }

    /// Submit a record's wire bytes to a remote node.
    pub async fn submit_record(&self, host: &str, port: u16, wire_bytes: Vec<u8>) -> Value {
        let url = format!("http://{host}:{port}/records");
        match self.client.post(&url).body(wire_bytes).send().await {
            Ok(resp) => parse_json_or_error(resp).await,
            Err(e) => {
                error!(%host, port, error = %e, "failed to submit record");
                json!({ "error": e.to_string() })
            }
        }
    }

    /// Query recent records. Returns the `records` array directly, or an
    /// empty array on any transport failure.
    pub async fn query_records(&self, host: &str, port: u16, since: i64, limit: usize) -> Vec<Value> {
        let limit = if limit == 0 { DEFAULT_RECORDS_QUERY_LIMIT } else { limit };
        let url = format!("http://{host}:{port}/records?since={since}&limit={limit}");
        match self.client.get(&url).send().await {
            Ok(resp) => match resp.json::<Value>().await {
                Ok(body) => body
                    .get("records")
                    .and_then(|r| r.as_array())
                    .cloned()
                    .unwrap_or_default(),
                Err(e) => {
                    error!(%host, port, error = %e, "failed to parse records response");
                    Vec::new()
                }
            },
            Err(e) => {
                error!(%host, port, error = %e, "failed to query records");
                Vec::new()
            }
        }
    }

    /// Request a witness attestation. When `verify_key`/`signable` are
    /// given, the returned signature is verified against the witness's
    /// public key before being handed back.
    pub async fn request_witness(
        &self,
        host: &str,
        port: u16,
        wire_bytes: Vec<u8>,
        verify_key: Option<&[u8]>,
        signable: Option<&[u8]>,
    ) -> Value {
        let url = format!("http://{host}:{port}/witness");
        let body = match self.client.post(&url).body(wire_bytes).send().await {
            Ok(resp) => parse_json_or_error(resp).await,
            Err(e) => {
                error!(%host, port, error = %e, "failed to request witness");
                return json!({ "error": e.to_string() });
            }
        };

        if body.get("error").is_some() {
            return body;
        }

        if let (Some(key), Some(signable)) = (verify_key, signable) {
            let sig_hex = body.get("signature").and_then(|v| v.as_str()).unwrap_or("");
            let verified = hex::decode(sig_hex)
                .ok()
                .map(|sig| elara_crypto::verify_primary(key, signable, &sig).is_ok())
                .unwrap_or(false);
            if !verified {
                return json!({ "error": "witness signature verification failed" });
            }
        }

        body
    }

    pub async fn get_status(&self, host: &str, port: u16) -> Value {
        let url = format!("http://{host}:{port}/status");
        match self.client.get(&url).send().await {
            Ok(resp) => parse_json_or_error(resp).await,
            Err(e) => {
                error!(%host, port, error = %e, "failed to get status");
                json!({ "error": e.to_string() })
            }
        }
    }

    /// Ping a remote node with a short, dedicated timeout. Returns `None`
    /// rather than an error on any failure — bounded-time liveness check.
    pub async fn ping(&self, host: &str, port: u16) -> Option<Value> {
        let url = format!("http://{host}:{port}/ping");
        let fut = self.client.get(&url).send();
        let resp = tokio::time::timeout(Duration::from_secs(CLIENT_PING_TIMEOUT_SECS), fut)
            .await
            .ok()?
            .ok()?;
        resp.json::<Value>().await.ok()
    }

    pub async fn query_attestations(&self, host: &str, port: u16, record_id: &str) -> Value {
        let url = format!("http://{host}:{port}/attestations?record_id={record_id}");
        match self.client.get(&url).send().await {
            Ok(resp) => parse_json_or_error(resp).await,
            Err(e) => {
                error!(%host, port, error = %e, "failed to query attestations");
                json!({ "error": e.to_string() })
            }
        }
    }

    /// No persistent resources to release; kept for parity with the
    /// session-based client this facade mirrors.
    pub async fn close(&self) {}
}

impl Default for NetworkClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn parse_json_or_error(resp: reqwest::Response) -> Value {
    match resp.json::<Value>().await {
        Ok(body) => body,
        Err(e) => json!({ "error": e.to_string() }),
    }
}

//! L1 Bridge — turns domain-level cognitive events into signed, chained
//! validation records without blocking producers (spec §4.9), grounded in
//! `original_source/core/layer1_bridge.py`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use elara_core::{Classification, CryptoProfile, ElaraError, EntityType, Event, EventBus};
use elara_core::events::CognitiveEvent;
use elara_crypto::Identity;
use elara_dag::{LocalDAG, RecordId, ValidationRecord};
use serde_json::json;
use tracing::{error, info};

/// Priority this bridge subscribes at — middle-of-the-road so other
/// observers can choose to run before or after it (spec §4.9).
pub const SUBSCRIBE_PRIORITY: u8 = 50;

fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock before epoch").as_secs() as i64
}

/// DAG statistics plus an identity fingerprint, returned by `stats()`.
#[derive(Debug, serde::Serialize)]
pub struct BridgeStats {
    pub record_count: u64,
    pub tip_count: u64,
    pub identity: String,
    pub identity_entity: String,
}

#[derive(Debug, serde::Serialize)]
pub struct ProvenanceEntry {
    pub record_id: String,
    pub timestamp: i64,
    pub artifact_type: String,
    pub content_summary: String,
}

/// Bridges cognitive events to cryptographic validation records. Holds a
/// single identity and DAG; `last_validated_hash` chains records linearly
/// per process (spec §5 — no attempt at global ordering). Also holds the
/// event bus it was installed on, so a successful validation can be
/// announced back onto it (spec §4.9/§7: validation outcomes are observable).
pub struct L1Bridge {
    identity: Identity,
    dag: LocalDAG,
    last_validated_hash: Mutex<Option<RecordId>>,
    version: String,
    bus: Arc<dyn EventBus>,
}

impl L1Bridge {
    /// Load or generate the identity at `identity_path`, open the DAG at
    /// `dag_path`, and recover `last_validated_hash` from the most recent tip.
    /// Standalone constructor for tests and callers that don't need to share
    /// the DAG handle with anything else.
    pub fn new(identity_path: &Path, dag_path: &Path, bus: Arc<dyn EventBus>) -> Result<Self, ElaraError> {
        let identity = if identity_path.exists() {
            let identity = Identity::load(identity_path)?;
            info!(identity = %identity.identity_hash, "loaded bridge identity");
            identity
        } else {
            let identity = Identity::generate(EntityType::Ai, CryptoProfile::ProfileA);
            identity.save(identity_path)?;
            info!(identity = %identity.identity_hash, "generated bridge identity");
            identity
        };

        let dag = LocalDAG::open(dag_path)?;
        Self::with_dag(identity, dag, bus)
    }

    /// Build a bridge over an identity and DAG handle already owned by the
    /// caller (spec §3: "the bridge borrows the DAG"). `dag` is a cheap
    /// clone of the server's `LocalDAG` handle onto the same on-disk store.
    pub fn with_dag(identity: Identity, dag: LocalDAG, bus: Arc<dyn EventBus>) -> Result<Self, ElaraError> {
        let last_validated_hash = dag.tips()?.last().copied();

        info!(
            identity = %identity.identity_hash,
            dag_records = dag.stats().record_count,
            "layer 1 bridge initialized"
        );

        Ok(Self {
            identity,
            dag,
            last_validated_hash: Mutex::new(last_validated_hash),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bus,
        })
    }

    /// Subscribe this bridge to the bus it was built with, at
    /// `SUBSCRIBE_PRIORITY`. The bridge itself filters for
    /// `Event::Cognitive` and ignores everything else — the bus has no
    /// notion of per-type subscriptions.
    pub fn install(bridge: Arc<Self>) {
        let bus = bridge.bus.clone();
        bus.subscribe(
            SUBSCRIBE_PRIORITY,
            Box::new(move |event| {
                if let Event::Cognitive(cognitive) = event {
                    bridge.handle_event(cognitive);
                }
            }),
        );
        info!("bridge subscribed to cognitive events");
    }

    /// Route one cognitive event to validation. Never panics or propagates:
    /// any failure is logged and swallowed so producers are never blocked.
    fn handle_event(&self, event: &CognitiveEvent) {
        if let Err(e) = self.validate(event) {
            error!(error = %e, kind = event.kind(), "bridge failed to validate cognitive event");
        }
    }

    fn validate(&self, event: &CognitiveEvent) -> Result<RecordId, ElaraError> {
        let content = build_artifact_content(event)?;
        let metadata = build_metadata(event, &self.version);

        let parents = match *self.last_validated_hash.lock().expect("bridge mutex poisoned") {
            Some(parent) => vec![parent],
            None => vec![],
        };

        let mut record = ValidationRecord::create(
            content,
            self.identity.primary_public_key.clone(),
            parents,
            Classification::Sovereign,
            metadata,
            now_secs(),
        );
        record.creator_secondary_public_key = self.identity.secondary_public_key.clone();
        record.finalize_id();

        let signable = record.signable_bytes();
        record.signature = self.identity.sign(&signable);
        if self.identity.profile == CryptoProfile::ProfileA {
            record.secondary_signature = Some(
                self.identity
                    .sign_secondary(&signable)
                    .expect("ProfileA identity always carries a secondary key"),
            );
        }

        self.dag.insert(&record, true)?;

        *self.last_validated_hash.lock().expect("bridge mutex poisoned") = Some(record.id);

        info!(
            record_id = %hex::encode(record.id),
            artifact_id = event.artifact_id(),
            "artifact validated"
        );
        self.bus.emit(Event::ArtifactValidated(self.identity.identity_hash));

        Ok(record.id)
    }

    /// DAG stats plus an identity fingerprint.
    pub fn stats(&self) -> BridgeStats {
        let dag_stats = self.dag.stats();
        BridgeStats {
            record_count: dag_stats.record_count,
            tip_count: dag_stats.tip_count,
            identity: self.identity.identity_hash.to_hex(),
            identity_entity: format!("{:?}", self.identity.entity_type),
        }
    }

    /// Records authored by this identity whose metadata `artifact_id`
    /// matches, newest-first.
    pub fn provenance(&self, artifact_id: &str) -> Result<Vec<ProvenanceEntry>, ElaraError> {
        let records = self.dag.query(Some(&self.identity.primary_public_key), 10_000)?;
        Ok(records
            .into_iter()
            .filter(|r| r.metadata.get("artifact_id").and_then(|v| v.as_str()) == Some(artifact_id))
            .map(|r| ProvenanceEntry {
                record_id: hex::encode(r.id),
                timestamp: r.timestamp,
                artifact_type: r.metadata.get("artifact_type").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                content_summary: r.metadata.get("content_summary").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            })
            .collect())
    }

    pub fn close(&self) -> Result<(), ElaraError> {
        self.dag.close()
    }
}

fn build_artifact_content(event: &CognitiveEvent) -> Result<Vec<u8>, ElaraError> {
    let data = serde_json::to_value(event).map_err(|e| ElaraError::Serialization(e.to_string()))?;
    let payload = json!({ "event_type": event.kind(), "data": data });
    // serde_json's default Map is a BTreeMap, so object keys serialize sorted;
    // `to_vec` is compact with no inserted whitespace.
    serde_json::to_vec(&payload).map_err(|e| ElaraError::Serialization(e.to_string()))
}

fn build_metadata(event: &CognitiveEvent, version: &str) -> BTreeMap<String, serde_json::Value> {
    let mut metadata = BTreeMap::new();
    metadata.insert("artifact_type".to_string(), json!(event.kind()));
    metadata.insert("artifact_id".to_string(), json!(event.artifact_id()));
    metadata.insert("domain".to_string(), json!("general"));
    metadata.insert("layer3_version".to_string(), json!(version));
    metadata.insert("content_summary".to_string(), json!(summary(event)));
    metadata.insert("confidence".to_string(), json!(1.0));
    metadata.insert("zone".to_string(), json!("local"));
    metadata.insert("witness_count".to_string(), json!(0));
    metadata
}

fn summary(event: &CognitiveEvent) -> String {
    let raw = match event {
        CognitiveEvent::ModelCreated(p) => &p.summary,
        CognitiveEvent::PredictionMade(p) => &p.summary,
        CognitiveEvent::PrincipleCrystallized(p) => &p.summary,
        CognitiveEvent::WorkflowCreated(p) => &p.summary,
        CognitiveEvent::CorrectionAdded(p) => &p.summary,
        CognitiveEvent::DreamCompleted(p) => &p.summary,
        CognitiveEvent::EpisodeEnded(p) => &p.summary,
        CognitiveEvent::HandoffSaved(p) => &p.summary,
        CognitiveEvent::SynthesisCreated(p) => &p.summary,
        CognitiveEvent::OutcomeRecorded(p) => &p.summary,
    };
    raw.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use elara_core::events::{ModelCreatedPayload, PredictionMadePayload};
    use elara_core::InMemoryBus;

    fn bridge() -> (Arc<L1Bridge>, Arc<InMemoryBus>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let bus = Arc::new(InMemoryBus::new());
        let bridge = L1Bridge::new(&dir.path().join("identity"), &dir.path().join("dag"), bus.clone()).unwrap();
        (Arc::new(bridge), bus, dir)
    }

    #[test]
    fn validating_creates_a_chained_record() {
        let (bridge, _bus, _dir) = bridge();
        let event = CognitiveEvent::PredictionMade(PredictionMadePayload {
            prediction_id: "pred-1".to_string(),
            summary: "the sky will be blue".to_string(),
        });
        let id1 = bridge.validate(&event).unwrap();

        let event2 = CognitiveEvent::PredictionMade(PredictionMadePayload {
            prediction_id: "pred-2".to_string(),
            summary: "the sky will be grey".to_string(),
        });
        let id2 = bridge.validate(&event2).unwrap();

        let record2 = bridge.dag.get(&id2).unwrap().unwrap();
        assert_eq!(record2.parents, vec![id1]);
    }

    #[test]
    fn install_routes_cognitive_events_and_ignores_others() {
        let (bridge, bus, _dir) = bridge();
        L1Bridge::install(bridge.clone());

        bus.emit(Event::NetworkStarted);
        assert_eq!(bridge.stats().record_count, 0);

        bus.emit(Event::Cognitive(CognitiveEvent::ModelCreated(ModelCreatedPayload {
            model_id: "model-1".to_string(),
            summary: "a model".to_string(),
        })));
        assert_eq!(bridge.stats().record_count, 1);
    }

    #[test]
    fn validating_emits_artifact_validated_on_the_bus() {
        let (bridge, bus, _dir) = bridge();
        let seen = Arc::new(Mutex::new(false));
        let seen2 = seen.clone();
        bus.subscribe(0, Box::new(move |event| {
            if matches!(event, Event::ArtifactValidated(_)) {
                *seen2.lock().unwrap() = true;
            }
        }));

        bridge
            .validate(&CognitiveEvent::ModelCreated(ModelCreatedPayload {
                model_id: "model-1".to_string(),
                summary: "a model".to_string(),
            }))
            .unwrap();

        assert!(*seen.lock().unwrap());
    }

    #[test]
    fn provenance_finds_matching_artifact_id() {
        let (bridge, _bus, _dir) = bridge();
        bridge
            .validate(&CognitiveEvent::PredictionMade(PredictionMadePayload {
                prediction_id: "pred-42".to_string(),
                summary: "a prediction".to_string(),
            }))
            .unwrap();

        let found = bridge.provenance("pred-42").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].artifact_type, "prediction_made");
    }

    #[test]
    fn content_is_sorted_compact_json() {
        let event = CognitiveEvent::ModelCreated(ModelCreatedPayload {
            model_id: "m1".to_string(),
            summary: "s".to_string(),
        });
        let content = build_artifact_content(&event).unwrap();
        let text = String::from_utf8(content).unwrap();
        assert!(!text.contains(' '));
        assert!(text.starts_with(r#"{"data":"#));
    }
}

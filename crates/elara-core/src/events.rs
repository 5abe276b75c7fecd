use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::types::IdentityHash;

/// One cognitive artifact reaching the bridge (spec §4.9).
///
/// Each variant carries its own payload struct with explicit fields — the
/// original `_build_metadata` fallback chain over a handful of candidate keys
/// becomes one inherent field read per variant here.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CognitiveEvent {
    ModelCreated(ModelCreatedPayload),
    PredictionMade(PredictionMadePayload),
    PrincipleCrystallized(PrincipleCrystallizedPayload),
    WorkflowCreated(WorkflowCreatedPayload),
    CorrectionAdded(CorrectionAddedPayload),
    DreamCompleted(DreamCompletedPayload),
    EpisodeEnded(EpisodeEndedPayload),
    HandoffSaved(HandoffSavedPayload),
    SynthesisCreated(SynthesisCreatedPayload),
    OutcomeRecorded(OutcomeRecordedPayload),
}

impl CognitiveEvent {
    /// Stable name used for the record's `metadata["event_type"]` field.
    pub fn kind(&self) -> &'static str {
        match self {
            CognitiveEvent::ModelCreated(_) => "model_created",
            CognitiveEvent::PredictionMade(_) => "prediction_made",
            CognitiveEvent::PrincipleCrystallized(_) => "principle_crystallized",
            CognitiveEvent::WorkflowCreated(_) => "workflow_created",
            CognitiveEvent::CorrectionAdded(_) => "correction_added",
            CognitiveEvent::DreamCompleted(_) => "dream_completed",
            CognitiveEvent::EpisodeEnded(_) => "episode_ended",
            CognitiveEvent::HandoffSaved(_) => "handoff_saved",
            CognitiveEvent::SynthesisCreated(_) => "synthesis_created",
            CognitiveEvent::OutcomeRecorded(_) => "outcome_recorded",
        }
    }

    /// Artifact identifier, used as the bridge's idempotency key.
    pub fn artifact_id(&self) -> &str {
        match self {
            CognitiveEvent::ModelCreated(p) => &p.model_id,
            CognitiveEvent::PredictionMade(p) => &p.prediction_id,
            CognitiveEvent::PrincipleCrystallized(p) => &p.principle_id,
            CognitiveEvent::WorkflowCreated(p) => &p.workflow_id,
            CognitiveEvent::CorrectionAdded(p) => &p.correction_id,
            CognitiveEvent::DreamCompleted(p) => &p.dream_id,
            CognitiveEvent::EpisodeEnded(p) => &p.episode_id,
            CognitiveEvent::HandoffSaved(p) => &p.handoff_id,
            CognitiveEvent::SynthesisCreated(p) => &p.synthesis_id,
            CognitiveEvent::OutcomeRecorded(p) => &p.outcome_id,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelCreatedPayload {
    pub model_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionMadePayload {
    pub prediction_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrincipleCrystallizedPayload {
    pub principle_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowCreatedPayload {
    pub workflow_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CorrectionAddedPayload {
    pub correction_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DreamCompletedPayload {
    pub dream_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EpisodeEndedPayload {
    pub episode_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HandoffSavedPayload {
    pub handoff_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisCreatedPayload {
    pub synthesis_id: String,
    pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutcomeRecordedPayload {
    pub outcome_id: String,
    pub summary: String,
}

/// Everything the node's in-process observers care about: cognitive
/// artifacts plus network lifecycle notices.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Event {
    Cognitive(CognitiveEvent),
    NetworkStarted,
    NetworkStopped,
    /// Carries the peer's `identity_hash` as discovery knows it — a plain
    /// string rather than `IdentityHash`, since bootstrap/LAN-resolved peers
    /// may carry placeholder values before their real identity is known
    /// (see `elara_discovery::PeerInfo`).
    PeerDiscovered(String),
    PeerLost(String),
    ArtifactValidated(IdentityHash),
}

pub type EventHandler = Box<dyn Fn(&Event) + Send + Sync>;

/// The contract `elara-bridge` and `elara-node` consume. The real bus lives
/// outside this workspace (spec §1); this trait is the seam it plugs into.
pub trait EventBus: Send + Sync {
    /// Register a handler. Lower `priority` runs first, matching the
    /// original `bus.on(event_type, handler, priority=50)` ordering.
    fn subscribe(&self, priority: u8, handler: EventHandler);

    fn emit(&self, event: Event);
}

/// Synchronous, priority-ordered observer bus — stands in for the external
/// bus when wiring the node binary and in bridge tests.
#[derive(Default)]
pub struct InMemoryBus {
    handlers: Mutex<Vec<(u8, Arc<EventHandler>)>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }
}

impl EventBus for InMemoryBus {
    fn subscribe(&self, priority: u8, handler: EventHandler) {
        let mut handlers = self.handlers.lock().expect("event bus mutex poisoned");
        handlers.push((priority, Arc::new(handler)));
        handlers.sort_by_key(|(p, _)| *p);
    }

    /// Snapshots the handler list and releases the lock before invoking any
    /// of them, so a handler that itself calls `emit` (the bridge announcing
    /// `ArtifactValidated` from inside its own cognitive-event handler)
    /// doesn't deadlock re-locking a held, non-reentrant mutex.
    fn emit(&self, event: Event) {
        let snapshot: Vec<Arc<EventHandler>> = {
            let handlers = self.handlers.lock().expect("event bus mutex poisoned");
            handlers.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in snapshot {
            handler(&event);
        }
    }
}

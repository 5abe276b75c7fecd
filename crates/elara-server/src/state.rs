use std::sync::Arc;

use elara_core::NodeType;
use elara_crypto::Identity;
use elara_dag::LocalDAG;
use elara_witness::WitnessStore;

use crate::ratelimit::PeerRateLimiter;

/// Shared state handed to every axum handler.
pub struct AppState {
    pub identity: Identity,
    pub dag: LocalDAG,
    pub witness_store: WitnessStore,
    pub rate_limiter: PeerRateLimiter,
    pub port: u16,
    pub node_type: NodeType,
}

pub type SharedState = Arc<AppState>;

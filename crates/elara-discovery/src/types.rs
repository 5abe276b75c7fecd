use elara_core::NodeType;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a discovered peer (spec §4.6).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerState {
    Discovered,
    Connected,
    Stale,
}

/// A known peer on the network.
///
/// `identity_hash` is a plain string rather than `elara_core::IdentityHash`:
/// peers resolved from seed/peers-file/remote-fallback sources before their
/// real identity is known carry placeholder values like `seed-host:port`
/// that aren't valid 32-byte hashes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeerInfo {
    pub identity_hash: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub node_type: NodeType,
    pub state: PeerState,
    pub last_seen: i64,
    #[serde(default)]
    pub records_exchanged: u64,
    #[serde(default)]
    pub public_key: Option<Vec<u8>>,
    #[serde(default)]
    pub heartbeat_failures: u32,
}

impl PeerInfo {
    pub fn new(identity_hash: String, host: String, port: u16, node_type: NodeType, now: i64) -> Self {
        Self {
            identity_hash,
            host,
            port,
            node_type,
            state: PeerState::Discovered,
            last_seen: now,
            records_exchanged: 0,
            public_key: None,
            heartbeat_failures: 0,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

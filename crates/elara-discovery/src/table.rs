use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use elara_core::constants::STALE_TIMEOUT_SECS;
use serde::Serialize;

use crate::types::{PeerInfo, PeerState};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

#[derive(Debug, Serialize)]
pub struct PeerTableStats {
    pub total_peers: usize,
    pub connected: usize,
    pub stale: usize,
}

/// All known peers, keyed by `identity_hash`. Mirrors the original's
/// `PeerDiscovery._peers` dict plus its freshness-on-read behaviour.
#[derive(Default)]
pub struct PeerTable {
    peers: Mutex<HashMap<String, PeerInfo>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self { peers: Mutex::new(HashMap::new()) }
    }

    /// All known peers, with any peer unseen for `STALE_TIMEOUT_SECS`
    /// transitioned to `Stale` as a side effect of this read.
    pub fn peers(&self) -> Vec<PeerInfo> {
        let now = now_secs();
        let mut guard = self.peers.lock().expect("peer table mutex poisoned");
        for peer in guard.values_mut() {
            if (now - peer.last_seen) as f64 > STALE_TIMEOUT_SECS {
                peer.state = PeerState::Stale;
            }
        }
        guard.values().cloned().collect()
    }

    pub fn connected_peers(&self) -> Vec<PeerInfo> {
        self.peers()
            .into_iter()
            .filter(|p| p.state == PeerState::Connected)
            .collect()
    }

    /// Insert or replace a peer, keyed by identity hash.
    pub fn add_peer(&self, peer: PeerInfo) {
        let mut guard = self.peers.lock().expect("peer table mutex poisoned");
        guard.insert(peer.identity_hash.clone(), peer);
    }

    pub fn get(&self, identity_hash: &str) -> Option<PeerInfo> {
        self.peers.lock().expect("peer table mutex poisoned").get(identity_hash).cloned()
    }

    /// Apply a mutation to a stored peer, if present.
    pub fn update<F: FnOnce(&mut PeerInfo)>(&self, identity_hash: &str, f: F) {
        let mut guard = self.peers.lock().expect("peer table mutex poisoned");
        if let Some(peer) = guard.get_mut(identity_hash) {
            f(peer);
        }
    }

    pub fn stats(&self) -> PeerTableStats {
        let peers = self.peers();
        let connected = peers.iter().filter(|p| p.state == PeerState::Connected).count();
        let stale = peers.iter().filter(|p| p.state == PeerState::Stale).count();
        PeerTableStats { total_peers: peers.len(), connected, stale }
    }
}

pub mod bootstrap;
pub mod heartbeat;
pub mod lan;
pub mod table;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use elara_core::{Event, EventBus, NodeType};
use serde::Serialize;
use tracing::info;

pub use bootstrap::{bootstrap_peers, load_network_config, save_network_config, NetworkConfig};
pub use heartbeat::heartbeat_once;
pub use lan::{LanDiscovery, LanEvent, MdnsLan, NullLan};
pub use table::{PeerTable, PeerTableStats};
pub use types::{PeerInfo, PeerState};

fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock before epoch").as_secs() as i64
}

#[derive(Debug, Serialize)]
pub struct DiscoveryStats {
    pub running: bool,
    pub lan_enabled: bool,
    pub total_peers: usize,
    pub connected: usize,
    pub stale: usize,
}

/// Top-level discovery facade, combining the peer table, bootstrap
/// resolution, and the LAN capability. Mirrors `original_source`'s
/// `PeerDiscovery` class, split into composable pieces.
pub struct PeerDiscovery {
    identity_hash: String,
    port: u16,
    node_type: NodeType,
    peers_file: Option<PathBuf>,
    table: PeerTable,
    lan: Box<dyn LanDiscovery>,
    lan_enabled: bool,
    running: bool,
    bus: Option<Arc<dyn EventBus>>,
}

impl PeerDiscovery {
    pub fn new(
        identity_hash: String,
        port: u16,
        node_type: NodeType,
        peers_file: Option<PathBuf>,
        lan: Box<dyn LanDiscovery>,
        bus: Option<Arc<dyn EventBus>>,
    ) -> Self {
        let lan_enabled = lan.is_enabled();
        Self {
            identity_hash,
            port,
            node_type,
            peers_file,
            table: PeerTable::new(),
            lan,
            lan_enabled,
            running: false,
            bus,
        }
    }

    pub fn table(&self) -> &PeerTable {
        &self.table
    }

    /// Bootstrap peers from config/peers-file/remote fallback, then start
    /// LAN advertisement and browsing.
    pub async fn start(&mut self, config: &NetworkConfig, remote_fallback_url: Option<&str>) {
        if self.running {
            return;
        }

        let resolved = bootstrap_peers(config, self.peers_file.as_deref(), remote_fallback_url).await;
        let now = now_secs();
        for peer in &resolved {
            self.table.add_peer(bootstrap::resolved_peer_to_info(peer, now));
        }
        info!(count = resolved.len(), "loaded bootstrap peers");

        if let Err(e) = self.lan.register(&self.identity_hash, self.port, self.node_type) {
            info!(error = %e, "LAN discovery unavailable, continuing with bootstrap peers only");
        }

        self.running = true;
    }

    /// Drain any pending LAN events and fold them into the peer table,
    /// announcing newly-seen and newly-lost peers on the bus.
    pub fn poll_lan(&mut self) {
        for event in self.lan.poll() {
            match event {
                LanEvent::Resolved(peer) => {
                    if peer.identity_hash != self.identity_hash {
                        let is_new = self.table.get(&peer.identity_hash).is_none();
                        let identity_hash = peer.identity_hash.clone();
                        self.table.add_peer(peer);
                        if is_new {
                            self.emit(Event::PeerDiscovered(identity_hash));
                        }
                    }
                }
                LanEvent::Removed { identity_hash } => {
                    self.table.update(&identity_hash, |p| p.state = PeerState::Stale);
                    self.emit(Event::PeerLost(identity_hash));
                }
            }
        }
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.bus {
            bus.emit(event);
        }
    }

    pub fn add_peer(&self, host: String, port: u16, identity_hash: Option<String>) -> PeerInfo {
        let identity = identity_hash.unwrap_or_else(|| format!("manual-{host}:{port}"));
        let peer = PeerInfo::new(identity, host, port, NodeType::Leaf, now_secs());
        self.table.add_peer(peer.clone());
        peer
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        let _ = self.lan.unregister();
        self.running = false;
        info!("discovery stopped");
    }

    pub fn stats(&self) -> DiscoveryStats {
        let stats = self.table.stats();
        DiscoveryStats {
            running: self.running,
            lan_enabled: self.lan_enabled,
            total_peers: stats.total_peers,
            connected: stats.connected,
            stale: stats.stale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_with_null_lan_loads_default_seed() {
        let mut discovery = PeerDiscovery::new("self-hash".into(), 9000, NodeType::Leaf, None, Box::new(NullLan), None);
        let config = NetworkConfig::default();
        discovery.start(&config, None).await;
        assert_eq!(discovery.table().peers().len(), 1);
    }

    #[test]
    fn add_peer_generates_manual_placeholder_identity() {
        let discovery = PeerDiscovery::new("self-hash".into(), 9000, NodeType::Leaf, None, Box::new(NullLan), None);
        let peer = discovery.add_peer("10.0.0.9".into(), 9100, None);
        assert_eq!(peer.identity_hash, "manual-10.0.0.9:9100");
    }

    #[test]
    fn stats_report_lan_disabled_for_null_lan() {
        let discovery = PeerDiscovery::new("self-hash".into(), 9000, NodeType::Leaf, None, Box::new(NullLan), None);
        assert!(!discovery.stats().lan_enabled);
    }
}

//! Seed node resolution + GitHub-style remote peer list fallback
//! (spec §4.6, grounded in `original_source/network/bootstrap.py`).
//!
//! Priority order: seed nodes from `NetworkConfig`, then the peers file,
//! then a remote fallback URL — tried only if the first two produced zero
//! peers.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use elara_core::constants::REMOTE_FALLBACK_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::PeerInfo;

fn default_node_type() -> String {
    "leaf".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedNode {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    pub identity_hash: Option<String>,
}

fn default_seeds() -> Vec<SeedNode> {
    vec![SeedNode {
        host: "node.navigatorbuilds.com".to_string(),
        port: 9473,
        node_type: "relay".to_string(),
        identity_hash: None,
    }]
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_seeds")]
    pub seed_nodes: Vec<SeedNode>,
}

fn default_enabled() -> bool {
    true
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            node_type: default_node_type(),
            port: 0,
            seed_nodes: default_seeds(),
        }
    }
}

/// Load `elara-network.json`, falling back to defaults on any error.
pub fn load_network_config(path: &Path) -> NetworkConfig {
    let Ok(text) = std::fs::read_to_string(path) else {
        return NetworkConfig::default();
    };
    match serde_json::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to parse network config, using defaults");
            NetworkConfig::default()
        }
    }
}

pub fn save_network_config(path: &Path, config: &NetworkConfig) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_json::to_string_pretty(config).expect("NetworkConfig always serializes");
    std::fs::write(path, text + "\n")
}

#[derive(Deserialize)]
struct PeersFile {
    #[serde(default)]
    peers: Vec<PeerFileEntry>,
}

#[derive(Deserialize)]
struct PeerFileEntry {
    host: String,
    port: u16,
    #[serde(default)]
    node_type: Option<String>,
    #[serde(default)]
    identity_hash: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedPeer {
    pub host: String,
    pub port: u16,
    pub node_type: String,
    pub identity_hash: String,
}

/// Seed nodes from config, each defaulted to a `seed-host:port` placeholder
/// identity when none is configured.
pub fn resolve_seed_peers(config: &NetworkConfig) -> Vec<ResolvedPeer> {
    config
        .seed_nodes
        .iter()
        .filter(|s| !s.host.is_empty() && s.port != 0)
        .map(|s| ResolvedPeer {
            host: s.host.clone(),
            port: s.port,
            node_type: s.node_type.clone(),
            identity_hash: s
                .identity_hash
                .clone()
                .unwrap_or_else(|| format!("seed-{}:{}", s.host, s.port)),
        })
        .collect()
}

fn load_peers_file(path: &Path) -> Vec<ResolvedPeer> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(file) = serde_json::from_str::<PeersFile>(&text) else {
        warn!(path = %path.display(), "failed to parse peers file");
        return Vec::new();
    };
    file.peers
        .into_iter()
        .filter(|e| !e.host.is_empty() && e.port != 0)
        .map(|e| ResolvedPeer {
            identity_hash: e
                .identity_hash
                .unwrap_or_else(|| format!("file-{}:{}", e.host, e.port)),
            node_type: e.node_type.unwrap_or_else(default_node_type),
            host: e.host,
            port: e.port,
        })
        .collect()
}

#[derive(Deserialize)]
struct RemoteSeedList {
    #[serde(default)]
    seed_nodes: Vec<RemoteSeedEntry>,
}

#[derive(Deserialize)]
struct RemoteSeedEntry {
    host: String,
    port: u16,
    #[serde(default, rename = "type")]
    node_type: Option<String>,
}

/// Last-resort peer list, fetched only when every other source is empty.
pub async fn fetch_remote_peers(url: &str) -> Vec<ResolvedPeer> {
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(REMOTE_FALLBACK_TIMEOUT_SECS))
        .build()
    {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let fetch = async {
        let resp = client.get(url).header("User-Agent", "elara-core").send().await.ok()?;
        resp.json::<RemoteSeedList>().await.ok()
    };

    match fetch.await {
        Some(list) => {
            let peers: Vec<ResolvedPeer> = list
                .seed_nodes
                .into_iter()
                .filter(|e| !e.host.is_empty() && e.port != 0)
                .map(|e| ResolvedPeer {
                    identity_hash: format!("remote-{}:{}", e.host, e.port),
                    node_type: e.node_type.unwrap_or_else(default_node_type),
                    host: e.host,
                    port: e.port,
                })
                .collect();
            info!(count = peers.len(), "fetched remote fallback peers");
            peers
        }
        None => {
            debug!("remote peer fallback failed (this is fine)");
            Vec::new()
        }
    }
}

/// Resolve all peers from every source, deduplicated by `host:port`, seeds
/// taking priority over the peers file, with the remote fallback only
/// consulted if nothing else produced a peer.
pub async fn bootstrap_peers(
    config: &NetworkConfig,
    peers_file: Option<&Path>,
    remote_fallback_url: Option<&str>,
) -> Vec<ResolvedPeer> {
    let mut seen: HashMap<String, ResolvedPeer> = HashMap::new();

    for peer in resolve_seed_peers(config) {
        let key = format!("{}:{}", peer.host, peer.port);
        seen.insert(key, peer);
    }

    if let Some(path) = peers_file {
        for peer in load_peers_file(path) {
            let key = format!("{}:{}", peer.host, peer.port);
            seen.entry(key).or_insert(peer);
        }
    }

    if seen.is_empty() {
        if let Some(url) = remote_fallback_url {
            for peer in fetch_remote_peers(url).await {
                let key = format!("{}:{}", peer.host, peer.port);
                seen.entry(key).or_insert(peer);
            }
        }
    }

    seen.into_values().collect()
}

pub fn resolved_peer_to_info(peer: &ResolvedPeer, now: i64) -> PeerInfo {
    use std::str::FromStr;
    let node_type = elara_core::NodeType::from_str(&peer.node_type).unwrap_or_default();
    PeerInfo::new(peer.identity_hash.clone(), peer.host.clone(), peer.port, node_type, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_one_seed() {
        let config = NetworkConfig::default();
        let seeds = resolve_seed_peers(&config);
        assert_eq!(seeds.len(), 1);
        assert!(seeds[0].identity_hash.starts_with("seed-"));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = load_network_config(Path::new("/nonexistent/elara-network.json"));
        assert!(config.enabled);
        assert_eq!(config.seed_nodes.len(), 1);
    }

    #[test]
    fn peers_file_entries_get_placeholder_identity_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elara-peers.json");
        std::fs::write(&path, r#"{"peers":[{"host":"10.0.0.5","port":9000}]}"#).unwrap();
        let peers = load_peers_file(&path);
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].identity_hash, "file-10.0.0.5:9000");
    }

    #[tokio::test]
    async fn bootstrap_seeds_take_priority_over_peers_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elara-peers.json");
        std::fs::write(
            &path,
            r#"{"peers":[{"host":"node.navigatorbuilds.com","port":9473,"identity_hash":"should-not-win"}]}"#,
        )
        .unwrap();

        let config = NetworkConfig::default();
        let peers = bootstrap_peers(&config, Some(&path), None).await;
        assert_eq!(peers.len(), 1);
        assert!(peers[0].identity_hash.starts_with("seed-"));
    }

    #[tokio::test]
    async fn bootstrap_skips_remote_fallback_when_peers_already_found() {
        let config = NetworkConfig::default();
        let peers = bootstrap_peers(&config, None, Some("http://127.0.0.1:1/unreachable")).await;
        assert_eq!(peers.len(), 1);
    }
}

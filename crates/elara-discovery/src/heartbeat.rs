//! Peer liveness checks (spec §4.6/§5): a failed ping increments
//! `heartbeat_failures`; crossing the threshold demotes the peer to Stale.

use elara_client::NetworkClient;
use elara_core::constants::HEARTBEAT_FAILURE_THRESHOLD;
use elara_core::{Event, EventBus};
use tracing::{debug, warn};

use crate::table::PeerTable;
use crate::types::PeerState;

/// Ping one peer and update its state in `table` accordingly. When the
/// failure count crosses `HEARTBEAT_FAILURE_THRESHOLD` and `bus` is given,
/// announces `Event::PeerLost` (spec §4.6 scenario 6).
pub async fn heartbeat_once(table: &PeerTable, client: &NetworkClient, identity_hash: &str, bus: Option<&dyn EventBus>) {
    let Some(peer) = table.get(identity_hash) else { return };

    match client.ping(&peer.host, peer.port).await {
        Some(_) => {
            table.update(identity_hash, |p| {
                p.heartbeat_failures = 0;
                p.state = PeerState::Connected;
                p.last_seen = now_secs();
            });
            debug!(identity = identity_hash, "heartbeat ok");
        }
        None => {
            let mut went_stale = false;
            table.update(identity_hash, |p| {
                p.heartbeat_failures += 1;
                if p.heartbeat_failures >= HEARTBEAT_FAILURE_THRESHOLD && p.state != PeerState::Stale {
                    p.state = PeerState::Stale;
                    went_stale = true;
                }
            });
            if went_stale {
                if let Some(bus) = bus {
                    bus.emit(Event::PeerLost(identity_hash.to_string()));
                }
            }
            warn!(identity = identity_hash, "heartbeat failed");
        }
    }
}

fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock").as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use elara_core::NodeType;
    use crate::types::PeerInfo;

    #[tokio::test]
    async fn unreachable_peer_accumulates_failures_then_goes_stale() {
        let table = PeerTable::new();
        table.add_peer(PeerInfo::new("p1".into(), "127.0.0.1".into(), 1, NodeType::Leaf, now_secs()));
        let client = NetworkClient::new();

        heartbeat_once(&table, &client, "p1", None).await;
        assert_eq!(table.get("p1").unwrap().heartbeat_failures, 1);
        assert_eq!(table.get("p1").unwrap().state, PeerState::Discovered);

        heartbeat_once(&table, &client, "p1", None).await;
        assert_eq!(table.get("p1").unwrap().heartbeat_failures, 2);
        assert_eq!(table.get("p1").unwrap().state, PeerState::Stale);
    }

    #[tokio::test]
    async fn unknown_peer_is_a_no_op() {
        let table = PeerTable::new();
        let client = NetworkClient::new();
        heartbeat_once(&table, &client, "ghost", None).await;
        assert!(table.get("ghost").is_none());
    }

    #[tokio::test]
    async fn going_stale_emits_peer_lost_exactly_once() {
        use elara_core::InMemoryBus;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let table = PeerTable::new();
        table.add_peer(PeerInfo::new("p1".into(), "127.0.0.1".into(), 1, NodeType::Leaf, now_secs()));
        let client = NetworkClient::new();
        let bus = InMemoryBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        bus.subscribe(0, Box::new(move |event| {
            if matches!(event, Event::PeerLost(id) if id == "p1") {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        heartbeat_once(&table, &client, "p1", Some(&bus)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        heartbeat_once(&table, &client, "p1", Some(&bus)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        heartbeat_once(&table, &client, "p1", Some(&bus)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}

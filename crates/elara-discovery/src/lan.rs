//! LAN discovery capability (spec §4.6 REDESIGN FLAGS): a small trait with a
//! real `mdns-sd`-backed implementation and a no-op stand-in, rather than the
//! original's runtime `try: import zeroconf` probe.

use std::collections::HashMap;
use std::str::FromStr;

use elara_core::constants::MDNS_SERVICE_TYPE;
use elara_core::NodeType;
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use tracing::{info, warn};

use crate::types::PeerInfo;

/// Something that can advertise this node on the LAN and report peers
/// discovered there. `NullLan` satisfies the trait when mDNS is disabled or
/// unavailable, so callers never branch on whether LAN discovery is active.
pub trait LanDiscovery: Send {
    fn register(&mut self, identity_hash: &str, port: u16, node_type: NodeType) -> Result<(), String>;
    /// Non-blocking: drains whatever service events have arrived since the
    /// last poll and returns newly resolved/removed peers.
    fn poll(&mut self) -> Vec<LanEvent>;
    fn unregister(&mut self) -> Result<(), String>;
    /// Whether this implementation actually reaches the LAN. `NullLan`
    /// reports `false` so `/status` can tell operators discovery is
    /// bootstrap-only.
    fn is_enabled(&self) -> bool {
        true
    }
}

pub enum LanEvent {
    Resolved(PeerInfo),
    Removed { identity_hash: String },
}

pub struct MdnsLan {
    daemon: ServiceDaemon,
    fullname: Option<String>,
    receiver: Option<mdns_sd::Receiver<ServiceEvent>>,
    known_fullnames: HashMap<String, String>,
}

impl MdnsLan {
    pub fn new() -> Result<Self, String> {
        let daemon = ServiceDaemon::new().map_err(|e| e.to_string())?;
        Ok(Self { daemon, fullname: None, receiver: None, known_fullnames: HashMap::new() })
    }
}

impl LanDiscovery for MdnsLan {
    fn register(&mut self, identity_hash: &str, port: u16, node_type: NodeType) -> Result<(), String> {
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "elara-node".to_string());
        let instance_name = format!("elara-{}", &identity_hash[..identity_hash.len().min(8)]);
        let mut properties = HashMap::new();
        properties.insert("identity".to_string(), identity_hash.to_string());
        properties.insert("node_type".to_string(), node_type.to_string());

        let service = ServiceInfo::new(
            MDNS_SERVICE_TYPE,
            &instance_name,
            &format!("{hostname}.local."),
            "",
            port,
            properties,
        )
        .map_err(|e| e.to_string())?
        .enable_addr_auto();

        self.fullname = Some(service.get_fullname().to_string());
        self.daemon.register(service).map_err(|e| e.to_string())?;

        let receiver = self.daemon.browse(MDNS_SERVICE_TYPE).map_err(|e| e.to_string())?;
        self.receiver = Some(receiver);

        info!(port, "mDNS discovery started");
        Ok(())
    }

    fn poll(&mut self) -> Vec<LanEvent> {
        let mut events = Vec::new();
        let Some(receiver) = &self.receiver else { return events };

        while let Ok(event) = receiver.try_recv() {
            match event {
                ServiceEvent::ServiceResolved(info) => {
                    if let Some(identity) = info.get_property_val_str("identity") {
                        self.known_fullnames.insert(info.get_fullname().to_string(), identity.to_string());
                        let host = info
                            .get_addresses()
                            .iter()
                            .next()
                            .map(|addr| addr.to_string())
                            .unwrap_or_default();
                        let node_type = info
                            .get_property_val_str("node_type")
                            .and_then(|s| NodeType::from_str(s).ok())
                            .unwrap_or_default();
                        let peer = PeerInfo::new(identity.to_string(), host, info.get_port(), node_type, now_secs());
                        events.push(LanEvent::Resolved(peer));
                    }
                }
                ServiceEvent::ServiceRemoved(_ty, fullname) => {
                    if let Some(identity) = self.known_fullnames.remove(&fullname) {
                        events.push(LanEvent::Removed { identity_hash: identity });
                    }
                }
                _ => {}
            }
        }
        events
    }

    fn unregister(&mut self) -> Result<(), String> {
        if let Some(fullname) = self.fullname.take() {
            if let Err(e) = self.daemon.unregister(&fullname) {
                warn!(error = %e, "mDNS unregister failed");
            }
        }
        Ok(())
    }
}



fn now_secs() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock").as_secs() as i64
}

/// Used when mDNS is disabled or its daemon failed to start — discovery
/// then relies solely on seed/peers-file/remote bootstrap.
#[derive(Default)]
pub struct NullLan;

impl LanDiscovery for NullLan {
    fn register(&mut self, _identity_hash: &str, _port: u16, _node_type: NodeType) -> Result<(), String> {
        Ok(())
    }

    fn poll(&mut self) -> Vec<LanEvent> {
        Vec::new()
    }

    fn unregister(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

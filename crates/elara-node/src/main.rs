//! elara-node — the Layer-2 network node binary.
//!
//! Startup sequence:
//!   1. Load or generate the node identity
//!   2. Open the DAG and witness store
//!   3. Wire the L1 bridge onto the in-process event bus
//!   4. Resolve bootstrap peers and start LAN discovery
//!   5. Serve the HTTP boundary; run a heartbeat loop alongside it

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use elara_bridge::L1Bridge;
use elara_client::NetworkClient;
use elara_core::constants::{DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS};
use elara_core::{CryptoProfile, EntityType, Event, EventBus, InMemoryBus, NodeType};
use elara_crypto::Identity;
use elara_dag::LocalDAG;
use elara_discovery::{heartbeat_once, load_network_config, LanDiscovery, MdnsLan, NullLan, PeerDiscovery};
use elara_server::ratelimit::PeerRateLimiter;
use elara_server::{build_router, AppState};
use elara_witness::WitnessStore;

#[derive(Parser, Debug)]
#[command(name = "elara-node", version, about = "Elara Layer-2 network node")]
struct Args {
    /// Directory for identity, DAG, witness store and config files.
    #[arg(long, env = "ELARA_DATA_DIR", default_value = "~/.elara/data")]
    data_dir: PathBuf,

    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:0")]
    listen: SocketAddr,

    /// Role this node advertises (leaf|relay|witness). Overrides the
    /// config file's `node_type` when set.
    #[arg(long)]
    node_type: Option<String>,

    /// Disable LAN auto-discovery even if `mdns-sd` is available.
    #[arg(long)]
    no_lan: bool,

    /// Remote seed-list fallback URL, used only when no other peers resolve.
    #[arg(long)]
    remote_fallback_url: Option<String>,

    /// Seconds between heartbeat sweeps of the peer table.
    #[arg(long, default_value_t = 30)]
    heartbeat_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,elara=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("elara node starting");

    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    // ── Identity (loaded twice: the server and the bridge each hold their
    // own `Identity`, since secret key material isn't `Clone`) ────────────
    let identity_path = data_dir.join("identity.bin");
    if !identity_path.exists() {
        let fresh = Identity::generate(EntityType::Ai, CryptoProfile::ProfileA);
        fresh.save(&identity_path).context("saving freshly generated node identity")?;
        info!(identity = %fresh.identity_hash, "node identity generated");
    }
    let server_identity = Identity::load(&identity_path).context("loading node identity for HTTP state")?;
    let bridge_identity = Identity::load(&identity_path).context("loading node identity for bridge")?;
    info!(identity = %server_identity.identity_hash, "node identity ready");

    // ── DAG & witness store. Sled takes an exclusive file lock per path, so
    // the DAG is opened exactly once here; the server and bridge each hold
    // a cheap clone of the same `LocalDAG` handle (spec §3: "the bridge
    // borrows the DAG") ────────────────────────────────────────────────────
    let dag_path = data_dir.join("dag");
    let witness_path = data_dir.join("witness");
    let dag = LocalDAG::open(&dag_path).context("opening DAG store")?;
    let witness_store = WitnessStore::open(&witness_path).context("opening witness store")?;

    // ── Event bus + L1 bridge ────────────────────────────────────────────
    let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new());
    let bridge = Arc::new(
        L1Bridge::with_dag(bridge_identity, dag.clone(), bus.clone()).context("initializing L1 bridge")?,
    );
    L1Bridge::install(bridge.clone());

    // ── Network config + node type ───────────────────────────────────────
    let config_path = data_dir.join("elara-network.json");
    let mut config = load_network_config(&config_path);
    if let Some(node_type) = &args.node_type {
        config.node_type = node_type.clone();
    }
    let node_type: NodeType = config.node_type.parse().unwrap_or_default();

    // ── Rate limiter + shared HTTP state ─────────────────────────────────
    let rate_limiter = PeerRateLimiter::new(DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS as f64);

    let listener = tokio::net::TcpListener::bind(args.listen).await.context("binding HTTP listener")?;
    let bound_addr = listener.local_addr().context("reading bound address")?;

    let state = Arc::new(AppState {
        identity: server_identity,
        dag,
        witness_store,
        rate_limiter,
        port: bound_addr.port(),
        node_type,
    });

    // ── Peer discovery & bootstrap ───────────────────────────────────────
    let peers_file = data_dir.join("elara-peers.json");
    let lan: Box<dyn LanDiscovery> = if args.no_lan {
        Box::new(NullLan)
    } else {
        match MdnsLan::new() {
            Ok(lan) => Box::new(lan),
            Err(e) => {
                info!(error = %e, "LAN discovery unavailable, continuing with bootstrap peers only");
                Box::new(NullLan)
            }
        }
    };
    let mut discovery = PeerDiscovery::new(
        state.identity.identity_hash.to_hex(),
        bound_addr.port(),
        node_type,
        Some(peers_file),
        lan,
        Some(bus.clone()),
    );
    discovery.start(&config, args.remote_fallback_url.as_deref()).await;
    let discovery = Arc::new(tokio::sync::Mutex::new(discovery));

    bus.emit(Event::NetworkStarted);
    info!(addr = %bound_addr, node_type = %node_type, "node ready");

    // ── Heartbeat loop, alongside the HTTP server ────────────────────────
    let heartbeat_discovery = discovery.clone();
    let heartbeat_interval = Duration::from_secs(args.heartbeat_interval_secs.max(1));
    let self_identity_hash = state.identity.identity_hash.to_hex();
    let heartbeat_bus = bus.clone();
    let heartbeat_task = tokio::spawn(async move {
        let client = NetworkClient::new();
        loop {
            tokio::time::sleep(heartbeat_interval).await;
            let mut discovery = heartbeat_discovery.lock().await;
            discovery.poll_lan();
            let peers = discovery.table().peers();
            for peer in peers {
                if peer.identity_hash != self_identity_hash {
                    heartbeat_once(discovery.table(), &client, &peer.identity_hash, Some(heartbeat_bus.as_ref())).await;
                }
            }
        }
    });

    let router = build_router(state.clone());
    let server = axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>());

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                warn!(error = %e, "HTTP server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    heartbeat_task.abort();
    bus.emit(Event::NetworkStopped);
    discovery.lock().await.stop();
    bridge.close().context("closing bridge DAG handle")?;
    state.dag.close().context("closing DAG")?;
    state.witness_store.close().context("closing witness store")?;
    info!("elara node stopped");

    Ok(())
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}

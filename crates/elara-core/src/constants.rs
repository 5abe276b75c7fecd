//! ─── Elara Layer-2 protocol constants ───────────────────────────────────────

/// mDNS service type advertised by every node (spec §6).
pub const MDNS_SERVICE_TYPE: &str = "_elara._tcp.local.";

/// A peer with no fresh evidence for this many seconds is marked STALE.
pub const STALE_TIMEOUT_SECS: f64 = 120.0;

/// Consecutive heartbeat failures before a peer transitions to STALE.
pub const HEARTBEAT_FAILURE_THRESHOLD: u32 = 2;

/// Default client timeout for most RPCs.
pub const CLIENT_DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Timeout for `/ping` specifically — liveness checks stay cheap.
pub const CLIENT_PING_TIMEOUT_SECS: u64 = 1;
/// Timeout for the remote seed-list fallback fetch.
pub const REMOTE_FALLBACK_TIMEOUT_SECS: u64 = 5;

/// Default sliding-window rate limit: requests allowed per window.
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 60;
/// Default sliding-window size, in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Maximum entries retained in the completion-pattern log file.
pub const COMPLETION_LOG_CAP: usize = 50;

/// Default `/records` query page size when the caller omits `limit`.
pub const DEFAULT_RECORDS_QUERY_LIMIT: usize = 20;

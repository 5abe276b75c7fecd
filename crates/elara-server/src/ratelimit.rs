//! Per-peer sliding window rate limiter (spec §4.7), grounded in
//! `original_source/network/ratelimit.py`'s `PeerRateLimiter`. Lives as a
//! module here rather than a standalone crate — it has exactly one
//! consumer, the server's mutating endpoints.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use elara_core::constants::{DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS};

fn now_secs() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).expect("clock before epoch").as_secs_f64()
}

pub struct PeerRateLimiter {
    max_requests: u32,
    window_secs: f64,
    requests: Mutex<HashMap<String, Vec<f64>>>,
}

impl PeerRateLimiter {
    pub fn new(max_requests: u32, window_secs: f64) -> Self {
        Self { max_requests, window_secs, requests: Mutex::new(HashMap::new()) }
    }

    /// Returns `true` if `peer_ip` is under its request budget for the
    /// current window, recording this request if so.
    pub fn allow(&self, peer_ip: &str) -> bool {
        let now = now_secs();
        let cutoff = now - self.window_secs;
        let mut requests = self.requests.lock().expect("rate limiter mutex poisoned");
        let timestamps = requests.entry(peer_ip.to_string()).or_default();
        timestamps.retain(|t| *t > cutoff);

        if timestamps.len() as u32 >= self.max_requests {
            return false;
        }
        timestamps.push(now);
        true
    }

    pub fn reset(&self, peer_ip: Option<&str>) {
        let mut requests = self.requests.lock().expect("rate limiter mutex poisoned");
        match peer_ip {
            Some(ip) => {
                requests.remove(ip);
            }
            None => requests.clear(),
        }
    }
}

impl Default for PeerRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_requests_then_denies() {
        let limiter = PeerRateLimiter::new(3, 60.0);
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
    }

    #[test]
    fn peers_are_tracked_independently() {
        let limiter = PeerRateLimiter::new(1, 60.0);
        assert!(limiter.allow("a"));
        assert!(limiter.allow("b"));
        assert!(!limiter.allow("a"));
    }

    #[test]
    fn reset_clears_a_single_peer() {
        let limiter = PeerRateLimiter::new(1, 60.0);
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        limiter.reset(Some("a"));
        assert!(limiter.allow("a"));
    }
}

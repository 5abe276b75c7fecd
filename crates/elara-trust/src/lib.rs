//! Trust scoring — pure functions over attestation evidence (spec §4.5).
//! No I/O; both `simple` and `weighted` are total over their domain.

use std::collections::HashSet;

use elara_witness::WitnessAttestation;

/// Decay constant: `exp(-DECAY_RATE * age_days)`, ~23-day half-life.
const DECAY_RATE: f64 = 0.03;
const SECONDS_PER_DAY: f64 = 86_400.0;
/// Diversity bonus per unique witness-identity prefix beyond the first.
const DIVERSITY_BONUS_PER_UNIQUE: f64 = 0.20;
const SCORE_CAP: f64 = 0.999;

/// `T₁(n) = 1 − 1/(1+n)` for witness count `n`. Negative counts clamp to 0.
pub fn simple(witness_count: i64) -> f64 {
    if witness_count < 0 {
        return 0.0;
    }
    1.0 - 1.0 / (1.0 + witness_count as f64)
}

/// Weighted trust score: exponential time-decay per attestation plus a
/// diversity bonus for distinct witness-identity prefixes.
pub fn weighted(attestations: &[WitnessAttestation], now: i64) -> f64 {
    if attestations.is_empty() {
        return 0.0;
    }

    let mut total_weight = 0.0;
    let mut prefixes = HashSet::new();
    for attestation in attestations {
        let age_days = ((now - attestation.timestamp).max(0) as f64) / SECONDS_PER_DAY;
        total_weight += (-DECAY_RATE * age_days).exp();
        prefixes.insert(attestation.witness_identity_hash.short());
    }

    let diversity_bonus = if prefixes.len() > 1 {
        DIVERSITY_BONUS_PER_UNIQUE * (prefixes.len() - 1) as f64 / prefixes.len() as f64
    } else {
        0.0
    };

    let base = 1.0 - 1.0 / (1.0 + total_weight);
    (base + diversity_bonus).min(SCORE_CAP)
}

/// Human-readable trust level bucket.
pub fn level(score: f64) -> &'static str {
    if score < 0.1 {
        "unwitnessed"
    } else if score < 0.5 {
        "minimal"
    } else if score < 0.75 {
        "moderate"
    } else if score < 0.9 {
        "strong"
    } else {
        "very strong"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elara_core::IdentityHash;

    fn attestation(timestamp: i64, witness_byte: u8) -> WitnessAttestation {
        WitnessAttestation {
            record_id: [0u8; 32],
            witness_identity_hash: IdentityHash::from_bytes([witness_byte; 32]),
            witness_signature: vec![],
            timestamp,
        }
    }

    #[test]
    fn simple_matches_known_values() {
        assert_eq!(simple(0), 0.0);
        assert!((simple(1) - 0.5).abs() < 1e-9);
        assert!((simple(3) - 0.75).abs() < 1e-9);
        assert!((simple(10) - 0.9090909090909091).abs() < 1e-9);
    }

    #[test]
    fn simple_negative_clamps_to_zero() {
        assert_eq!(simple(-5), 0.0);
    }

    #[test]
    fn simple_is_monotone_non_decreasing() {
        let mut prev = simple(0);
        for n in 1..200 {
            let next = simple(n);
            assert!(next >= prev);
            prev = next;
        }
    }

    #[test]
    fn simple_stays_in_unit_interval() {
        for n in 0..1000 {
            let score = simple(n);
            assert!((0.0..1.0).contains(&score));
        }
    }

    #[test]
    fn weighted_empty_is_zero() {
        assert_eq!(weighted(&[], 0), 0.0);
    }

    #[test]
    fn weighted_diversity_bonus_requires_distinct_prefixes() {
        let now = 1_700_000_000;
        let diverse = vec![attestation(now, 0xaa), attestation(now, 0xcc)];
        let same_prefix = vec![attestation(now, 0xaa), attestation(now, 0xaa)];

        let diverse_score = weighted(&diverse, now);
        let same_prefix_score = weighted(&same_prefix, now);
        assert!(diverse_score > same_prefix_score);
    }

    #[test]
    fn weighted_monotone_non_decreasing_on_addition() {
        let now = 1_700_000_000;
        let base = vec![attestation(now, 0xaa)];
        let mut with_more = base.clone();
        with_more.push(attestation(now, 0xbb));

        assert!(weighted(&with_more, now) >= weighted(&base, now));
    }

    #[test]
    fn weighted_never_reaches_one() {
        let now = 1_700_000_000;
        let many: Vec<_> = (0..255u8).map(|b| attestation(now, b)).collect();
        assert!(weighted(&many, now) < 1.0);
    }

    #[test]
    fn level_buckets_match_thresholds() {
        assert_eq!(level(0.0), "unwitnessed");
        assert_eq!(level(0.09), "unwitnessed");
        assert_eq!(level(0.1), "minimal");
        assert_eq!(level(0.5), "moderate");
        assert_eq!(level(0.75), "strong");
        assert_eq!(level(0.9), "very strong");
    }

    #[test]
    fn scenario_two_one_witness_is_moderate() {
        let score = simple(1);
        assert!((score - 0.5).abs() < 1e-6);
        assert_eq!(level(score), "moderate");
    }

    #[test]
    fn scenario_four_three_witnesses_is_strong() {
        let score = simple(3);
        assert!((score - 0.75).abs() < 1e-6);
        assert_eq!(level(score), "strong");
    }
}

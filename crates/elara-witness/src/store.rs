use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use elara_core::ElaraError;
use tracing::debug;

use crate::attestation::WitnessAttestation;

/// Summary counts returned by `WitnessStore::stats()`.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct WitnessStats {
    pub records_witnessed: u64,
    pub total_attestations: u64,
}

enum Backend {
    Sled(sled::Tree, sled::Db),
    Memory(Mutex<HashMap<[u8; 32], Vec<WitnessAttestation>>>),
}

/// Durable registry of counter-signatures (spec §4.3). Dedup by
/// `(record_id, witness_identity_hash)` is enforced here, not by the caller.
/// Backed by sled when a path is given, otherwise an in-memory map.
pub struct WitnessStore {
    backend: Backend,
}

impl WitnessStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ElaraError> {
        let db = sled::open(path)?;
        let tree = db.open_tree("attestations")?;
        Ok(Self {
            backend: Backend::Sled(tree, db),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Mutex::new(HashMap::new())),
        }
    }

    fn sled_key(record_id: &[u8; 32], witness: &elara_core::IdentityHash) -> Vec<u8> {
        let mut key = record_id.to_vec();
        key.extend_from_slice(witness.as_bytes());
        key
    }

    pub fn add_attestation(&self, attestation: WitnessAttestation) -> Result<(), ElaraError> {
        match &self.backend {
            Backend::Sled(tree, _) => {
                let key = Self::sled_key(&attestation.record_id, &attestation.witness_identity_hash);
                if tree.contains_key(&key)? {
                    return Ok(());
                }
                let bytes = bincode::serialize(&attestation)?;
                tree.insert(key, bytes)?;
            }
            Backend::Memory(map) => {
                let mut map = map.lock().expect("witness store mutex poisoned");
                let entries = map.entry(attestation.record_id).or_default();
                if !entries
                    .iter()
                    .any(|a| a.witness_identity_hash == attestation.witness_identity_hash)
                {
                    entries.push(attestation.clone());
                }
            }
        }
        debug!(record_id = %hex::encode(attestation.record_id), witness = %attestation.witness_identity_hash.short(), "attestation stored");
        Ok(())
    }

    pub fn get_attestations(&self, record_id: &[u8; 32]) -> Result<Vec<WitnessAttestation>, ElaraError> {
        match &self.backend {
            Backend::Sled(tree, _) => {
                let mut out = Vec::new();
                for item in tree.scan_prefix(record_id) {
                    let (_, bytes) = item?;
                    out.push(bincode::deserialize(&bytes)?);
                }
                Ok(out)
            }
            Backend::Memory(map) => {
                let map = map.lock().expect("witness store mutex poisoned");
                Ok(map.get(record_id).cloned().unwrap_or_default())
            }
        }
    }

    pub fn witness_count(&self, record_id: &[u8; 32]) -> Result<usize, ElaraError> {
        Ok(self.get_attestations(record_id)?.len())
    }

    pub fn stats(&self) -> Result<WitnessStats, ElaraError> {
        match &self.backend {
            Backend::Sled(tree, _) => {
                let mut records = HashSet::new();
                let mut total = 0u64;
                for item in tree.iter() {
                    let (key, _) = item?;
                    let mut record_id = [0u8; 32];
                    record_id.copy_from_slice(&key[..32]);
                    records.insert(record_id);
                    total += 1;
                }
                Ok(WitnessStats {
                    records_witnessed: records.len() as u64,
                    total_attestations: total,
                })
            }
            Backend::Memory(map) => {
                let map = map.lock().expect("witness store mutex poisoned");
                let total: usize = map.values().map(|v| v.len()).sum();
                Ok(WitnessStats {
                    records_witnessed: map.len() as u64,
                    total_attestations: total as u64,
                })
            }
        }
    }

    pub fn close(&self) -> Result<(), ElaraError> {
        if let Backend::Sled(_, db) = &self.backend {
            db.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elara_core::IdentityHash;

    fn attestation(record_id: [u8; 32], witness: u8) -> WitnessAttestation {
        WitnessAttestation {
            record_id,
            witness_identity_hash: IdentityHash::from_bytes([witness; 32]),
            witness_signature: vec![1, 2, 3],
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn dedup_by_record_and_witness_in_memory() {
        let store = WitnessStore::in_memory();
        let record_id = [7u8; 32];
        store.add_attestation(attestation(record_id, 1)).unwrap();
        store.add_attestation(attestation(record_id, 1)).unwrap();
        assert_eq!(store.witness_count(&record_id).unwrap(), 1);
    }

    #[test]
    fn distinct_witnesses_both_kept() {
        let store = WitnessStore::in_memory();
        let record_id = [7u8; 32];
        store.add_attestation(attestation(record_id, 1)).unwrap();
        store.add_attestation(attestation(record_id, 2)).unwrap();
        assert_eq!(store.witness_count(&record_id).unwrap(), 2);
    }

    #[test]
    fn sled_backend_persists_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let store = WitnessStore::open(dir.path()).unwrap();
        let record_id = [9u8; 32];
        store.add_attestation(attestation(record_id, 1)).unwrap();
        store.add_attestation(attestation(record_id, 1)).unwrap();
        store.add_attestation(attestation(record_id, 2)).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.records_witnessed, 1);
        assert_eq!(stats.total_attestations, 2);
    }

    #[test]
    fn unknown_record_returns_empty() {
        let store = WitnessStore::in_memory();
        assert!(store.get_attestations(&[0u8; 32]).unwrap().is_empty());
    }
}

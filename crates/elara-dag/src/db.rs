use std::path::Path;

use elara_core::ElaraError;
use elara_crypto::{hash, identity};
use tracing::info;

use crate::record::{RecordId, ValidationRecord};

/// Counts returned by `LocalDAG::stats()`.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DagStats {
    pub record_count: u64,
    pub tip_count: u64,
}

/// Durable, content-addressed store of `ValidationRecord`s with incremental
/// tip tracking (spec §3/§4.2). Sled-backed, tree-per-concern, mirroring the
/// teacher's `StateDb` layout. Cheaply `Clone`— `sled::Db`/`sled::Tree` are
/// themselves handles onto shared state, so a clone is another handle onto
/// the same on-disk store, not a second store.
#[derive(Clone)]
pub struct LocalDAG {
    db: sled::Db,
    records: sled::Tree,
    tips: sled::Tree,
}

impl LocalDAG {
    /// Open or create the DAG store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ElaraError> {
        let db = sled::open(path)?;
        let records = db.open_tree("records")?;
        let tips = db.open_tree("tips")?;
        Ok(Self { db, records, tips })
    }

    /// Insert `record`. Recomputes `id` from `signable_bytes()` and rejects
    /// mismatches; when `verify_signature` is set, also verifies the
    /// signature(s) against `creator_public_key`. Duplicate ids are
    /// idempotent — no error, no double-write.
    pub fn insert(&self, record: &ValidationRecord, verify_signature: bool) -> Result<(), ElaraError> {
        let expected_id = hash::record_id_from_bytes(&record.signable_bytes());
        if expected_id != record.id {
            return Err(ElaraError::MalformedRecord(
                "record id does not match signable_bytes()".into(),
            ));
        }

        if verify_signature {
            let signable = record.signable_bytes();
            identity::verify_primary(&record.creator_public_key, &signable, &record.signature)
                .map_err(|_| ElaraError::InvalidSignature)?;
            if let Some(secondary_sig) = &record.secondary_signature {
                let secondary_key = record
                    .creator_secondary_public_key
                    .as_ref()
                    .ok_or(ElaraError::InvalidSignature)?;
                identity::verify_secondary(secondary_key, &signable, secondary_sig)
                    .map_err(|_| ElaraError::InvalidSignature)?;
            }
        }

        if self.records.contains_key(record.id)? {
            return Ok(());
        }

        let bytes = bincode::serialize(record)?;
        self.records.insert(record.id, bytes)?;

        for parent in &record.parents {
            self.tips.remove(parent)?;
        }
        self.tips.insert(record.id, b"".as_ref())?;

        info!(record_id = %hex::encode(record.id), "record inserted");
        Ok(())
    }

    pub fn get(&self, id: &RecordId) -> Result<Option<ValidationRecord>, ElaraError> {
        match self.records.get(id)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Records authored by `creator_public_key`, newest-first, capped at `limit`.
    pub fn query(
        &self,
        creator_public_key: Option<&[u8]>,
        limit: usize,
    ) -> Result<Vec<ValidationRecord>, ElaraError> {
        self.query_since(creator_public_key, 0, limit)
    }

    /// As `query`, but additionally filters to records with `timestamp >= since`.
    /// Results are sorted newest-first by `timestamp` before truncating to
    /// `limit` — sled's key order is by `RecordId` (a content hash), which
    /// carries no relation to recency.
    pub fn query_since(
        &self,
        creator_public_key: Option<&[u8]>,
        since: i64,
        limit: usize,
    ) -> Result<Vec<ValidationRecord>, ElaraError> {
        let mut matched = Vec::new();
        for item in self.records.iter() {
            let (_, bytes) = item?;
            let record: ValidationRecord = bincode::deserialize(&bytes)?;
            if let Some(key) = creator_public_key {
                if record.creator_public_key != key {
                    continue;
                }
            }
            if record.timestamp < since {
                continue;
            }
            matched.push(record);
        }
        matched.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
        matched.truncate(limit);
        Ok(matched)
    }

    pub fn tips(&self) -> Result<Vec<RecordId>, ElaraError> {
        let mut out = Vec::new();
        for item in self.tips.iter() {
            let (key, _) = item?;
            let mut id = [0u8; 32];
            id.copy_from_slice(&key);
            out.push(id);
        }
        Ok(out)
    }

    pub fn stats(&self) -> DagStats {
        DagStats {
            record_count: self.records.len() as u64,
            tip_count: self.tips.len() as u64,
        }
    }

    pub fn close(&self) -> Result<(), ElaraError> {
        self.db.flush()?;
        info!("dag closed");
        Ok(())
    }
}

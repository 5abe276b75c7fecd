use std::collections::BTreeMap;

use elara_core::{Classification, ElaraError};
use serde::{Deserialize, Serialize};

/// Content-addressed id of a `ValidationRecord`: BLAKE3 of `signable_bytes()`.
pub type RecordId = [u8; 32];

/// Bincode can't deserialize `serde_json::Value` directly — it relies on
/// `deserialize_any`, which non-self-describing formats don't implement. We
/// carry metadata as a JSON string on the wire instead, keeping the typed
/// `BTreeMap<String, Value>` as the in-memory representation everywhere else.
mod json_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        map: &&BTreeMap<String, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let json = serde_json::to_string(*map).map_err(serde::ser::Error::custom)?;
        json.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Value>, D::Error> {
        let json = String::deserialize(deserializer)?;
        serde_json::from_str(&json).map_err(serde::de::Error::custom)
    }
}

/// As `json_map`, but for the owned field on `ValidationRecord` itself
/// rather than the borrowed one in `SignablePayload`.
mod json_map_owned {
    use std::collections::BTreeMap;

    use serde::{Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<String, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        super::json_map::serialize(&map, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Value>, D::Error> {
        super::json_map::deserialize(deserializer)
    }
}

/// Everything that goes into `signable_bytes()` — every field of
/// `ValidationRecord` except the signature slots (spec §3).
#[derive(Serialize)]
struct SignablePayload<'a> {
    content: &'a [u8],
    creator_public_key: &'a [u8],
    creator_secondary_public_key: &'a Option<Vec<u8>>,
    parents: &'a [RecordId],
    classification: Classification,
    #[serde(with = "json_map")]
    metadata: &'a BTreeMap<String, serde_json::Value>,
    timestamp: i64,
}

/// An immutable, signed, content-addressed record (spec §3). Once inserted
/// into a `LocalDAG`, never modified.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub id: RecordId,
    pub content: Vec<u8>,
    pub creator_public_key: Vec<u8>,
    /// Creator's secondary (SPHINCS+) public key, present under Profile A —
    /// needed to verify `secondary_signature` independently of the primary key.
    pub creator_secondary_public_key: Option<Vec<u8>>,
    pub parents: Vec<RecordId>,
    pub classification: Classification,
    #[serde(with = "json_map_owned")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub timestamp: i64,
    pub signature: Vec<u8>,
    pub secondary_signature: Option<Vec<u8>>,
}

impl ValidationRecord {
    /// Produce an unsigned record. Call `signable_bytes()` on the result,
    /// sign it, then fill in `signature`/`secondary_signature` and `id`.
    pub fn create(
        content: Vec<u8>,
        creator_public_key: Vec<u8>,
        parents: Vec<RecordId>,
        classification: Classification,
        metadata: BTreeMap<String, serde_json::Value>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: [0u8; 32],
            content,
            creator_public_key,
            creator_secondary_public_key: None,
            parents,
            classification,
            metadata,
            timestamp,
            signature: Vec::new(),
            secondary_signature: None,
        }
    }

    /// Deterministic byte serialization of every field except the signature
    /// slots. `id` must equal `hash(signable_bytes())`.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let payload = SignablePayload {
            content: &self.content,
            creator_public_key: &self.creator_public_key,
            creator_secondary_public_key: &self.creator_secondary_public_key,
            parents: &self.parents,
            classification: self.classification,
            metadata: &self.metadata,
            timestamp: self.timestamp,
        };
        bincode::serialize(&payload).expect("signable payload serialization is infallible")
    }

    /// Finalize `id` from the current `signable_bytes()`. Call after the
    /// content/parents/classification/metadata/timestamp are all set but
    /// before signing, and again is a no-op since signing doesn't change
    /// signable bytes.
    pub fn finalize_id(&mut self) {
        self.id = elara_crypto::hash::record_id_from_bytes(&self.signable_bytes());
    }

    /// Wire format: whole record via bincode, including signatures.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("record serialization is infallible")
    }

    /// Reconstruct an exact-equal record from `to_bytes()` output.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ElaraError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elara_core::EntityType;
    use elara_crypto::Identity;

    fn sign_record(identity: &Identity, mut record: ValidationRecord) -> ValidationRecord {
        record.finalize_id();
        let bytes = record.signable_bytes();
        record.signature = identity.sign(&bytes);
        record
    }

    #[test]
    fn to_bytes_from_bytes_round_trip() {
        let identity = Identity::generate(EntityType::Ai, elara_core::CryptoProfile::Single);
        let record = ValidationRecord::create(
            b"hello".to_vec(),
            identity.primary_public_key.clone(),
            vec![],
            Classification::Sovereign,
            BTreeMap::new(),
            1_700_000_000,
        );
        let record = sign_record(&identity, record);

        let bytes = record.to_bytes();
        let decoded = ValidationRecord::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.id, record.id);
        assert_eq!(decoded.content, record.content);
        assert_eq!(decoded.signature, record.signature);
    }

    #[test]
    fn id_is_a_function_of_signable_bytes_only() {
        let identity = Identity::generate(EntityType::Ai, elara_core::CryptoProfile::Single);
        let mut record = ValidationRecord::create(
            b"hello".to_vec(),
            identity.primary_public_key.clone(),
            vec![],
            Classification::Sovereign,
            BTreeMap::new(),
            1_700_000_000,
        );
        record.finalize_id();
        let id_before_sign = record.id;
        let bytes = record.signable_bytes();
        record.signature = identity.sign(&bytes);
        assert_eq!(record.id, id_before_sign);
    }
}

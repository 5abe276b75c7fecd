use elara_core::IdentityHash;
use serde::{Deserialize, Serialize};

/// A counter-signature by a second identity over a record's signable bytes
/// (spec §3). At most one is stored per `(record_id, witness_identity_hash)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WitnessAttestation {
    pub record_id: [u8; 32],
    pub witness_identity_hash: IdentityHash,
    pub witness_signature: Vec<u8>,
    pub timestamp: i64,
}

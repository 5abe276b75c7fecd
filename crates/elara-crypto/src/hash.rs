use elara_core::IdentityHash;

/// BLAKE3 hash of arbitrary bytes.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive an identity hash from concatenated public key material.
pub fn identity_hash_from_pubkeys(primary: &[u8], secondary: Option<&[u8]>) -> IdentityHash {
    let mut buf = Vec::with_capacity(primary.len() + secondary.map_or(0, |s| s.len()));
    buf.extend_from_slice(primary);
    if let Some(s) = secondary {
        buf.extend_from_slice(s);
    }
    IdentityHash::from_bytes(blake3_hash(&buf))
}

/// Hash used for `ValidationRecord::id` — BLAKE3 over `signable_bytes()`.
pub fn record_id_from_bytes(signable: &[u8]) -> [u8; 32] {
    blake3_hash(signable)
}

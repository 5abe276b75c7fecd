use pqcrypto_sphincsplus::sphincssha2128ssimple as sphincs;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};

use crate::error::SignatureError;

/// Secondary signature algorithm used under `CryptoProfile::ProfileA`
/// (spec §3). SPHINCS+ is hash-based, giving dual-signing a second
/// signature family with an entirely different failure mode than Dilithium.
pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let sk = sphincs::SecretKey::from_bytes(secret_key_bytes)
        .map_err(|_| SignatureError::InvalidSignature)?;
    let sig = sphincs::detached_sign(message, &sk);
    Ok(sig.as_bytes().to_vec())
}

pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
    let pk = sphincs::PublicKey::from_bytes(public_key).map_err(|_| {
        SignatureError::InvalidPublicKeyLength {
            expected: sphincs::public_key_bytes(),
            got: public_key.len(),
        }
    })?;
    let sig = sphincs::DetachedSignature::from_bytes(signature)
        .map_err(|_| SignatureError::InvalidSignature)?;
    sphincs::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| SignatureError::InvalidSignature)
}

pub fn generate() -> (Vec<u8>, Vec<u8>) {
    let (pk, sk) = sphincs::keypair();
    (pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_round_trip() {
        let (pk, sk) = generate();
        let message = b"elara secondary signature";
        let sig = sign(&sk, message).unwrap();
        assert!(verify(&pk, message, &sig).is_ok());
    }
}

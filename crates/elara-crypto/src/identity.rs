use std::fs;
use std::path::Path;

use elara_core::{CryptoProfile, ElaraError, EntityType, IdentityHash};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SignatureError;
use crate::hash::identity_hash_from_pubkeys;
use crate::{dilithium, sphincs};

/// An identity on the network: a primary Dilithium3 keypair, and — under
/// `CryptoProfile::ProfileA` — a secondary SPHINCS+ keypair signing the same
/// bytes (spec §3). Persisted whole via bincode; never rotated once loaded.
#[derive(Serialize, Deserialize)]
pub struct Identity {
    pub identity_hash: IdentityHash,
    pub entity_type: EntityType,
    pub profile: CryptoProfile,
    pub primary_public_key: Vec<u8>,
    primary_secret_key: Vec<u8>,
    pub secondary_public_key: Option<Vec<u8>>,
    secondary_secret_key: Option<Vec<u8>>,
}

impl Identity {
    /// Generate a fresh identity. `profile` selects whether a SPHINCS+
    /// secondary keypair is also generated.
    pub fn generate(entity_type: EntityType, profile: CryptoProfile) -> Self {
        let (primary_pk, primary_sk) = dilithium::generate();
        let (secondary_pk, secondary_sk) = match profile {
            CryptoProfile::ProfileA => {
                let (pk, sk) = sphincs::generate();
                (Some(pk), Some(sk))
            }
            CryptoProfile::Single => (None, None),
        };
        let identity_hash =
            identity_hash_from_pubkeys(&primary_pk, secondary_pk.as_deref());

        info!(identity = %identity_hash, ?entity_type, "identity generated");
        Self {
            identity_hash,
            entity_type,
            profile,
            primary_public_key: primary_pk,
            primary_secret_key: primary_sk,
            secondary_public_key: secondary_pk,
            secondary_secret_key: secondary_sk,
        }
    }

    /// Load an identity from a bincode file written by `save`.
    pub fn load(path: &Path) -> Result<Self, ElaraError> {
        let bytes = fs::read(path)
            .map_err(|e| ElaraError::Storage(format!("reading identity file: {e}")))?;
        let identity: Self = bincode::deserialize(&bytes)?;
        info!(identity = %identity.identity_hash, "identity loaded");
        Ok(identity)
    }

    /// Persist this identity to `path` with owner-only permissions on unix.
    pub fn save(&self, path: &Path) -> Result<(), ElaraError> {
        let bytes = bincode::serialize(self)?;
        fs::write(path, &bytes)
            .map_err(|e| ElaraError::Storage(format!("writing identity file: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms)
                .map_err(|e| ElaraError::Storage(format!("setting identity file mode: {e}")))?;
        }
        Ok(())
    }

    /// Sign `message` with the primary Dilithium3 key.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        dilithium::sign(&self.primary_secret_key, message)
            .expect("sign with a freshly-generated secret key is infallible")
    }

    /// Sign `message` with the secondary SPHINCS+ key, if present.
    pub fn sign_secondary(&self, message: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let sk = self
            .secondary_secret_key
            .as_ref()
            .ok_or(SignatureError::NoSecondaryKey)?;
        sphincs::sign(sk, message)
    }
}

impl Drop for Identity {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.primary_secret_key.zeroize();
        if let Some(sk) = self.secondary_secret_key.as_mut() {
            sk.zeroize();
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Identity {{ identity_hash: {:?}, entity_type: {:?}, profile: {:?} }}",
            self.identity_hash, self.entity_type, self.profile
        )
    }
}

/// Verify a primary Dilithium3 signature against a public key.
pub fn verify_primary(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    dilithium::verify(public_key, message, signature)
}

/// Verify a secondary SPHINCS+ signature against a public key.
pub fn verify_secondary(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    sphincs::verify(public_key, message, signature)
}

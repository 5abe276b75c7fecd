use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte content hash: BLAKE3 over the identity's concatenated public key
/// material, or over a record's `signable_bytes()`. Shared by identity and
/// record ids so the rest of the workspace speaks one hash type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityHash(pub [u8; 32]);

impl IdentityHash {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// First 8 hex characters — used for log lines and witness-diversity
    /// bucketing (spec §4.5 groups attestations by this prefix).
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityHash({}…)", self.short())
    }
}

/// Kind of entity an identity represents (spec §3 `entity_type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Ai,
    Human,
    Service,
    System,
}

/// Which signature algorithm set an identity signs with (spec §3 `profile`).
///
/// `ProfileA` means dual signing: the primary Dilithium3 signature plus a
/// secondary SPHINCS+ signature over the same signable bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CryptoProfile {
    Single,
    ProfileA,
}

/// Visibility scope of a `ValidationRecord` (spec §3 `classification`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// Never leaves origin.
    Sovereign,
    /// Requires explicit consent to share.
    Restricted,
    /// Visible to authorized peers.
    Shared,
    /// Visible to anyone.
    Public,
}

/// Role a peer plays on the network (spec §3 `node_type`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Leaf,
    Relay,
    Witness,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeType::Leaf => "leaf",
            NodeType::Relay => "relay",
            NodeType::Witness => "witness",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leaf" => Ok(NodeType::Leaf),
            "relay" => Ok(NodeType::Relay),
            "witness" => Ok(NodeType::Witness),
            other => Err(format!("unknown node_type: {other}")),
        }
    }
}

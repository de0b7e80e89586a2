//! Human-readable node identifiers.
//!
//! Nodes are keyed by their raw public key; the identifier shown to the
//! operator is derived from it by a [`NodeIdEncoder`]. Encoding can fail, in
//! which case [`display_id`] falls back to a truncated hex string.

use std::fmt::Debug;

use thiserror::Error;

use crate::wire::NodeKey;

/// Version byte prefixed to node public keys before base58check encoding.
pub const NODE_PUBLIC_VERSION: u8 = 0x1C;

/// Number of key bytes shown in the hex fallback.
const FALLBACK_BYTES: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The key does not start with a known key-type prefix.
    #[error("unrecognized public key prefix {0:#04x}")]
    UnknownKeyType(u8),
}

/// Re-encodes a raw public key into the ledger's node identifier format.
pub trait NodeIdEncoder: Send + Debug {
    fn encode(&self, key: &NodeKey) -> Result<String, IdentityError>;
}

/// Base58check with the ledger's alphabet, producing `n...` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base58NodeEncoder;

impl NodeIdEncoder for Base58NodeEncoder {
    fn encode(&self, key: &NodeKey) -> Result<String, IdentityError> {
        // secp256k1 compressed keys start with 0x02/0x03, ed25519 with 0xED.
        match key.as_bytes()[0] {
            0x02 | 0x03 | 0xED => {}
            other => return Err(IdentityError::UnknownKeyType(other)),
        }
        Ok(bs58::encode(key.as_bytes())
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .with_check_version(NODE_PUBLIC_VERSION)
            .into_string())
    }
}

/// Identifier to show for `key`: the encoded form, or a truncated hex
/// fallback if encoding fails.
pub fn display_id(encoder: &dyn NodeIdEncoder, key: &NodeKey) -> String {
    encoder.encode(key).unwrap_or_else(|err| {
        tracing::debug!(%err, "node identifier encoding failed, using hex");
        fallback_id(key)
    })
}

/// Truncated hex form of a key, e.g. `02abcdef01234567…`.
pub fn fallback_id(key: &NodeKey) -> String {
    format!("{}…", hex::encode(&key.as_bytes()[..FALLBACK_BYTES]))
}

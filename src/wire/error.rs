//! Error types for datagram decoding.

use thiserror::Error;

use super::layout::LayoutVersion;

/// Reasons a datagram is rejected outright.
///
/// Truncation is deliberately absent: a short datagram still decodes to a
/// partial packet.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The leading magic word did not match.
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },

    /// The protocol version is not one the layout accepts.
    #[error("protocol version {version} not accepted by {layout} layout")]
    UnsupportedVersion { version: u32, layout: LayoutVersion },
}

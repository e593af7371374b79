//! Error taxonomy for hierarchical key derivation.
//!
//! One enum, one `thiserror` derive: free-form `String` payloads where the
//! detail can't be known ahead of time, structured fields where it can.

use thiserror::Error;

/// Result type used throughout this crate.
pub type KeytreeResult<T> = Result<T, KeytreeError>;

/// Errors that can occur during key derivation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeytreeError {
    /// Segment grammar violations, depth overrun, scheme mixing.
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// Missing parent key, unsupported unhardened derivation, empty path, etc.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Root generation produced an unusable secp256k1 key.
    #[error("invalid master key: {0}")]
    InvalidMasterKey(String),

    /// Byte-length or range violation on a private key.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Byte-length or range violation on a public key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Byte-length violation on a chain code.
    #[error("invalid chain code: {0}")]
    InvalidChainCode(String),

    /// A tweak/scalar failed a range check.
    #[error("invalid tweak: {0}")]
    InvalidTweak(String),

    /// Serialized extended-key validation failure (checksum, version, structure).
    #[error("invalid extended key: {0}")]
    InvalidExtendedKey(String),

    /// Operation requested on a curve that does not support it.
    #[error("{operation} is not supported on curve {curve}")]
    UnsupportedCurve {
        curve: &'static str,
        operation: &'static str,
    },

    /// Depth/index/fingerprint invariant violation on a constructed node.
    #[error("invalid node invariant: {0}")]
    InvalidNodeInvariant(String),
}

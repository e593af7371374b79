//! Secret byte buffers that are wiped on drop.
//!
//! Nodes hold private-key material in [`SecretBytes`] instead of a bare
//! `Vec<u8>` so that dropping a [`crate::node::Node`] (or any intermediate
//! HMAC extension buffer built from one) does not leave key material sitting
//! in freed memory. `Debug` never prints the contents.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A heap-owned, zeroize-on-drop byte buffer holding secret key material.
///
/// Length varies by curve: 32 bytes for secp256k1/ed25519, 64 bytes for
/// ed25519Bip32 (`kL || kR`).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.clone()
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes({} bytes, redacted)", self.0.len())
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        // Not a secret-bearing comparison path (used only in tests/property
        // checks where both sides are already known), so no constant-time
        // requirement here.
        self.0 == other.0
    }
}

impl Eq for SecretBytes {}

impl From<Vec<u8>> for SecretBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for SecretBytes {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

//! Curve abstraction.
//!
//! Derivation is monomorphized over a small closed set of curves rather than
//! dispatched through a `dyn` trait object in the hot path.
//! [`Curve`] is the tag that flows through [`crate::node::Node`]; the free
//! functions in the curve-specific submodules do the actual arithmetic.

mod ed25519;
mod ed25519_bip32;
mod secp256k1;

use crate::error::KeytreeResult;

/// Which master-key generation protocol a curve uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterNodeSpec {
    Slip10,
    Cip3Icarus,
}

/// The three curves this crate derives keys over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Curve {
    Secp256k1,
    Ed25519,
    Ed25519Bip32,
}

impl Curve {
    pub fn name(&self) -> &'static str {
        match self {
            Curve::Secp256k1 => "secp256k1",
            Curve::Ed25519 => "ed25519",
            Curve::Ed25519Bip32 => "ed25519Bip32",
        }
    }

    /// HMAC key used when hashing the seed to produce the master node.
    pub fn master_secret_salt(&self) -> &'static [u8] {
        match self {
            Curve::Secp256k1 => b"Bitcoin seed",
            Curve::Ed25519 => b"ed25519 seed",
            // CIP-3 does not use an HMAC salt for its master step (§4.4
            // `cip3Icarus` stretches entropy with PBKDF2 directly), but the
            // field exists for interface uniformity with the other curves.
            Curve::Ed25519Bip32 => b"",
        }
    }

    pub fn private_key_length(&self) -> usize {
        match self {
            Curve::Secp256k1 | Curve::Ed25519 => 32,
            Curve::Ed25519Bip32 => 64,
        }
    }

    pub fn public_key_length(&self) -> usize {
        match self {
            Curve::Secp256k1 => 65,
            Curve::Ed25519 => 33,
            Curve::Ed25519Bip32 => 32,
        }
    }

    pub fn compressed_public_key_length(&self) -> usize {
        match self {
            Curve::Secp256k1 => 33,
            Curve::Ed25519 => 33,
            Curve::Ed25519Bip32 => 32,
        }
    }

    pub fn master_node_spec(&self) -> MasterNodeSpec {
        match self {
            Curve::Secp256k1 | Curve::Ed25519 => MasterNodeSpec::Slip10,
            Curve::Ed25519Bip32 => MasterNodeSpec::Cip3Icarus,
        }
    }

    /// Whether unhardened (normal) child derivation is supported at all.
    pub fn derive_unhardened_keys(&self) -> bool {
        match self {
            Curve::Secp256k1 => true,
            Curve::Ed25519 => false,
            Curve::Ed25519Bip32 => true,
        }
    }

    /// secp256k1/ed25519Bip32 group order, big-endian, for range checks.
    /// ed25519 (SLIP-10) has no notion of an out-of-range scalar (any 32
    /// bytes is a valid private key), so this is only consulted for the
    /// other two curves.
    pub fn curve_order(&self) -> [u8; 32] {
        match self {
            Curve::Secp256k1 => secp256k1::CURVE_ORDER,
            Curve::Ed25519 => [0u8; 32],
            Curve::Ed25519Bip32 => ed25519_bip32::CURVE_ORDER,
        }
    }

    /// Uncompressed public key for a private key, in this curve's native
    /// representation.
    pub fn get_public_key(&self, private_key: &[u8]) -> KeytreeResult<Vec<u8>> {
        match self {
            Curve::Secp256k1 => secp256k1::get_public_key(private_key),
            Curve::Ed25519 => ed25519::get_public_key(private_key),
            Curve::Ed25519Bip32 => ed25519_bip32::get_public_key(private_key),
        }
    }

    pub fn compress_public_key(&self, public_key: &[u8]) -> KeytreeResult<Vec<u8>> {
        match self {
            Curve::Secp256k1 => secp256k1::compress_public_key(public_key),
            Curve::Ed25519 => ed25519::compress_public_key(public_key),
            Curve::Ed25519Bip32 => ed25519_bip32::compress_public_key(public_key),
        }
    }

    pub fn decompress_public_key(&self, compressed: &[u8]) -> KeytreeResult<Vec<u8>> {
        match self {
            Curve::Secp256k1 => secp256k1::decompress_public_key(compressed),
            Curve::Ed25519 => ed25519::decompress_public_key(compressed),
            Curve::Ed25519Bip32 => ed25519_bip32::decompress_public_key(compressed),
        }
    }

    /// `public + tweak*G`. Fails with `UnsupportedCurve` for ed25519 (SLIP-10
    /// forbids public derivation on ed25519).
    pub fn public_add(&self, public_key: &[u8], tweak: &[u8]) -> KeytreeResult<Vec<u8>> {
        match self {
            Curve::Secp256k1 => secp256k1::public_add(public_key, tweak),
            Curve::Ed25519 => ed25519::public_add(public_key, tweak),
            Curve::Ed25519Bip32 => ed25519_bip32::public_add(public_key, tweak),
        }
    }

    pub fn is_valid_private_key(&self, private_key: &[u8]) -> bool {
        match self {
            Curve::Secp256k1 => secp256k1::is_valid_private_key(private_key),
            Curve::Ed25519 => ed25519::is_valid_private_key(private_key),
            Curve::Ed25519Bip32 => ed25519_bip32::is_valid_private_key(private_key),
        }
    }
}

pub(crate) use ed25519_bip32::{
    le_add_32, scalar_mul_base, scalar_mul_base_tweak, trunc28_mul8,
};
pub(crate) use secp256k1::add_scalars_mod_n;

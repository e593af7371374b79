//! ed25519Bip32 (CIP-3 / Icarus) curve operations.
//!
//! CIP-3 replaces RFC 8032's scalar clamping with a running, additive scalar
//! arithmetic so that unhardened derivation is possible on an Edwards curve
//! (ordinary SLIP-10 ed25519 forbids it). Built on `curve25519-dalek`:
//! `EdwardsPoint::mul_base_clamped` for a full (already-clamped) secret
//! scalar, `Scalar::from_bytes_mod_order` + `EdwardsPoint::mul_base` for the
//! *unclamped* per-step tweak used when only a public key is available.

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;

use crate::error::{KeytreeError, KeytreeResult};

/// Base-point order `l`, little-endian (CIP-3's arithmetic is little-endian
/// throughout, unlike BIP-32/SLIP-10).
pub const CURVE_ORDER: [u8; 32] = [
    0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2, 0xfe, 0xf9, 0xde, 0x14,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
];

/// A 64-byte ed25519Bip32 private key is valid if `kL` already carries the
/// CIP-3/RFC8032 clamp: low 3 bits of byte 0 clear, bit 7 of byte 31 clear,
/// bit 6 of byte 31 set.
pub fn is_valid_private_key(private_key: &[u8]) -> bool {
    if private_key.len() != 64 {
        return false;
    }
    let kl0 = private_key[0];
    let kl31 = private_key[31];
    kl0 & 0b0000_0111 == 0 && kl31 & 0b1000_0000 == 0 && kl31 & 0b0100_0000 != 0
}

/// Full (already-clamped) secret scalar -> compressed Edwards public key.
pub fn get_public_key(private_key: &[u8]) -> KeytreeResult<Vec<u8>> {
    if private_key.len() != 64 {
        return Err(KeytreeError::InvalidPrivateKey(
            "ed25519Bip32 private key must be 64 bytes (kL || kR)".to_string(),
        ));
    }
    let mut kl = [0u8; 32];
    kl.copy_from_slice(&private_key[0..32]);
    Ok(scalar_mul_base_clamped(&kl).to_vec())
}

/// Identity: this curve's public-key representation is already its
/// compressed form (a single 32-byte Edwards point).
pub fn compress_public_key(public_key: &[u8]) -> KeytreeResult<Vec<u8>> {
    validate_len(public_key)?;
    Ok(public_key.to_vec())
}

pub fn decompress_public_key(compressed: &[u8]) -> KeytreeResult<Vec<u8>> {
    validate_len(compressed)?;
    Ok(compressed.to_vec())
}

fn validate_len(public_key: &[u8]) -> KeytreeResult<()> {
    if public_key.len() != 32 {
        return Err(KeytreeError::InvalidPublicKey(
            "ed25519Bip32 public key must be 32 bytes".to_string(),
        ));
    }
    Ok(())
}

/// `public + tweak*G`, used by the CIP-3 public-only (unhardened) step.
/// `tweak` here is the *unclamped* `trunc28_mul8(ZL)` value, not a full
/// secret scalar, so it goes through `Scalar::from_bytes_mod_order` rather
/// than the clamped base-point multiply.
pub fn public_add(public_key: &[u8], tweak: &[u8]) -> KeytreeResult<Vec<u8>> {
    validate_len(public_key)?;
    let tweak_arr: [u8; 32] = tweak
        .try_into()
        .map_err(|_| KeytreeError::InvalidTweak("tweak must be 32 bytes".to_string()))?;
    let point = decompress_point(public_key)?;
    let right = scalar_mul_base_tweak(&tweak_arr);
    let right_point = decompress_point(&right)?;
    Ok((point + right_point).compress().to_bytes().to_vec())
}

fn decompress_point(bytes: &[u8]) -> KeytreeResult<EdwardsPoint> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| KeytreeError::InvalidPublicKey("expected 32-byte point".to_string()))?;
    CompressedEdwardsY(arr)
        .decompress()
        .ok_or_else(|| KeytreeError::InvalidPublicKey("not a valid Edwards point".to_string()))
}

/// `8 * G` scaled by an already-clamped full secret scalar. Used to turn a
/// CIP-3 `kL` (whether from the master step or a derived child) into its
/// public key.
pub(crate) fn scalar_mul_base_clamped(clamped: &[u8; 32]) -> [u8; 32] {
    EdwardsPoint::mul_base_clamped(*clamped).compress().to_bytes()
}

/// Plain (unclamped, reduced mod the group order) base-point multiply. Used
/// for the per-step tweak, which is not a valid full secret scalar.
pub(crate) fn scalar_mul_base_tweak(tweak: &[u8; 32]) -> [u8; 32] {
    let scalar = Scalar::from_bytes_mod_order(*tweak);
    EdwardsPoint::mul_base(&scalar).compress().to_bytes()
}

/// `(a + b) mod 2^256`, both little-endian.
pub(crate) fn le_add_32(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let sum = a[i] as u16 + b[i] as u16 + carry;
        out[i] = (sum & 0xff) as u8;
        carry = sum >> 8;
    }
    out
}

/// Take the first 28 bytes of `z` (little-endian), multiply by 8, return the
/// 32-byte little-endian result.
pub(crate) fn trunc28_mul8(z: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..28 {
        let shifted = (z[i] as u16) << 3;
        let v = shifted + carry;
        out[i] = (v & 0xff) as u8;
        carry = v >> 8;
    }
    let mut i = 28;
    while carry > 0 && i < 32 {
        out[i] = (carry & 0xff) as u8;
        carry >>= 8;
        i += 1;
    }
    out
}

/// `scalar_mul_base` entry point used by the master-key generator: the
/// master `kL` is already clamped there too.
pub(crate) fn scalar_mul_base(clamped: &[u8; 32]) -> [u8; 32] {
    scalar_mul_base_clamped(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn le_add_wraps_mod_2_256() {
        let a = [0xffu8; 32];
        let b = {
            let mut b = [0u8; 32];
            b[0] = 1;
            b
        };
        let sum = le_add_32(&a, &b);
        assert_eq!(sum, [0u8; 32]);
    }

    #[test]
    fn trunc28_mul8_shifts_left_by_three_bits() {
        let mut z = [0u8; 32];
        z[0] = 1;
        let out = trunc28_mul8(&z);
        assert_eq!(out[0], 8);
        assert!(out[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn clamp_predicate_matches_manual_tweak() {
        let mut key = [0u8; 64];
        key[0] = 0b1111_1000; // low 3 bits clear
        key[31] = 0b0100_0000; // bit7 clear, bit6 set
        assert!(is_valid_private_key(&key));
        key[0] = 0b0000_0001; // low bit set -> invalid
        assert!(!is_valid_private_key(&key));
    }
}

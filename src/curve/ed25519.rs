//! ed25519 curve operations for SLIP-10 (hardened-only derivation).
//!
//! The 32-byte SLIP-10 private key is fed straight into `ed25519-dalek`'s
//! `SigningKey::from_bytes`, which performs the standard ed25519
//! SHA-512-and-clamp scalar derivation for us.

use ed25519_dalek::SigningKey;

use crate::error::{KeytreeError, KeytreeResult};

pub fn is_valid_private_key(private_key: &[u8]) -> bool {
    // SLIP-10 ed25519: any 32-byte sequence is a valid private key.
    private_key.len() == 32
}

/// Returns the 33-byte `0x00 || pubkey` representation used for this curve.
pub fn get_public_key(private_key: &[u8]) -> KeytreeResult<Vec<u8>> {
    let bytes: [u8; 32] = private_key
        .try_into()
        .map_err(|_| KeytreeError::InvalidPrivateKey("ed25519 key must be 32 bytes".to_string()))?;
    let signing_key = SigningKey::from_bytes(&bytes);
    let verifying_key = signing_key.verifying_key();
    let mut out = Vec::with_capacity(33);
    out.push(0x00);
    out.extend_from_slice(verifying_key.as_bytes());
    Ok(out)
}

/// Identity: the node's public-key representation for this curve already is
/// its compressed form (both are the 33-byte `0x00 || pub`).
pub fn compress_public_key(public_key: &[u8]) -> KeytreeResult<Vec<u8>> {
    validate_len(public_key)?;
    Ok(public_key.to_vec())
}

pub fn decompress_public_key(compressed: &[u8]) -> KeytreeResult<Vec<u8>> {
    validate_len(compressed)?;
    Ok(compressed.to_vec())
}

fn validate_len(public_key: &[u8]) -> KeytreeResult<()> {
    if public_key.len() != 33 {
        return Err(KeytreeError::InvalidPublicKey(
            "ed25519 public key must be 33 bytes (0x00 prefix + 32)".to_string(),
        ));
    }
    Ok(())
}

/// SLIP-10 forbids public derivation on ed25519.
pub fn public_add(_public_key: &[u8], _tweak: &[u8]) -> KeytreeResult<Vec<u8>> {
    Err(KeytreeError::UnsupportedCurve {
        curve: "ed25519",
        operation: "public_add",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_32_bytes_is_valid() {
        assert!(is_valid_private_key(&[0u8; 32]));
        assert!(is_valid_private_key(&[0xffu8; 32]));
    }

    #[test]
    fn public_key_has_zero_prefix() {
        let key = [3u8; 32];
        let pubkey = get_public_key(&key).unwrap();
        assert_eq!(pubkey.len(), 33);
        assert_eq!(pubkey[0], 0x00);
    }

    #[test]
    fn public_add_is_unsupported() {
        let err = public_add(&[0u8; 33], &[0u8; 32]).unwrap_err();
        assert!(matches!(err, KeytreeError::UnsupportedCurve { .. }));
    }
}

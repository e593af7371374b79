//! secp256k1 curve operations, built on the `secp256k1` crate's
//! `SecretKey`/`PublicKey`/`Scalar` types.

use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};

use crate::error::{KeytreeError, KeytreeResult};

/// The secp256k1 group order, big-endian.
pub const CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41,
];

pub fn is_valid_private_key(private_key: &[u8]) -> bool {
    private_key.len() == 32 && SecretKey::from_slice(private_key).is_ok()
}

pub fn get_public_key(private_key: &[u8]) -> KeytreeResult<Vec<u8>> {
    let secret = SecretKey::from_slice(private_key)
        .map_err(|e| KeytreeError::InvalidPrivateKey(e.to_string()))?;
    let secp = Secp256k1::new();
    let public = secret.public_key(&secp);
    Ok(public.serialize_uncompressed().to_vec())
}

pub fn compress_public_key(public_key: &[u8]) -> KeytreeResult<Vec<u8>> {
    let public = parse_public_key(public_key)?;
    Ok(public.serialize().to_vec())
}

pub fn decompress_public_key(compressed: &[u8]) -> KeytreeResult<Vec<u8>> {
    let public = parse_public_key(compressed)?;
    Ok(public.serialize_uncompressed().to_vec())
}

pub fn public_add(public_key: &[u8], tweak: &[u8]) -> KeytreeResult<Vec<u8>> {
    let public = parse_public_key(public_key)?;
    let scalar = scalar_from_be_bytes(tweak)?;
    let secp = Secp256k1::new();
    let tweaked = public
        .add_exp_tweak(&secp, &scalar)
        .map_err(|e| KeytreeError::InvalidTweak(e.to_string()))?;
    Ok(tweaked.serialize_uncompressed().to_vec())
}

fn parse_public_key(bytes: &[u8]) -> KeytreeResult<PublicKey> {
    PublicKey::from_slice(bytes).map_err(|e| KeytreeError::InvalidPublicKey(e.to_string()))
}

fn scalar_from_be_bytes(bytes: &[u8]) -> KeytreeResult<Scalar> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| KeytreeError::InvalidTweak("tweak must be 32 bytes".to_string()))?;
    Scalar::from_be_bytes(arr).map_err(|_| {
        KeytreeError::InvalidTweak("tweak is not a valid secp256k1 scalar".to_string())
    })
}

/// `(private_key + il) mod n`. Used by the BIP-32 private-step deriver.
/// Returns `Err` if `il >= n` or the resulting key would be zero — the
/// deriver interprets either as the SLIP-10 "invalid key, retry" condition.
pub fn add_scalars_mod_n(private_key: &[u8], il: &[u8; 32]) -> KeytreeResult<Vec<u8>> {
    let secret = SecretKey::from_slice(private_key)
        .map_err(|e| KeytreeError::InvalidPrivateKey(e.to_string()))?;
    let scalar = Scalar::from_be_bytes(*il)
        .map_err(|_| KeytreeError::InvalidTweak("IL out of range".to_string()))?;
    let child = secret
        .add_tweak(&scalar)
        .map_err(|e| KeytreeError::InvalidTweak(e.to_string()))?;
    Ok(child.secret_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_private_key() {
        assert!(!is_valid_private_key(&[0u8; 32]));
    }

    #[test]
    fn rejects_private_key_at_or_above_order() {
        assert!(!is_valid_private_key(&CURVE_ORDER));
    }

    #[test]
    fn accepts_private_key_of_one() {
        let mut key = [0u8; 32];
        key[31] = 1;
        assert!(is_valid_private_key(&key));
    }

    #[test]
    fn public_key_round_trips_through_compress_decompress() {
        let mut key = [0u8; 32];
        key[31] = 7;
        let uncompressed = get_public_key(&key).unwrap();
        let compressed = compress_public_key(&uncompressed).unwrap();
        assert_eq!(compressed.len(), 33);
        let back = decompress_public_key(&compressed).unwrap();
        assert_eq!(back, uncompressed);
    }
}

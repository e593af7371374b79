//! Extended-key codec: BIP-32 base58check serialization.
//!
//! `bs58` supplies only the base58 alphabet; the 78-byte field layout and
//! double-SHA256 checksum are hand-written.

use sha2::{Digest, Sha256};

use crate::curve::Curve;
use crate::error::{KeytreeError, KeytreeResult};
use crate::node::{Network, Node, NodeParts};

const VERSION_PUBLIC_MAINNET: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
const VERSION_PRIVATE_MAINNET: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
const VERSION_PUBLIC_TESTNET: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];
const VERSION_PRIVATE_TESTNET: [u8; 4] = [0x04, 0x35, 0x83, 0x94];

fn version_bytes(network: Network, is_private: bool) -> [u8; 4] {
    match (network, is_private) {
        (Network::Mainnet, false) => VERSION_PUBLIC_MAINNET,
        (Network::Mainnet, true) => VERSION_PRIVATE_MAINNET,
        (Network::Testnet, false) => VERSION_PUBLIC_TESTNET,
        (Network::Testnet, true) => VERSION_PRIVATE_TESTNET,
    }
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let once = Sha256::digest(data);
    Sha256::digest(once).into()
}

/// Serialize `node` to its base58check extended-key string. secp256k1 only;
/// callers wanting a private xprv must supply a node that still holds its
/// private key.
pub fn encode_extended_key(node: &Node, as_private: bool) -> KeytreeResult<String> {
    if node.curve() != Curve::Secp256k1 {
        return Err(KeytreeError::UnsupportedCurve {
            curve: node.curve().name(),
            operation: "extended_key",
        });
    }
    if as_private && !node.has_private_key() {
        return Err(KeytreeError::InvalidParameters(
            "cannot encode a private extended key for a neutered node".to_string(),
        ));
    }

    let mut payload = Vec::with_capacity(78);
    payload.extend_from_slice(&version_bytes(node.network(), as_private));
    payload.push(node.depth());
    payload.extend_from_slice(&node.parent_fingerprint().to_be_bytes());
    payload.extend_from_slice(&node.index().to_be_bytes());
    payload.extend_from_slice(node.chain_code());
    if as_private {
        payload.push(0x00);
        payload.extend_from_slice(node.private_key_bytes().expect("checked above"));
    } else {
        payload.extend_from_slice(&node.compressed_public_key_bytes()?);
    }

    let checksum = double_sha256(&payload);
    let mut full = payload;
    full.extend_from_slice(&checksum[0..4]);
    Ok(bs58::encode(full).into_string())
}

/// Parse and validate a base58check extended-key string into a `Node`.
/// Rejects bad base58, bad checksum, an unknown version, zero key bytes,
/// depth=0 with a nonzero parent fingerprint, and depth>=1 with a zero
/// parent fingerprint.
pub fn decode_extended_key(encoded: &str) -> KeytreeResult<Node> {
    let full = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| KeytreeError::InvalidExtendedKey(format!("bad base58: {e}")))?;
    if full.len() != 82 {
        return Err(KeytreeError::InvalidExtendedKey(format!(
            "expected 82 bytes (78 + 4 checksum), got {}",
            full.len()
        )));
    }
    let (payload, checksum) = full.split_at(78);
    let expected_checksum = double_sha256(payload);
    if checksum != &expected_checksum[0..4] {
        return Err(KeytreeError::InvalidExtendedKey(
            "checksum mismatch".to_string(),
        ));
    }

    let version: [u8; 4] = payload[0..4].try_into().unwrap();
    let (network, is_private) = match version {
        VERSION_PUBLIC_MAINNET => (Network::Mainnet, false),
        VERSION_PRIVATE_MAINNET => (Network::Mainnet, true),
        VERSION_PUBLIC_TESTNET => (Network::Testnet, false),
        VERSION_PRIVATE_TESTNET => (Network::Testnet, true),
        other => {
            return Err(KeytreeError::InvalidExtendedKey(format!(
                "unknown version bytes {other:02x?}"
            )))
        }
    };

    let depth = payload[4];
    let parent_fingerprint = u32::from_be_bytes(payload[5..9].try_into().unwrap());
    let index = u32::from_be_bytes(payload[9..13].try_into().unwrap());
    let chain_code: [u8; 32] = payload[13..45].try_into().unwrap();
    let key_field = &payload[45..78];

    if depth == 0 && parent_fingerprint != 0 {
        return Err(KeytreeError::InvalidExtendedKey(
            "depth 0 requires a zero parent fingerprint".to_string(),
        ));
    }
    if depth >= 1 && parent_fingerprint == 0 {
        return Err(KeytreeError::InvalidExtendedKey(
            "depth >= 1 requires a nonzero parent fingerprint".to_string(),
        ));
    }

    let (private_key, public_key) = if is_private {
        if key_field[0] != 0x00 {
            return Err(KeytreeError::InvalidExtendedKey(
                "private key field must start with 0x00".to_string(),
            ));
        }
        let private = key_field[1..33].to_vec();
        if private.iter().all(|&b| b == 0) {
            return Err(KeytreeError::InvalidExtendedKey(
                "zero private key bytes".to_string(),
            ));
        }
        (Some(private), None)
    } else {
        let compressed = key_field.to_vec();
        if compressed.iter().all(|&b| b == 0) {
            return Err(KeytreeError::InvalidExtendedKey(
                "zero public key bytes".to_string(),
            ));
        }
        let public = Curve::Secp256k1
            .decompress_public_key(&compressed)
            .map_err(|e| KeytreeError::InvalidExtendedKey(e.to_string()))?;
        (None, Some(public))
    };

    Node::from_parts(NodeParts {
        depth,
        index,
        parent_fingerprint,
        // A depth-1 node's parent *is* the root, so its fingerprint is
        // known exactly. Deeper nodes don't carry master_fingerprint on the
        // wire, so it is left unknown.
        master_fingerprint: if depth == 1 { Some(parent_fingerprint) } else { None },
        chain_code,
        private_key,
        public_key,
        curve: Curve::Secp256k1,
        network,
    })
    .map_err(|e| KeytreeError::InvalidExtendedKey(e.to_string()))
}

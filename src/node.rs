//! The `Node` value type: an immutable HD key carrying private/public
//! key material, chain code, depth/index bookkeeping and fingerprints.

use std::sync::{Arc, OnceLock};

use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::curve::Curve;
use crate::derive::{bip32 as bip32_deriver, cip3 as cip3_deriver};
use crate::error::{KeytreeError, KeytreeResult};
use crate::path::{Path, PathSegment, Scheme, SegmentValue};
use crate::primitives::Primitives;
use crate::secret::SecretBytes;

/// Which version-byte table an extended key serializes with.
/// Affects only the extended-key codec; never the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Network {
    Mainnet,
    Testnet,
}

/// An immutable HD key. Construct via [`crate::master`], [`crate::xkey`], or
/// by calling [`Node::derive`] on an existing node.
#[derive(Clone)]
pub struct Node {
    depth: u8,
    index: u32,
    parent_fingerprint: u32,
    master_fingerprint: Option<u32>,
    chain_code: [u8; 32],
    private_key: Option<SecretBytes>,
    public_key: Arc<OnceLock<Vec<u8>>>,
    curve: Curve,
    network: Network,
}

/// Fields needed to construct the very first (depth-0) node, or any node
/// reconstructed with already-known public key bytes (e.g. from an extended
/// public key or from JSON).
pub struct NodeParts {
    pub depth: u8,
    pub index: u32,
    pub parent_fingerprint: u32,
    pub master_fingerprint: Option<u32>,
    pub chain_code: [u8; 32],
    pub private_key: Option<Vec<u8>>,
    pub public_key: Option<Vec<u8>>,
    pub curve: Curve,
    pub network: Network,
}

impl Node {
    /// Construct a node from its raw parts, checking depth/index/fingerprint
    /// invariants. `master_fingerprint` may be omitted for a depth-0 node
    /// (it is then derived from the node's own fingerprint), and is likewise
    /// optional for depth >= 1 when it is not actually known (e.g. a node
    /// rebuilt from an extended key, which does not carry it on the wire).
    pub fn from_parts(parts: NodeParts) -> KeytreeResult<Self> {
        if parts.private_key.is_none() && parts.public_key.is_none() {
            return Err(KeytreeError::InvalidParameters(
                "a node needs at least one of private_key or public_key".to_string(),
            ));
        }
        if let Some(ref pk) = parts.private_key {
            if pk.len() != parts.curve.private_key_length() {
                return Err(KeytreeError::InvalidPrivateKey(format!(
                    "expected {} bytes for {}, got {}",
                    parts.curve.private_key_length(),
                    parts.curve.name(),
                    pk.len()
                )));
            }
            if !parts.curve.is_valid_private_key(pk) {
                return Err(KeytreeError::InvalidPrivateKey(format!(
                    "private key is not valid on curve {}",
                    parts.curve.name()
                )));
            }
        }

        let public_cache = Arc::new(OnceLock::new());
        if let Some(pub_bytes) = parts.public_key {
            if pub_bytes.len() != parts.curve.public_key_length() {
                return Err(KeytreeError::InvalidPublicKey(format!(
                    "expected {} bytes for {}, got {}",
                    parts.curve.public_key_length(),
                    parts.curve.name(),
                    pub_bytes.len()
                )));
            }
            // Invariant #1 (spec.md:45): private_key present => public_key ==
            // curve.get_public_key(private_key). A caller supplying both must
            // supply a consistent pair — this is the only point where both
            // can arrive together (derive()/child_parts never pass both).
            if let Some(ref private) = parts.private_key {
                let expected = parts.curve.get_public_key(private)?;
                if expected != pub_bytes {
                    return Err(KeytreeError::InvalidNodeInvariant(
                        "public_key does not match curve.get_public_key(private_key)".to_string(),
                    ));
                }
            }
            let _ = public_cache.set(pub_bytes);
        }

        let mut node = Self {
            depth: parts.depth,
            index: parts.index,
            parent_fingerprint: parts.parent_fingerprint,
            master_fingerprint: parts.master_fingerprint,
            chain_code: parts.chain_code,
            private_key: parts.private_key.map(SecretBytes::new),
            public_key: public_cache,
            curve: parts.curve,
            network: parts.network,
        };

        if parts.depth == 0 {
            if node.index != 0 {
                return Err(KeytreeError::InvalidNodeInvariant(
                    "depth 0 requires index 0".to_string(),
                ));
            }
            if node.parent_fingerprint != 0 {
                return Err(KeytreeError::InvalidNodeInvariant(
                    "depth 0 requires parent_fingerprint 0".to_string(),
                ));
            }
            node.master_fingerprint = Some(node.fingerprint()?);
        } else {
            if node.parent_fingerprint == 0 {
                return Err(KeytreeError::InvalidNodeInvariant(
                    "depth >= 1 requires a nonzero parent_fingerprint".to_string(),
                ));
            }
            // master_fingerprint may be unknown (e.g. a node rebuilt from an
            // extended key at depth >= 2, which does not carry it on the
            // wire) — the invariant below only applies when it is known.
            if parts.depth >= 2 && node.master_fingerprint == Some(node.parent_fingerprint) {
                return Err(KeytreeError::InvalidNodeInvariant(
                    "depth >= 2 node cannot have the root as its direct parent".to_string(),
                ));
            }
        }

        Ok(node)
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn parent_fingerprint(&self) -> u32 {
        self.parent_fingerprint
    }

    pub fn master_fingerprint(&self) -> Option<u32> {
        self.master_fingerprint
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn private_key_bytes(&self) -> Option<&[u8]> {
        self.private_key.as_ref().map(SecretBytes::as_slice)
    }

    /// Uncompressed public key, computed lazily from the private key on
    /// first access if it wasn't supplied directly.
    pub fn public_key_bytes(&self) -> KeytreeResult<Vec<u8>> {
        if let Some(cached) = self.public_key.get() {
            return Ok(cached.clone());
        }
        let private = self.private_key.as_ref().ok_or_else(|| {
            KeytreeError::InvalidNodeInvariant(
                "node has neither a cached public key nor a private key".to_string(),
            )
        })?;
        let computed = self.curve.get_public_key(private.as_slice())?;
        let _ = self.public_key.set(computed.clone());
        Ok(computed)
    }

    pub fn compressed_public_key_bytes(&self) -> KeytreeResult<Vec<u8>> {
        self.curve.compress_public_key(&self.public_key_bytes()?)
    }

    /// Returns a copy of this node with the private key removed. The
    /// public key is resolved eagerly first, since a neutered node can no
    /// longer compute it — it genuinely does not hold the private key field.
    pub fn neuter(&self) -> KeytreeResult<Self> {
        let public_key = self.public_key_bytes()?;
        let cache = Arc::new(OnceLock::new());
        let _ = cache.set(public_key);
        Ok(Self {
            depth: self.depth,
            index: self.index,
            parent_fingerprint: self.parent_fingerprint,
            master_fingerprint: self.master_fingerprint,
            chain_code: self.chain_code,
            private_key: None,
            public_key: cache,
            curve: self.curve,
            network: self.network,
        })
    }

    /// First 4 bytes of RIPEMD160(SHA256(compressed_public_key)), big-endian.
    pub fn fingerprint(&self) -> KeytreeResult<u32> {
        let compressed = self.compressed_public_key_bytes()?;
        let sha = Sha256::digest(compressed);
        let ripemd = Ripemd160::digest(sha);
        Ok(u32::from_be_bytes([ripemd[0], ripemd[1], ripemd[2], ripemd[3]]))
    }

    /// `0x`-prefixed lowercase-hex Ethereum address. secp256k1 only.
    pub fn address(&self) -> KeytreeResult<String> {
        if self.curve != Curve::Secp256k1 {
            return Err(KeytreeError::UnsupportedCurve {
                curve: self.curve.name(),
                operation: "address",
            });
        }
        let uncompressed = self.public_key_bytes()?;
        let hash = Keccak256::digest(&uncompressed[1..]);
        Ok(format!("0x{}", hex::encode(&hash[12..32])))
    }

    /// Validate and dispatch a derivation path against this node.
    ///
    /// `segments` must be a partial path (it must not start with a `bip39`
    /// segment) whose scheme matches this node's curve.
    pub async fn derive(
        &self,
        segments: &[PathSegment],
        primitives: &Primitives,
    ) -> KeytreeResult<Node> {
        let path = Path::from_segments(segments.to_vec(), true, None)?;
        let expected = expected_scheme(self.curve);
        let mut current = self.clone();
        for segment in path.derivation_segments() {
            if segment.scheme != expected {
                return Err(KeytreeError::InvalidParameters(format!(
                    "segment scheme does not match curve {}",
                    self.curve.name()
                )));
            }
            let (index, hardened) = match &segment.value {
                SegmentValue::Index { index, hardened } => (*index, *hardened),
                _ => {
                    return Err(KeytreeError::InvalidParameters(
                        "derivation segments must be index segments".to_string(),
                    ))
                }
            };
            current = match current.curve {
                Curve::Secp256k1 | Curve::Ed25519 => {
                    bip32_deriver::derive_step(&current, index, hardened, primitives).await?
                }
                Curve::Ed25519Bip32 => {
                    cip3_deriver::derive_step(&current, index, hardened, primitives).await?
                }
            };
        }
        Ok(current)
    }

    pub(crate) fn child_parts(
        &self,
        index: u32,
        chain_code: [u8; 32],
        private_key: Option<Vec<u8>>,
        public_key: Option<Vec<u8>>,
    ) -> KeytreeResult<NodeParts> {
        let parent_fp = self.fingerprint()?;
        let master_fp = if self.depth == 0 {
            Some(parent_fp)
        } else {
            self.master_fingerprint
        };
        Ok(NodeParts {
            depth: self
                .depth
                .checked_add(1)
                .ok_or_else(|| KeytreeError::InvalidNodeInvariant("depth overflow".to_string()))?,
            index,
            parent_fingerprint: parent_fp,
            master_fingerprint: master_fp,
            chain_code,
            private_key,
            public_key,
            curve: self.curve,
            network: self.network,
        })
    }

    pub fn to_json(&self) -> KeytreeResult<NodeJson> {
        Ok(NodeJson {
            depth: self.depth,
            master_fingerprint: self.master_fingerprint,
            parent_fingerprint: self.parent_fingerprint,
            index: self.index,
            network: self.network,
            curve: self.curve,
            private_key: self.private_key_bytes().map(hex::encode),
            public_key: format!("0x{}", hex::encode(self.public_key_bytes()?)),
            chain_code: format!("0x{}", hex::encode(self.chain_code)),
        })
    }

    pub fn from_json(json: &NodeJson) -> KeytreeResult<Self> {
        let chain_code = decode_hex_32(&json.chain_code)?;
        let private_key = json
            .private_key
            .as_deref()
            .map(decode_hex_prefixed)
            .transpose()?;
        let public_key = decode_hex_prefixed(&json.public_key)?;
        Node::from_parts(NodeParts {
            depth: json.depth,
            index: json.index,
            parent_fingerprint: json.parent_fingerprint,
            master_fingerprint: json.master_fingerprint,
            chain_code,
            private_key,
            public_key: Some(public_key),
            curve: json.curve,
            network: json.network,
        })
    }
}

fn expected_scheme(curve: Curve) -> Scheme {
    match curve {
        Curve::Secp256k1 => Scheme::Bip32,
        Curve::Ed25519 => Scheme::Slip10,
        Curve::Ed25519Bip32 => Scheme::Cip3,
    }
}

fn decode_hex_prefixed(s: &str) -> KeytreeResult<Vec<u8>> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|e| KeytreeError::InvalidParameters(e.to_string()))
}

fn decode_hex_32(s: &str) -> KeytreeResult<[u8; 32]> {
    let bytes = decode_hex_prefixed(s)?;
    bytes
        .try_into()
        .map_err(|_| KeytreeError::InvalidChainCode("chain code must be 32 bytes".to_string()))
}

/// JSON-serializable shape of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeJson {
    pub depth: u8,
    pub master_fingerprint: Option<u32>,
    pub parent_fingerprint: u32,
    pub index: u32,
    pub network: Network,
    pub curve: Curve,
    pub private_key: Option<String>,
    pub public_key: String,
    pub chain_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secp_root() -> Node {
        let mut private = vec![0u8; 32];
        private[31] = 1;
        Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 0,
            master_fingerprint: None,
            chain_code: [7u8; 32],
            private_key: Some(private),
            public_key: None,
            curve: Curve::Secp256k1,
            network: Network::Mainnet,
        })
        .unwrap()
    }

    #[test]
    fn root_node_master_fingerprint_equals_own_fingerprint() {
        let node = secp_root();
        assert_eq!(Some(node.fingerprint().unwrap()), node.master_fingerprint());
    }

    #[test]
    fn neuter_drops_private_key_but_keeps_public() {
        let node = secp_root();
        let pubkey_before = node.public_key_bytes().unwrap();
        let neutered = node.neuter().unwrap();
        assert!(!neutered.has_private_key());
        assert_eq!(neutered.public_key_bytes().unwrap(), pubkey_before);
    }

    #[test]
    fn rejects_mismatched_public_key_when_private_key_also_supplied() {
        let mut private = vec![0u8; 32];
        private[31] = 1;
        let wrong_public = Curve::Secp256k1.get_public_key(&{
            let mut other = vec![0u8; 32];
            other[31] = 2;
            other
        }).unwrap();
        let err = Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 0,
            master_fingerprint: None,
            chain_code: [7u8; 32],
            private_key: Some(private),
            public_key: Some(wrong_public),
            curve: Curve::Secp256k1,
            network: Network::Mainnet,
        })
        .unwrap_err();
        assert!(matches!(err, KeytreeError::InvalidNodeInvariant(_)));
    }

    #[test]
    fn depth_zero_rejects_nonzero_parent_fingerprint() {
        let mut private = vec![0u8; 32];
        private[31] = 1;
        let err = Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 1,
            master_fingerprint: None,
            chain_code: [0u8; 32],
            private_key: Some(private),
            public_key: None,
            curve: Curve::Secp256k1,
            network: Network::Mainnet,
        })
        .unwrap_err();
        assert!(matches!(err, KeytreeError::InvalidNodeInvariant(_)));
    }

    #[test]
    fn json_round_trips() {
        let node = secp_root();
        let json = node.to_json().unwrap();
        let back = Node::from_json(&json).unwrap();
        assert_eq!(back.public_key_bytes().unwrap(), node.public_key_bytes().unwrap());
        assert_eq!(back.chain_code(), node.chain_code());
        assert_eq!(back.depth(), node.depth());
    }

    #[test]
    fn address_rejected_on_non_secp256k1_curve() {
        let node = Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 0,
            master_fingerprint: None,
            chain_code: [0u8; 32],
            private_key: Some(vec![1u8; 32]),
            public_key: None,
            curve: Curve::Ed25519,
            network: Network::Mainnet,
        })
        .unwrap();
        assert!(matches!(
            node.address().unwrap_err(),
            KeytreeError::UnsupportedCurve { .. }
        ));
    }
}

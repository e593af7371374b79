//! CIP-3 (Icarus / BIP32-Ed25519) one-step derivation.
//!
//! Little-endian throughout (unlike BIP-32/SLIP-10's big-endian), using the
//! `le_add_32`/`trunc28_mul8` helpers and the clamped-vs-unclamped scalar
//! multiplications from [`crate::curve`].

use crate::curve::{le_add_32, scalar_mul_base, trunc28_mul8, Curve};
use crate::error::{KeytreeError, KeytreeResult};
use crate::node::Node;
use crate::primitives::Primitives;

const Z_HARD: u8 = 0;
const CC_HARD: u8 = 1;
const Z_SOFT: u8 = 2;
const CC_SOFT: u8 = 3;

pub async fn derive_step(
    parent: &Node,
    index: u32,
    hardened: bool,
    primitives: &Primitives,
) -> KeytreeResult<Node> {
    if index >= 0x8000_0000 {
        return Err(KeytreeError::InvalidParameters(format!(
            "index {index} out of range [0, 2^31)"
        )));
    }
    if hardened && !parent.has_private_key() {
        return Err(KeytreeError::InvalidParameters(
            "hardened derivation requires a parent private key".to_string(),
        ));
    }
    if !hardened && !parent.curve().derive_unhardened_keys() {
        return Err(KeytreeError::InvalidParameters(format!(
            "curve {} does not support unhardened derivation",
            parent.curve().name()
        )));
    }

    let actual_index = if hardened { index + 0x8000_0000 } else { index };
    let chain_code = *parent.chain_code();

    let (z_ext, cc_ext) = if hardened {
        let private = parent.private_key_bytes().expect("checked above");
        (
            build_extension(Z_HARD, private, actual_index),
            build_extension(CC_HARD, private, actual_index),
        )
    } else {
        let a = parent.public_key_bytes()?;
        (
            build_extension(Z_SOFT, &a, actual_index),
            build_extension(CC_SOFT, &a, actual_index),
        )
    };

    let z = primitives.hmac_sha512(&chain_code, &z_ext).await?;
    let zl: [u8; 32] = z[0..32].try_into().unwrap();
    let zr: [u8; 32] = z[32..64].try_into().unwrap();
    let cc_full = primitives.hmac_sha512(&chain_code, &cc_ext).await?;
    let child_chain: [u8; 32] = cc_full[32..64].try_into().unwrap();

    if let Some(private) = parent.private_key_bytes() {
        let kl: [u8; 32] = private[0..32].try_into().unwrap();
        let kr: [u8; 32] = private[32..64].try_into().unwrap();
        let child_kl = le_add_32(&trunc28_mul8(&zl), &kl);
        let child_kr = le_add_32(&zr, &kr);
        let mut child_private = Vec::with_capacity(64);
        child_private.extend_from_slice(&child_kl);
        child_private.extend_from_slice(&child_kr);
        let child_public = scalar_mul_base(&child_kl).to_vec();
        build_child(parent, actual_index, child_chain, Some(child_private), Some(child_public))
    } else {
        // Unhardened is guaranteed here: hardened without a private key was
        // rejected above.
        let a = parent.public_key_bytes()?;
        let child_public = Curve::Ed25519Bip32.public_add(&a, &trunc28_mul8(&zl))?;
        build_child(parent, actual_index, child_chain, None, Some(child_public))
    }
}

fn build_extension(tag: u8, key_material: &[u8], actual_index: u32) -> Vec<u8> {
    let mut ext = Vec::with_capacity(1 + key_material.len() + 4);
    ext.push(tag);
    ext.extend_from_slice(key_material);
    ext.extend_from_slice(&actual_index.to_le_bytes());
    ext
}

fn build_child(
    parent: &Node,
    actual_index: u32,
    chain_code: [u8; 32],
    private_key: Option<Vec<u8>>,
    public_key: Option<Vec<u8>>,
) -> KeytreeResult<Node> {
    let parts = parent.child_parts(actual_index, chain_code, private_key, public_key)?;
    Node::from_parts(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Network, NodeParts};

    fn icarus_root() -> Node {
        let mut private = vec![0u8; 64];
        private[0] = 0b1111_1000;
        private[31] = 0b0100_0000;
        let public = scalar_mul_base(&private[0..32].try_into().unwrap()).to_vec();
        Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 0,
            master_fingerprint: None,
            chain_code: [5u8; 32],
            private_key: Some(private),
            public_key: Some(public),
            curve: Curve::Ed25519Bip32,
            network: Network::Mainnet,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn hardened_child_requires_private_key() {
        let root = icarus_root().neuter().unwrap();
        let primitives = Primitives::builtin();
        let err = derive_step(&root, 0, true, &primitives).await.unwrap_err();
        assert!(matches!(err, KeytreeError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn unhardened_public_derivation_matches_private_derivation() {
        let root = icarus_root();
        let primitives = Primitives::builtin();
        let private_child = derive_step(&root, 2, false, &primitives).await.unwrap();
        let neutered_root = root.neuter().unwrap();
        let public_child = derive_step(&neutered_root, 2, false, &primitives)
            .await
            .unwrap();
        assert_eq!(
            private_child.public_key_bytes().unwrap(),
            public_child.public_key_bytes().unwrap()
        );
    }

    #[tokio::test]
    async fn derivation_is_deterministic() {
        let root = icarus_root();
        let primitives = Primitives::builtin();
        let a = derive_step(&root, 7, true, &primitives).await.unwrap();
        let b = derive_step(&root, 7, true, &primitives).await.unwrap();
        assert_eq!(a.private_key_bytes(), b.private_key_bytes());
        assert_eq!(a.chain_code(), b.chain_code());
    }
}

//! BIP-32 / SLIP-10 one-step derivation.
//!
//! Generalized over [`Curve`] so the same extension and retry machinery
//! serves both secp256k1 and ed25519 (SLIP-10).

use crate::curve::{add_scalars_mod_n, Curve};
use crate::error::{KeytreeError, KeytreeResult};
use crate::node::Node;
use crate::primitives::Primitives;

/// Defensive bound on the SLIP-10 "invalid key, retry" loop. A single retry
/// already has probability ~2^-127; this turns a theoretical
/// non-termination bug into an error instead of a hang.
const MAX_RETRIES: u32 = 256;

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
    let curve = parent.curve();

    if curve == Curve::Ed25519 {
        // SLIP-10 ed25519: hardened only (checked above), HMAC left half is
        // the child private key directly, no tweak addition, no retry.
        let extension = hardened_extension(parent, actual_index)?;
        let i = primitives.hmac_sha512(parent.chain_code(), &extension).await?;
        let (il, ir) = split_i(&i);
        let child_public = curve.get_public_key(&il)?;
        return build_child(parent, actual_index, ir, Some(il.to_vec()), Some(child_public));
    }

    let mut extension = if hardened {
        hardened_extension(parent, actual_index)?
    } else {
        normal_extension(parent, actual_index)?
    };

    for attempt in 0..MAX_RETRIES {
        let i = primitives.hmac_sha512(parent.chain_code(), &extension).await?;
        let (il, ir) = split_i(&i);

        let step_result: KeytreeResult<(Option<Vec<u8>>, Vec<u8>)> =
            if let Some(private) = parent.private_key_bytes() {
                add_scalars_mod_n(private, &il)
                    .and_then(|child_private| {
                        let child_public = curve.get_public_key(&child_private)?;
                        Ok((Some(child_private), child_public))
                    })
            } else {
                curve
                    .public_add(&parent.public_key_bytes()?, &il)
                    .map(|child_public| (None, child_public))
            };

        match step_result {
            Ok((child_private, child_public)) => {
                return build_child(parent, actual_index, ir, child_private, Some(child_public));
            }
            Err(_) if attempt + 1 < MAX_RETRIES => {
                extension = retry_extension(&ir, actual_index);
            }
            Err(e) => return Err(e),
        }
    }

    Err(KeytreeError::InvalidMasterKey(
        "exhausted the SLIP-10 retry budget synthesizing a valid child key".to_string(),
    ))
}

fn hardened_extension(parent: &Node, actual_index: u32) -> KeytreeResult<Vec<u8>> {
    let private = parent.private_key_bytes().ok_or_else(|| {
        KeytreeError::InvalidParameters("hardened derivation requires a private key".to_string())
    })?;
    let mut ext = Vec::with_capacity(1 + private.len() + 4);
    ext.push(0x00);
    ext.extend_from_slice(private);
    ext.extend_from_slice(&actual_index.to_be_bytes());
    Ok(ext)
}

fn normal_extension(parent: &Node, index: u32) -> KeytreeResult<Vec<u8>> {
    let compressed = parent.compressed_public_key_bytes()?;
    let mut ext = Vec::with_capacity(compressed.len() + 4);
    ext.extend_from_slice(&compressed);
    ext.extend_from_slice(&index.to_be_bytes());
    Ok(ext)
}

fn retry_extension(ir: &[u8; 32], actual_index: u32) -> Vec<u8> {
    let mut ext = Vec::with_capacity(1 + 32 + 4);
    ext.push(0x01);
    ext.extend_from_slice(ir);
    ext.extend_from_slice(&actual_index.to_be_bytes());
    ext
}

fn split_i(i: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut il = [0u8; 32];
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[0..32]);
    ir.copy_from_slice(&i[32..64]);
    (il, ir)
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

    fn secp_root() -> Node {
        let mut private = vec![0u8; 32];
        private[31] = 1;
        Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 0,
            master_fingerprint: None,
            chain_code: [9u8; 32],
            private_key: Some(private),
            public_key: None,
            curve: Curve::Secp256k1,
            network: Network::Mainnet,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn hardened_child_requires_private_key() {
        let root = secp_root().neuter().unwrap();
        let primitives = Primitives::builtin();
        let err = derive_step(&root, 0, true, &primitives).await.unwrap_err();
        assert!(matches!(err, KeytreeError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn secp256k1_private_derivation_is_deterministic() {
        let root = secp_root();
        let primitives = Primitives::builtin();
        let a = derive_step(&root, 0, true, &primitives).await.unwrap();
        let b = derive_step(&root, 0, true, &primitives).await.unwrap();
        assert_eq!(a.private_key_bytes(), b.private_key_bytes());
        assert_eq!(a.index(), 0x8000_0000);
    }

    #[tokio::test]
    async fn ed25519_rejects_unhardened() {
        let mut node_parts_private = vec![0u8; 32];
        node_parts_private[0] = 9;
        let root = Node::from_parts(NodeParts {
            depth: 0,
            index: 0,
            parent_fingerprint: 0,
            master_fingerprint: None,
            chain_code: [1u8; 32],
            private_key: Some(node_parts_private),
            public_key: None,
            curve: Curve::Ed25519,
            network: Network::Mainnet,
        })
        .unwrap();
        let primitives = Primitives::builtin();
        let err = derive_step(&root, 0, false, &primitives).await.unwrap_err();
        assert!(matches!(err, KeytreeError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn public_derivation_matches_private_derivation_when_unhardened() {
        let root = secp_root();
        let primitives = Primitives::builtin();
        let private_child = derive_step(&root, 3, false, &primitives).await.unwrap();
        let neutered_root = root.neuter().unwrap();
        let public_child = derive_step(&neutered_root, 3, false, &primitives)
            .await
            .unwrap();
        assert_eq!(
            private_child.public_key_bytes().unwrap(),
            public_child.public_key_bytes().unwrap()
        );
    }
}

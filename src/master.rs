//! Master-seed generator: builds the depth-0 [`Node`] for either
//! protocol a curve's [`MasterNodeSpec`] names.
//!
//! Mnemonic parsing/validation is the `bip39` crate's job; the PBKDF2 stretch
//! and HMAC-SHA-512 master-key split are this crate's own code, run through
//! [`Primitives`] so they stay pluggable and swappable like every other
//! derivation step.

use bip39::Mnemonic;

use crate::curve::{Curve, MasterNodeSpec};
use crate::error::{KeytreeError, KeytreeResult};
use crate::node::{Network, Node, NodeParts};
use crate::primitives::Primitives;

const MNEMONIC_PBKDF2_ITERATIONS: u32 = 2048;
const MNEMONIC_SEED_LENGTH: usize = 64;
const CIP3_PBKDF2_ITERATIONS: u32 = 4096;
const CIP3_XPRV_LENGTH: usize = 96;

/// Build a depth-0 node for `curve` from a BIP-39 mnemonic.
///
/// For `slip10` curves (secp256k1, ed25519) the mnemonic is PBKDF2-stretched
/// into a seed first. For `cip3Icarus` (ed25519Bip32) the mnemonic's raw
/// entropy is used directly.
pub async fn from_mnemonic(
    mnemonic: &str,
    passphrase: &str,
    curve: Curve,
    network: Network,
    primitives: &Primitives,
) -> KeytreeResult<Node> {
    let parsed = Mnemonic::parse_normalized(mnemonic)
        .map_err(|e| KeytreeError::InvalidParameters(format!("invalid mnemonic: {e}")))?;

    match curve.master_node_spec() {
        MasterNodeSpec::Slip10 => {
            let mut salt = Vec::with_capacity(b"mnemonic".len() + passphrase.len());
            salt.extend_from_slice(b"mnemonic");
            salt.extend_from_slice(passphrase.as_bytes());
            let seed = primitives
                .pbkdf2_sha512(
                    mnemonic.as_bytes(),
                    &salt,
                    MNEMONIC_PBKDF2_ITERATIONS,
                    MNEMONIC_SEED_LENGTH,
                )
                .await?;
            from_seed(&seed, curve, network, primitives).await
        }
        MasterNodeSpec::Cip3Icarus => {
            let entropy = parsed.to_entropy();
            from_entropy(&entropy, curve, network, primitives).await
        }
    }
}

/// Build a depth-0 `slip10` node directly from a raw seed, bypassing
/// mnemonic parsing. `seed` must be 16-64 bytes. Fails `UnsupportedCurve`
/// for `cip3Icarus` curves (ed25519Bip32), which do not have a seed-based
/// master step.
pub async fn from_seed(
    seed: &[u8],
    curve: Curve,
    network: Network,
    primitives: &Primitives,
) -> KeytreeResult<Node> {
    if !(16..=64).contains(&seed.len()) {
        return Err(KeytreeError::InvalidParameters(
            "seed must be 16-64 bytes".to_string(),
        ));
    }
    if curve.master_node_spec() != MasterNodeSpec::Slip10 {
        return Err(KeytreeError::UnsupportedCurve {
            curve: curve.name(),
            operation: "fromSeed",
        });
    }

    let i = primitives.hmac_sha512(curve.master_secret_salt(), seed).await?;
    let il: [u8; 32] = i[0..32].try_into().unwrap();
    let ir: [u8; 32] = i[32..64].try_into().unwrap();

    if curve == Curve::Secp256k1 {
        let order = curve.curve_order();
        if il == [0u8; 32] || il.as_slice() >= order.as_slice() {
            return Err(KeytreeError::InvalidMasterKey(
                "master seed produced an out-of-range secp256k1 private key".to_string(),
            ));
        }
    }

    let public_key = curve.get_public_key(&il)?;
    Node::from_parts(NodeParts {
        depth: 0,
        index: 0,
        parent_fingerprint: 0,
        master_fingerprint: None,
        chain_code: ir,
        private_key: Some(il.to_vec()),
        public_key: Some(public_key),
        curve,
        network,
    })
}

/// Build a depth-0 `cip3Icarus` node directly from raw BIP-39 entropy,
/// bypassing mnemonic parsing. `entropy` must be 16-64 bytes. Fails
/// `UnsupportedCurve` for `slip10` curves (secp256k1, ed25519).
pub async fn from_entropy(
    entropy: &[u8],
    curve: Curve,
    network: Network,
    primitives: &Primitives,
) -> KeytreeResult<Node> {
    if !(16..=64).contains(&entropy.len()) {
        return Err(KeytreeError::InvalidParameters(
            "entropy must be 16-64 bytes".to_string(),
        ));
    }
    if curve.master_node_spec() != MasterNodeSpec::Cip3Icarus {
        return Err(KeytreeError::UnsupportedCurve {
            curve: curve.name(),
            operation: "fromEntropy",
        });
    }

    let xprv = primitives
        .pbkdf2_sha512(b"", entropy, CIP3_PBKDF2_ITERATIONS, CIP3_XPRV_LENGTH)
        .await?;
    let mut kl: [u8; 32] = xprv[0..32].try_into().unwrap();
    let kr: [u8; 32] = xprv[32..64].try_into().unwrap();
    let chain_code: [u8; 32] = xprv[64..96].try_into().unwrap();

    kl[0] &= 0b1111_1000;
    kl[31] &= 0b0111_1111;
    kl[31] |= 0b0100_0000;

    let mut private_key = Vec::with_capacity(64);
    private_key.extend_from_slice(&kl);
    private_key.extend_from_slice(&kr);
    let public_key = crate::curve::scalar_mul_base(&kl).to_vec();

    Node::from_parts(NodeParts {
        depth: 0,
        index: 0,
        parent_fingerprint: 0,
        master_fingerprint: None,
        chain_code,
        private_key: Some(private_key),
        public_key: Some(public_key),
        curve,
        network,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bip32_test_vector_1_root_private_key() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let primitives = Primitives::builtin();
        let node = from_seed(&seed, Curve::Secp256k1, Network::Mainnet, &primitives)
            .await
            .unwrap();
        assert_eq!(
            hex::encode(node.private_key_bytes().unwrap()),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b3"
        );
    }

    #[tokio::test]
    async fn slip10_ed25519_test_vector_1() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let primitives = Primitives::builtin();
        let node = from_seed(&seed, Curve::Ed25519, Network::Mainnet, &primitives)
            .await
            .unwrap();
        assert_eq!(
            hex::encode(node.private_key_bytes().unwrap()),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e"
        );
        assert_eq!(
            hex::encode(node.public_key_bytes().unwrap()),
            "00a4b2856bfec510abab89753fac1ac0e1112364e7d250545963f135f2a33188e"
        );
    }

    #[tokio::test]
    async fn cip3_test_vector_from_entropy() {
        let entropy = hex::decode("46e62370a138a182a498b8e2885bc032379ddf38").unwrap();
        let primitives = Primitives::builtin();
        let node = from_entropy(&entropy, Curve::Ed25519Bip32, Network::Mainnet, &primitives)
            .await
            .unwrap();
        assert_eq!(node.private_key_bytes().unwrap().len(), 64);
        assert_eq!(node.chain_code().len(), 32);
    }

    #[tokio::test]
    async fn from_seed_rejects_out_of_range_length() {
        let primitives = Primitives::builtin();
        let err = from_seed(&[0u8; 8], Curve::Secp256k1, Network::Mainnet, &primitives)
            .await
            .unwrap_err();
        assert!(matches!(err, KeytreeError::InvalidParameters(_)));
    }

    #[tokio::test]
    async fn from_seed_rejects_cip3_curve() {
        let seed = [0u8; 32];
        let primitives = Primitives::builtin();
        let err = from_seed(&seed, Curve::Ed25519Bip32, Network::Mainnet, &primitives)
            .await
            .unwrap_err();
        assert!(matches!(err, KeytreeError::UnsupportedCurve { .. }));
    }
}

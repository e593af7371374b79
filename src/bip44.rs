//! BIP-44 wrappers: depth-bound specializations of [`Node`], restricted
//! to `m / 44' / coin_type' / account' / change / address_index`.
//!
//! Depth/curve are invariants checked at construction rather than encoded
//! in separate path-segment types.

use crate::curve::Curve;
use crate::error::{KeytreeError, KeytreeResult};
use crate::node::Node;
use crate::path::{PathSegment, Scheme};
use crate::primitives::Primitives;

const PURPOSE: u32 = 44;

/// A [`Node`] restricted to depth 0-5 and `curve == secp256k1`.
pub struct Bip44Node(Node);

impl Bip44Node {
    /// Wrap an existing node, checking the depth/curve invariants.
    pub fn wrap(node: Node) -> KeytreeResult<Self> {
        if node.curve() != Curve::Secp256k1 {
            return Err(KeytreeError::UnsupportedCurve {
                curve: node.curve().name(),
                operation: "bip44",
            });
        }
        if node.depth() > 5 {
            return Err(KeytreeError::InvalidParameters(format!(
                "bip44 node depth {} exceeds the maximum of 5",
                node.depth()
            )));
        }
        Ok(Self(node))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn into_node(self) -> Node {
        self.0
    }

    /// Derive the full `m / 44' / coin_type' / account' / change / address_index`
    /// path from a root node in one call.
    pub async fn from_derivation_path(
        root: &Node,
        coin_type: u32,
        account: u32,
        change: u32,
        address_index: u32,
        primitives: &Primitives,
    ) -> KeytreeResult<Self> {
        let segments = [
            PathSegment::index(Scheme::Bip32, PURPOSE, true)?,
            PathSegment::index(Scheme::Bip32, coin_type, true)?,
            PathSegment::index(Scheme::Bip32, account, true)?,
            PathSegment::index(Scheme::Bip32, change, false)?,
            PathSegment::index(Scheme::Bip32, address_index, false)?,
        ];
        let derived = root.derive(&segments, primitives).await?;
        Self::wrap(derived)
    }
}

/// A [`Bip44Node`] fixed at depth 2 (`m / 44' / coin_type'`).
pub struct CoinTypeNode(Bip44Node);

impl CoinTypeNode {
    pub fn wrap(node: Node) -> KeytreeResult<Self> {
        let wrapped = Bip44Node::wrap(node)?;
        if wrapped.node().depth() != 2 {
            return Err(KeytreeError::InvalidParameters(format!(
                "coin-type node requires depth 2, got {}",
                wrapped.node().depth()
            )));
        }
        Ok(Self(wrapped))
    }

    pub async fn from_root(
        root: &Node,
        coin_type: u32,
        primitives: &Primitives,
    ) -> KeytreeResult<Self> {
        let segments = [
            PathSegment::index(Scheme::Bip32, PURPOSE, true)?,
            PathSegment::index(Scheme::Bip32, coin_type, true)?,
        ];
        let derived = root.derive(&segments, primitives).await?;
        Self::wrap(derived)
    }

    pub fn node(&self) -> &Node {
        self.0.node()
    }
}

/// Collapses depths 3-5 (`account' / change / address_index`) behind a
/// single callable, returned by [`get_bip44_address_key_deriver`].
///
/// Holds an owned [`Node`] (depth 4, `account' / change`) and [`Primitives`]
/// rather than borrowing them, so the deriver can outlive the call that
/// built it.
pub struct AddressKeyDeriver {
    change_node: Node,
    primitives: Primitives,
}

impl AddressKeyDeriver {
    pub async fn derive(&self, address_index: u32) -> KeytreeResult<Node> {
        let segments = [PathSegment::index(Scheme::Bip32, address_index, false)?];
        self.change_node.derive(&segments, &self.primitives).await
    }
}

/// Build a deriver that turns an `address_index` directly into the depth-5
/// `m / 44' / coin_type' / account' / change / address_index` node, given a
/// depth-2 coin-type node plus `account`/`change`.
pub async fn get_bip44_address_key_deriver(
    coin_type_node: &CoinTypeNode,
    account: u32,
    change: u32,
    primitives: &Primitives,
) -> KeytreeResult<AddressKeyDeriver> {
    let segments = [
        PathSegment::index(Scheme::Bip32, account, true)?,
        PathSegment::index(Scheme::Bip32, change, false)?,
    ];
    let change_node = coin_type_node.node().derive(&segments, primitives).await?;
    Ok(AddressKeyDeriver {
        change_node,
        primitives: primitives.clone(),
    })
}

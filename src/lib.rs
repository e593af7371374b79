//! # hd-keytree
//!
//! Hierarchical deterministic key derivation over secp256k1, ed25519 and
//! ed25519Bip32 — BIP-32, SLIP-10, and CIP-3 (BIP32-Ed25519 / Icarus).
//!
//! Given a BIP-39 mnemonic (or a raw seed/entropy) and a derivation path,
//! this crate produces child key [`Node`]s that expose private key, public
//! key, chain code, extended-key serialization, and (for secp256k1)
//! Ethereum addresses.
//!
//! ## Quick start
//!
//! ```no_run
//! # async fn run() -> Result<(), hd_keytree::KeytreeError> {
//! use hd_keytree::{master, Curve, Network, Primitives};
//! use hd_keytree::bip44::{get_bip44_address_key_deriver, CoinTypeNode};
//!
//! let primitives = Primitives::builtin();
//! let root = master::from_mnemonic(
//!     "romance hurry grit huge rifle ordinary loud toss sound congress upset twist",
//!     "",
//!     Curve::Secp256k1,
//!     Network::Mainnet,
//!     &primitives,
//! )
//! .await?;
//!
//! let coin_type_node = CoinTypeNode::from_root(&root, 60, &primitives).await?;
//! let deriver = get_bip44_address_key_deriver(&coin_type_node, 0, 0, &primitives).await?;
//! let first_address_node = deriver.derive(0).await?;
//! println!("{}", first_address_node.address()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module map
//!
//! - [`curve`] — the curve abstraction: secp256k1, ed25519, ed25519Bip32.
//! - [`primitives`] — pluggable HMAC-SHA-512 / PBKDF2-SHA-512.
//! - [`path`] — path segment grammar and structural validation.
//! - [`master`] — master-seed generation, `slip10` and `cip3Icarus`.
//! - [`derive`] — the BIP-32/SLIP-10 and CIP-3 step derivers.
//! - [`node`] — the immutable [`Node`] type.
//! - [`xkey`] — extended-key (xprv/xpub) base58check codec.
//! - [`bip44`] — BIP-44 depth-bound wrappers.
//!
//! This is a pure derivation library: no logging, no configuration surface,
//! no network I/O. Entry points that touch pluggable cryptographic
//! primitives are `async fn`, built on `tokio` but independent of any
//! particular runtime — callers bring their own executor.

pub mod bip44;
pub mod curve;
pub mod derive;
pub mod error;
pub mod master;
pub mod node;
pub mod path;
pub mod primitives;
pub mod secret;
pub mod xkey;

pub use curve::Curve;
pub use error::{KeytreeError, KeytreeResult};
pub use node::{Network, Node, NodeJson, NodeParts};
pub use path::{Path, PathSegment, Scheme, SegmentValue};
pub use primitives::{HmacSha512Fn, Pbkdf2Sha512Fn, Primitives};
pub use secret::SecretBytes;

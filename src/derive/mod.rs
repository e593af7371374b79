//! Step derivers: one-step private→child and public→child derivation,
//! dispatched per node curve by [`crate::node::Node::derive`].

pub mod bip32;
pub mod cip3;

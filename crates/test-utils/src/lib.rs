//! Test utilities for Alephium multisig components.
//!
//! This crate provides deterministic signer keys and in-memory stand-ins for the full node
//! and the explorer, so the engine and server can be exercised end to end without network
//! access.
//!
//! - [`TestSigner`] - secp256k1 key pairs that sign transaction ids
//! - [`MockNode`] - a [`NodeApi`](alephium_multisig_client::NodeApi) fake that builds real
//!   unsigned transaction bytes and records every call
//! - [`MockExplorer`] - an [`ExplorerApi`](alephium_multisig_client::ExplorerApi) fake that
//!   indexes transactions after a configurable number of polls

mod explorer;
mod keys;
mod node;

pub use self::{
    explorer::MockExplorer,
    keys::{TestSigner, descriptor, p2pkh_address},
    node::{MockNode, NodeCall},
};

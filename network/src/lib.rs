//! Obscura P2P networking placeholder.
//!
//! Block and transaction gossip, peer discovery, and sync all live outside
//! `obscura-core`'s scope — this crate is the seam where they'll attach
//! once built; for now it only declares the shape of a gossip message.

use serde::{Deserialize, Serialize};

/// A block or transaction announced to peers. The payload is the
/// `obscura-core` codec image of the underlying entity; this crate does
/// not decode it itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GossipMessage {
    Block(Vec<u8>),
    Transaction(Vec<u8>),
}

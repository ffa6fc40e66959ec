//! Domain conditions that make a store operation refuse to apply.

use thiserror::Error;

/// Reasons a store operation was rejected. The store is left unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A pool or player already uses the requested name.
    #[error("pool or player with name \"{0}\" already exists")]
    NameTaken(String),

    /// Loot still names the pool as its source.
    #[error("pool \"{0}\" is the source of existing loot; delete that loot first")]
    PoolIsLootSource(String),

    /// The pool is a player pool.
    #[error("pool \"{0}\" belongs to a player; delete the player instead")]
    PoolOwnedByPlayer(String),
}

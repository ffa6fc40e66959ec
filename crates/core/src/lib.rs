#![warn(clippy::all, missing_docs)]

//! Core domain logic for Loot Keeper.
//!
//! This crate hosts the loot, pool and player models, the observable store
//! and its import reconciliation, the persistence adapter, and configuration
//! handling used by the command-line front end and any future frontends.

pub mod catalog;
pub mod config;
pub mod keeper;
pub mod models;
pub mod reconcile;
pub mod storage;
pub mod store;

pub use config::AppConfig;
pub use keeper::{ImportError, LootKeeper};
pub use models::{Loot, LootType, Player, Pool, Snapshot, Stat};
pub use reconcile::ImportMode;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{Store, StoreError, SubscriptionId};

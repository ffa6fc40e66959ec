//! Persistence adapter around the [`Store`].
//!
//! [`LootKeeper`] restores the store from durable storage on start-up, writes
//! every published collection back under its own key, and converts between the
//! stored collections and the combined export document.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    models::Snapshot,
    reconcile::ImportMode,
    storage::KeyValueStorage,
    store::Store,
};

/// Storage key of the loot definitions.
pub const LOOT_KEY: &str = "lootDefs";
/// Storage key of the pools.
pub const POOL_KEY: &str = "poolDefs";
/// Storage key of the players.
pub const PLAYER_KEY: &str = "playerDefs";
/// File name used for exports.
pub const EXPORT_FILE_NAME: &str = "loot-keeper-export.json";

/// Reasons an import was not applied. State is unchanged in every case.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Only `.json` files are accepted.
    #[error("import file must have a .json extension: {0}")]
    NotJson(PathBuf),

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being imported.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The text is not JSON or lacks one of the three collections.
    #[error("import is not a valid loot keeper document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Owns the store and mirrors it into durable storage.
pub struct LootKeeper {
    store: Store,
    storage: Arc<dyn KeyValueStorage>,
}

impl LootKeeper {
    /// Restore state from `storage`, falling back to the default catalog when
    /// nothing usable is stored. Never fails.
    pub fn open(storage: Arc<dyn KeyValueStorage>) -> Self {
        let restored = match load_snapshot(storage.as_ref()) {
            Ok(Some(snapshot)) => {
                info!(
                    loots = snapshot.loots.len(),
                    pools = snapshot.pools.len(),
                    players = snapshot.players.len(),
                    "restored saved state"
                );
                Some(snapshot)
            }
            Ok(None) => {
                info!("no saved state found; starting from the default catalog");
                None
            }
            Err(err) => {
                warn!("failed to restore saved state ({err:#}); starting from the default catalog");
                None
            }
        };

        let needs_reset = restored.is_none();
        let mut store = Store::from_snapshot(restored.unwrap_or_default());
        mirror(&mut store, &storage);
        if needs_reset {
            store.reset_defs();
        }

        Self { store, storage }
    }

    /// Borrow the store for queries.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Borrow the store to run operations. Every change is persisted.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Build the combined export document from the stored collections.
    pub fn export_document(&self) -> anyhow::Result<String> {
        let loots = read_stored_value(self.storage.as_ref(), LOOT_KEY)?;
        let pools = read_stored_value(self.storage.as_ref(), POOL_KEY)?;
        let players = read_stored_value(self.storage.as_ref(), PLAYER_KEY)?;
        let mut document = Map::new();
        document.insert(LOOT_KEY.to_string(), loots);
        document.insert(POOL_KEY.to_string(), pools);
        document.insert(PLAYER_KEY.to_string(), players);
        serde_json::to_string_pretty(&document).context("failed to serialize export document")
    }

    /// Write the export document to `path`.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let document = self.export_document()?;
        fs::write(path, document).with_context(|| format!("failed to write {}", path.display()))?;
        info!("exported state to {}", path.display());
        Ok(())
    }

    /// Read a `.json` file and merge it into the store.
    pub async fn import_file(
        &mut self,
        path: impl AsRef<Path>,
        mode: ImportMode,
    ) -> Result<(), ImportError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            let err = ImportError::NotJson(path.to_path_buf());
            warn!("{err}");
            return Err(err);
        }

        let text = tokio::fs::read_to_string(path).await.map_err(|source| {
            let err = ImportError::Read {
                path: path.to_path_buf(),
                source,
            };
            warn!("{err}");
            err
        })?;
        self.import_str(&text, mode)
    }

    /// Parse a combined document and merge it into the store.
    pub fn import_str(&mut self, text: &str, mode: ImportMode) -> Result<(), ImportError> {
        let snapshot: Snapshot = serde_json::from_str(text).map_err(|err| {
            warn!("rejected import: {err}");
            ImportError::Malformed(err)
        })?;
        self.store.apply_import(snapshot, mode);
        Ok(())
    }
}

/// Load all three collections, or `None` if any of them has never been stored.
fn load_snapshot(storage: &dyn KeyValueStorage) -> anyhow::Result<Option<Snapshot>> {
    let (Some(loots), Some(pools), Some(players)) = (
        storage.get(LOOT_KEY)?,
        storage.get(POOL_KEY)?,
        storage.get(PLAYER_KEY)?,
    ) else {
        return Ok(None);
    };

    Ok(Some(Snapshot {
        loots: parse_stored(LOOT_KEY, &loots)?,
        pools: parse_stored(POOL_KEY, &pools)?,
        players: parse_stored(PLAYER_KEY, &players)?,
    }))
}

fn parse_stored<T: DeserializeOwned>(key: &str, raw: &str) -> anyhow::Result<T> {
    serde_json::from_str(raw).with_context(|| format!("failed to parse stored {key}"))
}

fn read_stored_value(storage: &dyn KeyValueStorage, key: &str) -> anyhow::Result<Value> {
    let raw = storage
        .get(key)?
        .ok_or_else(|| anyhow!("nothing stored under {key}"))?;
    parse_stored(key, &raw)
}

fn mirror(store: &mut Store, storage: &Arc<dyn KeyValueStorage>) {
    let target = Arc::clone(storage);
    store.subscribe_loots(move |loots| save_defs(target.as_ref(), LOOT_KEY, loots));
    let target = Arc::clone(storage);
    store.subscribe_pools(move |pools| save_defs(target.as_ref(), POOL_KEY, pools));
    let target = Arc::clone(storage);
    store.subscribe_players(move |players| save_defs(target.as_ref(), PLAYER_KEY, players));
}

fn save_defs<T: Serialize>(storage: &dyn KeyValueStorage, key: &str, value: &T) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(err) => {
            warn!("failed to serialize {key}: {err}");
            return;
        }
    };
    match storage.set(key, &json) {
        Ok(()) => debug!(key, bytes = json.len(), "saved collection"),
        Err(err) => warn!("failed to save {key}: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Loot, LootType, Player, Pool},
        storage::{FileStorage, MemoryStorage},
        store::partition_violations,
    };
    use tempfile::tempdir;

    fn memory() -> Arc<dyn KeyValueStorage> {
        Arc::new(MemoryStorage::new())
    }

    fn stored<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> T {
        let raw = storage
            .get(key)
            .expect("memory storage cannot fail")
            .expect("key should be stored");
        serde_json::from_str(&raw).expect("stored value should parse")
    }

    #[test]
    fn empty_storage_starts_from_defaults_and_persists_them() {
        let storage = memory();
        let keeper = LootKeeper::open(storage.clone());

        assert_eq!(keeper.store().loots().len(), 47);
        assert!(keeper.store().players().is_empty());
        let loots: Vec<Loot> = stored(storage.as_ref(), LOOT_KEY);
        let pools: Vec<Pool> = stored(storage.as_ref(), POOL_KEY);
        let players: Vec<Player> = stored(storage.as_ref(), PLAYER_KEY);
        assert_eq!(loots, keeper.store().loots());
        assert_eq!(pools, keeper.store().pools());
        assert!(players.is_empty());
    }

    #[test]
    fn every_operation_is_mirrored() {
        let storage = memory();
        let mut keeper = LootKeeper::open(storage.clone());

        keeper.store_mut().add_player("Alice").expect("name is free");
        keeper.store_mut().move_loot_to_pool(2, 6);

        let players: Vec<Player> = stored(storage.as_ref(), PLAYER_KEY);
        let pools: Vec<Pool> = stored(storage.as_ref(), POOL_KEY);
        assert_eq!(players[0].name, "Alice");
        assert_eq!(pools[6].loots, vec![2]);
    }

    #[test]
    fn saved_state_is_restored_on_open() {
        let storage = memory();
        let mut first = LootKeeper::open(storage.clone());
        first.store_mut().add_player("Bob").expect("name is free");
        first.store_mut().remove_loot_def(0);
        let expected = first.store().snapshot();
        drop(first);

        let second = LootKeeper::open(storage);
        assert_eq!(second.store().snapshot(), expected);
    }

    #[test]
    fn partial_or_corrupt_storage_falls_back_to_defaults() {
        let storage = memory();
        storage.set(LOOT_KEY, "[]").expect("memory storage cannot fail");
        storage.set(POOL_KEY, "[]").expect("memory storage cannot fail");
        let keeper = LootKeeper::open(storage.clone());
        assert_eq!(keeper.store().loots().len(), 47);

        storage.set(PLAYER_KEY, "{not json").expect("memory storage cannot fail");
        let keeper = LootKeeper::open(storage.clone());
        assert_eq!(keeper.store().loots().len(), 47);
        let players: Vec<Player> = stored(storage.as_ref(), PLAYER_KEY);
        assert!(players.is_empty());
    }

    #[test]
    fn export_then_override_import_round_trips() {
        let mut keeper = LootKeeper::open(memory());
        keeper.store_mut().add_player("Alice").expect("name is free");
        keeper.store_mut().move_loot_to_pool(0, 6);
        keeper.store_mut().drain_loot(0);
        let before = keeper.store().snapshot();
        let exported = keeper.export_document().expect("export should succeed");

        keeper.store_mut().reset_defs();
        keeper.store_mut().add_pool("Scratch").expect("name is free");
        keeper
            .import_str(&exported, ImportMode::Override)
            .expect("export should import");

        assert_eq!(keeper.store().snapshot(), before);
    }

    #[test]
    fn export_document_uses_combined_keys() {
        let keeper = LootKeeper::open(memory());
        let exported = keeper.export_document().expect("export should succeed");
        let value: Value = serde_json::from_str(&exported).expect("export is json");
        let object = value.as_object().expect("export is an object");
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["lootDefs", "playerDefs", "poolDefs"]);
    }

    #[test]
    fn malformed_import_leaves_state_unchanged() {
        let mut keeper = LootKeeper::open(memory());
        let before = keeper.store().snapshot();

        let not_json = keeper.import_str("{oops", ImportMode::Override);
        let missing_players =
            keeper.import_str(r#"{"lootDefs": [], "poolDefs": []}"#, ImportMode::Override);

        assert!(matches!(not_json, Err(ImportError::Malformed(_))));
        assert!(matches!(missing_players, Err(ImportError::Malformed(_))));
        assert_eq!(keeper.store().snapshot(), before);
    }

    #[test]
    fn add_new_loot_only_import_adds_one_item() {
        let mut keeper = LootKeeper::open(memory());
        keeper.store_mut().add_player("Alice").expect("name is free");
        let before = keeper.store().snapshot();

        let mut incoming = before.clone();
        incoming
            .loots
            .push(Loot::new("Glass Blade", LootType::Weapon, "Shards"));
        incoming.players.clear();
        let document = serde_json::to_string(&incoming).expect("snapshot serializes");

        keeper
            .import_str(&document, ImportMode::AddNewLootOnly)
            .expect("import should apply");

        let after = keeper.store().snapshot();
        assert_eq!(after.loots.len(), before.loots.len() + 1);
        assert_eq!(after.players, before.players);
        let shards = after
            .pools
            .iter()
            .find(|pool| pool.name == "Shards")
            .expect("source pool is created");
        assert_eq!(shards.loots, vec![before.loots.len()]);
        assert!(partition_violations(&after).is_empty());
    }

    #[tokio::test]
    async fn import_file_reads_json_documents() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(dir.path().join("data")));
        let mut keeper = LootKeeper::open(storage);
        keeper.store_mut().add_player("Bob")?;
        let exported = dir.path().join(EXPORT_FILE_NAME);
        keeper.export_to_file(&exported)?;
        let expected = keeper.store().snapshot();

        keeper.store_mut().reset_defs();
        keeper.import_file(&exported, ImportMode::default()).await?;

        assert_eq!(keeper.store().snapshot(), expected);
        Ok(())
    }

    #[tokio::test]
    async fn import_file_rejects_other_extensions_and_missing_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let text_file = dir.path().join("state.txt");
        fs::write(&text_file, "{}")?;
        let mut keeper = LootKeeper::open(memory());
        let before = keeper.store().snapshot();

        let wrong_extension = keeper.import_file(&text_file, ImportMode::Override).await;
        let missing = keeper
            .import_file(dir.path().join("missing.json"), ImportMode::Override)
            .await;

        assert!(matches!(wrong_extension, Err(ImportError::NotJson(_))));
        assert!(matches!(missing, Err(ImportError::Read { .. })));
        assert_eq!(keeper.store().snapshot(), before);
        Ok(())
    }
}

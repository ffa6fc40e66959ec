use std::{io::Write, path::PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lootkeeper_core::{AppConfig, ImportMode, Loot, LootKeeper, LootType, Stat, Store};
use tracing::info;

/// Track loot, pools and players for a tabletop campaign.
#[derive(Debug, Parser)]
#[command(name = "lootkeeper", version, long_about = None)]
pub struct Cli {
    /// Defaults to `show`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Loot is addressed by its index or its name, pools and players by name.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Summary of pools and players
    Show,

    /// Restore the default catalog and pools, removing every player
    Reset,

    /// Write the export document into DIR
    Export {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Merge a .json export into the current state
    Import {
        file: PathBuf,
        /// override, add-new-loot-only or update-and-add
        mode: Option<ImportMode>,
    },

    /// Define new loot and file it under its source pool
    AddLoot {
        name: String,
        #[arg(long = "type", value_enum)]
        kind: LootKind,
        /// Pool the loot comes from; created if missing
        #[arg(long)]
        source: String,
        #[arg(long, default_value = "")]
        basic: String,
        #[arg(long, default_value = "")]
        charged: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete a loot definition
    RemoveLoot { loot: String },

    /// Create a player together with its pool
    AddPlayer { name: String },

    /// Delete a player, returning its loot to the source pools
    RemovePlayer { name: String },

    /// Create an empty pool
    AddPool { name: String },

    /// Delete a pool, returning its loot to the source pools
    RemovePool { name: String },

    /// Move loot into another pool
    Move { loot: String, pool: String },

    /// Charge loot and send it back to its source pool
    Return { loot: String },

    /// Mark loot held by a player as drained
    Drain { loot: String },

    /// Mark loot held by a player as charged
    Charge { loot: String },

    /// Add DELTA to a player's current stat, or its maximum with --max
    Stat {
        player: String,
        #[arg(value_enum)]
        stat: StatKind,
        #[arg(allow_negative_numbers = true)]
        delta: i32,
        #[arg(long)]
        max: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LootKind {
    Weapon,
    Clothing,
    MagicItem,
    Consumable,
}

impl From<LootKind> for LootType {
    fn from(kind: LootKind) -> Self {
        match kind {
            LootKind::Weapon => LootType::Weapon,
            LootKind::Clothing => LootType::Clothing,
            LootKind::MagicItem => LootType::MagicItem,
            LootKind::Consumable => LootType::Consumable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatKind {
    Health,
    Armor,
    Force,
    Flow,
    Focus,
}

impl From<StatKind> for Stat {
    fn from(kind: StatKind) -> Self {
        match kind {
            StatKind::Health => Stat::Health,
            StatKind::Armor => Stat::Armor,
            StatKind::Force => Stat::Force,
            StatKind::Flow => Stat::Flow,
            StatKind::Focus => Stat::Focus,
        }
    }
}

/// Run `command` against the keeper, writing user-facing output to `out`.
///
/// Refused store operations surface their [`StoreError`](lootkeeper_core::StoreError)
/// as the returned error and leave the state untouched.
pub async fn run(
    keeper: &mut LootKeeper,
    config: &AppConfig,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Show => print_summary(keeper.store(), out)?,
        Command::Reset => {
            keeper.store_mut().reset_defs();
            writeln!(out, "Restored the default catalog.")?;
        }
        Command::Export { dir } => {
            let path = dir.join(&config.export_file_name);
            keeper.export_to_file(&path)?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        Command::Import { file, mode } => {
            let mode = mode.unwrap_or(config.default_import_mode);
            keeper
                .import_file(&file, mode)
                .await
                .with_context(|| format!("failed to import {}", file.display()))?;
            info!("imported {} using {mode}", file.display());
            let store = keeper.store();
            writeln!(
                out,
                "Imported {} ({mode}): {} loots, {} pools, {} players",
                file.display(),
                store.loots().len(),
                store.pools().len(),
                store.players().len()
            )?;
        }
        Command::AddLoot {
            name,
            kind,
            source,
            basic,
            charged,
            description,
        } => {
            let loot = Loot::new(name, kind.into(), source)
                .with_basic(basic)
                .with_charged(charged)
                .with_description(description);
            writeln!(out, "Added {} to {}", loot.name, loot.source_pool)?;
            keeper.store_mut().add_loot_def(loot);
        }
        Command::RemoveLoot { loot } => {
            let store = keeper.store();
            let index = find_loot(store, &loot)?;
            let name = store.loots()[index].name.clone();
            let holder = store
                .pool_of_loot(index)
                .map(|pool| pool.name.clone())
                .unwrap_or_else(|| "no pool".to_string());
            keeper.store_mut().remove_loot_def(index);
            writeln!(out, "Removed {name} (held by {holder})")?;
        }
        Command::AddPlayer { name } => {
            keeper.store_mut().add_player(&name)?;
            writeln!(out, "Added player {name}")?;
        }
        Command::RemovePlayer { name } => {
            let player = find_player(keeper.store(), &name)?;
            keeper.store_mut().remove_player(player)?;
            writeln!(out, "Removed player {name}")?;
        }
        Command::AddPool { name } => {
            keeper.store_mut().add_pool(&name)?;
            writeln!(out, "Added pool {name}")?;
        }
        Command::RemovePool { name } => {
            let pool = find_pool(keeper.store(), &name)?;
            keeper.store_mut().remove_pool(pool)?;
            writeln!(out, "Removed pool {name}")?;
        }
        Command::Move { loot, pool } => {
            let store = keeper.store();
            let index = find_loot(store, &loot)?;
            let target = find_pool(store, &pool)?;
            if store.pool_index_of_loot(index).is_none() {
                bail!("loot '{loot}' is not in any pool");
            }
            let name = store.loots()[index].name.clone();
            keeper.store_mut().move_loot_to_pool(index, target);
            writeln!(out, "Moved {name} to {pool}")?;
        }
        Command::Return { loot } => {
            let store = keeper.store();
            let index = find_loot(store, &loot)?;
            let def = &store.loots()[index];
            let (name, source) = (def.name.clone(), def.source_pool.clone());
            let target = find_pool(store, &source)?;
            keeper.store_mut().charge_loot(index);
            keeper.store_mut().move_loot_to_pool(index, target);
            writeln!(out, "Returned {name} to {source}")?;
        }
        Command::Drain { loot } => {
            let (index, name) = held_loot(keeper.store(), &loot)?;
            keeper.store_mut().drain_loot(index);
            writeln!(out, "Drained {name}")?;
        }
        Command::Charge { loot } => {
            let (index, name) = held_loot(keeper.store(), &loot)?;
            keeper.store_mut().charge_loot(index);
            writeln!(out, "Charged {name}")?;
        }
        Command::Stat {
            player,
            stat,
            delta,
            max,
        } => {
            let index = find_player(keeper.store(), &player)?;
            let stat = Stat::from(stat);
            let slot = if max { stat.max_slot() } else { stat.current_slot() };
            keeper.store_mut().add_to_stat(index, slot, delta);
            let updated = &keeper.store().players()[index];
            writeln!(
                out,
                "{player} {} {}/{}",
                stat.label(),
                updated.current(stat),
                updated.max(stat)
            )?;
        }
    }
    Ok(())
}

fn find_loot(store: &Store, loot: &str) -> Result<usize> {
    if let Ok(index) = loot.parse::<usize>() {
        if index < store.loots().len() {
            return Ok(index);
        }
    }
    store
        .loots()
        .iter()
        .position(|def| def.name == loot)
        .ok_or_else(|| anyhow!("no loot named '{loot}'"))
}

fn find_pool(store: &Store, name: &str) -> Result<usize> {
    store
        .pools()
        .iter()
        .position(|pool| pool.name == name)
        .ok_or_else(|| anyhow!("no pool named '{name}'"))
}

fn find_player(store: &Store, name: &str) -> Result<usize> {
    store
        .players()
        .iter()
        .position(|player| player.name == name)
        .ok_or_else(|| anyhow!("no player named '{name}'"))
}

/// Loot that sits in a player pool, with its display name.
fn held_loot(store: &Store, loot: &str) -> Result<(usize, String)> {
    let index = find_loot(store, loot)?;
    let held = store
        .pool_index_of_loot(index)
        .and_then(|pool| store.player_of_pool(pool))
        .is_some();
    if !held {
        bail!("loot '{loot}' is not held by a player");
    }
    Ok((index, store.loots()[index].name.clone()))
}

fn print_summary(store: &Store, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Pools")?;
    for (index, pool) in store.pools().iter().enumerate() {
        let owner = store.player_of_pool(index);
        let marker = owner.map(|_| " (player)").unwrap_or_default();
        writeln!(out, "  {} [{}]{marker}", pool.name, pool.loots.len())?;
        for &loot in &pool.loots {
            let Some(def) = store.loots().get(loot) else {
                continue;
            };
            let drained = owner
                .and_then(|player| store.players().get(player))
                .map(|player| player.is_drained(loot))
                .unwrap_or(false);
            let drained = if drained { " (drained)" } else { "" };
            writeln!(out, "    {loot}: {} <{}>{drained}", def.name, def.loot_type)?;
        }
    }

    writeln!(out, "Players")?;
    if store.players().is_empty() {
        writeln!(out, "  (none)")?;
    }
    for player in store.players() {
        let stats = Stat::ALL
            .iter()
            .map(|&stat| {
                format!(
                    "{} {}/{}",
                    stat.label(),
                    player.current(stat),
                    player.max(stat)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(out, "  {}: {stats}", player.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lootkeeper_core::{KeyValueStorage, MemoryStorage, StoreError};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn parse(line: &str) -> Result<Command> {
        let cli = Cli::try_parse_from(std::iter::once("lootkeeper").chain(line.split_whitespace()))?;
        Ok(cli.command.unwrap_or(Command::Show))
    }

    fn keeper() -> LootKeeper {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        LootKeeper::open(storage)
    }

    async fn exec(keeper: &mut LootKeeper, line: &str) -> Result<String> {
        let mut out = Vec::new();
        run(keeper, &AppConfig::default(), parse(line)?, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    fn pool_named<'a>(keeper: &'a LootKeeper, name: &str) -> &'a lootkeeper_core::Pool {
        keeper
            .store()
            .pools()
            .iter()
            .find(|pool| pool.name == name)
            .expect("pool should exist")
    }

    #[test]
    fn parses_commands() -> Result<()> {
        assert_eq!(parse("")?, Command::Show);
        assert_eq!(parse("reset")?, Command::Reset);
        assert_eq!(
            parse("export out")?,
            Command::Export {
                dir: PathBuf::from("out")
            }
        );
        assert_eq!(
            parse("import loot.json update-and-add")?,
            Command::Import {
                file: PathBuf::from("loot.json"),
                mode: Some(ImportMode::UpdateAndAdd),
            }
        );
        assert_eq!(
            parse("stat Ana health -2 --max")?,
            Command::Stat {
                player: "Ana".to_string(),
                stat: StatKind::Health,
                delta: -2,
                max: true,
            }
        );
        assert_eq!(
            parse("add-loot Blade --type magic-item --source City")?,
            Command::AddLoot {
                name: "Blade".to_string(),
                kind: LootKind::MagicItem,
                source: "City".to_string(),
                basic: String::new(),
                charged: String::new(),
                description: String::new(),
            }
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse("import").is_err());
        assert!(parse("import a.json sideways").is_err());
        assert!(parse("reset now").is_err());
        assert!(parse("dance").is_err());
        assert!(parse("add-loot Blade --source City").is_err());
        assert!(parse("stat Ana luck 1").is_err());
    }

    #[tokio::test]
    async fn show_lists_default_pools() -> Result<()> {
        let mut keeper = keeper();
        let text = exec(&mut keeper, "show").await?;

        assert!(text.contains("Loot Pool [28]"));
        assert!(text.contains("Consumable Pool [7]"));
        assert!(text.contains("(none)"));
        Ok(())
    }

    #[tokio::test]
    async fn export_then_import_restores_state() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::default();

        let mut source = keeper();
        source.store_mut().add_player("Ana")?;
        run(
            &mut source,
            &config,
            Command::Export {
                dir: dir.path().to_path_buf(),
            },
            &mut Vec::new(),
        )
        .await?;

        let mut target = keeper();
        run(
            &mut target,
            &config,
            Command::Import {
                file: dir.path().join(&config.export_file_name),
                mode: None,
            },
            &mut Vec::new(),
        )
        .await?;
        assert_eq!(target.store().snapshot(), source.store().snapshot());
        Ok(())
    }

    #[tokio::test]
    async fn import_of_non_json_file_fails() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "{}")?;

        let mut keeper = keeper();
        let before = keeper.store().snapshot();
        let result = run(
            &mut keeper,
            &AppConfig::default(),
            Command::Import {
                file: path,
                mode: None,
            },
            &mut Vec::new(),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(keeper.store().snapshot(), before);
        Ok(())
    }

    #[tokio::test]
    async fn loot_can_be_added_and_removed() -> Result<()> {
        let mut keeper = keeper();
        let count = keeper.store().loots().len();

        exec(&mut keeper, "add-loot Blade --type weapon --source Armory").await?;
        assert_eq!(keeper.store().loots().len(), count + 1);
        assert_eq!(pool_named(&keeper, "Armory").loots, vec![count]);

        let text = exec(&mut keeper, "remove-loot Blade").await?;
        assert!(text.contains("held by Armory"));
        assert_eq!(keeper.store().loots().len(), count);
        assert!(exec(&mut keeper, "remove-loot Blade").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn players_and_pools_report_refusals() -> Result<()> {
        let mut keeper = keeper();
        exec(&mut keeper, "add-player Ana").await?;
        exec(&mut keeper, "add-pool Stash").await?;

        let err = exec(&mut keeper, "add-pool Ana").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<StoreError>(),
            Some(&StoreError::NameTaken("Ana".to_string()))
        );
        let err = exec(&mut keeper, "remove-pool Ana").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::PoolOwnedByPlayer(_))
        ));
        let err = exec(&mut keeper, "remove-pool City").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::PoolIsLootSource(_))
        ));

        exec(&mut keeper, "remove-pool Stash").await?;
        exec(&mut keeper, "remove-player Ana").await?;
        assert!(keeper.store().players().is_empty());
        assert!(keeper.store().pools().iter().all(|pool| pool.name != "Stash"));
        Ok(())
    }

    #[tokio::test]
    async fn loot_moves_drains_and_returns_to_its_source() -> Result<()> {
        let mut keeper = keeper();
        exec(&mut keeper, "add-player Ana").await?;

        exec(&mut keeper, "move 0 Ana").await?;
        assert!(pool_named(&keeper, "Ana").contains(0));
        assert!(exec(&mut keeper, "drain 1").await.is_err());

        exec(&mut keeper, "drain 0").await?;
        assert!(keeper.store().players()[0].is_drained(0));
        exec(&mut keeper, "charge 0").await?;
        assert!(!keeper.store().players()[0].is_drained(0));

        exec(&mut keeper, "drain 0").await?;
        exec(&mut keeper, "return 0").await?;
        let source = keeper.store().loots()[0].source_pool.clone();
        assert!(pool_named(&keeper, &source).contains(0));
        assert!(keeper.store().players()[0].drained.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stat_adjusts_current_or_max() -> Result<()> {
        let mut keeper = keeper();
        exec(&mut keeper, "add-player Ana").await?;

        let text = exec(&mut keeper, "stat Ana health -3").await?;
        assert_eq!(text.trim(), "Ana Health -1/2");
        exec(&mut keeper, "stat Ana focus 2 --max").await?;
        assert_eq!(keeper.store().players()[0].max(Stat::Focus), 3);
        assert!(exec(&mut keeper, "stat Bob health 1").await.is_err());
        Ok(())
    }
}

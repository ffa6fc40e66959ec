//! Merge strategies for imported snapshots.
//!
//! Loot carries no identifier, so imported loot is matched against existing
//! loot by full structural equality. Pools and players are matched by name.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Loot, Player, Pool, Snapshot};

/// How an imported snapshot is combined with the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportMode {
    /// Discard the current state and adopt the import verbatim.
    #[default]
    Override,
    /// Append loot that does not exist yet; leave pools' contents and players alone.
    AddNewLootOnly,
    /// Take pool contents and players from the import, keeping anything it does not mention.
    UpdateAndAdd,
}

impl ImportMode {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            ImportMode::Override => "Override",
            ImportMode::AddNewLootOnly => "Add New Loot Only",
            ImportMode::UpdateAndAdd => "Update and Add",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when an import mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown import mode '{0}' (expected override, add-new-loot-only or update-and-add)")]
pub struct UnknownImportMode(pub String);

impl FromStr for ImportMode {
    type Err = UnknownImportMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "override" => Ok(ImportMode::Override),
            "addnewlootonly" | "addnew" => Ok(ImportMode::AddNewLootOnly),
            "updateandadd" | "update" => Ok(ImportMode::UpdateAndAdd),
            _ => Err(UnknownImportMode(s.to_string())),
        }
    }
}

/// Combine `incoming` with `current` according to `mode`.
pub fn merge(current: &Snapshot, incoming: Snapshot, mode: ImportMode) -> Snapshot {
    match mode {
        ImportMode::Override => incoming,
        ImportMode::AddNewLootOnly => add_new_loot_only(current, &incoming),
        ImportMode::UpdateAndAdd => update_and_add(current, &incoming),
    }
}

/// Outcome of matching imported loot against existing loot.
struct LootMatch {
    /// Current loot followed by every unmatched imported loot.
    loots: Vec<Loot>,
    /// Imported loot index to combined loot index.
    mapping: Vec<usize>,
    /// Combined indices of the appended loot.
    added: Vec<usize>,
}

impl LootMatch {
    fn remap(&self, indices: &[usize]) -> Vec<usize> {
        indices
            .iter()
            .filter_map(|index| self.mapping.get(*index).copied())
            .collect()
    }
}

/// Each existing loot can absorb at most one imported loot; the first
/// unconsumed equal loot wins, in imported order.
fn match_loots(current: &[Loot], incoming: &[Loot]) -> LootMatch {
    let mut loots = current.to_vec();
    let mut consumed = vec![false; current.len()];
    let mut mapping = Vec::with_capacity(incoming.len());
    let mut added = Vec::new();

    for loot in incoming {
        let found = current
            .iter()
            .enumerate()
            .position(|(index, existing)| !consumed[index] && existing == loot);
        match found {
            Some(index) => {
                consumed[index] = true;
                mapping.push(index);
            }
            None => {
                let index = loots.len();
                loots.push(loot.clone());
                mapping.push(index);
                added.push(index);
            }
        }
    }

    LootMatch {
        loots,
        mapping,
        added,
    }
}

fn add_new_loot_only(current: &Snapshot, incoming: &Snapshot) -> Snapshot {
    let matched = match_loots(&current.loots, &incoming.loots);
    let mut pools = current.pools.clone();
    for index in &matched.added {
        route_to_source(&mut pools, &matched.loots, *index);
    }

    Snapshot {
        loots: matched.loots,
        pools,
        players: current.players.clone(),
    }
}

fn update_and_add(current: &Snapshot, incoming: &Snapshot) -> Snapshot {
    let matched = match_loots(&current.loots, &incoming.loots);

    // A combined loot index may only be claimed by the first imported pool listing it.
    let mut claimed = HashSet::new();
    let updated: Vec<Pool> = incoming
        .pools
        .iter()
        .map(|pool| {
            let loots = matched
                .remap(&pool.loots)
                .into_iter()
                .filter(|index| claimed.insert(*index))
                .collect();
            Pool::with_loots(pool.name.clone(), loots)
        })
        .collect();

    let mut pools: Vec<Pool> = current
        .pools
        .iter()
        .map(|pool| {
            let mut loots: Vec<usize> = pool
                .loots
                .iter()
                .copied()
                .filter(|index| !claimed.contains(index))
                .collect();
            if let Some(update) = updated.iter().find(|update| update.name == pool.name) {
                loots.extend(update.loots.iter().copied());
            }
            Pool::with_loots(pool.name.clone(), loots)
        })
        .collect();
    for update in &updated {
        if !pools.iter().any(|pool| pool.name == update.name) {
            pools.push(update.clone());
        }
    }

    let pooled: HashSet<usize> = pools
        .iter()
        .flat_map(|pool| pool.loots.iter().copied())
        .collect();
    for index in 0..matched.loots.len() {
        if !pooled.contains(&index) {
            route_to_source(&mut pools, &matched.loots, index);
        }
    }

    let mut updated_players = Vec::with_capacity(incoming.players.len());
    for player in &incoming.players {
        let pool_name = pool_name_of(&incoming.pools, player);
        let pool = pool_index_or_create(&mut pools, &pool_name);
        updated_players.push(Player {
            name: player.name.clone(),
            pool,
            stats: player.stats,
            drained: matched.remap(&player.drained),
        });
    }

    let mut players = Vec::with_capacity(current.players.len() + updated_players.len());
    for player in &current.players {
        match updated_players.iter().find(|update| update.name == player.name) {
            Some(update) => players.push(update.clone()),
            None => {
                let pool_name = pool_name_of(&current.pools, player);
                let mut kept = player.clone();
                kept.pool = pool_index_or_create(&mut pools, &pool_name);
                players.push(kept);
            }
        }
    }
    for update in updated_players {
        if !current.players.iter().any(|player| player.name == update.name) {
            players.push(update);
        }
    }

    for player in &mut players {
        let own = &pools[player.pool];
        player.drained.retain(|index| own.contains(*index));
    }

    Snapshot {
        loots: matched.loots,
        pools,
        players,
    }
}

/// Append loot `index` to the pool named by its source, creating that pool if needed.
fn route_to_source(pools: &mut Vec<Pool>, loots: &[Loot], index: usize) {
    let source = &loots[index].source_pool;
    match pools.iter_mut().find(|pool| &pool.name == source) {
        Some(pool) => pool.loots.push(index),
        None => pools.push(Pool::with_loots(source.clone(), vec![index])),
    }
}

fn pool_name_of(pools: &[Pool], player: &Player) -> String {
    pools
        .get(player.pool)
        .map(|pool| pool.name.clone())
        .unwrap_or_else(|| player.name.clone())
}

fn pool_index_or_create(pools: &mut Vec<Pool>, name: &str) -> usize {
    match pools.iter().position(|pool| pool.name == name) {
        Some(index) => index,
        None => {
            pools.push(Pool::new(name));
            pools.len() - 1
        }
    }
}

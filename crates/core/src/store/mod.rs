//! Observable loot, pool and player state.
//!
//! The [`Store`] owns the three collections and is the only place that
//! juggles positional loot and pool indices. Every operation computes the new
//! collections first and publishes them afterwards, so subscribers never see
//! a half-applied change.

mod error;
mod observable;

use std::collections::HashSet;

use tracing::{debug, info, warn};

pub use error::StoreError;
pub use observable::{Observable, SubscriptionId};

use crate::{
    catalog::{self, CONSUMABLE_POOL, INITIATE_SOURCE, LOOT_POOL, STARTER_SOURCE},
    models::{Loot, Player, Pool, Snapshot, CONSUMABLE_SOURCE, STAT_SLOTS},
    reconcile::{self, ImportMode},
};

/// Central state holder for the tracker.
pub struct Store {
    loots: Observable<Vec<Loot>>,
    pools: Observable<Vec<Pool>>,
    players: Observable<Vec<Player>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store with no loot, pools or players.
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    /// Create a store holding the given state.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            loots: Observable::new(snapshot.loots),
            pools: Observable::new(snapshot.pools),
            players: Observable::new(snapshot.players),
        }
    }

    /// Create a store seeded with the default catalog.
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.reset_defs();
        store
    }

    /// Current loot definitions.
    pub fn loots(&self) -> &[Loot] {
        self.loots.get()
    }

    /// Current pools.
    pub fn pools(&self) -> &[Pool] {
        self.pools.get()
    }

    /// Current players.
    pub fn players(&self) -> &[Player] {
        self.players.get()
    }

    /// Copy of all three collections.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            loots: self.loots().to_vec(),
            pools: self.pools().to_vec(),
            players: self.players().to_vec(),
        }
    }

    /// Subscribe to the loot collection. The callback runs immediately.
    pub fn subscribe_loots(
        &mut self,
        subscriber: impl FnMut(&Vec<Loot>) + Send + 'static,
    ) -> SubscriptionId {
        self.loots.subscribe(subscriber)
    }

    /// Subscribe to the pool collection. The callback runs immediately.
    pub fn subscribe_pools(
        &mut self,
        subscriber: impl FnMut(&Vec<Pool>) + Send + 'static,
    ) -> SubscriptionId {
        self.pools.subscribe(subscriber)
    }

    /// Subscribe to the player collection. The callback runs immediately.
    pub fn subscribe_players(
        &mut self,
        subscriber: impl FnMut(&Vec<Player>) + Send + 'static,
    ) -> SubscriptionId {
        self.players.subscribe(subscriber)
    }

    /// Remove a subscription from whichever collection it was registered on.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.loots.unsubscribe(id) || self.pools.unsubscribe(id) || self.players.unsubscribe(id)
    }

    /// Index of the pool currently holding `loot`.
    pub fn pool_index_of_loot(&self, loot: usize) -> Option<usize> {
        self.pools().iter().position(|pool| pool.contains(loot))
    }

    /// Pool currently holding `loot`.
    pub fn pool_of_loot(&self, loot: usize) -> Option<&Pool> {
        self.pool_index_of_loot(loot)
            .and_then(|index| self.pools().get(index))
    }

    /// Index of the player owning pool `pool`, if it is a player pool.
    pub fn player_of_pool(&self, pool: usize) -> Option<usize> {
        self.players().iter().position(|player| player.pool == pool)
    }

    /// Replace everything with the default catalog and its initial pools.
    pub fn reset_defs(&mut self) {
        let loots = catalog::default_loots();
        let pools = initial_pools(&loots);
        info!(
            loots = loots.len(),
            pools = pools.len(),
            "resetting to default catalog"
        );
        self.loots.publish(loots);
        self.pools.publish(pools);
        self.players.publish(Vec::new());
    }

    /// Replace everything with `snapshot`, publishing all three collections.
    pub fn replace(&mut self, snapshot: Snapshot) {
        self.loots.publish(snapshot.loots);
        self.pools.publish(snapshot.pools);
        self.players.publish(snapshot.players);
    }

    /// Merge an imported snapshot into the current state.
    pub fn apply_import(&mut self, incoming: Snapshot, mode: ImportMode) {
        let merged = reconcile::merge(&self.snapshot(), incoming, mode);
        info!(
            ?mode,
            loots = merged.loots.len(),
            pools = merged.pools.len(),
            players = merged.players.len(),
            "applying import"
        );
        self.replace(merged);
    }

    /// Append a loot definition and file it under its source pool.
    pub fn add_loot_def(&mut self, loot: Loot) {
        let index = self.loots().len();
        let pools = match self.pool_index_by_name(&loot.source_pool) {
            Some(pool) => replace_at(self.pools(), pool, self.pools()[pool].add_loot(index)),
            None => {
                let mut pools = self.pools().to_vec();
                pools.push(Pool::with_loots(loot.source_pool.clone(), vec![index]));
                pools
            }
        };

        let mut loots = self.loots().to_vec();
        loots.push(loot);
        self.loots.publish(loots);
        self.pools.publish(pools);
    }

    /// Delete a loot definition and renumber every reference above it.
    pub fn remove_loot_def(&mut self, loot: usize) {
        if loot >= self.loots().len() {
            debug!(loot, "remove_loot_def: no such loot");
            return;
        }

        let mut loots = self.loots().to_vec();
        loots.remove(loot);

        let Some(owner) = self.pool_index_of_loot(loot) else {
            warn!(loot, "removed loot was not held by any pool; pools left untouched");
            self.loots.publish(loots);
            return;
        };

        let pools = self
            .pools()
            .iter()
            .enumerate()
            .map(|(index, pool)| {
                if index == owner {
                    pool.remove_loot(loot).adjust_indices(loot)
                } else {
                    pool.adjust_indices(loot)
                }
            })
            .collect();
        let players = self
            .players()
            .iter()
            .map(|player| player.adjust_drained(loot))
            .collect();

        self.loots.publish(loots);
        self.pools.publish(pools);
        self.players.publish(players);
    }

    /// Create a player together with its pool.
    pub fn add_player(&mut self, name: &str) -> Result<(), StoreError> {
        if self.name_taken(name) {
            return reject(StoreError::NameTaken(name.to_string()));
        }

        let pool = self.pools().len();
        let mut pools = self.pools().to_vec();
        pools.push(Pool::new(name));
        let mut players = self.players().to_vec();
        players.push(Player::new(name, pool));

        self.pools.publish(pools);
        self.players.publish(players);
        Ok(())
    }

    /// Delete a player, returning its loot to the source pools first.
    pub fn remove_player(&mut self, player: usize) -> Result<(), StoreError> {
        let Some(pool) = self.players().get(player).map(|p| p.pool) else {
            debug!(player, "remove_player: no such player");
            return Ok(());
        };

        let mut players = self.players().to_vec();
        players.remove(player);

        if pool >= self.pools().len() {
            warn!(player, pool, "player referenced a missing pool");
            self.players.publish(players);
            return Ok(());
        }

        let name = &self.pools()[pool].name;
        if self.loots().iter().any(|loot| &loot.source_pool == name) {
            return reject(StoreError::PoolIsLootSource(name.clone()));
        }

        let pools = return_loot_to_sources(self.loots(), self.pools(), pool);
        let (pools, players) = drop_pool(pools, players, pool);
        self.pools.publish(pools);
        self.players.publish(players);
        Ok(())
    }

    /// Append an empty pool.
    pub fn add_pool(&mut self, name: &str) -> Result<(), StoreError> {
        if self.name_taken(name) {
            return reject(StoreError::NameTaken(name.to_string()));
        }

        let mut pools = self.pools().to_vec();
        pools.push(Pool::new(name));
        self.pools.publish(pools);
        Ok(())
    }

    /// Delete a pool that is neither a loot source nor owned by a player.
    pub fn remove_pool(&mut self, pool: usize) -> Result<(), StoreError> {
        let Some(name) = self.pools().get(pool).map(|p| p.name.clone()) else {
            debug!(pool, "remove_pool: no such pool");
            return Ok(());
        };
        if self.loots().iter().any(|loot| loot.source_pool == name) {
            return reject(StoreError::PoolIsLootSource(name));
        }
        if self.player_of_pool(pool).is_some() {
            return reject(StoreError::PoolOwnedByPlayer(name));
        }

        let pools = return_loot_to_sources(self.loots(), self.pools(), pool);
        let (pools, players) = drop_pool(pools, self.players().to_vec(), pool);
        self.pools.publish(pools);
        self.players.publish(players);
        Ok(())
    }

    /// Move loot from whichever pool holds it into pool `to`.
    pub fn move_loot_to_pool(&mut self, loot: usize, to: usize) {
        let Some(from) = self.pool_index_of_loot(loot) else {
            debug!(loot, "move_loot_to_pool: loot is not pooled");
            return;
        };
        if to >= self.pools().len() {
            debug!(loot, to, "move_loot_to_pool: no such destination");
            return;
        }

        let pools = replace_at(self.pools(), from, self.pools()[from].remove_loot(loot));
        let destination = pools[to].add_loot(loot);
        let pools = replace_at(&pools, to, destination);
        self.pools.publish(pools);

        if from == to {
            return;
        }
        if let Some(holder) = self.player_of_pool(from) {
            if self.players()[holder].is_drained(loot) {
                let updated = self.players()[holder].remove_drained(loot);
                let players = replace_at(self.players(), holder, updated);
                self.players.publish(players);
            }
        }
    }

    /// Mark loot held by a player as drained.
    pub fn drain_loot(&mut self, loot: usize) {
        let Some(holder) = self.holder_of_loot(loot) else {
            return;
        };
        let player = &self.players()[holder];
        if !player.is_drained(loot) {
            let players = replace_at(self.players(), holder, player.add_drained(loot));
            self.players.publish(players);
        }
    }

    /// Mark loot held by a player as charged again.
    pub fn charge_loot(&mut self, loot: usize) {
        let Some(holder) = self.holder_of_loot(loot) else {
            return;
        };
        let player = &self.players()[holder];
        if player.is_drained(loot) {
            let players = replace_at(self.players(), holder, player.remove_drained(loot));
            self.players.publish(players);
        }
    }

    /// Add `delta` to a raw stat slot. Values are not clamped, but a sum that
    /// would overflow `i32` leaves the slot unchanged.
    pub fn add_to_stat(&mut self, player: usize, slot: usize, delta: i32) {
        if slot >= STAT_SLOTS {
            debug!(player, slot, "add_to_stat: no such stat slot");
            return;
        }
        let Some(current) = self.players().get(player) else {
            debug!(player, "add_to_stat: no such player");
            return;
        };
        if current.stats[slot].checked_add(delta).is_none() {
            debug!(player, slot, delta, "add_to_stat: value would overflow");
            return;
        }
        let players = replace_at(self.players(), player, current.add_stat(slot, delta));
        self.players.publish(players);
    }

    fn holder_of_loot(&self, loot: usize) -> Option<usize> {
        self.pool_index_of_loot(loot)
            .and_then(|pool| self.player_of_pool(pool))
    }

    fn pool_index_by_name(&self, name: &str) -> Option<usize> {
        self.pools().iter().position(|pool| pool.name == name)
    }

    fn name_taken(&self, name: &str) -> bool {
        self.pools().iter().any(|pool| pool.name == name)
            || self.players().iter().any(|player| player.name == name)
    }
}

fn reject(err: StoreError) -> Result<(), StoreError> {
    warn!("{err}");
    Err(err)
}

fn replace_at<T: Clone>(items: &[T], index: usize, value: T) -> Vec<T> {
    let mut items = items.to_vec();
    items[index] = value;
    items
}

/// Pools for a freshly reset catalog: one per source, with the initiate and
/// starter loot folded into the shared loot pool and the consumables into the
/// consumable pool. The folded sources stay behind, empty.
fn initial_pools(loots: &[Loot]) -> Vec<Pool> {
    let mut sources: Vec<Pool> = Vec::new();
    for (index, loot) in loots.iter().enumerate() {
        match sources.iter_mut().find(|pool| pool.name == loot.source_pool) {
            Some(pool) => pool.loots.push(index),
            None => sources.push(Pool::with_loots(loot.source_pool.clone(), vec![index])),
        }
    }

    let mut take = |name: &str| -> Vec<usize> {
        sources
            .iter_mut()
            .find(|pool| pool.name == name)
            .map(|pool| std::mem::take(&mut pool.loots))
            .unwrap_or_default()
    };
    let mut shared = take(INITIATE_SOURCE);
    shared.extend(take(STARTER_SOURCE));
    let consumables = take(CONSUMABLE_SOURCE);

    let mut pools = vec![
        Pool::with_loots(LOOT_POOL, shared),
        Pool::with_loots(CONSUMABLE_POOL, consumables),
    ];
    pools.extend(sources);
    pools
}

/// Move every loot held by pool `origin` back to the pool named by its
/// source, leaving `origin` empty. A missing source pool is recreated at the
/// end so no loot is dropped.
fn return_loot_to_sources(loots: &[Loot], pools: &[Pool], origin: usize) -> Vec<Pool> {
    let mut pools = pools.to_vec();
    let held = std::mem::take(&mut pools[origin].loots);

    for index in held {
        let Some(source) = loots.get(index).map(|loot| loot.source_pool.as_str()) else {
            warn!(loot = index, "pool referenced missing loot; dropping it");
            continue;
        };
        let target = pools
            .iter()
            .enumerate()
            .position(|(i, pool)| i != origin && pool.name == source);
        match target {
            Some(target) => pools[target].loots.push(index),
            None => {
                warn!(source, "source pool missing; recreating it");
                pools.push(Pool::with_loots(source, vec![index]));
            }
        }
    }
    pools
}

/// Remove pool `removed` and repoint every player reference above it.
fn drop_pool(
    mut pools: Vec<Pool>,
    players: Vec<Player>,
    removed: usize,
) -> (Vec<Pool>, Vec<Player>) {
    pools.remove(removed);
    let players = players
        .into_iter()
        .map(|mut player| {
            if player.pool > removed {
                player.pool -= 1;
            }
            player
        })
        .collect();
    (pools, players)
}

/// Loot indices that appear in more than one pool, or in none.
///
/// Used to check the partition invariant after an operation.
pub fn partition_violations(snapshot: &Snapshot) -> Vec<usize> {
    let mut seen = HashSet::new();
    let mut violations = Vec::new();
    for pool in &snapshot.pools {
        for index in &pool.loots {
            if !seen.insert(*index) {
                violations.push(*index);
            }
        }
    }
    violations.extend((0..snapshot.loots.len()).filter(|index| !seen.contains(index)));
    violations
}

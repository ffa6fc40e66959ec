//! Shared domain models.
//!
//! Records are plain data. Every helper returns an updated copy and leaves
//! the receiver untouched; the store is responsible for keeping the three
//! collections consistent with each other.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of raw stat slots carried by a player (five stats, max and current).
pub const STAT_SLOTS: usize = Stat::ALL.len() * 2;

/// Category of a piece of loot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LootType {
    /// Weapons, shields and offensive abilities.
    Weapon,
    /// Armor and garments.
    Clothing,
    /// Trinkets, rings and orbs.
    #[serde(rename = "Magic Item")]
    MagicItem,
    /// Single-use items.
    Consumable,
}

impl LootType {
    /// Human-readable label, identical to the persisted spelling.
    pub fn label(self) -> &'static str {
        match self {
            LootType::Weapon => "Weapon",
            LootType::Clothing => "Clothing",
            LootType::MagicItem => "Magic Item",
            LootType::Consumable => "Consumable",
        }
    }
}

impl fmt::Display for LootType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single item or ability definition.
///
/// Loot has no identifier of its own: it is addressed by its position in the
/// loot sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loot {
    /// Display name.
    pub name: String,
    /// Loot category.
    #[serde(rename = "type")]
    pub loot_type: LootType,
    /// Name of the pool this loot originally came from.
    pub source_pool: String,
    /// Ability text usable at any time.
    #[serde(default)]
    pub basic: String,
    /// Ability text usable while the loot is charged.
    #[serde(default)]
    pub charged: String,
    /// Flavor or passive effect text.
    #[serde(default)]
    pub description: String,
}

impl Loot {
    /// Create loot with empty ability and description text.
    pub fn new(
        name: impl Into<String>,
        loot_type: LootType,
        source_pool: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            loot_type,
            source_pool: source_pool.into(),
            basic: String::new(),
            charged: String::new(),
            description: String::new(),
        }
    }

    /// Consumables always originate from the `Consumable` source.
    pub fn consumable(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, LootType::Consumable, CONSUMABLE_SOURCE).with_description(description)
    }

    /// Set the always-available ability text.
    pub fn with_basic(mut self, basic: impl Into<String>) -> Self {
        self.basic = basic.into();
        self
    }

    /// Set the ability text that requires a charge.
    pub fn with_charged(mut self, charged: impl Into<String>) -> Self {
        self.charged = charged.into();
        self
    }

    /// Set the passive or flavor text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Only loot with a charged ability can meaningfully be drained.
    pub fn is_chargeable(&self) -> bool {
        !self.charged.trim().is_empty()
    }
}

/// Source pool every consumable belongs to.
pub const CONSUMABLE_SOURCE: &str = "Consumable";

/// A named bucket holding loot by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Unique name, shared with the owning player for player pools.
    pub name: String,
    /// Indices into the loot sequence, in insertion order.
    #[serde(default)]
    pub loots: Vec<usize>,
}

impl Pool {
    /// Create an empty pool.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_loots(name, Vec::new())
    }

    /// Create a pool holding the given loot indices.
    pub fn with_loots(name: impl Into<String>, loots: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            loots,
        }
    }

    /// Whether the pool currently holds `loot`.
    pub fn contains(&self, loot: usize) -> bool {
        self.loots.contains(&loot)
    }

    /// Return a copy with `loot` appended.
    pub fn add_loot(&self, loot: usize) -> Self {
        let mut loots = self.loots.clone();
        loots.push(loot);
        Self::with_loots(self.name.clone(), loots)
    }

    /// Return a copy without any occurrence of `loot`.
    pub fn remove_loot(&self, loot: usize) -> Self {
        Self::with_loots(self.name.clone(), without_index(&self.loots, loot))
    }

    /// Return a copy where every index above `removed` is shifted down by one.
    pub fn adjust_indices(&self, removed: usize) -> Self {
        Self::with_loots(self.name.clone(), shift_above(&self.loots, removed))
    }
}

/// The five stat kinds tracked per player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stat {
    /// Hit points.
    Health,
    /// Damage absorbed before health.
    Armor,
    /// Physical approach.
    Force,
    /// Agile approach.
    Flow,
    /// Mental approach.
    Focus,
}

impl Stat {
    /// Every stat kind in slot order.
    pub const ALL: [Stat; 5] = [
        Stat::Health,
        Stat::Armor,
        Stat::Force,
        Stat::Flow,
        Stat::Focus,
    ];

    /// Raw slot holding this stat's maximum.
    pub fn max_slot(self) -> usize {
        self as usize * 2
    }

    /// Raw slot holding this stat's current value.
    pub fn current_slot(self) -> usize {
        self.max_slot() + 1
    }

    /// Starting value used for both max and current.
    pub fn default_value(self) -> i32 {
        match self {
            Stat::Health => 2,
            _ => 1,
        }
    }

    /// Display name of the stat.
    pub fn label(self) -> &'static str {
        match self {
            Stat::Health => "Health",
            Stat::Armor => "Armor",
            Stat::Force => "Force",
            Stat::Flow => "Flow",
            Stat::Focus => "Focus",
        }
    }
}

/// Stat block with every stat at its default max and current value.
pub fn default_stats() -> [i32; STAT_SLOTS] {
    let mut stats = [0; STAT_SLOTS];
    for stat in Stat::ALL {
        stats[stat.max_slot()] = stat.default_value();
        stats[stat.current_slot()] = stat.default_value();
    }
    stats
}

/// A player character owning exactly one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Character name, identical to the owned pool's name.
    pub name: String,
    /// Index of the owned pool.
    pub pool: usize,
    /// Raw stat slots: `2k` is the max of stat `k`, `2k + 1` its current value.
    #[serde(default = "default_stats")]
    pub stats: [i32; STAT_SLOTS],
    /// Loot indices in the player's pool whose charge is spent.
    #[serde(default)]
    pub drained: Vec<usize>,
}

impl Player {
    /// Create a player with default stats and nothing drained.
    pub fn new(name: impl Into<String>, pool: usize) -> Self {
        Self {
            name: name.into(),
            pool,
            stats: default_stats(),
            drained: Vec::new(),
        }
    }

    /// Maximum value of `stat`.
    pub fn max(&self, stat: Stat) -> i32 {
        self.stats[stat.max_slot()]
    }

    /// Current value of `stat`.
    pub fn current(&self, stat: Stat) -> i32 {
        self.stats[stat.current_slot()]
    }

    /// Whether `loot` is currently drained.
    pub fn is_drained(&self, loot: usize) -> bool {
        self.drained.contains(&loot)
    }

    /// Return a copy with `delta` added to the raw slot.
    ///
    /// Out of range slots and sums that would overflow leave the slot unchanged.
    pub fn add_stat(&self, slot: usize, delta: i32) -> Self {
        let mut next = self.clone();
        if let Some(value) = next.stats.get_mut(slot) {
            *value = value.checked_add(delta).unwrap_or(*value);
        }
        next
    }

    /// Return a copy with `loot` marked as drained.
    pub fn add_drained(&self, loot: usize) -> Self {
        let mut next = self.clone();
        if !next.drained.contains(&loot) {
            next.drained.push(loot);
        }
        next
    }

    /// Return a copy with `loot` charged again.
    pub fn remove_drained(&self, loot: usize) -> Self {
        let mut next = self.clone();
        next.drained = without_index(&self.drained, loot);
        next
    }

    /// Return a copy with the drained set renumbered after loot `removed` was deleted.
    pub fn adjust_drained(&self, removed: usize) -> Self {
        let mut next = self.clone();
        next.drained = shift_above(&without_index(&self.drained, removed), removed);
        next
    }
}

/// The three collections versioned together for persistence and import/export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Loot definitions, addressed by position.
    #[serde(rename = "lootDefs")]
    pub loots: Vec<Loot>,
    /// Pools, including player pools.
    #[serde(rename = "poolDefs")]
    pub pools: Vec<Pool>,
    /// Player characters.
    #[serde(rename = "playerDefs")]
    pub players: Vec<Player>,
}

fn without_index(indices: &[usize], index: usize) -> Vec<usize> {
    indices.iter().copied().filter(|i| *i != index).collect()
}

fn shift_above(indices: &[usize], removed: usize) -> Vec<usize> {
    indices
        .iter()
        .map(|i| if *i > removed { i - 1 } else { *i })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pool_helpers_leave_original_untouched() {
        let pool = Pool::with_loots("Starter", vec![1, 4, 7]);

        let added = pool.add_loot(9);
        let removed = pool.remove_loot(4);
        let adjusted = pool.adjust_indices(4);

        assert_eq!(pool.loots, vec![1, 4, 7]);
        assert_eq!(added.loots, vec![1, 4, 7, 9]);
        assert_eq!(removed.loots, vec![1, 7]);
        assert_eq!(adjusted.loots, vec![1, 4, 6]);
    }

    #[test]
    fn default_stats_follow_slot_layout() {
        let player = Player::new("Alice", 3);
        assert_eq!(player.stats, [2, 2, 1, 1, 1, 1, 1, 1, 1, 1]);
        assert_eq!(player.max(Stat::Health), 2);
        assert_eq!(player.current(Stat::Focus), 1);
        assert_eq!(Stat::Flow.max_slot(), 6);
        assert_eq!(Stat::Flow.current_slot(), 7);
    }

    #[test]
    fn add_stat_is_unclamped_and_ignores_unknown_slots() {
        let player = Player::new("Alice", 0);
        let hurt = player.add_stat(Stat::Health.current_slot(), -5);
        assert_eq!(hurt.current(Stat::Health), -3);
        assert_eq!(hurt.max(Stat::Health), 2);

        let same = player.add_stat(STAT_SLOTS, 3);
        assert_eq!(same, player);
    }

    #[test]
    fn add_stat_leaves_slot_unchanged_on_overflow() {
        let player = Player::new("Alice", 0);
        let slot = Stat::Armor.max_slot();
        assert_eq!(player.add_stat(slot, i32::MAX), player);
        let low = player.add_stat(slot, i32::MIN);
        assert_eq!(low.max(Stat::Armor), i32::MIN + 1);
        assert_eq!(low.add_stat(slot, -2), low);
    }

    #[test]
    fn drained_set_has_no_duplicates() {
        let player = Player::new("Bob", 0).add_drained(3).add_drained(3);
        assert_eq!(player.drained, vec![3]);
        assert!(player.remove_drained(3).drained.is_empty());
    }

    #[test]
    fn adjust_drained_drops_and_shifts() {
        let player = Player::new("Bob", 0)
            .add_drained(2)
            .add_drained(5)
            .add_drained(8);
        assert_eq!(player.adjust_drained(5).drained, vec![2, 7]);
    }

    #[test]
    fn loot_uses_camel_case_and_optional_text() {
        let loot: Loot = serde_json::from_value(json!({
            "name": "Giants Ring",
            "type": "Magic Item",
            "sourcePool": "Initiate",
            "description": "+1 Health"
        }))
        .expect("loot should parse");

        assert_eq!(loot.loot_type, LootType::MagicItem);
        assert_eq!(loot.source_pool, "Initiate");
        assert!(loot.basic.is_empty());
        assert!(!loot.is_chargeable());

        let value = serde_json::to_value(&loot).expect("loot should serialize");
        assert_eq!(value["sourcePool"], json!("Initiate"));
        assert_eq!(value["type"], json!("Magic Item"));
    }

    #[test]
    fn snapshot_requires_all_three_collections() {
        let missing = serde_json::from_value::<Snapshot>(json!({
            "lootDefs": [],
            "poolDefs": []
        }));
        assert!(missing.is_err());

        let complete = serde_json::from_value::<Snapshot>(json!({
            "lootDefs": [],
            "poolDefs": [{ "name": "Loot Pool", "loots": [] }],
            "playerDefs": []
        }))
        .expect("complete snapshot should parse");
        assert_eq!(complete.pools.len(), 1);
    }
}

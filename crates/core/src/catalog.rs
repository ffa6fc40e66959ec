//! Built-in loot catalog used when the tracker is reset.

use crate::models::{Loot, LootType};

/// Source pool of the first tier of loot.
pub const INITIATE_SOURCE: &str = "Initiate";
/// Source pool of the starter loot handed out with the first tier.
pub const STARTER_SOURCE: &str = "Starter";
/// Shared pool the initiate and starter loot is folded into on reset.
pub const LOOT_POOL: &str = "Loot Pool";
/// Shared pool the consumables are folded into on reset.
pub const CONSUMABLE_POOL: &str = "Consumable Pool";

/// Return the default loot definitions in catalog order.
pub fn default_loots() -> Vec<Loot> {
    use LootType::{Clothing, MagicItem, Weapon};

    vec![
        Loot::new("Simple Sword", Weapon, INITIATE_SOURCE)
            .with_basic("Range 1, Harm 1")
            .with_charged("Range 1, Harm 2"),
        Loot::new("Shield", Weapon, INITIATE_SOURCE)
            .with_charged("Range 1, *Stuns* enemy (-1 action next turn)")
            .with_description("+1 Armor"),
        Loot::new("Flame Aura", Weapon, INITIATE_SOURCE)
            .with_charged("Range 1-2. Deal 1 Harm to ALL characters within range."),
        Loot::new("Bow", Weapon, INITIATE_SOURCE)
            .with_basic("Range 3, Harm 1.")
            .with_charged("Harm 1 to all enemies in a straight line up to 3 spaces from you."),
        Loot::new("Dagger", Weapon, INITIATE_SOURCE)
            .with_basic("Range 0, Harm 1")
            .with_charged("Range 2, Harm 2"),
        Loot::new("Magic Missile", Weapon, INITIATE_SOURCE)
            .with_basic("Range 2-3, Harm 1")
            .with_charged("Range 2-3, Harm 1, choose up to 3 targets"),
        Loot::new("Shiv", Weapon, INITIATE_SOURCE)
            .with_basic("Range 1, Harm 1")
            .with_charged("Range 1, Harm 1, *Bleed* (1 Harm start of each turn)"),
        Loot::new("Razor Trap", Weapon, INITIATE_SOURCE).with_charged(
            "Choose an empty space at Range 1 to place the trap.\n\n\
             The next enemy that moves onto that space takes Harm 2.",
        ),
        Loot::new("Iron Plate", Clothing, INITIATE_SOURCE).with_description("+3 Health, +1 Armor"),
        Loot::new("Cloak", Clothing, INITIATE_SOURCE)
            .with_description("+2 Health, +1 Armor\n\n+1 Flow"),
        Loot::new("Robe", Clothing, INITIATE_SOURCE)
            .with_description("+1 Health\n\n+1 Flow\n\n+2 Focus"),
        Loot::new("Hunters Vest", Clothing, INITIATE_SOURCE)
            .with_description("+3 Health\n\n+1 Force"),
        Loot::new("Giants Ring", MagicItem, INITIATE_SOURCE)
            .with_description("+1 Health\n\n+1 Force"),
        Loot::new("Owl Stone", MagicItem, INITIATE_SOURCE).with_description("+1 Flow"),
        Loot::new("Time Orb", MagicItem, INITIATE_SOURCE).with_charged(
            "You and one ally within Range 2 may reset all of your drained loot (except this one).",
        ),
        Loot::new("Lure", MagicItem, INITIATE_SOURCE).with_charged(
            "Range 4-5. Choose an enemy. They will move in a straight line towards you up to their movement.",
        ),
        Loot::consumable(
            "Healing Potion",
            "Range 0-1 (if used in combat).\n\nRecover 3 Health.",
        ),
        Loot::consumable(
            "Patch Kit",
            "Range 0-1 (if used in combat).\n\nRecover 1 Armor.",
        ),
        Loot::consumable(
            "Quick Camp",
            "All party members recover 1 of any Approach.\n\nCannot be used during combat.",
        ),
        Loot::consumable(
            "Smoke Bomb",
            "Range 1\n\nStuns enemies at range the rest (-1 action during turn)",
        ),
        Loot::consumable(
            "Liquid Shield",
            "Range 0\n\nProvides you with 2 Armor for a fight.",
        ),
        Loot::consumable(
            "Silken Tonic",
            "Temporarily grants the ability to climb on walls and ceilings.",
        ),
        Loot::consumable(
            "Beast Friend",
            "Nearby creatures will provided temporary assistance to you.",
        ),
        Loot::new("Iron Spear", Weapon, STARTER_SOURCE)
            .with_basic("Range 2, Harm 1")
            .with_charged("Move 1, Range 2, Harm 3"),
        Loot::new("Tower Shield", Weapon, STARTER_SOURCE).with_description("+1 Health, +2 Armor"),
        Loot::new("Sling", Weapon, STARTER_SOURCE)
            .with_basic("Range 2-3, Harm 1")
            .with_charged("Range 2-3, Harm 1, *AOE* (Harm all characters Range 1 from target)."),
        Loot::new("Simple Crossbow", Weapon, STARTER_SOURCE)
            .with_basic("Range 3-4, Harm 1")
            .with_charged("2 Harm to all enemies in a straight line from you"),
        Loot::new("Delver Armor", Clothing, STARTER_SOURCE)
            .with_description("+1 Health, +1 Armor\n\n+1 Force, +1 Flow, +1 Focus"),
        Loot::new("Scholars Robes", Clothing, STARTER_SOURCE).with_description("+3 Focus"),
        Loot::new("Simple Plate", Clothing, STARTER_SOURCE)
            .with_description("+2 Health, +2 Armor\n\n+1 Force"),
        Loot::new("Skulking Cloak", Clothing, STARTER_SOURCE)
            .with_description("+2 Flow, +1 Focus"),
        Loot::new("Amulet of Body", MagicItem, STARTER_SOURCE).with_description("+3 Health"),
        Loot::new("Amplifier", MagicItem, STARTER_SOURCE).with_description(
            "Choose any number on a piece of loot you have equipped.\n\nIncrease it +1.",
        ),
        Loot::new("Lying Cat", MagicItem, STARTER_SOURCE).with_description(
            "As long as you have more than 1 Focus remaining, you can always detect when someone is lying to you.",
        ),
        Loot::new("Silken Scarf", MagicItem, STARTER_SOURCE).with_description(
            "As long as you have more than 1 Flow remaining, you can walk on walls.",
        ),
        Loot::new("Banish", Weapon, "City").with_charged(
            "Range 1. Target disappears from the grid. They return to their same space at the end of the next round.",
        ),
        Loot::new("Inferno", Weapon, "City").with_charged(
            "Deal 2 Harm to all characters (except you) who share the same row and column as you.",
        ),
        Loot::new("Axe", Weapon, "City")
            .with_basic("Range 1, Harm 1")
            .with_charged("Range 1, Harm 1, affects all enemies in range."),
        Loot::new("Hammer", Weapon, "City")
            .with_basic("Range 1, Harm 2")
            .with_charged("1 Harm to all enemies in a straight line up to 3 spaces away."),
        Loot::new("Tahnlian Scale", Clothing, "City")
            .with_description("+3 Health, +1 Armor\n\n+1 Force, +1 Flow, +1 Focus"),
        Loot::new("Spectral Shirt", Clothing, "City").with_description(
            "+0 Health, +1 Armor\n\n-1 Force, +3 Flow\n\nOnce per quest, you may walk through any solid wall.",
        ),
        Loot::new("Shapers Shirt", Clothing, "City")
            .with_charged("Tunnel through the ground, moving to any other open space on the grid.")
            .with_description("+2 Health, +1 Armor"),
        Loot::new("Pact Bound Hide", Clothing, "City")
            .with_charged("Use 1 Focus. You may recover 3 Health.")
            .with_description("+1 Health\n\n+1 Flow, +2 Focus"),
        Loot::new("Remixer", MagicItem, "City").with_description(
            "You may freely move points between your Health and your Approaches at any time.",
        ),
        Loot::new("Skull of Lore", MagicItem, "City").with_description("+2 Focus"),
        Loot::new("Blink Ring", MagicItem, "City").with_charged(
            "Move to any empty space on the grid. It must be at least 4 spaces away.",
        ),
        Loot::new("Healing Orb", MagicItem, "City")
            .with_charged("Heals ALL characters 2 within Range 3."),
    ]
}

//! Static item catalog
//!
//! Loaded once, never mutated. The relay does not consult it when relaying
//! pickups; it is published read-only for clients.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Utility,
    /// Purchased items
    Premium,
}

/// What an item does when used
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    Damage(u32),
    Heal(u32),
    Revive(bool),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub name: &'static str,
    #[serde(flatten)]
    pub effect: ItemEffect,
}

const fn item(id: &'static str, item_type: ItemType, name: &'static str, effect: ItemEffect) -> Item {
    Item {
        id,
        item_type,
        name,
        effect,
    }
}

pub static ITEMS: [Item; 7] = [
    item("pistol", ItemType::Weapon, "Pistol", ItemEffect::Damage(10)),
    item("shotgun", ItemType::Weapon, "Shotgun", ItemEffect::Damage(20)),
    item("rifle", ItemType::Weapon, "Rifle", ItemEffect::Damage(15)),
    item("health_potion", ItemType::Utility, "Health Potion", ItemEffect::Heal(25)),
    item("revive_kit", ItemType::Utility, "Revive Kit", ItemEffect::Revive(true)),
    item(
        "premium_revive_kit",
        ItemType::Premium,
        "Premium Revive Kit",
        ItemEffect::Revive(true),
    ),
    item("flamethrower", ItemType::Premium, "Flamethrower", ItemEffect::Damage(25)),
];

pub fn all() -> &'static [Item] {
    &ITEMS
}

pub fn find(id: &str) -> Option<&'static Item> {
    ITEMS.iter().find(|item| item.id == id)
}

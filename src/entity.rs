//! Identifiers and descriptors shared by every layer of the behaviour core.
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque handle for anything the environment knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl EntityId {
    /// Raw id value.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

/// Allegiance of an agent. Agents sharing a faction are friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Creatures recruited by the player.
    Ally,
    /// Neutral wandering creatures.
    Wild,
    /// Hostile to every other faction.
    Enemy,
}

impl Faction {
    /// Agents of the same faction never fight.
    #[must_use]
    pub fn is_friendly_to(self, other: Self) -> bool {
        self == other
    }

    /// Whether the agent is biased away from the protected zone.
    #[must_use]
    pub fn avoids_protected_zone(self) -> bool {
        self != Self::Ally
    }
}

/// Claim state of a loot item as tracked by the pickup system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LootCategory {
    /// Lying in the world, available to anyone.
    Free,
    /// Claimed by an agent; no longer on the loot layer.
    Claimed,
    /// Delivered to a base.
    Deposited,
}

/// Snapshot of a loot item's claim state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootStatus {
    /// Claim state.
    pub category: LootCategory,
    /// Entity currently holding the item, if any.
    pub parent: Option<EntityId>,
}

impl LootStatus {
    /// Whether an agent may still set out to collect this item.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.category == LootCategory::Free && self.parent.is_none()
    }
}

/// Region that non-allied agents steer away from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    /// Centre on the ground plane.
    pub center: Vec3,
    /// Ground radius.
    pub radius: f32,
}

//! Narrow interfaces to the collaborators the core does not own.
//!
//! Animation, stats and the pickup system live outside this crate. The
//! controller reaches them only through these traits, injected per tick via
//! [`crate::controller::TickContext`].
use glam::Vec3;

use crate::entity::EntityId;
use crate::spatial::Environment;

/// Fire-and-forget animation requests. Implementations must tolerate the
/// same request every tick.
#[cfg_attr(test, mockall::automock)]
pub trait Animator {
    /// Starts or stops the walk cycle.
    fn request_walking(&mut self, walking: bool);
    /// Returns to the idle pose.
    fn request_idle(&mut self);
    /// Starts or stops the attack animation.
    fn request_attacking(&mut self, attacking: bool);
}

/// Anything that can die.
pub trait Damageable {
    /// Whether the entity has died.
    fn is_dead(&self) -> bool;
}

/// Stats and attack capability of the controlled agent.
pub trait CombatStats: Damageable {
    /// Authoritative top speed. May be invalid; the controller sanitises it.
    fn move_speed(&self) -> f32;
    /// Reach of a strike.
    fn attack_range(&self) -> f32;
    /// Seconds until the next attack is allowed.
    fn attack_cooldown_remaining(&self) -> f32;
    /// Attempts an attack and reports whether it landed.
    fn try_attack(&mut self, target: EntityId) -> bool;
}

/// Claim and delivery of loot items.
///
/// Claims must be atomic: of two agents claiming the same item, exactly one
/// succeeds, and the item leaves the loot layer the moment it is claimed.
pub trait LootLedger {
    /// Claims `loot` for `claimant`, attaching it to the claimant.
    fn try_claim_loot(&mut self, loot: EntityId, claimant: EntityId) -> bool;
    /// Detaches `loot` and places it at `at`.
    fn deposit_at_base(&mut self, loot: EntityId, at: Vec3);
}

/// The full environment handed to a controller tick.
pub trait World: Environment + LootLedger {}

impl<T: Environment + LootLedger + ?Sized> World for T {}

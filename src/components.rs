//! ECS components attaching the behaviour core to Bevy entities.
use bevy::prelude::*;
use bevy_transform::components::Transform;
use glam::{EulerRot, Quat};

use crate::controller::AgentController;
use crate::entity::EntityId;
use crate::interfaces::{Animator, CombatStats, Damageable};
use crate::locomotion::Body;

/// Links an ECS entity to its record in the scene.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Deref)]
pub struct SceneId(pub EntityId);

/// Marks loot whose transform is driven by the scene.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct LootItem;

/// Ground velocity of a scene entity, in units per second.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Deref, DerefMut)]
pub struct Velocity(pub Vec3);

/// The behaviour controller of an agent.
#[derive(Component, Debug, Clone, Deref, DerefMut)]
pub struct Brain(pub AgentController);

/// Stats of a controlled agent.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Vitals {
    /// Top ground speed.
    pub move_speed: f32,
    /// Reach of a strike.
    pub attack_range: f32,
    /// Seconds between attacks.
    pub attack_cooldown: f32,
    /// Seconds until the next strike is allowed.
    pub cooldown_remaining: f32,
    /// Hit points; the agent is dead at zero.
    pub health: f32,
    /// Target of the most recent landed attack.
    pub last_strike: Option<EntityId>,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            move_speed: crate::DEFAULT_MOVE_SPEED,
            attack_range: 1.5,
            attack_cooldown: 1.0,
            cooldown_remaining: 0.0,
            health: 10.0,
            last_strike: None,
        }
    }
}

impl Vitals {
    /// Counts the attack cooldown down by `dt`.
    pub const fn tick_cooldown(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }
}

impl Damageable for Vitals {
    fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

impl CombatStats for Vitals {
    fn move_speed(&self) -> f32 {
        self.move_speed
    }

    fn attack_range(&self) -> f32 {
        self.attack_range
    }

    fn attack_cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    fn try_attack(&mut self, target: EntityId) -> bool {
        if self.cooldown_remaining > 0.0 {
            return false;
        }
        self.cooldown_remaining = self.attack_cooldown;
        self.last_strike = Some(target);
        true
    }
}

/// Animation clip an agent should be playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationClip {
    /// Standing still.
    #[default]
    Idle,
    /// Moving under its own power.
    Walking,
    /// Striking a target in range.
    Attacking,
}

/// Latest animation requests from the controller.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationState {
    walking: bool,
    attacking: bool,
}

impl AnimationState {
    /// Attacking wins over walking; neither means idle.
    #[must_use]
    pub const fn clip(&self) -> AnimationClip {
        if self.attacking {
            AnimationClip::Attacking
        } else if self.walking {
            AnimationClip::Walking
        } else {
            AnimationClip::Idle
        }
    }
}

impl Animator for AnimationState {
    fn request_walking(&mut self, walking: bool) {
        self.walking = walking;
    }

    fn request_idle(&mut self) {
        self.walking = false;
        self.attacking = false;
    }

    fn request_attacking(&mut self, attacking: bool) {
        self.attacking = attacking;
    }
}

/// Yaw of a transform about the vertical axis.
#[must_use]
pub fn yaw_of(transform: &Transform) -> f32 {
    transform.rotation.to_euler(EulerRot::YXZ).0
}

/// Kinematic body read from an entity's transform and velocity.
#[must_use]
pub fn body_from(transform: &Transform, velocity: Velocity) -> Body {
    Body {
        position: transform.translation,
        yaw: yaw_of(transform),
        velocity: velocity.0,
    }
}

/// Writes `body` back into the entity's transform and velocity.
pub fn write_body(body: &Body, transform: &mut Transform, velocity: &mut Velocity) {
    transform.translation = body.position;
    transform.rotation = Quat::from_rotation_y(body.yaw);
    velocity.0 = body.velocity;
}

//! Hand-written fakes for the controller's collaborators.
//!
//! Compiled for unit tests and for dependants enabling the `test-support`
//! feature. Use `mockall` mocks when exact call expectations matter; these
//! fakes suit scenario tests that only inspect the end state.
use crate::entity::EntityId;
use crate::interfaces::{Animator, CombatStats, Damageable};

/// Last value of every animation request plus a call log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingAnimator {
    /// Last walking request.
    pub walking: bool,
    /// Last attacking request.
    pub attacking: bool,
    /// Number of idle requests.
    pub idle_requests: usize,
    /// Every request in order.
    pub calls: Vec<AnimationCall>,
}

/// One recorded animation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationCall {
    /// `request_walking`.
    Walking(bool),
    /// `request_idle`.
    Idle,
    /// `request_attacking`.
    Attacking(bool),
}

impl Animator for RecordingAnimator {
    fn request_walking(&mut self, walking: bool) {
        self.walking = walking;
        self.calls.push(AnimationCall::Walking(walking));
    }

    fn request_idle(&mut self) {
        self.idle_requests += 1;
        self.calls.push(AnimationCall::Idle);
    }

    fn request_attacking(&mut self, attacking: bool) {
        self.attacking = attacking;
        self.calls.push(AnimationCall::Attacking(attacking));
    }
}

/// Stats with fixed values and an attack log.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStats {
    /// Reported move speed.
    pub move_speed: f32,
    /// Reported attack range.
    pub attack_range: f32,
    /// Reported cooldown.
    pub cooldown_remaining: f32,
    /// Reported death state.
    pub dead: bool,
    /// Whether `try_attack` reports a landed hit.
    pub attacks_land: bool,
    /// Targets of every `try_attack` call.
    pub attacks: Vec<EntityId>,
}

impl Default for FixedStats {
    fn default() -> Self {
        Self {
            move_speed: crate::DEFAULT_MOVE_SPEED,
            attack_range: 1.5,
            cooldown_remaining: 0.0,
            dead: false,
            attacks_land: true,
            attacks: Vec::new(),
        }
    }
}

impl FixedStats {
    /// Defaults with a specific move speed.
    #[must_use]
    pub fn with_speed(move_speed: f32) -> Self {
        Self {
            move_speed,
            ..Self::default()
        }
    }
}

impl Damageable for FixedStats {
    fn is_dead(&self) -> bool {
        self.dead
    }
}

impl CombatStats for FixedStats {
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
        self.attacks.push(target);
        self.attacks_land
    }
}

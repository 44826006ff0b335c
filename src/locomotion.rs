//! Bounded-rate turning and translation on the ground plane.
//!
//! Every movement the core performs goes through [`Locomotion`]. It turns
//! the body toward the requested direction by at most `turn_rate * dt` and
//! translates it by at most `speed * dt`, where the speed always comes from
//! a sanitised stats value.
use glam::Vec3;
use log::warn;

use crate::vector_math::{
    direction_from_yaw, ground_direction, ground_distance, step_angle, yaw_from_direction,
};
use crate::{DEFAULT_MOVE_SPEED, MAX_SPEED_SCALE, MIN_MOVE_SPEED};

/// Kinematic capability required by the locomotion primitive.
pub trait Locomotable {
    /// Ground position.
    fn position(&self) -> Vec3;
    /// Moves the body.
    fn set_position(&mut self, position: Vec3);
    /// Yaw in radians; 0 faces +Z.
    fn yaw(&self) -> f32;
    /// Sets the heading in radians.
    fn set_yaw(&mut self, yaw: f32);
    /// Velocity of the last movement.
    fn velocity(&self) -> Vec3;
    /// Records the velocity of a movement.
    fn set_velocity(&mut self, velocity: Vec3);

    /// Unit ground vector the body faces.
    fn forward(&self) -> Vec3 {
        direction_from_yaw(self.yaw())
    }
}

/// Kinematic state of a controlled agent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Body {
    /// World position.
    pub position: Vec3,
    /// Heading in radians; 0 faces +Z.
    pub yaw: f32,
    /// Velocity of the last movement.
    pub velocity: Vec3,
}

impl Body {
    /// Body at rest at `position`, facing +Z.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            velocity: Vec3::ZERO,
        }
    }

    /// Turns the body to face `direction`; degenerate directions are ignored.
    #[must_use]
    pub fn facing(mut self, direction: Vec3) -> Self {
        if let Some(dir) = ground_direction(direction) {
            self.yaw = yaw_from_direction(dir);
        }
        self
    }
}

impl Locomotable for Body {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn yaw(&self) -> f32 {
        self.yaw
    }

    fn set_yaw(&mut self, yaw: f32) {
        self.yaw = yaw;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }
}

/// Outcome of validating a move speed read from the stats provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedCheck {
    /// Speed to use.
    pub speed: f32,
    /// `true` when the raw value was replaced by [`DEFAULT_MOVE_SPEED`].
    pub corrected: bool,
}

/// Enforces the move speed floor.
///
/// Values that are not finite or do not exceed [`MIN_MOVE_SPEED`] are
/// replaced with [`DEFAULT_MOVE_SPEED`].
///
/// # Examples
/// ```
/// use critter_ai::locomotion::sanitise_move_speed;
/// assert_eq!(sanitise_move_speed(0.0).speed, 2.0);
/// assert!(!sanitise_move_speed(3.5).corrected);
/// ```
#[must_use]
pub const fn sanitise_move_speed(raw: f32) -> SpeedCheck {
    if raw.is_finite() && raw > MIN_MOVE_SPEED {
        SpeedCheck {
            speed: raw,
            corrected: false,
        }
    } else {
        SpeedCheck {
            speed: DEFAULT_MOVE_SPEED,
            corrected: true,
        }
    }
}

/// The locomotion primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Locomotion {
    /// Maximum angular rate in radians per second.
    pub turn_rate: f32,
}

impl Locomotion {
    /// Primitive limited to `turn_rate_degrees` per second.
    #[must_use]
    pub const fn from_degrees(turn_rate_degrees: f32) -> Self {
        Self {
            turn_rate: turn_rate_degrees.to_radians(),
        }
    }

    /// Rotates toward `direction` without translating.
    pub fn face<B: Locomotable + ?Sized>(&self, body: &mut B, direction: Vec3, dt: f32) {
        let Some(dir) = ground_direction(direction) else {
            return;
        };
        let yaw = step_angle(body.yaw(), yaw_from_direction(dir), self.turn_rate * dt);
        body.set_yaw(yaw);
    }

    /// Turns toward `direction` and advances along it.
    ///
    /// Returns the displacement applied. A degenerate direction stops the
    /// body instead.
    pub fn steer<B: Locomotable + ?Sized>(
        &self,
        body: &mut B,
        direction: Vec3,
        speed_scale: f32,
        max_speed: f32,
        dt: f32,
    ) -> Vec3 {
        self.steer_within(body, direction, speed_scale, max_speed, dt, f32::INFINITY)
    }

    /// As [`Locomotion::steer`] but never passes `target`.
    pub fn move_towards<B: Locomotable + ?Sized>(
        &self,
        body: &mut B,
        target: Vec3,
        speed_scale: f32,
        max_speed: f32,
        dt: f32,
    ) -> Vec3 {
        let remaining = ground_distance(body.position(), target);
        self.steer_within(
            body,
            target - body.position(),
            speed_scale,
            max_speed,
            dt,
            remaining,
        )
    }

    /// As [`Locomotion::steer`] but advances at most `limit`.
    pub fn steer_within<B: Locomotable + ?Sized>(
        &self,
        body: &mut B,
        direction: Vec3,
        speed_scale: f32,
        max_speed: f32,
        dt: f32,
        limit: f32,
    ) -> Vec3 {
        let Some(dir) = ground_direction(direction) else {
            Self::stop(body);
            return Vec3::ZERO;
        };
        self.face(body, dir, dt);
        let speed = sanitise_move_speed(max_speed).speed * speed_scale.clamp(0.0, MAX_SPEED_SCALE);
        let distance = (speed * dt).min(limit).max(0.0);
        let displacement = dir * distance;
        body.set_position(body.position() + displacement);
        body.set_velocity(if dt > 0.0 { displacement / dt } else { Vec3::ZERO });
        displacement
    }

    /// Translates along `direction` by `distance` without turning.
    pub fn advance<B: Locomotable + ?Sized>(
        body: &mut B,
        direction: Vec3,
        distance: f32,
        dt: f32,
    ) -> Vec3 {
        let Some(dir) = ground_direction(direction) else {
            warn!("advance requested along a degenerate direction");
            return Vec3::ZERO;
        };
        let displacement = dir * distance.max(0.0);
        body.set_position(body.position() + displacement);
        body.set_velocity(if dt > 0.0 { displacement / dt } else { Vec3::ZERO });
        displacement
    }

    /// Clears any residual velocity.
    pub fn stop<B: Locomotable + ?Sized>(body: &mut B) {
        body.set_velocity(Vec3::ZERO);
    }
}

impl Default for Locomotion {
    fn default() -> Self {
        Self::from_degrees(crate::TURN_RATE_DEGREES)
    }
}

//! Ground-plane vector helpers.
//!
//! Movement logic works in the XZ plane with `y` pinned to terrain height.
//! Yaw 0 faces +Z and positive yaw turns toward +X.
use glam::{Quat, Vec2, Vec3};

use crate::DIRECTION_EPSILON;

/// Projects a vector onto the ground plane.
///
/// # Examples
/// ```
/// use critter_ai::vector_math::flatten;
/// use glam::Vec3;
/// assert_eq!(flatten(Vec3::new(1.0, 5.0, 2.0)), Vec3::new(1.0, 0.0, 2.0));
/// ```
#[must_use]
pub const fn flatten(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z)
}

/// Returns the XZ components of a vector as a [`Vec2`].
#[must_use]
pub const fn ground(vector: Vec3) -> Vec2 {
    Vec2::new(vector.x, vector.z)
}

/// Normalises the ground projection of `vector`.
///
/// Returns `None` for non-finite input and for vectors too short to carry a
/// direction.
///
/// # Examples
/// ```
/// use critter_ai::ground_direction;
/// use glam::Vec3;
/// let dir = ground_direction(Vec3::new(3.0, 9.0, 4.0)).unwrap();
/// assert!((dir.x - 0.6).abs() < 1e-6);
/// assert!((dir.z - 0.8).abs() < 1e-6);
/// assert!(ground_direction(Vec3::Y).is_none());
/// ```
#[must_use]
pub fn ground_direction(vector: Vec3) -> Option<Vec3> {
    let flat = flatten(vector);
    if !flat.is_finite() || flat.length_squared() < DIRECTION_EPSILON {
        return None;
    }
    Some(flat.normalize())
}

/// Distance between two points measured on the ground plane.
#[must_use]
pub fn ground_distance(a: Vec3, b: Vec3) -> f32 {
    ground(a).distance(ground(b))
}

/// Unit direction for a yaw angle in radians.
#[must_use]
pub fn direction_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Yaw angle in radians for a ground direction.
#[must_use]
pub fn yaw_from_direction(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Rotates `direction` about the vertical axis by `angle` radians.
#[must_use]
pub fn rotate_yaw(direction: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * direction
}

/// Wraps an angle into `(-PI, PI]`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Moves `from` toward `to` along the shortest arc by at most `max_step`.
#[must_use]
pub fn step_angle(from: f32, to: f32, max_step: f32) -> f32 {
    let delta = wrap_angle(to - from);
    if delta.abs() <= max_step {
        wrap_angle(to)
    } else {
        wrap_angle(from + max_step.copysign(delta))
    }
}

/// Interpolates between two yaw angles along the shortest arc.
#[must_use]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + wrap_angle(to - from) * t.clamp(0.0, 1.0))
}

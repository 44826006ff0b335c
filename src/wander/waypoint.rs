//! Safe waypoint search along a requested direction.
use glam::Vec3;
use log::debug;

use crate::config::WanderConfig;
use crate::spatial::{Environment, RegionKind};
use crate::vector_math::{ground_direction, ground_distance};

/// A waypoint accepted by the safety predicate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeWaypoint {
    /// The waypoint.
    pub point: Vec3,
    /// Radius that was verified free of hazards around `point`.
    pub clearance: f32,
}

/// The safety predicate: no hazard volume overlaps the circle.
#[must_use]
pub fn is_safe<E: Environment + ?Sized>(env: &E, point: Vec3, clearance: f32) -> bool {
    env.probe_region(point, clearance, RegionKind::Hazard)
        .is_empty()
}

/// Searches for a safe waypoint along `direction`.
///
/// Tries `waypoint_attempts` candidates whose distance shrinks from
/// `max_distance` to half of `min_distance` while the required clearance
/// shrinks from `safety_radius` to half of it. When every candidate fails, a
/// short `fallback_step` is tried, then the closest safe point past it.
/// Returns `None` when nothing is safe; the caller stays put this cycle.
pub fn find_safe_waypoint<E: Environment + ?Sized>(
    env: &E,
    origin: Vec3,
    direction: Vec3,
    config: &WanderConfig,
) -> Option<SafeWaypoint> {
    let dir = ground_direction(direction)?;
    let attempts = config.waypoint_attempts.max(2);
    let near = config.min_distance * 0.5;
    let min_clearance = config.safety_radius * 0.5;

    for attempt in 0..attempts {
        let t = lerp_factor(attempt, attempts);
        let distance = config.max_distance + (near - config.max_distance) * t;
        let clearance = config.safety_radius + (min_clearance - config.safety_radius) * t;
        let point = origin + dir * distance;
        if is_safe(env, point, clearance) {
            return Some(SafeWaypoint { point, clearance });
        }
    }

    let step = origin + dir * config.fallback_step;
    if is_safe(env, step, min_clearance) {
        debug!("waypoint search fell back to a short step from {origin:?}");
        return Some(SafeWaypoint {
            point: step,
            clearance: min_clearance,
        });
    }

    let edge = env.closest_safe_point(step, origin);
    let nudged = ground_direction(edge - step).map_or(edge, |out| edge + out * min_clearance);
    if ground_distance(origin, nudged) <= config.max_distance && is_safe(env, nudged, min_clearance)
    {
        return Some(SafeWaypoint {
            point: nudged,
            clearance: min_clearance,
        });
    }
    debug!("no safe waypoint from {origin:?} along {dir:?}");
    None
}

#[expect(
    clippy::cast_precision_loss,
    reason = "Attempt counts are small configuration values."
)]
fn lerp_factor(attempt: usize, attempts: usize) -> f32 {
    attempt as f32 / (attempts - 1) as f32
}

//! Heading selection for the wander cycle.
//!
//! A heading passes three filters in order: escape from nearby hazards,
//! steering non-allied agents away from the protected zone, and a final
//! hazard re-check that falls back to a sampled search.
use std::f32::consts::{PI, TAU};

use glam::Vec3;
use log::debug;
use rand::Rng;

use crate::config::WanderConfig;
use crate::entity::{Faction, Zone};
use crate::spatial::{Environment, SurfaceKind};
use crate::vector_math::{direction_from_yaw, ground_direction, rotate_yaw};

/// Uniformly random ground heading.
pub fn random_heading<R: Rng>(rng: &mut R) -> Vec3 {
    direction_from_yaw(rng.random_range(-PI..PI))
}

#[expect(
    clippy::cast_precision_loss,
    reason = "Sample counts are small configuration values."
)]
fn sample_step(samples: usize) -> f32 {
    TAU / samples.max(1) as f32
}

#[expect(
    clippy::cast_precision_loss,
    reason = "Sample indices are bounded by small configuration values."
)]
fn sample_direction(start: Vec3, step: f32, index: usize) -> Vec3 {
    rotate_yaw(start, step * index as f32)
}

/// Pushes away from every hazard within half the detection distance.
///
/// Samples `escape_samples` directions around `facing`. Returns `None` when
/// no sample triggers, or when the triggering directions cancel out.
pub fn escape_heading<E: Environment + ?Sized>(
    env: &E,
    origin: Vec3,
    facing: Vec3,
    config: &WanderConfig,
) -> Option<Vec3> {
    let range = config.hazard_detection_distance * 0.5;
    let step = sample_step(config.escape_samples);
    let push = (0..config.escape_samples)
        .map(|index| sample_direction(facing, step, index))
        .filter(|dir| {
            env.probe_direction(origin, *dir, range, SurfaceKind::Hazard)
                .is_some()
        })
        .fold(Vec3::ZERO, |sum, dir| sum + dir);
    if push == Vec3::ZERO {
        return None;
    }
    let escape = ground_direction(-push);
    if escape.is_some() {
        debug!("hazard too close at {origin:?}; escaping along {escape:?}");
    }
    escape
}

/// Replaces headings that lead toward the protected zone.
///
/// Applies only to factions that avoid the zone. A heading whose dot
/// product with the direction to the zone exceeds `zone_dot_threshold` is
/// swapped for the away-from-zone direction jittered by up to
/// `zone_jitter_degrees` either way.
pub fn avoid_zone<R: Rng>(
    heading: Vec3,
    origin: Vec3,
    zone: Option<Zone>,
    faction: Faction,
    config: &WanderConfig,
    rng: &mut R,
) -> Vec3 {
    if !faction.avoids_protected_zone() {
        return heading;
    }
    let Some(to_zone) = zone.and_then(|z| ground_direction(z.center - origin)) else {
        return heading;
    };
    if heading.dot(to_zone) <= config.zone_dot_threshold {
        return heading;
    }
    let jitter = zone_jitter(config);
    let angle = if jitter > 0.0 {
        rng.random_range(-jitter..=jitter)
    } else {
        0.0
    };
    debug!("heading {heading:?} leads into the protected zone; turning away");
    rotate_yaw(-to_zone, angle)
}

/// Jitter half-width in radians. A negative setting uses its magnitude and a
/// non-finite one disables the jitter.
fn zone_jitter(config: &WanderConfig) -> f32 {
    let degrees = config.zone_jitter_degrees.abs();
    if degrees.is_finite() {
        degrees.to_radians()
    } else {
        0.0
    }
}

/// Samples `safe_direction_samples` directions starting from `start`.
///
/// Returns the first direction with no hazard inside the detection
/// distance, else the longest clear one if it clears
/// `safe_clearance_ratio` of the distance, else the direction to the zone
/// centre, else a random heading.
pub fn find_safe_direction<E: Environment + ?Sized, R: Rng>(
    env: &E,
    origin: Vec3,
    start: Vec3,
    config: &WanderConfig,
    rng: &mut R,
) -> Vec3 {
    let range = config.hazard_detection_distance;
    let step = sample_step(config.safe_direction_samples);
    let mut best: Option<(Vec3, f32)> = None;
    for index in 0..config.safe_direction_samples {
        let dir = sample_direction(start, step, index);
        match env.probe_direction(origin, dir, range, SurfaceKind::Hazard) {
            None => return dir,
            Some(hit) if best.is_none_or(|(_, clear)| hit.distance > clear) => {
                best = Some((dir, hit.distance));
            }
            Some(_) => {}
        }
    }
    if let Some((dir, clear)) = best {
        if clear >= range * config.safe_clearance_ratio {
            return dir;
        }
    }
    env.protected_zone()
        .and_then(|zone| ground_direction(zone.center - origin))
        .unwrap_or_else(|| random_heading(rng))
}

/// Runs the full heading pipeline for one wander cycle.
pub fn choose_heading<E: Environment + ?Sized, R: Rng>(
    env: &E,
    origin: Vec3,
    facing: Vec3,
    faction: Faction,
    config: &WanderConfig,
    rng: &mut R,
) -> Vec3 {
    let initial =
        escape_heading(env, origin, facing, config).unwrap_or_else(|| random_heading(rng));
    let heading = avoid_zone(initial, origin, env.protected_zone(), faction, config, rng);
    if env
        .probe_direction(
            origin,
            heading,
            config.hazard_detection_distance,
            SurfaceKind::Hazard,
        )
        .is_some()
    {
        find_safe_direction(env, origin, heading, config, rng)
    } else {
        heading
    }
}

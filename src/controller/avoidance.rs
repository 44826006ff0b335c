//! Separation from nearby same-faction agents.
//!
//! Repulsion is blended into the goal direction with a capped weight below
//! one half, so the blended direction always keeps a positive component
//! along the goal.
use glam::Vec3;

use crate::config::AvoidanceConfig;
use crate::vector_math::{ground_direction, ground_distance};

/// Sum of pushes away from every neighbour inside `avoid_distance`.
///
/// Each push grows as the neighbour gets closer, in proportion to
/// `(avoid_distance - d) / d`. Neighbours at exactly the same spot carry no
/// direction and are skipped.
#[must_use]
pub fn repulsion(position: Vec3, neighbours: &[Vec3], avoid_distance: f32) -> Vec3 {
    neighbours
        .iter()
        .filter_map(|&neighbour| {
            let distance = ground_distance(position, neighbour);
            if distance >= avoid_distance {
                return None;
            }
            let away = ground_direction(position - neighbour)?;
            Some(away * ((avoid_distance - distance) / distance))
        })
        .fold(Vec3::ZERO, |sum, push| sum + push)
}

/// Mixes `repulsion` into the unit `goal` direction.
///
/// The repulsion weight is its magnitude capped at `max_weight`.
#[must_use]
pub fn blend(goal: Vec3, repulsion: Vec3, max_weight: f32) -> Vec3 {
    let Some(away) = ground_direction(repulsion) else {
        return goal;
    };
    let weight = repulsion.length().min(max_weight);
    ground_direction(goal * (1.0 - weight) + away * weight).unwrap_or(goal)
}

/// Steers `goal` around nearby allies.
#[must_use]
pub fn avoid(position: Vec3, goal: Vec3, neighbours: &[Vec3], config: &AvoidanceConfig) -> Vec3 {
    blend(
        goal,
        repulsion(position, neighbours, config.avoid_distance),
        config.max_blend_weight,
    )
}

/// Small nudge that separates agents stacked within half the avoidance
/// distance.
#[must_use]
pub fn overlap_correction(
    position: Vec3,
    neighbours: &[Vec3],
    config: &AvoidanceConfig,
) -> Option<Vec3> {
    let threshold = config.avoid_distance * 0.5;
    let push = neighbours
        .iter()
        .filter(|&&neighbour| ground_distance(position, neighbour) < threshold)
        .filter_map(|&neighbour| ground_direction(position - neighbour))
        .fold(Vec3::ZERO, |sum, away| sum + away);
    ground_direction(push).map(|dir| dir * config.overlap_push)
}

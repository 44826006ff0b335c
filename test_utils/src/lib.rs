//! Utility helpers for tests.
//!
//! Ground-plane assertions plus a [`scenario::Scenario`] harness that ticks
//! several controllers against one scene.
pub mod scenario;

use glam::Vec3;

/// Assert that `actual` lies within `tolerance` of `expected` on every axis.
///
/// # Panics
/// Panics with both vectors in the message when they differ.
pub fn assert_vec3_near(actual: Vec3, expected: Vec3, tolerance: f32) {
    assert!(
        actual.abs_diff_eq(expected, tolerance),
        "{actual:?} is not within {tolerance} of {expected:?}"
    );
}

/// Assert that two points are at most `limit` apart on the ground plane.
///
/// # Panics
/// Panics with the measured distance when the points are too far apart.
pub fn assert_ground_within(a: Vec3, b: Vec3, limit: f32) {
    let distance = critter_ai::ground_distance(a, b);
    assert!(
        distance <= limit,
        "{a:?} and {b:?} are {distance} apart, more than {limit}"
    );
}

/// Assert that `direction` is a unit vector lying on the ground plane.
///
/// # Panics
/// Panics when the vector has a vertical component or is not normalised.
pub fn assert_ground_unit(direction: Vec3) {
    assert!(direction.y.abs() < 1e-6, "{direction:?} leaves the ground plane");
    assert!(
        (direction.length() - 1.0).abs() < 1e-4,
        "{direction:?} is not normalised"
    );
}

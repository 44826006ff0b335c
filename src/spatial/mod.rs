//! Read-only environment probes consumed by the behaviour core.
//!
//! The core never mutates the spatial indices behind these traits, so any
//! number of agents may query them within a tick without coordination.
//! Absence ("nothing found") is the only failure mode.

mod scene;

use glam::Vec3;
use hashbrown::HashSet;

use crate::entity::{EntityId, Faction, LootStatus, Zone};
use crate::vector_math::{ground, ground_distance};

pub use scene::{EntityKind, EntityRecord, Scene, SceneError};

/// Surfaces a ray probe can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Boundary agents must never cross.
    Hazard,
    /// Solid geometry that blocks walking.
    Obstacle,
}

/// Categories a region query can collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Loot still lying free in the world.
    Loot,
    /// Every live agent on the agent layer; callers filter by faction.
    Allies,
    /// Hazard volumes overlapping the query circle.
    Hazard,
}

/// Result of a successful ray probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Ground-plane distance from the probe origin to the surface.
    pub distance: f32,
}

/// Spatial probes against hazard, obstacle, loot and agent layers.
pub trait SpatialQuery {
    /// Casts a ray along `direction` and reports the nearest surface of
    /// `kind` within `max_distance`.
    fn probe_direction(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        kind: SurfaceKind,
    ) -> Option<Hit>;

    /// Collects entities of `kind` overlapping the circle at `center`.
    fn probe_region(&self, center: Vec3, radius: f32, kind: RegionKind) -> HashSet<EntityId>;

    /// Nearest point outside every hazard volume, starting from `target`.
    ///
    /// `reference` picks the push-out direction when `target` sits exactly
    /// on a hazard centre.
    fn closest_safe_point(&self, target: Vec3, reference: Vec3) -> Vec3;
}

/// Entity lookups the controller needs beyond raw spatial probes.
pub trait SceneView {
    /// World position of `id`.
    fn position_of(&self, id: EntityId) -> Option<Vec3>;
    /// Velocity of `id`.
    fn velocity_of(&self, id: EntityId) -> Option<Vec3>;
    /// Yaw of the entity in radians.
    fn facing_of(&self, id: EntityId) -> Option<f32>;
    /// Faction of agent `id`; `None` for loot and unknown ids.
    fn faction_of(&self, id: EntityId) -> Option<Faction>;
    /// `false` for dead agents and for ids the scene does not know.
    fn is_alive(&self, id: EntityId) -> bool;
    /// Claim state of loot `id`.
    fn loot_status(&self, id: EntityId) -> Option<LootStatus>;
    /// The protected zone, if the level has one.
    fn protected_zone(&self) -> Option<Zone>;
}

/// Everything the planner and the handlers read.
pub trait Environment: SpatialQuery + SceneView {}

impl<T: SpatialQuery + SceneView + ?Sized> Environment for T {}

/// Vertical cylinder used for hazard and obstacle volumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    /// Centre; height is ignored.
    pub center: Vec3,
    /// Ground radius.
    pub radius: f32,
}

impl Disc {
    /// Disc of `radius` around `center`.
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Whether `point` lies strictly inside.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        ground_distance(self.center, point) < self.radius
    }

    /// Whether a circle of `radius` around `center` overlaps this disc.
    #[must_use]
    pub fn overlaps(&self, center: Vec3, radius: f32) -> bool {
        ground_distance(self.center, center) < self.radius + radius
    }

    /// Distance along a ground ray to the disc boundary.
    ///
    /// Origins inside the disc hit at distance zero. `direction` must be a
    /// unit ground-plane vector.
    #[must_use]
    pub fn ray_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        let offset = ground(origin) - ground(self.center);
        let dir = ground(direction);
        let b = offset.dot(dir);
        let c = offset.length_squared() - self.radius * self.radius;
        if c > 0.0 && b > 0.0 {
            return None;
        }
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let distance = (-b - discriminant.sqrt()).max(0.0);
        (distance <= max_distance).then_some(distance)
    }
}

//! In-memory environment used by the engine layer, the demo and tests.
//!
//! The scene stores hazards, obstacles, agents and loot and answers every
//! facade query by brute force. It also plays the pickup system: claims flip
//! an item's category and parent in a single call.

use glam::Vec3;
use hashbrown::{HashMap, HashSet};
use log::{debug, info};
use thiserror::Error;

use super::{Disc, Hit, RegionKind, SceneView, SpatialQuery, SurfaceKind};
use crate::entity::{EntityId, Faction, LootCategory, LootStatus, Zone};
use crate::interfaces::LootLedger;
use crate::vector_math::{ground_direction, ground_distance};

/// Clearance added when pushing a point out of a hazard.
const SAFE_POINT_MARGIN: f32 = 0.1;
/// Height above its carrier at which a carried item rides.
const CARRY_HEIGHT: f32 = 1.0;

/// What an entity record describes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    /// A creature.
    Agent {
        /// Allegiance.
        faction: Faction,
        /// `false` once the agent has died.
        alive: bool,
    },
    /// A loot item and its claim state.
    Loot(LootStatus),
}

/// Transform and kind of a scene entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRecord {
    /// World position.
    pub position: Vec3,
    /// Velocity of the last movement.
    pub velocity: Vec3,
    /// Heading in radians.
    pub yaw: f32,
    /// Agent or loot payload.
    pub kind: EntityKind,
}

/// Errors raised when mutating entities the scene does not hold.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    /// No entity with this id.
    #[error("unknown entity {0:?}")]
    UnknownEntity(EntityId),
    /// The entity exists but is of the wrong kind.
    #[error("entity {id:?} is not {expected}")]
    WrongKind {
        /// The entity.
        id: EntityId,
        /// Kind the operation needed.
        expected: &'static str,
    },
}

/// Brute-force implementation of the spatial facade and the loot ledger.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    next_id: u64,
    hazards: Vec<(EntityId, Disc)>,
    obstacles: Vec<Disc>,
    entities: HashMap<EntityId, EntityRecord>,
    zone: Option<Zone>,
}

impl Scene {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    /// Adds a cylindrical hazard volume.
    pub fn add_hazard(&mut self, center: Vec3, radius: f32) -> EntityId {
        let id = self.allocate();
        self.hazards.push((id, Disc::new(center, radius)));
        id
    }

    /// Adds a cylindrical obstacle that blocks walking.
    pub fn add_obstacle(&mut self, center: Vec3, radius: f32) {
        self.obstacles.push(Disc::new(center, radius));
    }

    /// Sets the zone non-allied agents avoid.
    pub fn set_protected_zone(&mut self, zone: Zone) {
        self.zone = Some(zone);
    }

    /// Adds a live agent at `position`.
    pub fn spawn_agent(&mut self, position: Vec3, faction: Faction) -> EntityId {
        let id = self.allocate();
        self.entities.insert(
            id,
            EntityRecord {
                position,
                velocity: Vec3::ZERO,
                yaw: 0.0,
                kind: EntityKind::Agent {
                    faction,
                    alive: true,
                },
            },
        );
        id
    }

    /// Adds a free loot item at `position`.
    pub fn spawn_loot(&mut self, position: Vec3) -> EntityId {
        let id = self.allocate();
        self.entities.insert(
            id,
            EntityRecord {
                position,
                velocity: Vec3::ZERO,
                yaw: 0.0,
                kind: EntityKind::Loot(LootStatus {
                    category: LootCategory::Free,
                    parent: None,
                }),
            },
        );
        id
    }

    /// Removes an entity, as when it is destroyed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityRecord> {
        self.entities.remove(&id)
    }

    /// Stored state of `id`.
    #[must_use]
    pub fn record(&self, id: EntityId) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    fn record_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord, SceneError> {
        self.entities
            .get_mut(&id)
            .ok_or(SceneError::UnknownEntity(id))
    }

    /// Moves `id`.
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownEntity`] for ids the scene does not hold.
    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> Result<(), SceneError> {
        self.record_mut(id)?.position = position;
        Ok(())
    }

    /// Records the velocity of `id`.
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownEntity`] for ids the scene does not hold.
    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec3) -> Result<(), SceneError> {
        self.record_mut(id)?.velocity = velocity;
        Ok(())
    }

    /// Turns `id`.
    ///
    /// # Errors
    /// Returns [`SceneError::UnknownEntity`] for ids the scene does not hold.
    pub fn set_yaw(&mut self, id: EntityId, yaw: f32) -> Result<(), SceneError> {
        self.record_mut(id)?.yaw = yaw;
        Ok(())
    }

    /// Kills or revives agent `id`.
    ///
    /// # Errors
    /// Fails for unknown ids and for loot.
    pub fn set_alive(&mut self, id: EntityId, alive: bool) -> Result<(), SceneError> {
        match &mut self.record_mut(id)?.kind {
            EntityKind::Agent { alive: flag, .. } => {
                *flag = alive;
                Ok(())
            }
            EntityKind::Loot(_) => Err(SceneError::WrongKind {
                id,
                expected: "an agent",
            }),
        }
    }

    /// Moves every carried item onto its carrier.
    pub fn sync_carried(&mut self) {
        let carried: Vec<(EntityId, EntityId)> = self
            .entities
            .iter()
            .filter_map(|(id, record)| match record.kind {
                EntityKind::Loot(LootStatus {
                    parent: Some(parent),
                    ..
                }) => Some((*id, parent)),
                _ => None,
            })
            .collect();
        for (loot, parent) in carried {
            let Some(anchor) = self.entities.get(&parent).map(|r| r.position) else {
                continue;
            };
            if let Some(record) = self.entities.get_mut(&loot) {
                record.position = anchor + Vec3::Y * CARRY_HEIGHT;
            }
        }
    }

    /// Ids of every agent in the scene.
    pub fn agents(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .filter(|(_, record)| matches!(record.kind, EntityKind::Agent { .. }))
            .map(|(id, _)| *id)
    }

    fn hazard_containing(&self, point: Vec3) -> Option<&Disc> {
        self.hazards
            .iter()
            .map(|(_, disc)| disc)
            .find(|disc| disc.contains(point))
    }
}

impl SpatialQuery for Scene {
    fn probe_direction(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        kind: SurfaceKind,
    ) -> Option<Hit> {
        let dir = ground_direction(direction)?;
        let nearest = match kind {
            SurfaceKind::Hazard => self
                .hazards
                .iter()
                .filter_map(|(_, disc)| disc.ray_hit(origin, dir, max_distance))
                .min_by(f32::total_cmp),
            SurfaceKind::Obstacle => self
                .obstacles
                .iter()
                .filter_map(|disc| disc.ray_hit(origin, dir, max_distance))
                .min_by(f32::total_cmp),
        };
        nearest.map(|distance| Hit { distance })
    }

    fn probe_region(&self, center: Vec3, radius: f32, kind: RegionKind) -> HashSet<EntityId> {
        match kind {
            RegionKind::Hazard => self
                .hazards
                .iter()
                .filter(|(_, disc)| disc.overlaps(center, radius))
                .map(|(id, _)| *id)
                .collect(),
            RegionKind::Loot => self
                .entities
                .iter()
                .filter(|(_, record)| {
                    matches!(record.kind, EntityKind::Loot(status) if status.is_available())
                        && ground_distance(record.position, center) <= radius
                })
                .map(|(id, _)| *id)
                .collect(),
            RegionKind::Allies => self
                .entities
                .iter()
                .filter(|(_, record)| {
                    matches!(record.kind, EntityKind::Agent { alive: true, .. })
                        && ground_distance(record.position, center) <= radius
                })
                .map(|(id, _)| *id)
                .collect(),
        }
    }

    fn closest_safe_point(&self, target: Vec3, reference: Vec3) -> Vec3 {
        let mut point = target;
        for _ in 0..=self.hazards.len() {
            let Some(disc) = self.hazard_containing(point) else {
                return point;
            };
            let outward = ground_direction(point - disc.center)
                .or_else(|| ground_direction(reference - disc.center))
                .unwrap_or(Vec3::X);
            let pushed = disc.center + outward * (disc.radius + SAFE_POINT_MARGIN);
            point = Vec3::new(pushed.x, target.y, pushed.z);
        }
        point
    }
}

impl SceneView for Scene {
    fn position_of(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|record| record.position)
    }

    fn velocity_of(&self, id: EntityId) -> Option<Vec3> {
        self.entities.get(&id).map(|record| record.velocity)
    }

    fn facing_of(&self, id: EntityId) -> Option<f32> {
        self.entities.get(&id).map(|record| record.yaw)
    }

    fn faction_of(&self, id: EntityId) -> Option<Faction> {
        match self.entities.get(&id)?.kind {
            EntityKind::Agent { faction, .. } => Some(faction),
            EntityKind::Loot(_) => None,
        }
    }

    fn is_alive(&self, id: EntityId) -> bool {
        matches!(
            self.entities.get(&id).map(|record| record.kind),
            Some(EntityKind::Agent { alive: true, .. })
        )
    }

    fn loot_status(&self, id: EntityId) -> Option<LootStatus> {
        match self.entities.get(&id)?.kind {
            EntityKind::Loot(status) => Some(status),
            EntityKind::Agent { .. } => None,
        }
    }

    fn protected_zone(&self) -> Option<Zone> {
        self.zone
    }
}

impl LootLedger for Scene {
    fn try_claim_loot(&mut self, loot: EntityId, claimant: EntityId) -> bool {
        let Some(record) = self.entities.get_mut(&loot) else {
            return false;
        };
        match &mut record.kind {
            EntityKind::Loot(status) if status.is_available() => {
                status.category = LootCategory::Claimed;
                status.parent = Some(claimant);
                info!("loot {loot:?} claimed by {claimant:?}");
                true
            }
            _ => {
                debug!("claim of {loot:?} by {claimant:?} refused");
                false
            }
        }
    }

    fn deposit_at_base(&mut self, loot: EntityId, at: Vec3) {
        let Some(record) = self.entities.get_mut(&loot) else {
            return;
        };
        if let EntityKind::Loot(status) = &mut record.kind {
            status.category = LootCategory::Deposited;
            status.parent = None;
            record.position = at;
            record.velocity = Vec3::ZERO;
            info!("loot {loot:?} deposited at {at:?}");
        }
    }
}

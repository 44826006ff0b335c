//! Hostile detection set fed by enter/exit events or a region sweep.
use hashbrown::HashSet;

use crate::entity::{EntityId, Faction};
use crate::spatial::{Environment, RegionKind};
use glam::Vec3;

/// Hostiles currently inside the detection radius.
#[derive(Debug, Clone, Default)]
pub struct HostileSensor {
    in_range: HashSet<EntityId>,
}

impl HostileSensor {
    /// Adds `id` to the set.
    pub fn entered(&mut self, id: EntityId) {
        self.in_range.insert(id);
    }

    /// Removes `id` from the set.
    pub fn exited(&mut self, id: EntityId) {
        self.in_range.remove(&id);
    }

    /// Whether `id` is currently sensed.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.in_range.contains(&id)
    }

    /// Whether nothing is sensed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_range.is_empty()
    }

    /// Sensed ids in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.in_range.iter().copied()
    }

    /// Drops entries that no longer resolve to a live agent.
    pub fn prune<E: Environment + ?Sized>(&mut self, env: &E) {
        self.in_range.retain(|id| env.is_alive(*id));
    }

    /// Replaces the set with every live non-friendly agent within `radius`.
    pub fn refresh<E: Environment + ?Sized>(
        &mut self,
        env: &E,
        me: EntityId,
        faction: Faction,
        position: Vec3,
        radius: f32,
    ) {
        self.in_range = env
            .probe_region(position, radius, RegionKind::Allies)
            .into_iter()
            .filter(|id| *id != me)
            .filter(|id| {
                env.faction_of(*id)
                    .is_some_and(|other| !faction.is_friendly_to(other))
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Scene;

    #[test]
    fn refresh_keeps_only_hostiles_in_range() {
        let mut scene = Scene::new();
        let me = scene.spawn_agent(Vec3::ZERO, Faction::Ally);
        let friend = scene.spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Ally);
        let near_enemy = scene.spawn_agent(Vec3::new(0.0, 0.0, 3.0), Faction::Enemy);
        let far_enemy = scene.spawn_agent(Vec3::new(0.0, 0.0, 30.0), Faction::Enemy);

        let mut sensor = HostileSensor::default();
        sensor.refresh(&scene, me, Faction::Ally, Vec3::ZERO, 6.0);

        assert!(sensor.contains(near_enemy));
        assert!(!sensor.contains(friend));
        assert!(!sensor.contains(far_enemy));
        assert!(!sensor.contains(me));
    }

    #[test]
    fn prune_drops_dead_entries() {
        let mut scene = Scene::new();
        let enemy = scene.spawn_agent(Vec3::ZERO, Faction::Enemy);
        let mut sensor = HostileSensor::default();
        sensor.entered(enemy);
        scene
            .set_alive(enemy, false)
            .unwrap_or_else(|err| panic!("{err}"));
        sensor.prune(&scene);
        assert!(sensor.is_empty());
    }
}

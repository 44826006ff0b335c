//! Bevy plugin running the behaviour core inside an ECS app.
//!
//! The [`Scene`] lives in a resource and is the single source of truth for
//! the facade queries. Transforms of externally driven entities are copied
//! into it at the start of the frame, every controller is then ticked in
//! turn, and each agent's result is written back to both its transform and
//! the scene before the next agent runs.
use bevy::prelude::*;
use bevy::time::Time;
use bevy_ecs::system::SystemParam;
use bevy_transform::components::Transform;
use glam::Quat;
use log::{debug, warn};

use crate::components::{
    body_from, write_body, yaw_of, AnimationState, Brain, LootItem, SceneId, Velocity, Vitals,
};
use crate::controller::{AgentController, ControllerBuilder, TickContext};
use crate::entity::Faction;
use crate::spatial::{Scene, SceneError, SceneView};

/// The shared scene every controller queries.
#[derive(Resource, Debug, Clone, Default, Deref, DerefMut)]
pub struct SceneResource(pub Scene);

/// Bevy plugin installing the behaviour systems.
#[derive(Default)]
pub struct CritterAiPlugin;

impl Plugin for CritterAiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneResource>();
        app.add_systems(
            Update,
            (
                sync_scene_system,
                sense_hostiles_system,
                tick_brains_system,
                carry_loot_system,
            )
                .chain(),
        );
    }
}

fn log_scene_error(result: Result<(), SceneError>) {
    if let Err(err) = result {
        warn!("scene out of step with the ECS: {err}");
    }
}

/// Copies transforms and velocities of non-loot entities into the scene.
pub fn sync_scene_system(
    mut scene: ResMut<SceneResource>,
    query: Query<(&SceneId, &Transform, Option<&Velocity>), Without<LootItem>>,
) {
    for (id, transform, moving) in &query {
        log_scene_error(scene.set_position(**id, transform.translation));
        log_scene_error(scene.set_yaw(**id, yaw_of(transform)));
        if let Some(velocity) = moving {
            log_scene_error(scene.set_velocity(**id, velocity.0));
        }
    }
}

/// Rebuilds each brain's hostile set from the scene.
pub fn sense_hostiles_system(
    scene: Res<SceneResource>,
    mut brains: Query<(&mut Brain, &Transform)>,
) {
    for (mut brain, transform) in &mut brains {
        brain.refresh_from_scene(&scene.0, transform.translation);
    }
}

/// Per-agent components touched by [`tick_brains_system`].
#[derive(SystemParam)]
pub struct AgentQuery<'w, 's> {
    /// Brain, stats, animation and kinematics of each agent.
    pub agents: Query<
        'w,
        's,
        (
            &'static mut Brain,
            &'static mut Vitals,
            &'static mut AnimationState,
            &'static mut Transform,
            &'static mut Velocity,
        ),
    >,
}

/// Ticks every controller once and writes the result back.
pub fn tick_brains_system(
    time: Res<Time>,
    mut scene: ResMut<SceneResource>,
    mut agents: AgentQuery,
) {
    let dt = time.delta_secs();
    for (mut brain, mut vitals, mut animation, mut transform, mut velocity) in &mut agents.agents
    {
        vitals.tick_cooldown(dt);
        let mut body = body_from(&transform, *velocity);
        let before = brain.mode();
        let report = {
            let mut ctx = TickContext {
                dt,
                world: &mut scene.0,
                stats: &mut *vitals,
                animator: &mut *animation,
            };
            brain.tick(&mut body, &mut ctx)
        };
        if report.mode != before {
            debug!("agent {} {before:?} -> {:?}", brain.id(), report.mode);
        }
        write_body(&body, &mut transform, &mut velocity);

        let id = brain.id();
        log_scene_error(scene.set_position(id, body.position));
        log_scene_error(scene.set_yaw(id, body.yaw));
        log_scene_error(scene.set_velocity(id, body.velocity));
        scene.sync_carried();
    }
}

/// Moves loot transforms to where the scene holds them.
pub fn carry_loot_system(
    scene: Res<SceneResource>,
    mut loot: Query<(&SceneId, &mut Transform), With<LootItem>>,
) {
    for (id, mut transform) in &mut loot {
        if let Some(position) = scene.position_of(**id) {
            transform.translation = position;
        }
    }
}

/// Spawns a controlled agent registered with the scene.
///
/// `configure` receives a builder already holding the scene id and faction.
pub fn spawn_critter(
    world: &mut World,
    position: Vec3,
    faction: Faction,
    vitals: Vitals,
    configure: impl FnOnce(ControllerBuilder) -> ControllerBuilder,
) -> Entity {
    let id = world
        .get_resource_or_insert_with(SceneResource::default)
        .spawn_agent(position, faction);
    let controller: AgentController = configure(AgentController::builder(id, faction)).build();
    world
        .spawn((
            SceneId(id),
            Brain(controller),
            vitals,
            AnimationState::default(),
            Transform::from_translation(position),
            Velocity::default(),
        ))
        .id()
}

/// Spawns an agent driven from outside the core, such as the player.
pub fn spawn_puppet(world: &mut World, position: Vec3, faction: Faction) -> Entity {
    let id = world
        .get_resource_or_insert_with(SceneResource::default)
        .spawn_agent(position, faction);
    world
        .spawn((
            SceneId(id),
            Transform::from_translation(position).with_rotation(Quat::IDENTITY),
            Velocity::default(),
        ))
        .id()
}

/// Spawns a loot item registered with the scene.
pub fn spawn_loot(world: &mut World, position: Vec3) -> Entity {
    let id = world
        .get_resource_or_insert_with(SceneResource::default)
        .spawn_loot(position);
    world
        .spawn((SceneId(id), LootItem, Transform::from_translation(position)))
        .id()
}

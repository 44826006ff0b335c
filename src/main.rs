//! Headless simulator: runs a small creature scenario for a fixed number of
//! ticks and logs every mode change.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_transform::components::Transform;
use clap::Parser;
use critter_ai::components::{Brain, SceneId};
use critter_ai::controller::Mode;
use critter_ai::plugin::{spawn_critter, spawn_loot, spawn_puppet, SceneResource};
use critter_ai::{init_logging, BehaviourConfig, CritterAiPlugin, EntityId, Faction, Vitals, Zone};
use hashbrown::HashMap;
use log::info;

/// Run a headless creature behaviour scenario
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// Number of simulation ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Seed for the agents' wander randomness
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Fixed time step in milliseconds
    #[arg(long, default_value_t = 50)]
    step_ms: u64,
    /// JSON behaviour configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> Result<BehaviourConfig> {
    let Some(file) = path else {
        return Ok(BehaviourConfig::default());
    };
    BehaviourConfig::from_path(file)
        .with_context(|| format!("loading behaviour config from {}", file.display()))
}

fn scene_id(app: &App, entity: Entity) -> Result<EntityId> {
    app.world()
        .get::<SceneId>(entity)
        .map(|id| **id)
        .context("spawned entity lacks a scene id")
}

fn populate(app: &mut App, config: &BehaviourConfig, seed: u64) -> Result<()> {
    {
        let mut scene = app.world_mut().get_resource_or_insert_with(SceneResource::default);
        scene.add_hazard(Vec3::new(8.0, 0.0, 6.0), 2.0);
        scene.add_hazard(Vec3::new(-6.0, 0.0, -8.0), 1.5);
        scene.add_obstacle(Vec3::new(0.0, 0.0, 10.0), 1.0);
        scene.set_protected_zone(Zone {
            center: Vec3::ZERO,
            radius: 4.0,
        });
    }

    let player = spawn_puppet(app.world_mut(), Vec3::new(0.0, 0.0, 3.0), Faction::Ally);
    let leader = scene_id(app, player)?;
    let base = Vec3::new(-2.0, 0.0, -2.0);

    for (index, spot) in [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]
        .into_iter()
        .enumerate()
    {
        let ally_config = config.clone();
        spawn_critter(
            app.world_mut(),
            spot,
            Faction::Ally,
            Vitals::default(),
            |builder| {
                builder
                    .leader(leader)
                    .base(base)
                    .config(ally_config)
                    .seed(seed.wrapping_add(index as u64))
                    .initial_mode(Mode::Follow)
            },
        );
    }

    let wild_config = config.clone();
    spawn_critter(
        app.world_mut(),
        Vec3::new(12.0, 0.0, -4.0),
        Faction::Wild,
        Vitals::default(),
        |builder| {
            builder
                .config(wild_config)
                .seed(seed.wrapping_add(100))
                .initial_mode(Mode::Wander)
        },
    );

    spawn_puppet(app.world_mut(), Vec3::new(-9.0, 0.0, 4.0), Faction::Enemy);
    for spot in [Vec3::new(4.0, 0.0, -3.0), Vec3::new(-5.0, 0.0, 2.0)] {
        spawn_loot(app.world_mut(), spot);
    }
    Ok(())
}

/// Logs each agent's mode whenever it changes.
fn report_modes_system(
    brains: Query<(&Brain, &Transform)>,
    mut last: Local<HashMap<EntityId, Mode>>,
) {
    for (brain, transform) in &brains {
        let mode = brain.mode();
        if last.insert(brain.id(), mode) != Some(mode) {
            info!(
                "agent {} is now {mode:?} at ({:.2}, {:.2})",
                brain.id(),
                transform.translation.x,
                transform.translation.z
            );
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = load_config(args.config.as_ref())?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(CritterAiPlugin)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            args.step_ms,
        )))
        .add_systems(PostUpdate, report_modes_system);
    populate(&mut app, &config, args.seed)?;

    for _ in 0..args.ticks {
        app.update();
    }
    info!("simulated {} ticks of {} ms", args.ticks, args.step_ms);
    Ok(())
}

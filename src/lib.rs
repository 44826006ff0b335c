#![cfg_attr(docsrs, feature(doc_cfg))]
//! Behaviour core for creatures and allies in a 3D creature simulation.
//!
//! Each agent owns an [`AgentController`], a small mode state machine that
//! follows a leader, wanders safely, fetches loot and fights hostiles. The
//! controller reaches its environment only through the traits in
//! [`spatial`] and [`interfaces`]; [`CritterAiPlugin`] wires it into a Bevy
//! app.
pub mod components;
pub mod config;
pub mod constants;
pub mod controller;
pub mod entity;
pub mod interfaces;
pub mod locomotion;
pub mod logging;
pub mod plugin;
pub mod spatial;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;
pub mod vector_math;
pub mod wander;
pub use constants::*;

// Re-export commonly used items
pub use components::{AnimationClip, AnimationState, Brain, SceneId, Vitals};
pub use config::{BehaviourConfig, ConfigError};
pub use controller::{
    AgentController, ControllerBuilder, Mode, MotionSource, TickContext, TickReport,
};
pub use entity::{EntityId, Faction, LootCategory, LootStatus, Zone};
pub use interfaces::{Animator, CombatStats, Damageable, LootLedger, World};
pub use locomotion::{Body, Locomotable, Locomotion};
pub use logging::init as init_logging;
pub use plugin::{CritterAiPlugin, SceneResource};
pub use spatial::{Environment, RegionKind, Scene, SceneError, SceneView, SpatialQuery, SurfaceKind};
pub use vector_math::{direction_from_yaw, ground_direction, ground_distance};
pub use wander::{WanderPhase, WanderPlanner};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use critter_ai::prelude::*;
    //! ```

    pub use crate::AgentController;
    pub use crate::BehaviourConfig;
    pub use crate::Body;
    pub use crate::EntityId;
    pub use crate::Faction;
    pub use crate::Mode;
    pub use crate::Scene;
    pub use crate::TickContext;
    pub use ordered_float::OrderedFloat;
}

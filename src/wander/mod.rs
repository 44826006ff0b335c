//! Wander planner: pause, turn, walk, repeat.
//!
//! The planner is a small phase machine advanced once per tick. Waits and
//! walks are stored as remaining time or distance, never as blocking
//! sleeps. The walking direction is re-probed every tick so hazards that
//! appear mid-walk stop the agent before it reaches them.

pub mod heading;
pub mod waypoint;

use glam::Vec3;
use log::debug;
use rand::Rng;

use crate::config::WanderConfig;
use crate::entity::Faction;
use crate::locomotion::{Locomotable, Locomotion};
use crate::spatial::{Disc, Environment, SurfaceKind};
use crate::vector_math::{ground_direction, ground_distance, lerp_angle, yaw_from_direction};

pub use heading::choose_heading;
pub use waypoint::{find_safe_waypoint, SafeWaypoint};

/// Remaining distance below which a walk counts as complete.
const ARRIVAL_EPSILON: f32 = 1e-4;

/// Straight-line walk chosen at the end of a pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkPlan {
    /// Unit ground direction.
    pub heading: Vec3,
    /// Length of the walk.
    pub distance: f32,
}

/// Current phase of the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderPhase {
    /// The controller is in another mode.
    Disabled,
    /// Pausing before the next cycle.
    Idle {
        /// Seconds left before the next heading is chosen.
        remaining: f32,
    },
    /// Time-boxed turn toward the planned heading; no translation.
    Turning {
        /// Yaw when the turn started.
        from: f32,
        /// Yaw of the planned heading.
        to: f32,
        /// Seconds spent turning.
        elapsed: f32,
        /// Walk that follows the turn.
        plan: WalkPlan,
    },
    /// Straight-line walk along a fixed heading.
    Walking {
        /// Unit ground direction.
        heading: Vec3,
        /// Planned length.
        total: f32,
        /// Distance covered so far.
        travelled: f32,
        /// Seconds spent walking.
        elapsed: f32,
        /// Time budget derived from `total / speed`.
        duration: f32,
    },
}

/// What the planner did this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WanderStep {
    /// Paused, or disabled.
    Waiting,
    /// Turned in place.
    Turning,
    /// Walked by the given displacement.
    Walked(Vec3),
    /// A hazard or obstacle ahead cut the walk short.
    Aborted,
}

impl WanderStep {
    /// Translation applied this tick, if any.
    #[must_use]
    pub const fn displacement(&self) -> Option<Vec3> {
        match self {
            Self::Walked(moved) => Some(*moved),
            _ => None,
        }
    }
}

/// Per-tick inputs that do not belong to the planner.
#[derive(Debug, Clone, Copy)]
pub struct WanderContext {
    /// Faction of the wandering agent.
    pub faction: Faction,
    /// Sanitised move speed of the agent.
    pub max_speed: f32,
    /// Seconds since the previous tick.
    pub dt: f32,
}

/// The wander behaviour.
#[derive(Debug, Clone)]
pub struct WanderPlanner {
    config: WanderConfig,
    phase: WanderPhase,
    requested_direction: Option<Vec3>,
}

impl WanderPlanner {
    /// Disabled planner.
    #[must_use]
    pub const fn new(config: WanderConfig) -> Self {
        Self {
            config,
            phase: WanderPhase::Disabled,
            requested_direction: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> WanderPhase {
        self.phase
    }

    /// Whether the planner is running.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self.phase, WanderPhase::Disabled)
    }

    /// Whether a walk is in progress.
    #[must_use]
    pub const fn is_walking(&self) -> bool {
        matches!(self.phase, WanderPhase::Walking { .. })
    }

    /// Starts the planner if it is disabled. An enabled planner keeps its
    /// current phase.
    pub const fn enable(&mut self) {
        if !self.is_enabled() {
            self.phase = WanderPhase::Idle { remaining: 0.0 };
        }
    }

    /// Stops the planner mid-turn or mid-walk and clears every timer.
    pub const fn disable(&mut self) {
        self.phase = WanderPhase::Disabled;
        self.requested_direction = None;
    }

    /// Drops the current cycle; the next update picks a fresh heading.
    pub const fn force_new_waypoint(&mut self) {
        if self.is_enabled() {
            self.phase = WanderPhase::Idle { remaining: 0.0 };
        }
    }

    /// Drops the current cycle and walks toward a safe waypoint along
    /// `direction` on the next update.
    pub fn force_waypoint_in_direction(&mut self, direction: Vec3) {
        if self.is_enabled() {
            self.requested_direction = ground_direction(direction);
            self.phase = WanderPhase::Idle { remaining: 0.0 };
        }
    }

    /// Advances the planner by one tick.
    pub fn update<B, E, R>(
        &mut self,
        body: &mut B,
        env: &E,
        rng: &mut R,
        ctx: WanderContext,
    ) -> WanderStep
    where
        B: Locomotable + ?Sized,
        E: Environment + ?Sized,
        R: Rng,
    {
        match self.phase {
            WanderPhase::Disabled => WanderStep::Waiting,
            WanderPhase::Idle { remaining } => self.wait(remaining, body, env, rng, ctx),
            WanderPhase::Turning {
                from,
                to,
                elapsed,
                plan,
            } => self.turn(from, to, elapsed + ctx.dt, plan, body, ctx),
            WanderPhase::Walking { .. } => self.walk(body, env, rng, ctx),
        }
    }

    fn random_wait<R: Rng>(&self, rng: &mut R) -> f32 {
        sample_between(rng, self.config.min_wait, self.config.max_wait)
    }

    fn rest<R: Rng>(&mut self, rng: &mut R) {
        self.phase = WanderPhase::Idle {
            remaining: self.random_wait(rng),
        };
    }

    fn wait<B, E, R>(
        &mut self,
        left: f32,
        body: &mut B,
        env: &E,
        rng: &mut R,
        ctx: WanderContext,
    ) -> WanderStep
    where
        B: Locomotable + ?Sized,
        E: Environment + ?Sized,
        R: Rng,
    {
        Locomotion::stop(body);
        let remaining = left - ctx.dt;
        if remaining > 0.0 {
            self.phase = WanderPhase::Idle { remaining };
            return WanderStep::Waiting;
        }

        let Some(plan) = self.plan_walk(body, env, rng, ctx.faction) else {
            debug!("no safe wander target from {:?}; standing still", body.position());
            self.rest(rng);
            return WanderStep::Waiting;
        };
        self.phase = WanderPhase::Turning {
            from: body.yaw(),
            to: yaw_from_direction(plan.heading),
            elapsed: 0.0,
            plan,
        };
        WanderStep::Turning
    }

    fn plan_walk<B, E, R>(
        &mut self,
        body: &B,
        env: &E,
        rng: &mut R,
        faction: Faction,
    ) -> Option<WalkPlan>
    where
        B: Locomotable + ?Sized,
        E: Environment + ?Sized,
        R: Rng,
    {
        let origin = body.position();
        if let Some(direction) = self.requested_direction.take() {
            let waypoint = find_safe_waypoint(env, origin, direction, &self.config)?;
            let heading = ground_direction(waypoint.point - origin)?;
            return Some(WalkPlan {
                heading,
                distance: ground_distance(origin, waypoint.point),
            });
        }
        let heading = choose_heading(env, origin, body.forward(), faction, &self.config, rng);
        let distance = sample_between(rng, self.config.min_distance, self.config.max_distance);
        Some(WalkPlan { heading, distance })
    }

    fn turn<B: Locomotable + ?Sized>(
        &mut self,
        from: f32,
        to: f32,
        elapsed: f32,
        plan: WalkPlan,
        body: &mut B,
        ctx: WanderContext,
    ) -> WanderStep {
        let t = (elapsed / self.config.turn_duration).min(1.0);
        body.set_yaw(lerp_angle(from, to, t));
        Locomotion::stop(body);
        self.phase = if t >= 1.0 {
            let speed = ctx.max_speed * self.config.speed_scale;
            WanderPhase::Walking {
                heading: plan.heading,
                total: plan.distance,
                travelled: 0.0,
                elapsed: 0.0,
                duration: plan.distance / speed,
            }
        } else {
            WanderPhase::Turning {
                from,
                to,
                elapsed,
                plan,
            }
        };
        WanderStep::Turning
    }

    fn walk<B, E, R>(&mut self, body: &mut B, env: &E, rng: &mut R, ctx: WanderContext) -> WanderStep
    where
        B: Locomotable + ?Sized,
        E: Environment + ?Sized,
        R: Rng,
    {
        let WanderPhase::Walking {
            heading,
            total,
            travelled,
            elapsed,
            duration,
        } = self.phase
        else {
            return WanderStep::Waiting;
        };

        let remaining = (total - travelled).max(0.0);
        let detection = self.config.hazard_detection_distance.min(remaining + 1.0);
        let origin = body.position();
        let blocked = [SurfaceKind::Hazard, SurfaceKind::Obstacle]
            .into_iter()
            .find(|kind| env.probe_direction(origin, heading, detection, *kind).is_some());
        if let Some(kind) = blocked {
            debug!("{kind:?} ahead of {origin:?}; abandoning walk");
            Locomotion::stop(body);
            self.rest(rng);
            return WanderStep::Aborted;
        }
        if leads_into_zone(env, ctx.faction, origin, heading, remaining) {
            debug!("walk from {origin:?} would enter the protected zone; abandoning walk");
            Locomotion::stop(body);
            self.rest(rng);
            return WanderStep::Aborted;
        }

        let speed = ctx.max_speed * self.config.speed_scale;
        let step = (speed * ctx.dt).min(remaining);
        let moved = Locomotion::advance(body, heading, step, ctx.dt);
        let walked = travelled + step;
        let spent = elapsed + ctx.dt;
        if walked >= total - ARRIVAL_EPSILON || spent >= duration + self.config.walk_duration_slack {
            self.rest(rng);
        } else {
            self.phase = WanderPhase::Walking {
                heading,
                total,
                travelled: walked,
                elapsed: spent,
                duration,
            };
        }
        WanderStep::Walked(moved)
    }
}

/// Uniform sample between two bounds given in either order.
///
/// Non-finite bounds yield zero rather than a panic inside the sampler.
fn sample_between<R: Rng>(rng: &mut R, a: f32, b: f32) -> f32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    if low.is_finite() && high.is_finite() {
        rng.random_range(low..=high)
    } else {
        0.0
    }
}

/// Whether the rest of a walk crosses into the protected zone.
///
/// Only factions that avoid the zone are checked, and an agent already
/// inside may walk out.
fn leads_into_zone<E: Environment + ?Sized>(
    env: &E,
    faction: Faction,
    origin: Vec3,
    heading: Vec3,
    remaining: f32,
) -> bool {
    if !faction.avoids_protected_zone() {
        return false;
    }
    env.protected_zone()
        .map(|zone| Disc::new(zone.center, zone.radius))
        .is_some_and(|disc| !disc.contains(origin) && disc.ray_hit(origin, heading, remaining).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Zone;
    use crate::locomotion::Body;
    use crate::spatial::{RegionKind, Scene, SpatialQuery};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::{fixture, rstest};

    const DT: f32 = 0.1;

    fn ctx() -> WanderContext {
        WanderContext {
            faction: Faction::Ally,
            max_speed: 2.0,
            dt: DT,
        }
    }

    #[fixture]
    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn enabled_planner() -> WanderPlanner {
        let mut planner = WanderPlanner::new(WanderConfig::default());
        planner.enable();
        planner
    }

    #[rstest]
    fn disabled_planner_does_nothing(mut rng: StdRng) {
        let mut planner = WanderPlanner::new(WanderConfig::default());
        let mut body = Body::default();
        let step = planner.update(&mut body, &Scene::new(), &mut rng, ctx());
        assert_eq!(step, WanderStep::Waiting);
        assert_eq!(body, Body::default());
    }

    #[rstest]
    fn turn_completes_before_translation(mut rng: StdRng) {
        let scene = Scene::new();
        let mut planner = enabled_planner();
        let mut body = Body::default();

        assert_eq!(planner.update(&mut body, &scene, &mut rng, ctx()), WanderStep::Turning);
        let mut turns = 0;
        while !planner.is_walking() {
            assert!(turns < 10, "turn never completed");
            let step = planner.update(&mut body, &scene, &mut rng, ctx());
            assert_eq!(step, WanderStep::Turning);
            assert_eq!(body.position, Vec3::ZERO);
            turns += 1;
        }
        let step = planner.update(&mut body, &scene, &mut rng, ctx());
        assert!(step.displacement().is_some_and(|d| d.length() > 0.0));
    }

    #[rstest]
    fn mid_walk_hazard_aborts_to_idle(mut rng: StdRng) {
        let mut scene = Scene::new();
        let total = 8.0;
        let travelled = 3.0;
        let remaining = total - travelled;
        // Hazard surface sits at remaining + 0.5 ahead of the agent.
        let edge = remaining + 0.5;
        scene.add_hazard(Vec3::new(0.0, 0.0, edge + 1.0), 1.0);

        let mut planner = enabled_planner();
        planner.phase = WanderPhase::Walking {
            heading: Vec3::Z,
            total,
            travelled,
            elapsed: 1.0,
            duration: 10.0,
        };
        let mut body = Body::default();
        let step = planner.update(&mut body, &scene, &mut rng, ctx());

        assert_eq!(step, WanderStep::Aborted);
        assert!(matches!(planner.phase(), WanderPhase::Idle { .. }));
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[rstest]
    fn distant_hazard_beyond_shortened_range_is_ignored(mut rng: StdRng) {
        let mut scene = Scene::new();
        // One metre left to walk: detection shrinks to two metres.
        scene.add_hazard(Vec3::new(0.0, 0.0, 4.0), 1.0);
        let mut planner = enabled_planner();
        planner.phase = WanderPhase::Walking {
            heading: Vec3::Z,
            total: 8.0,
            travelled: 7.0,
            elapsed: 1.0,
            duration: 10.0,
        };
        let mut body = Body::default();
        let step = planner.update(&mut body, &scene, &mut rng, ctx());
        assert!(matches!(step, WanderStep::Walked(_)));
    }

    #[rstest]
    fn obstacle_ahead_aborts_walk(mut rng: StdRng) {
        let mut scene = Scene::new();
        scene.add_obstacle(Vec3::new(0.0, 0.0, 2.0), 0.5);
        let mut planner = enabled_planner();
        planner.phase = WanderPhase::Walking {
            heading: Vec3::Z,
            total: 8.0,
            travelled: 0.0,
            elapsed: 0.0,
            duration: 10.0,
        };
        let mut body = Body::default();
        assert_eq!(
            planner.update(&mut body, &scene, &mut rng, ctx()),
            WanderStep::Aborted
        );
    }

    #[rstest]
    fn walk_finishes_at_planned_distance(mut rng: StdRng) {
        let scene = Scene::new();
        let mut planner = enabled_planner();
        planner.phase = WanderPhase::Walking {
            heading: Vec3::X,
            total: 0.5,
            travelled: 0.0,
            elapsed: 0.0,
            duration: 10.0,
        };
        let mut body = Body::default();
        for _ in 0..20 {
            planner.update(&mut body, &scene, &mut rng, ctx());
            if !planner.is_walking() {
                break;
            }
        }
        assert_relative_eq!(body.position.x, 0.5, epsilon = 1e-4);
        assert!(matches!(planner.phase(), WanderPhase::Idle { .. }));
    }

    #[rstest]
    fn disable_resets_mid_walk(mut rng: StdRng) {
        let scene = Scene::new();
        let mut planner = enabled_planner();
        let mut body = Body::default();
        planner.update(&mut body, &scene, &mut rng, ctx());
        planner.disable();
        assert_eq!(planner.phase(), WanderPhase::Disabled);
        planner.enable();
        assert_eq!(planner.phase(), WanderPhase::Idle { remaining: 0.0 });
    }

    #[rstest]
    fn forced_direction_walks_to_a_safe_waypoint(mut rng: StdRng) {
        let mut scene = Scene::new();
        scene.add_hazard(Vec3::new(8.0, 0.0, 0.0), 2.0);
        let mut planner = enabled_planner();
        planner.force_waypoint_in_direction(Vec3::X);
        let mut body = Body::default();
        planner.update(&mut body, &scene, &mut rng, ctx());
        let WanderPhase::Turning { plan, .. } = planner.phase() else {
            panic!("expected a turn toward the waypoint, got {:?}", planner.phase());
        };
        let waypoint = body.position + plan.heading * plan.distance;
        let config = WanderConfig::default();
        assert!(scene
            .probe_region(waypoint, config.safety_radius * 0.5, RegionKind::Hazard)
            .is_empty());
    }

    #[rstest]
    fn boxed_in_agent_waits_instead_of_walking(mut rng: StdRng) {
        let mut scene = Scene::new();
        scene.add_hazard(Vec3::ZERO, 50.0);
        let mut planner = enabled_planner();
        planner.force_waypoint_in_direction(Vec3::X);
        let mut body = Body::default();
        let step = planner.update(&mut body, &scene, &mut rng, ctx());
        assert_eq!(step, WanderStep::Waiting);
        assert!(matches!(planner.phase(), WanderPhase::Idle { .. }));
    }

    fn walking_toward(heading: Vec3, total: f32) -> WanderPlanner {
        let mut planner = enabled_planner();
        planner.phase = WanderPhase::Walking {
            heading,
            total,
            travelled: 0.0,
            elapsed: 0.0,
            duration: 10.0,
        };
        planner
    }

    fn zoned_scene() -> Scene {
        let mut scene = Scene::new();
        scene.set_protected_zone(Zone {
            center: Vec3::new(0.0, 0.0, 6.0),
            radius: 2.0,
        });
        scene
    }

    #[rstest]
    #[case::wild(Faction::Wild)]
    #[case::enemy(Faction::Enemy)]
    fn walk_into_protected_zone_aborts(mut rng: StdRng, #[case] faction: Faction) {
        let scene = zoned_scene();
        let mut planner = walking_toward(Vec3::Z, 8.0);
        let mut body = Body::default();
        let step = planner.update(&mut body, &scene, &mut rng, WanderContext { faction, ..ctx() });
        assert_eq!(step, WanderStep::Aborted);
        assert_eq!(body.position, Vec3::ZERO);
    }

    #[rstest]
    fn allies_walk_through_the_zone(mut rng: StdRng) {
        let scene = zoned_scene();
        let mut planner = walking_toward(Vec3::Z, 8.0);
        let mut body = Body::default();
        let step = planner.update(&mut body, &scene, &mut rng, ctx());
        assert!(matches!(step, WanderStep::Walked(_)));
    }

    #[rstest]
    fn walk_stopping_short_of_the_zone_continues(mut rng: StdRng) {
        let scene = zoned_scene();
        let mut planner = walking_toward(Vec3::Z, 3.0);
        let mut body = Body::default();
        let wild = WanderContext {
            faction: Faction::Wild,
            ..ctx()
        };
        assert!(matches!(
            planner.update(&mut body, &scene, &mut rng, wild),
            WanderStep::Walked(_)
        ));
    }

    #[rstest]
    fn inverted_ranges_still_sample(mut rng: StdRng) {
        let config = WanderConfig {
            min_wait: 3.0,
            max_wait: 1.0,
            min_distance: 9.0,
            max_distance: 2.0,
            ..WanderConfig::default()
        };
        let mut planner = WanderPlanner::new(config);
        planner.enable();
        let scene = Scene::new();
        let mut body = Body::default();
        for _ in 0..200 {
            planner.update(&mut body, &scene, &mut rng, ctx());
            match planner.phase() {
                WanderPhase::Idle { remaining } => assert!(remaining <= 3.0),
                WanderPhase::Turning { plan, .. } => {
                    assert!((2.0..=9.0).contains(&plan.distance));
                }
                _ => {}
            }
        }
    }

    #[rstest]
    fn idle_wait_counts_down(mut rng: StdRng) {
        let scene = Scene::new();
        let mut planner = enabled_planner();
        planner.phase = WanderPhase::Idle { remaining: 1.0 };
        let mut body = Body::default();
        assert_eq!(
            planner.update(&mut body, &scene, &mut rng, ctx()),
            WanderStep::Waiting
        );
        let WanderPhase::Idle { remaining } = planner.phase() else {
            panic!("still idle");
        };
        assert_relative_eq!(remaining, 0.9, epsilon = 1e-6);
    }
}

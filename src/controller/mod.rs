//! The agent controller: one mode state machine per creature.
//!
//! A tick runs a fixed priority ladder (death, carrying, loot scan,
//! hostiles, stale chase, mode dispatch). Handlers never switch modes
//! themselves; they hand back a [`Transition`] which [`AgentController`]
//! applies exactly once after the handler has returned.

pub mod avoidance;
mod combat;
mod follow;
mod loot;
pub mod modes;
pub mod sensing;

use glam::Vec3;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::BehaviourConfig;
use crate::entity::{EntityId, Faction};
use crate::interfaces::{Animator, CombatStats, World};
use crate::locomotion::{sanitise_move_speed, Locomotable, Locomotion, SpeedCheck};
use crate::spatial::{Environment, RegionKind};
use crate::wander::{WanderContext, WanderPlanner};

pub use modes::{Mode, ModeHistory, Transition};
pub use sensing::HostileSensor;

/// Which behaviour moved the agent during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionSource {
    /// The wander planner's walk.
    Wander,
    /// A mode handler's own steering call.
    Handler,
    /// The overlap correction applied on an otherwise idle tick.
    Avoidance,
}

/// Summary of one [`AgentController::tick`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Mode after the tick.
    pub mode: Mode,
    /// Behaviour that moved the body, if any.
    pub moved_by: Option<MotionSource>,
    /// Total translation applied this tick.
    pub displacement: Vec3,
    /// Whether `try_attack` landed this tick.
    pub attacked: bool,
    /// Speed actually used for locomotion.
    pub move_speed: f32,
    /// Whether the reported speed replaced an invalid stats value.
    pub speed_corrected: bool,
}

/// A hostile being chased, with the last place it was seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseTarget {
    /// The hostile.
    pub id: EntityId,
    /// Where it was last sensed.
    pub last_known_position: Vec3,
}

/// Collaborators injected for the duration of one tick.
pub struct TickContext<'a> {
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Spatial queries and the loot ledger.
    pub world: &'a mut dyn World,
    /// Stats of the ticking agent.
    pub stats: &'a mut dyn CombatStats,
    /// Animation sink of the ticking agent.
    pub animator: &'a mut dyn Animator,
}

/// Bookkeeping for a single tick.
#[derive(Debug, Clone, Copy)]
struct Frame {
    speed: SpeedCheck,
    moved_by: Option<MotionSource>,
    displacement: Vec3,
    attacked: bool,
    in_attack_range: bool,
}

impl Frame {
    const fn new(speed: SpeedCheck) -> Self {
        Self {
            speed,
            moved_by: None,
            displacement: Vec3::ZERO,
            attacked: false,
            in_attack_range: false,
        }
    }

    /// Records a displacement, flagging a second mover within one tick.
    fn record(&mut self, agent: EntityId, source: MotionSource, displacement: Vec3) {
        if displacement == Vec3::ZERO {
            return;
        }
        if let Some(prior) = self.moved_by {
            warn!("agent {agent} moved by {source:?} after {prior:?} in one tick");
            debug_assert!(false, "agent {agent} moved twice in one tick");
        }
        self.moved_by = Some(source);
        self.displacement += displacement;
    }

    const fn report(&self, mode: Mode) -> TickReport {
        TickReport {
            mode,
            moved_by: self.moved_by,
            displacement: self.displacement,
            attacked: self.attacked,
            move_speed: self.speed.speed,
            speed_corrected: self.speed.corrected,
        }
    }
}

/// Configures and builds an [`AgentController`].
#[derive(Debug, Clone)]
pub struct ControllerBuilder {
    id: EntityId,
    faction: Faction,
    leader: Option<EntityId>,
    base: Option<Vec3>,
    config: BehaviourConfig,
    seed: Option<u64>,
    initial_mode: Mode,
}

impl ControllerBuilder {
    /// Leader to follow.
    #[must_use]
    pub fn leader(mut self, leader: EntityId) -> Self {
        self.leader = Some(leader);
        self
    }

    /// Where carried loot is delivered.
    #[must_use]
    pub fn base(mut self, base: Vec3) -> Self {
        self.base = Some(base);
        self
    }

    /// Overrides the default behaviour parameters.
    #[must_use]
    pub fn config(mut self, config: BehaviourConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the wander RNG; defaults to the entity id.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Standing mode to start in; defaults to [`Mode::Wander`].
    #[must_use]
    pub fn initial_mode(mut self, mode: Mode) -> Self {
        self.initial_mode = mode;
        self
    }

    /// Finishes the controller.
    ///
    /// A configuration that fails [`BehaviourConfig::validate`] is replaced
    /// by the defaults with a warning.
    #[must_use]
    pub fn build(self) -> AgentController {
        if self.initial_mode.is_interrupt() {
            warn!(
                "agent {} cannot start in {:?}; starting in Wander",
                self.id, self.initial_mode
            );
        }
        let config = match self.config.validate() {
            Ok(()) => self.config,
            Err(err) => {
                warn!("agent {} rejected its behaviour config ({err}); using defaults", self.id);
                BehaviourConfig::default()
            }
        };
        let modes = ModeHistory::new(self.initial_mode);
        let mut planner = WanderPlanner::new(config.wander.clone());
        if modes.current() == Mode::Wander {
            planner.enable();
        }
        AgentController {
            id: self.id,
            faction: self.faction,
            leader: self.leader,
            base: self.base,
            locomotion: Locomotion::from_degrees(config.locomotion.turn_rate_degrees),
            rng: StdRng::seed_from_u64(self.seed.unwrap_or(self.id.into_inner())),
            config,
            modes,
            planner,
            sensor: HostileSensor::default(),
            chase: None,
            loot_goal: None,
            carried_loot: None,
            loot_cooldown: 0.0,
            pending_request: None,
            pending_direction: None,
            speed_warning_logged: false,
        }
    }
}

/// Behaviour controller for one agent.
#[derive(Debug, Clone)]
pub struct AgentController {
    id: EntityId,
    faction: Faction,
    leader: Option<EntityId>,
    base: Option<Vec3>,
    config: BehaviourConfig,
    locomotion: Locomotion,
    rng: StdRng,
    modes: ModeHistory,
    planner: WanderPlanner,
    sensor: HostileSensor,
    chase: Option<ChaseTarget>,
    loot_goal: Option<EntityId>,
    carried_loot: Option<EntityId>,
    /// Seconds until the next loot scan or pickup is allowed.
    loot_cooldown: f32,
    pending_request: Option<Mode>,
    /// Heading handed to the wander planner once the agent is wandering.
    pending_direction: Option<Vec3>,
    speed_warning_logged: bool,
}

impl AgentController {
    /// Starts building a controller for agent `id`.
    #[must_use]
    pub fn builder(id: EntityId, faction: Faction) -> ControllerBuilder {
        ControllerBuilder {
            id,
            faction,
            leader: None,
            base: None,
            config: BehaviourConfig::default(),
            seed: None,
            initial_mode: Mode::Wander,
        }
    }

    /// Entity driven by this controller.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Allegiance used for hostility and ally avoidance.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.modes.current()
    }

    /// Mode history, including the interrupt episode in progress.
    #[must_use]
    pub const fn history(&self) -> &ModeHistory {
        &self.modes
    }

    /// The wander planner, enabled only in [`Mode::Wander`].
    #[must_use]
    pub const fn planner(&self) -> &WanderPlanner {
        &self.planner
    }

    /// Loot currently carried.
    #[must_use]
    pub const fn carried_loot(&self) -> Option<EntityId> {
        self.carried_loot
    }

    /// Loot being walked to.
    #[must_use]
    pub const fn loot_goal(&self) -> Option<EntityId> {
        self.loot_goal
    }

    /// Hostile being engaged.
    #[must_use]
    pub const fn chase_target(&self) -> Option<ChaseTarget> {
        self.chase
    }

    /// Leader being followed.
    #[must_use]
    pub const fn leader(&self) -> Option<EntityId> {
        self.leader
    }

    /// Delivery point for carried loot.
    #[must_use]
    pub const fn base(&self) -> Option<Vec3> {
        self.base
    }

    /// Behaviour parameters in effect after validation.
    #[must_use]
    pub const fn config(&self) -> &BehaviourConfig {
        &self.config
    }

    /// Hostiles currently sensed.
    #[must_use]
    pub const fn hostiles(&self) -> &HostileSensor {
        &self.sensor
    }

    /// Replaces the leader; `None` makes Follow fall back to Wander.
    pub const fn set_leader(&mut self, leader: Option<EntityId>) {
        self.leader = leader;
    }

    /// Replaces the delivery point.
    pub const fn set_base(&mut self, base: Option<Vec3>) {
        self.base = base;
    }

    /// Asks for a standing mode change at the start of the next tick.
    ///
    /// Requests made during an interrupt episode wait until it ends.
    /// Interrupt modes cannot be requested; they are entered only by the
    /// controller's own scans.
    pub fn request_mode(&mut self, mode: Mode) {
        if mode.is_interrupt() {
            warn!("agent {} ignored external request for {mode:?}", self.id);
            return;
        }
        self.pending_request = Some(mode);
    }

    /// Asks the wander planner to head for a safe waypoint along
    /// `direction` from the next tick.
    ///
    /// The request waits out an interrupt episode and is dropped if the
    /// agent is not wandering when it is due.
    pub const fn force_wander_direction(&mut self, direction: Vec3) {
        self.pending_direction = Some(direction);
    }

    /// Records a hostile entering the detection volume.
    pub fn on_hostile_entered(&mut self, hostile: EntityId) {
        if hostile != self.id {
            self.sensor.entered(hostile);
        }
    }

    /// Records a hostile leaving the detection volume.
    pub fn on_hostile_exited(&mut self, hostile: EntityId) {
        self.sensor.exited(hostile);
    }

    /// Rebuilds the hostile set from a region sweep around `position`.
    pub fn refresh_from_scene<E: Environment + ?Sized>(&mut self, env: &E, position: Vec3) {
        self.sensor.refresh(
            env,
            self.id,
            self.faction,
            position,
            self.config.combat.detection_radius,
        );
    }

    /// Runs one evaluation of the priority ladder.
    pub fn tick<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
    ) -> TickReport {
        let mut frame = Frame::new(self.sanitised_speed(ctx.stats.move_speed()));
        if ctx.stats.is_dead() {
            Locomotion::stop(body);
            ctx.animator.request_walking(false);
            ctx.animator.request_attacking(false);
            ctx.animator.request_idle();
            return frame.report(self.mode());
        }

        self.housekeeping(ctx);

        if let Some(transition) = self.evaluate(body, ctx, &mut frame) {
            self.apply(transition, ctx);
        }
        if frame.moved_by.is_none() {
            self.settle_overlap(body, ctx, &mut frame);
        }
        self.animate(ctx, &frame);
        frame.report(self.mode())
    }

    fn evaluate<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
    ) -> Option<Transition> {
        if self.carried_loot.is_some() {
            self.apply(Transition::Interrupt(Mode::Carrying), ctx);
            return self.carry(body, ctx, frame);
        }

        match self.scan_for_loot(body.position(), ctx) {
            Some(loot::LootScan::PickedUp) => return Some(Transition::Interrupt(Mode::Carrying)),
            Some(loot::LootScan::Spotted(loot)) => {
                self.apply(Transition::Interrupt(Mode::GoingToLoot), ctx);
                self.loot_goal = Some(loot);
            }
            None => {}
        }

        if let Some(target) = self.nearest_hostile(body.position(), ctx) {
            self.chase = Some(target);
            self.apply(Transition::Interrupt(Mode::Attacking), ctx);
            return self.attack(body, ctx, frame, target);
        }

        if self.chase.is_some() {
            return self.continue_chase(body, ctx, frame);
        }

        match self.mode() {
            Mode::Follow => self.follow(body, ctx, frame),
            Mode::Wander => {
                self.wander(body, ctx, frame);
                None
            }
            Mode::GoingToLoot => self.go_to_loot(body, ctx, frame),
            Mode::Carrying | Mode::Attacking => Some(Transition::RestoreOriginal),
        }
    }

    /// Applies a transition and its side effects on the planner, the chase
    /// record and the loot goal.
    fn apply(&mut self, transition: Transition, ctx: &mut TickContext<'_>) {
        let before = self.mode();
        if !self.modes.apply(transition) {
            return;
        }
        let now = self.mode();
        if before == Mode::Attacking {
            ctx.animator.request_attacking(false);
        }
        if now != Mode::Attacking {
            self.chase = None;
        }
        if now != Mode::GoingToLoot {
            self.loot_goal = None;
        }
        if now == Mode::Wander {
            self.planner.enable();
            self.planner.force_new_waypoint();
        } else {
            self.planner.disable();
        }
    }

    fn housekeeping(&mut self, ctx: &mut TickContext<'_>) {
        self.loot_cooldown = (self.loot_cooldown - ctx.dt).max(0.0);
        if self.modes.in_episode() {
            return;
        }
        if let Some(mode) = self.pending_request.take() {
            self.apply(Transition::Standing(mode), ctx);
        }
        let Some(direction) = self.pending_direction.take() else {
            return;
        };
        if self.mode() == Mode::Wander {
            self.planner.enable();
            self.planner.force_waypoint_in_direction(direction);
        } else {
            debug!(
                "agent {} dropped wander direction {direction:?} while in {:?}",
                self.id,
                self.mode()
            );
        }
    }

    fn sanitised_speed(&mut self, raw: f32) -> SpeedCheck {
        let check = sanitise_move_speed(raw);
        if check.corrected && !self.speed_warning_logged {
            warn!(
                "agent {} has invalid move speed {raw}; using {}",
                self.id, check.speed
            );
            self.speed_warning_logged = true;
        }
        check
    }

    fn wander<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
    ) {
        self.planner.enable();
        let step = self.planner.update(
            body,
            &*ctx.world,
            &mut self.rng,
            WanderContext {
                faction: self.faction,
                max_speed: frame.speed.speed,
                dt: ctx.dt,
            },
        );
        if let Some(moved) = step.displacement() {
            frame.record(self.id, MotionSource::Wander, moved);
        }
    }

    /// Positions of same-faction agents near `position`, excluding self.
    fn ally_positions<E: Environment + ?Sized>(&self, env: &E, position: Vec3) -> Vec<Vec3> {
        env.probe_region(position, self.config.avoidance.query_radius, RegionKind::Allies)
            .into_iter()
            .filter(|id| *id != self.id)
            .filter(|id| env.faction_of(*id) == Some(self.faction))
            .filter_map(|id| env.position_of(id))
            .collect()
    }

    /// Handler movement toward `target` with ally avoidance, never passing
    /// the target.
    fn drive_towards<B: Locomotable + ?Sized>(
        &self,
        body: &mut B,
        ctx: &TickContext<'_>,
        frame: &mut Frame,
        target: Vec3,
        speed_scale: f32,
    ) {
        let position = body.position();
        let Some(goal) = crate::vector_math::ground_direction(target - position) else {
            Locomotion::stop(body);
            return;
        };
        let neighbours = self.ally_positions(&*ctx.world, position);
        let direction = avoidance::avoid(position, goal, &neighbours, &self.config.avoidance);
        let moved = self.locomotion.steer_within(
            body,
            direction,
            speed_scale,
            frame.speed.speed,
            ctx.dt,
            crate::vector_math::ground_distance(position, target),
        );
        frame.record(self.id, MotionSource::Handler, moved);
    }

    /// Handler movement along `direction` with ally avoidance.
    fn drive_along<B: Locomotable + ?Sized>(
        &self,
        body: &mut B,
        ctx: &TickContext<'_>,
        frame: &mut Frame,
        direction: Vec3,
        speed_scale: f32,
    ) {
        let position = body.position();
        let neighbours = self.ally_positions(&*ctx.world, position);
        let blended = avoidance::avoid(position, direction, &neighbours, &self.config.avoidance);
        let moved = self
            .locomotion
            .steer(body, blended, speed_scale, frame.speed.speed, ctx.dt);
        frame.record(self.id, MotionSource::Handler, moved);
    }

    /// Separates stacked allies on ticks where nothing else moved the body.
    fn settle_overlap<B: Locomotable + ?Sized>(
        &self,
        body: &mut B,
        ctx: &TickContext<'_>,
        frame: &mut Frame,
    ) {
        if !matches!(
            self.mode(),
            Mode::Follow | Mode::GoingToLoot | Mode::Carrying
        ) {
            return;
        }
        let position = body.position();
        let neighbours = self.ally_positions(&*ctx.world, position);
        if let Some(push) =
            avoidance::overlap_correction(position, &neighbours, &self.config.avoidance)
        {
            body.set_position(position + push);
            frame.record(self.id, MotionSource::Avoidance, push);
        }
    }

    fn animate(&self, ctx: &mut TickContext<'_>, frame: &Frame) {
        let walking = frame.moved_by.is_some_and(|source| source != MotionSource::Avoidance);
        ctx.animator.request_walking(walking);
        ctx.animator.request_attacking(frame.in_attack_range);
        if !walking && !frame.in_attack_range {
            ctx.animator.request_idle();
        }
    }
}

#[cfg(test)]
mod tests;

//! Hostile selection, attacks and stale chases.
use glam::Vec3;
use log::debug;
use ordered_float::OrderedFloat;

use super::{AgentController, ChaseTarget, Frame, MotionSource, TickContext, Transition};
use crate::locomotion::{Locomotable, Locomotion};
use crate::vector_math::{ground_direction, ground_distance};

impl AgentController {
    /// Nearest live non-friendly agent in the hostile set.
    pub(super) fn nearest_hostile(
        &mut self,
        position: Vec3,
        ctx: &TickContext<'_>,
    ) -> Option<ChaseTarget> {
        let world = &*ctx.world;
        self.sensor.prune(world);
        self.sensor
            .iter()
            .filter(|id| *id != self.id)
            .filter(|id| {
                world
                    .faction_of(*id)
                    .is_some_and(|other| !self.faction.is_friendly_to(other))
            })
            .filter_map(|id| {
                world.position_of(id).map(|at| ChaseTarget {
                    id,
                    last_known_position: at,
                })
            })
            .min_by_key(|target| {
                (
                    OrderedFloat(ground_distance(position, target.last_known_position)),
                    target.id,
                )
            })
    }

    fn attack_range(ctx: &TickContext<'_>) -> f32 {
        ctx.stats.attack_range().max(0.0)
    }

    /// Faces the target, then either strikes or closes the distance.
    ///
    /// At most one attack is attempted per tick.
    pub(super) fn attack<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
        target: ChaseTarget,
    ) -> Option<Transition> {
        let position = body.position();
        let goal = target.last_known_position;
        let range = Self::attack_range(ctx);
        let distance = ground_distance(position, goal);

        if distance > range {
            let stop_short = ground_direction(goal - position)
                .map_or(goal, |dir| goal - dir * (range * 0.5));
            let moved = self.locomotion.move_towards(
                body,
                stop_short,
                self.config.combat.chase_speed_scale,
                frame.speed.speed,
                ctx.dt,
            );
            frame.record(self.id, MotionSource::Handler, moved);
            return None;
        }

        self.locomotion.face(body, goal - position, ctx.dt);
        Locomotion::stop(body);
        frame.in_attack_range = true;
        if !frame.attacked
            && ctx.stats.attack_cooldown_remaining() <= 0.0
            && ctx.stats.try_attack(target.id)
        {
            debug!("agent {} hit {}", self.id, target.id);
            frame.attacked = true;
        }
        None
    }

    /// Walks to where a lost target was last seen, or gives up.
    pub(super) fn continue_chase<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
    ) -> Option<Transition> {
        let chase = self.chase?;
        if !ctx.world.is_alive(chase.id) {
            debug!("agent {}: chase target {} is gone", self.id, chase.id);
            return Some(Transition::RestoreOriginal);
        }
        let distance = ground_distance(body.position(), chase.last_known_position);
        if distance <= Self::attack_range(ctx) || distance > self.config.combat.give_up_range {
            debug!(
                "agent {} ends chase of {} at {distance:.2}",
                self.id, chase.id
            );
            Locomotion::stop(body);
            return Some(Transition::RestoreOriginal);
        }
        let moved = self.locomotion.move_towards(
            body,
            chase.last_known_position,
            self.config.combat.chase_speed_scale,
            frame.speed.speed,
            ctx.dt,
        );
        frame.record(self.id, MotionSource::Handler, moved);
        None
    }
}

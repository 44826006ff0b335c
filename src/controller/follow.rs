//! Follow handler: keep station behind the leader.
use glam::Vec3;
use log::warn;

use super::{AgentController, Frame, Mode, TickContext, Transition};
use crate::locomotion::{Locomotable, Locomotion};
use crate::vector_math::{direction_from_yaw, flatten, ground_direction, ground_distance};

impl AgentController {
    pub(super) fn follow<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
    ) -> Option<Transition> {
        let world = &*ctx.world;
        let resolved = self
            .leader
            .filter(|id| world.is_alive(*id))
            .and_then(|id| world.position_of(id).map(|at| (id, at)));
        let Some((leader, leader_position)) = resolved else {
            warn!(
                "agent {} lost its leader {:?}; wandering instead",
                self.id, self.leader
            );
            return Some(Transition::Standing(Mode::Wander));
        };

        let config = &self.config.follow;
        let leader_velocity = flatten(world.velocity_of(leader).unwrap_or(Vec3::ZERO));
        let leader_forward = ground_direction(leader_velocity)
            .or_else(|| world.facing_of(leader).map(direction_from_yaw))
            .unwrap_or(Vec3::Z);
        let ideal = leader_position - leader_forward * config.distance;
        let position = body.position();

        if ground_distance(position, leader_position) > config.distance * 2.0 {
            let catch_up = config.catch_up_scale;
            self.drive_towards(body, ctx, frame, leader_position, catch_up);
        } else if ground_distance(position, ideal) > config.position_tolerance {
            self.drive_towards(body, ctx, frame, ideal, 1.0);
        } else if leader_velocity.length() > config.leader_moving_threshold {
            let scale = leader_velocity.length() / frame.speed.speed;
            self.drive_along(body, ctx, frame, leader_forward, scale);
        } else {
            Locomotion::stop(body);
        }
        None
    }
}

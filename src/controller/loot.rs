//! Loot seeking and delivery.
use glam::Vec3;
use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use super::{AgentController, Frame, Mode, TickContext, Transition};
use crate::entity::EntityId;
use crate::locomotion::{Locomotable, Locomotion};
use crate::spatial::RegionKind;
use crate::vector_math::ground_distance;

/// Outcome of a loot scan that found something.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LootScan {
    /// Claimed on the spot; the agent is now carrying it.
    PickedUp,
    /// Free loot out of reach; worth walking to.
    Spotted(EntityId),
}

impl AgentController {
    /// Looks for the nearest free loot unless busy or cooling down.
    ///
    /// Skipped while any chase record exists, stale or not, so a lost
    /// target is always followed up before loot is considered.
    pub(super) fn scan_for_loot(
        &mut self,
        position: Vec3,
        ctx: &mut TickContext<'_>,
    ) -> Option<LootScan> {
        if self.carried_loot.is_some()
            || self.chase.is_some()
            || matches!(self.mode(), Mode::Attacking | Mode::GoingToLoot)
            || self.loot_cooldown > 0.0
        {
            return None;
        }
        let config = &self.config.loot;
        self.loot_cooldown = config.scan_interval;

        let world = &*ctx.world;
        let (loot, distance) = world
            .probe_region(position, config.detection_radius, RegionKind::Loot)
            .into_iter()
            .filter(|id| world.loot_status(*id).is_some_and(|status| status.is_available()))
            .filter_map(|id| {
                world
                    .position_of(id)
                    .map(|at| (id, ground_distance(position, at)))
            })
            .min_by_key(|(id, distance)| (OrderedFloat(*distance), *id))?;

        if distance > config.pickup_distance {
            debug!("agent {} spotted loot {loot} at {distance:.2}", self.id);
            return Some(LootScan::Spotted(loot));
        }
        if ctx.world.try_claim_loot(loot, self.id) {
            info!("agent {} picked up loot {loot}", self.id);
            self.carried_loot = Some(loot);
            Some(LootScan::PickedUp)
        } else {
            None
        }
    }

    pub(super) fn go_to_loot<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
    ) -> Option<Transition> {
        let Some(loot) = self.loot_goal else {
            return Some(Transition::ReturnToPrevious);
        };
        let located = ctx
            .world
            .loot_status(loot)
            .filter(|status| status.is_available())
            .and_then(|_| ctx.world.position_of(loot));
        let Some(target) = located else {
            debug!("agent {} abandons loot {loot}: gone or claimed", self.id);
            Locomotion::stop(body);
            return Some(Transition::ReturnToPrevious);
        };

        if ground_distance(body.position(), target) > self.config.loot.pickup_distance {
            self.drive_towards(body, ctx, frame, target, 1.0);
            return None;
        }
        Locomotion::stop(body);
        if ctx.world.try_claim_loot(loot, self.id) {
            info!("agent {} picked up loot {loot}", self.id);
            self.carried_loot = Some(loot);
            Some(Transition::Interrupt(Mode::Carrying))
        } else {
            debug!("agent {} lost the race for loot {loot}", self.id);
            Some(Transition::ReturnToPrevious)
        }
    }

    pub(super) fn carry<B: Locomotable + ?Sized>(
        &mut self,
        body: &mut B,
        ctx: &mut TickContext<'_>,
        frame: &mut Frame,
    ) -> Option<Transition> {
        let loot = self.carried_loot?;
        if ctx.world.loot_status(loot).is_none() {
            warn!("agent {} was carrying loot {loot} which no longer exists", self.id);
            self.carried_loot = None;
            return Some(Transition::RestoreOriginal);
        }
        let position = body.position();
        let base = self.base.unwrap_or_else(|| {
            warn!("agent {} has no base; dropping loot {loot} here", self.id);
            position
        });

        if ground_distance(position, base) > self.config.loot.drop_distance {
            self.drive_towards(body, ctx, frame, base, 1.0);
            return None;
        }
        Locomotion::stop(body);
        ctx.world.deposit_at_base(loot, base + self.config.loot.drop_offset);
        info!("agent {} delivered loot {loot}", self.id);
        self.carried_loot = None;
        self.loot_cooldown = self.config.loot.pickup_cooldown;
        Some(Transition::RestoreOriginal)
    }
}

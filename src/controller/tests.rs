//! Unit tests for the controller's priority ladder and mode handlers.
use approx::assert_relative_eq;
use glam::Vec3;
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::entity::LootCategory;
use crate::interfaces::{Damageable, LootLedger, MockAnimator};
use crate::locomotion::Body;
use crate::spatial::{Scene, SceneView};
use crate::test_support::{FixedStats, RecordingAnimator};
use crate::wander::WanderPhase;

const DT: f32 = 0.1;

mockall::mock! {
    Stats {}

    impl Damageable for Stats {
        fn is_dead(&self) -> bool;
    }

    impl CombatStats for Stats {
        fn move_speed(&self) -> f32;
        fn attack_range(&self) -> f32;
        fn attack_cooldown_remaining(&self) -> f32;
        fn try_attack(&mut self, target: EntityId) -> bool;
    }
}

/// Ticks `controller` once and mirrors the body back into the scene.
fn step(
    scene: &mut Scene,
    controller: &mut AgentController,
    body: &mut Body,
    stats: &mut dyn CombatStats,
    animator: &mut dyn Animator,
) -> TickReport {
    let report = {
        let mut ctx = TickContext {
            dt: DT,
            world: scene,
            stats,
            animator,
        };
        controller.tick(body, &mut ctx)
    };
    scene
        .set_position(controller.id(), body.position)
        .unwrap_or_else(|err| panic!("{err}"));
    scene
        .set_velocity(controller.id(), body.velocity)
        .unwrap_or_else(|err| panic!("{err}"));
    scene.sync_carried();
    report
}

/// An ally stationed exactly behind a stationary leader.
struct Station {
    scene: Scene,
    me: EntityId,
    leader: EntityId,
    body: Body,
    stats: FixedStats,
    animator: RecordingAnimator,
}

impl Station {
    fn controller(&self) -> ControllerBuilder {
        AgentController::builder(self.me, Faction::Ally)
            .leader(self.leader)
            .initial_mode(Mode::Follow)
    }

    fn tick(&mut self, controller: &mut AgentController) -> TickReport {
        step(
            &mut self.scene,
            controller,
            &mut self.body,
            &mut self.stats,
            &mut self.animator,
        )
    }
}

#[fixture]
fn station() -> Station {
    let mut scene = Scene::new();
    let me = scene.spawn_agent(Vec3::ZERO, Faction::Ally);
    let leader = scene.spawn_agent(Vec3::new(0.0, 0.0, 2.5), Faction::Ally);
    Station {
        scene,
        me,
        leader,
        body: Body::at(Vec3::ZERO),
        stats: FixedStats::default(),
        animator: RecordingAnimator::default(),
    }
}

#[rstest]
fn zero_speed_and_missing_leader_recover_in_one_tick(mut station: Station) {
    let mut controller = AgentController::builder(station.me, Faction::Ally)
        .leader(EntityId(999))
        .initial_mode(Mode::Follow)
        .build();
    station.stats.move_speed = 0.0;

    let report = station.tick(&mut controller);

    assert_relative_eq!(report.move_speed, crate::DEFAULT_MOVE_SPEED);
    assert!(report.speed_corrected);
    assert_eq!(report.mode, Mode::Wander);
    assert!(controller.planner().is_enabled());
}

#[rstest]
fn follower_catches_up_at_boosted_speed(mut station: Station) {
    station
        .scene
        .set_position(station.leader, Vec3::new(0.0, 0.0, 20.0))
        .unwrap_or_else(|err| panic!("{err}"));
    let mut controller = station.controller().build();

    let report = station.tick(&mut controller);

    assert_eq!(report.moved_by, Some(MotionSource::Handler));
    let expected = crate::DEFAULT_MOVE_SPEED * crate::FOLLOW_CATCH_UP_SCALE * DT;
    assert_relative_eq!(report.displacement.length(), expected, epsilon = 1e-5);
    assert!(report.displacement.z > 0.0);
    assert!(station.animator.walking);
}

#[rstest]
fn follower_on_station_stands_still(mut station: Station) {
    station.body.velocity = Vec3::X;
    let mut controller = station.controller().build();

    let report = station.tick(&mut controller);

    assert_eq!(report.moved_by, None);
    assert_eq!(station.body.velocity, Vec3::ZERO);
    assert!(station.animator.idle_requests > 0);
}

#[rstest]
fn follower_mirrors_a_moving_leader(mut station: Station) {
    station
        .scene
        .set_velocity(station.leader, Vec3::new(0.0, 0.0, 1.0))
        .unwrap_or_else(|err| panic!("{err}"));
    let mut controller = station.controller().build();

    let report = station.tick(&mut controller);

    assert_eq!(report.moved_by, Some(MotionSource::Handler));
    assert_relative_eq!(report.displacement.z, 1.0 * DT, epsilon = 1e-5);
}

#[rstest]
fn stacked_allies_are_nudged_apart_on_idle_ticks(mut station: Station) {
    station
        .scene
        .spawn_agent(Vec3::new(0.1, 0.0, 0.0), Faction::Ally);
    let mut controller = station.controller().build();

    let report = station.tick(&mut controller);

    assert_eq!(report.moved_by, Some(MotionSource::Avoidance));
    assert!(report.displacement.x < 0.0);
    assert_relative_eq!(
        report.displacement.length(),
        crate::AVOIDANCE_OVERLAP_PUSH,
        epsilon = 1e-6
    );
    assert!(!station.animator.walking);
}

#[rstest]
fn loot_within_reach_is_picked_up_immediately(mut station: Station) {
    let loot = station.scene.spawn_loot(Vec3::new(0.5, 0.0, 0.0));
    let mut controller = station.controller().build();

    let report = station.tick(&mut controller);

    assert_eq!(report.mode, Mode::Carrying);
    assert_eq!(controller.carried_loot(), Some(loot));
    assert_eq!(controller.history().original(), Some(Mode::Follow));
    let status = station
        .scene
        .loot_status(loot)
        .unwrap_or_else(|| panic!("loot must still exist"));
    assert_eq!(status.category, LootCategory::Claimed);
    assert_eq!(status.parent, Some(station.me));
}

#[rstest]
fn loot_is_fetched_delivered_and_original_mode_restored(mut station: Station) {
    let loot = station.scene.spawn_loot(Vec3::new(3.0, 0.0, 0.0));
    let base = Vec3::new(0.0, 0.0, -6.0);
    let mut controller = station.controller().base(base).build();

    let first = station.tick(&mut controller);
    assert_eq!(first.mode, Mode::GoingToLoot);
    assert_eq!(controller.loot_goal(), Some(loot));

    let mut picked = false;
    for _ in 0..400 {
        let report = station.tick(&mut controller);
        if controller.carried_loot().is_some() {
            picked = true;
            assert_eq!(report.mode, Mode::Carrying);
        }
        if picked && report.mode == Mode::Follow {
            break;
        }
    }

    assert!(picked, "loot was never picked up");
    assert_eq!(controller.mode(), Mode::Follow);
    assert_eq!(controller.carried_loot(), None);
    assert!(!controller.history().in_episode());
    let status = station
        .scene
        .loot_status(loot)
        .unwrap_or_else(|| panic!("loot must still exist"));
    assert_eq!(status.category, LootCategory::Deposited);
    let dropped = station.scene.position_of(loot).unwrap_or(Vec3::NAN);
    assert_relative_eq!(dropped.x, base.x + crate::LOOT_DROP_OFFSET[0], epsilon = 1e-5);
    assert_relative_eq!(dropped.z, base.z + crate::LOOT_DROP_OFFSET[2], epsilon = 1e-5);
}

#[rstest]
fn missing_base_drops_loot_on_the_spot(mut station: Station) {
    let loot = station.scene.spawn_loot(Vec3::new(0.5, 0.0, 0.0));
    let mut controller = station.controller().build();

    station.tick(&mut controller);
    let report = station.tick(&mut controller);

    assert_eq!(report.mode, Mode::Follow);
    assert_eq!(controller.carried_loot(), None);
    let status = station.scene.loot_status(loot);
    assert!(status.is_some_and(|s| s.category == LootCategory::Deposited));
}

#[rstest]
fn loot_claimed_elsewhere_is_abandoned_next_tick(mut station: Station) {
    let loot = station.scene.spawn_loot(Vec3::new(4.0, 0.0, 0.0));
    let rival = station.scene.spawn_agent(Vec3::new(8.0, 0.0, 0.0), Faction::Wild);
    let mut controller = station.controller().build();

    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::GoingToLoot);
    assert!(station.scene.try_claim_loot(loot, rival));

    let report = station.tick(&mut controller);

    assert_eq!(report.mode, Mode::Follow);
    assert_eq!(controller.loot_goal(), None);
    assert!(!controller.history().in_episode());
}

#[test]
fn racing_agents_claim_loot_exactly_once() {
    let mut scene = Scene::new();
    let leader = scene.spawn_agent(Vec3::new(0.0, 0.0, -20.0), Faction::Ally);
    let loot = scene.spawn_loot(Vec3::ZERO);
    let a = scene.spawn_agent(Vec3::new(-3.0, 0.0, 0.0), Faction::Ally);
    let b = scene.spawn_agent(Vec3::new(3.0, 0.0, 0.0), Faction::Ally);
    let build = |id| {
        AgentController::builder(id, Faction::Ally)
            .leader(leader)
            .base(Vec3::new(0.0, 0.0, -30.0))
            .initial_mode(Mode::Follow)
            .build()
    };
    let mut agents = [
        (build(a), Body::at(Vec3::new(-3.0, 0.0, 0.0))),
        (build(b), Body::at(Vec3::new(3.0, 0.0, 0.0))),
    ];
    let mut stats = FixedStats::default();
    let mut animator = RecordingAnimator::default();

    for _ in 0..40 {
        for (controller, body) in &mut agents {
            step(&mut scene, controller, body, &mut stats, &mut animator);
        }
    }

    let carriers: Vec<_> = agents
        .iter()
        .filter(|(controller, _)| controller.carried_loot() == Some(loot))
        .collect();
    assert_eq!(carriers.len(), 1);
    let loser = agents
        .iter()
        .map(|(controller, _)| controller)
        .find(|controller| controller.carried_loot().is_none())
        .unwrap_or_else(|| panic!("one agent must miss out"));
    assert_eq!(loser.mode(), Mode::Follow);
    assert_eq!(loser.loot_goal(), None);
}

#[rstest]
fn attack_in_range_fires_exactly_once(station: Station) {
    let Station {
        mut scene,
        me,
        leader,
        mut body,
        ..
    } = station;
    let enemy = scene.spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = AgentController::builder(me, Faction::Ally)
        .leader(leader)
        .initial_mode(Mode::Follow)
        .build();
    controller.on_hostile_entered(enemy);

    let mut stats = MockStats::new();
    stats.expect_is_dead().return_const(false);
    stats.expect_move_speed().return_const(2.0_f32);
    stats.expect_attack_range().return_const(1.5_f32);
    stats
        .expect_attack_cooldown_remaining()
        .return_const(0.0_f32);
    stats
        .expect_try_attack()
        .with(eq(enemy))
        .times(1)
        .return_const(true);
    let mut animator = MockAnimator::new();
    animator
        .expect_request_walking()
        .with(eq(false))
        .return_const(());
    animator
        .expect_request_attacking()
        .with(eq(true))
        .times(1)
        .return_const(());
    animator.expect_request_idle().never();

    let report = step(&mut scene, &mut controller, &mut body, &mut stats, &mut animator);

    assert!(report.attacked);
    assert_eq!(report.mode, Mode::Attacking);
    assert_eq!(report.moved_by, None);
}

#[rstest]
fn attack_waits_for_cooldown(mut station: Station) {
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Enemy);
    station.stats.cooldown_remaining = 0.5;
    let mut controller = station.controller().build();
    controller.on_hostile_entered(enemy);

    let report = station.tick(&mut controller);

    assert!(!report.attacked);
    assert!(station.stats.attacks.is_empty());
    assert!(station.animator.attacking);
}

#[rstest]
fn friendly_agents_are_never_targeted(mut station: Station) {
    let friend = station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Ally);
    let mut controller = station.controller().build();
    controller.on_hostile_entered(friend);

    let report = station.tick(&mut controller);

    assert_eq!(report.mode, Mode::Follow);
    assert!(station.stats.attacks.is_empty());
}

#[rstest]
#[case::follow(Mode::Follow)]
#[case::wander(Mode::Wander)]
fn combat_restores_the_original_mode(mut station: Station, #[case] standing: Mode) {
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = station.controller().initial_mode(standing).build();
    controller.on_hostile_entered(enemy);

    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Attacking);
    assert!(!controller.planner().is_enabled());

    station
        .scene
        .set_alive(enemy, false)
        .unwrap_or_else(|err| panic!("{err}"));
    let report = station.tick(&mut controller);

    assert_eq!(report.mode, standing);
    assert_eq!(controller.chase_target(), None);
    assert!(!controller.history().in_episode());
    assert_eq!(controller.planner().is_enabled(), standing == Mode::Wander);
}

#[rstest]
fn wander_restarts_with_a_fresh_cycle_after_combat(mut station: Station) {
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = station.controller().initial_mode(Mode::Wander).build();
    controller.on_hostile_entered(enemy);
    station.tick(&mut controller);
    station
        .scene
        .despawn(enemy)
        .unwrap_or_else(|| panic!("enemy was spawned"));

    station.tick(&mut controller);

    assert_eq!(
        controller.planner().phase(),
        WanderPhase::Idle { remaining: 0.0 }
    );
}

#[rstest]
fn lost_target_is_chased_to_its_last_known_position(mut station: Station) {
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(4.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = station.controller().build();
    controller.on_hostile_entered(enemy);
    station.tick(&mut controller);

    controller.on_hostile_exited(enemy);
    station
        .scene
        .set_position(enemy, Vec3::new(4.0, 0.0, 12.0))
        .unwrap_or_else(|err| panic!("{err}"));

    let mut ticks = 0;
    while controller.mode() == Mode::Attacking && ticks < 100 {
        let report = station.tick(&mut controller);
        if report.mode == Mode::Attacking {
            assert_eq!(report.moved_by, Some(MotionSource::Handler));
        }
        ticks += 1;
    }

    assert_eq!(controller.mode(), Mode::Follow);
    let remaining = crate::vector_math::ground_distance(station.body.position, Vec3::new(4.0, 0.0, 0.0));
    assert!(remaining <= station.stats.attack_range + 1e-4);
}

#[rstest]
fn chase_beyond_give_up_range_ends_without_moving(mut station: Station) {
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(4.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = station.controller().build();
    controller.on_hostile_entered(enemy);
    station.tick(&mut controller);
    controller.on_hostile_exited(enemy);
    station.body.position = Vec3::new(40.0, 0.0, 0.0);

    let report = station.tick(&mut controller);

    assert_eq!(report.mode, Mode::Follow);
    assert_eq!(controller.chase_target(), None);
}

#[rstest]
fn carrying_outranks_combat(mut station: Station) {
    station.scene.spawn_loot(Vec3::new(0.5, 0.0, 0.0));
    let mut controller = station.controller().base(Vec3::new(0.0, 0.0, -20.0)).build();
    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Carrying);

    let enemy = station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Enemy);
    controller.on_hostile_entered(enemy);

    for _ in 0..10 {
        let report = station.tick(&mut controller);
        assert_eq!(report.mode, Mode::Carrying);
        assert!(!report.attacked);
    }
    assert!(station.stats.attacks.is_empty());
}

#[rstest]
fn dead_agents_freeze(mut station: Station) {
    station.stats.dead = true;
    station.body.velocity = Vec3::X;
    let mut controller = AgentController::builder(station.me, Faction::Ally)
        .leader(EntityId(999))
        .initial_mode(Mode::Follow)
        .build();

    let report = station.tick(&mut controller);

    assert_eq!(report.mode, Mode::Follow);
    assert_eq!(report.moved_by, None);
    assert_eq!(station.body.position, Vec3::ZERO);
    assert_eq!(station.body.velocity, Vec3::ZERO);
    assert!(station.animator.idle_requests > 0);
    assert!(!station.animator.walking);
}

#[rstest]
fn mode_requests_wait_for_the_episode_to_end(mut station: Station) {
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = station.controller().build();
    controller.on_hostile_entered(enemy);
    station.tick(&mut controller);

    controller.request_mode(Mode::Wander);
    controller.request_mode(Mode::Attacking);
    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Attacking);
    assert_eq!(controller.history().original(), Some(Mode::Follow));

    station
        .scene
        .set_alive(enemy, false)
        .unwrap_or_else(|err| panic!("{err}"));
    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Follow);

    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Wander);
}

#[rstest]
#[case::short_ticks(0.1)]
#[case::quarter_ticks(0.25)]
#[case::scan_aligned(0.5)]
fn loot_scan_never_preempts_a_chase(mut station: Station, #[case] dt: f32) {
    let loot = station.scene.spawn_loot(Vec3::new(0.0, 0.0, -5.0));
    let enemy = station
        .scene
        .spawn_agent(Vec3::new(3.0, 0.0, 0.0), Faction::Enemy);
    let mut controller = station.controller().build();
    controller.on_hostile_entered(enemy);

    let tick = |station: &mut Station, controller: &mut AgentController| {
        let mut ctx = TickContext {
            dt,
            world: &mut station.scene,
            stats: &mut station.stats,
            animator: &mut station.animator,
        };
        let report = controller.tick(&mut station.body, &mut ctx);
        station
            .scene
            .set_position(station.me, station.body.position)
            .unwrap_or_else(|err| panic!("{err}"));
        report
    };

    tick(&mut station, &mut controller);
    assert_eq!(controller.mode(), Mode::Attacking);
    assert_eq!(controller.history().previous(), Mode::GoingToLoot);
    controller.on_hostile_exited(enemy);

    let mut ticks = 0;
    while controller.chase_target().is_some() && ticks < 200 {
        assert_eq!(controller.mode(), Mode::Attacking);
        assert_eq!(controller.loot_goal(), None);
        tick(&mut station, &mut controller);
        ticks += 1;
    }
    assert_eq!(controller.mode(), Mode::Follow);

    let mut spotted = false;
    for _ in 0..20 {
        tick(&mut station, &mut controller);
        if controller.loot_goal() == Some(loot) {
            spotted = true;
            break;
        }
    }
    assert!(spotted, "loot should be sought once the chase is over");
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
fn crowded_agents_move_once_per_tick(#[case] seed: u64) {
    let mut scene = Scene::new();
    scene.add_hazard(Vec3::new(4.0, 0.0, 4.0), 1.5);
    let leader = scene.spawn_agent(Vec3::new(0.0, 0.0, 3.0), Faction::Ally);
    let spots = [
        Vec3::new(0.2, 0.0, 0.0),
        Vec3::new(-0.2, 0.0, 0.1),
        Vec3::new(0.0, 0.0, -0.3),
        Vec3::new(0.4, 0.0, 0.4),
    ];
    let mut agents: Vec<(AgentController, Body)> = spots
        .iter()
        .enumerate()
        .map(|(index, &spot)| {
            let id = scene.spawn_agent(spot, Faction::Ally);
            let mode = if index % 2 == 0 { Mode::Follow } else { Mode::Wander };
            let controller = AgentController::builder(id, Faction::Ally)
                .leader(leader)
                .seed(seed * 10 + index as u64)
                .initial_mode(mode)
                .build();
            (controller, Body::at(spot))
        })
        .collect();
    let mut stats = FixedStats::default();
    let mut animator = RecordingAnimator::default();
    let bound = stats.move_speed * crate::MAX_SPEED_SCALE * DT + 1e-4;

    for _ in 0..200 {
        for (controller, body) in &mut agents {
            let report = step(&mut scene, controller, body, &mut stats, &mut animator);
            assert!(
                report.displacement.length() <= bound,
                "{:?} moved {} in one tick",
                report.moved_by,
                report.displacement.length()
            );
        }
    }
}

#[rstest]
fn dead_agents_hold_pending_requests_and_timers(mut station: Station) {
    station.stats.dead = true;
    let mut controller = station.controller().build();
    controller.loot_cooldown = 1.0;
    controller.request_mode(Mode::Wander);

    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Follow);
    assert_relative_eq!(controller.loot_cooldown, 1.0);

    station.stats.dead = false;
    station.tick(&mut controller);
    assert_eq!(controller.mode(), Mode::Wander);
}

#[rstest]
fn mirroring_follower_steers_clear_of_a_neighbour(mut station: Station) {
    station
        .scene
        .set_velocity(station.leader, Vec3::new(0.0, 0.0, 1.0))
        .unwrap_or_else(|err| panic!("{err}"));
    station
        .scene
        .spawn_agent(Vec3::new(1.0, 0.0, 0.0), Faction::Ally);
    let mut controller = station.controller().build();

    let report = station.tick(&mut controller);

    assert_eq!(report.moved_by, Some(MotionSource::Handler));
    assert!(report.displacement.z > 0.0);
    assert!(
        report.displacement.x < 0.0,
        "{:?} should veer away from the neighbour",
        report.displacement
    );
}

#[rstest]
fn invalid_config_falls_back_to_defaults(mut station: Station) {
    let mut config = BehaviourConfig::default();
    config.wander.min_wait = 3.0;
    config.wander.max_wait = 1.0;
    config.wander.zone_jitter_degrees = -20.0;
    let mut controller = station
        .controller()
        .config(config)
        .initial_mode(Mode::Wander)
        .build();

    assert_eq!(controller.config(), &BehaviourConfig::default());
    for _ in 0..100 {
        station.tick(&mut controller);
    }
    assert_eq!(controller.mode(), Mode::Wander);
}

#[rstest]
fn forced_wander_direction_plans_a_safe_waypoint(mut station: Station) {
    station.scene.add_hazard(Vec3::new(8.0, 0.0, 0.0), 2.0);
    let mut controller = station.controller().initial_mode(Mode::Wander).build();
    controller.force_wander_direction(Vec3::X);

    station.tick(&mut controller);

    let WanderPhase::Turning { plan, .. } = controller.planner().phase() else {
        panic!("expected a turn, got {:?}", controller.planner().phase());
    };
    assert!(plan.heading.x > 0.99, "heading {:?}", plan.heading);
    let waypoint = station.body.position + plan.heading * plan.distance;
    let clearance = controller.config().wander.safety_radius * 0.5;
    assert!(crate::wander::waypoint::is_safe(&station.scene, waypoint, clearance));
}

#[rstest]
fn forced_wander_direction_is_dropped_outside_wander(mut station: Station) {
    let mut controller = station.controller().build();
    controller.force_wander_direction(Vec3::X);

    station.tick(&mut controller);

    assert_eq!(controller.mode(), Mode::Follow);
    assert_eq!(controller.planner().phase(), WanderPhase::Disabled);
    assert_eq!(controller.pending_direction, None);
}

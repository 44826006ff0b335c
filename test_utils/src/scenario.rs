//! Multi-agent harness driving controllers against a shared [`Scene`].
use critter_ai::test_support::{FixedStats, RecordingAnimator};
use critter_ai::{
    AgentController, Body, ControllerBuilder, EntityId, Faction, Scene, TickContext, TickReport,
};
use glam::Vec3;

/// One controlled agent with its own body and collaborators.
#[derive(Debug, Clone)]
pub struct Agent {
    pub controller: AgentController,
    pub body: Body,
    pub stats: FixedStats,
    pub animator: RecordingAnimator,
    /// Report from the agent's most recent tick.
    pub last_report: Option<TickReport>,
}

impl Agent {
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.controller.id()
    }
}

/// A scene plus the agents ticked against it, in spawn order.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub scene: Scene,
    pub agents: Vec<Agent>,
}

impl Scenario {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent at `position` and returns its index.
    ///
    /// `configure` receives a builder already holding the id and faction.
    pub fn add_agent(
        &mut self,
        position: Vec3,
        faction: Faction,
        configure: impl FnOnce(ControllerBuilder) -> ControllerBuilder,
    ) -> usize {
        let id = self.scene.spawn_agent(position, faction);
        let controller = configure(AgentController::builder(id, faction)).build();
        self.agents.push(Agent {
            controller,
            body: Body::at(position),
            stats: FixedStats::default(),
            animator: RecordingAnimator::default(),
            last_report: None,
        });
        self.agents.len() - 1
    }

    /// Returns the agent at `index`.
    ///
    /// # Panics
    /// Panics when no agent was registered at `index`.
    #[must_use]
    pub fn agent(&self, index: usize) -> &Agent {
        self.agents
            .get(index)
            .unwrap_or_else(|| panic!("no agent at index {index}"))
    }

    /// Mutable access to the agent at `index`.
    ///
    /// # Panics
    /// Panics when no agent was registered at `index`.
    pub fn agent_mut(&mut self, index: usize) -> &mut Agent {
        self.agents
            .get_mut(index)
            .unwrap_or_else(|| panic!("no agent at index {index}"))
    }

    /// Ticks every agent once, in order. Each agent senses the scene first
    /// and its body is mirrored back before the next agent runs.
    ///
    /// # Panics
    /// Panics if an agent's scene record has been despawned.
    pub fn tick(&mut self, dt: f32) {
        let Self { scene, agents } = self;
        for agent in agents.iter_mut() {
            agent
                .controller
                .refresh_from_scene(&*scene, agent.body.position);
            let report = {
                let mut ctx = TickContext {
                    dt,
                    world: &mut *scene,
                    stats: &mut agent.stats,
                    animator: &mut agent.animator,
                };
                agent.controller.tick(&mut agent.body, &mut ctx)
            };
            agent.last_report = Some(report);
            let id = agent.controller.id();
            scene
                .set_position(id, agent.body.position)
                .unwrap_or_else(|err| panic!("{err}"));
            scene
                .set_velocity(id, agent.body.velocity)
                .unwrap_or_else(|err| panic!("{err}"));
            scene
                .set_yaw(id, agent.body.yaw)
                .unwrap_or_else(|err| panic!("{err}"));
            scene.sync_carried();
        }
    }

    /// Ticks `count` times.
    pub fn run(&mut self, count: usize, dt: f32) {
        for _ in 0..count {
            self.tick(dt);
        }
    }

    /// Ticks until `done` holds or `limit` ticks have run; returns whether
    /// `done` was reached.
    pub fn run_until(
        &mut self,
        limit: usize,
        dt: f32,
        mut done: impl FnMut(&Self) -> bool,
    ) -> bool {
        for _ in 0..limit {
            if done(self) {
                return true;
            }
            self.tick(dt);
        }
        done(self)
    }
}

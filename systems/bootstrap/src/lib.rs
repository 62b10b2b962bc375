#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that wires the Horde encounter together.
//!
//! [`Encounter`] owns the authoritative world together with the spawning and
//! wave systems. Hosts drive it through [`Encounter::advance`] once per frame
//! and forward player intents through the remaining operations. Every call
//! appends the events the world broadcast while it ran.

use std::time::Duration;

use glam::Vec3;
use horde_core::{Command, EncounterConfig, EnemyId, Event, STRIKE_DAMAGE};
use horde_system_spawning::{Config as SpawningConfig, Spawning};
use horde_system_waves::{Config as WaveConfig, WaveDisplay, WaveScheduler};
use horde_world::{self as world, query, World};

/// Produces data required to greet the player.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the encounter starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }
}

/// Complete encounter: world state plus the systems that feed it.
#[derive(Debug)]
pub struct Encounter {
    world: World,
    spawning: Spawning,
    scheduler: WaveScheduler,
    started: bool,
}

impl Encounter {
    /// Builds an encounter from the provided configuration without starting it.
    #[must_use]
    pub fn new(config: &EncounterConfig) -> Self {
        Self {
            world: World::new(config),
            spawning: Spawning::new(SpawningConfig::from_encounter(config)),
            scheduler: WaveScheduler::new(WaveConfig::from_encounter(config)),
            started: false,
        }
    }

    /// Attaches the display that receives wave and alive-count updates.
    #[must_use]
    pub fn with_display(mut self, display: Box<dyn WaveDisplay>) -> Self {
        self.scheduler = self.scheduler.with_display(display);
        self
    }

    /// Starts the first wave. Later calls have no effect.
    pub fn start(&mut self, out_events: &mut Vec<Event>) {
        if self.started {
            return;
        }
        self.started = true;
        tracing::info!(banner = query::welcome_banner(&self.world), "encounter started");

        let mut commands = Vec::new();
        self.scheduler
            .start_next_wave(&mut self.spawning, &mut commands);
        self.pump(commands, out_events);
    }

    /// Advances the simulation by `dt`.
    pub fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.pump(vec![Command::Tick { dt }], out_events);
    }

    /// Moves the tracked target, or clears it when `None`.
    pub fn set_target(&mut self, position: Option<Vec3>, out_events: &mut Vec<Event>) {
        self.pump(vec![Command::SetTarget { position }], out_events);
    }

    /// Lands a standard player strike on the enemy.
    pub fn strike(&mut self, enemy: EnemyId, out_events: &mut Vec<Event>) {
        self.damage(enemy, STRIKE_DAMAGE, out_events);
    }

    /// Applies `amount` damage to the enemy.
    pub fn damage(&mut self, enemy: EnemyId, amount: u32, out_events: &mut Vec<Event>) {
        self.pump(vec![Command::DamageEnemy { enemy, amount }], out_events);
    }

    /// Pauses or resumes wave progression.
    pub fn toggle_pause(&mut self, out_events: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.scheduler
            .toggle_pause(&mut self.spawning, &mut commands);
        self.pump(commands, out_events);
    }

    /// Jumps to the next wave, topping the survivors up to its size.
    pub fn skip_wave(&mut self, out_events: &mut Vec<Event>) {
        let mut commands = Vec::new();
        self.scheduler.skip_wave(&mut self.spawning, &mut commands);
        self.pump(commands, out_events);
    }

    /// Kills every living enemy and clears the current wave.
    pub fn kill_all_enemies(&mut self, out_events: &mut Vec<Event>) {
        let living = query::living_enemies(&self.world);
        let mut commands = Vec::new();
        self.scheduler.kill_all_enemies(&living, &mut commands);
        self.pump(commands, out_events);
    }

    /// Living enemy closest to the tracked target on the horizontal plane.
    ///
    /// Ties resolve to the lowest identifier. Without a target there is no
    /// closest enemy.
    #[must_use]
    pub fn nearest_living_enemy(&self) -> Option<EnemyId> {
        let target = query::target(&self.world)?;
        let pool = query::pool(&self.world);
        query::living_enemies(&self.world)
            .into_iter()
            .filter_map(|id| {
                let distance = pool.get(id)?.distance_to(Some(target)).ok()?;
                Some((id, distance))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }

    /// Reports whether the first wave has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only access to the wave scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &WaveScheduler {
        &self.scheduler
    }

    fn pump(&mut self, mut commands: Vec<Command>, out_events: &mut Vec<Event>) {
        while !commands.is_empty() {
            let mut events = Vec::new();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }

            self.scheduler
                .handle(&events, &mut self.spawning, &mut commands);
            out_events.append(&mut events);
        }
    }
}

#[cfg(test)]
mod tests {
    use horde_core::{EnemyType, PoolConfig};

    use super::*;

    fn small_config() -> EncounterConfig {
        EncounterConfig {
            pools: vec![PoolConfig::new(EnemyType::Ghost, 4)],
            spawn_points: vec![[5.0, 0.0, 0.0]],
            spawn_offset_range: 0.0,
            ..EncounterConfig::default()
        }
    }

    #[test]
    fn start_is_idempotent() {
        let mut encounter = Encounter::new(&small_config());
        let mut events = Vec::new();
        encounter.start(&mut events);
        encounter.start(&mut events);

        assert!(encounter.is_started());
        assert_eq!(encounter.scheduler().current_wave(), 1);
        assert_eq!(query::living_enemies(encounter.world()).len(), 30);
    }

    #[test]
    fn nearest_enemy_requires_a_target() {
        let mut encounter = Encounter::new(&small_config());
        let mut events = Vec::new();
        encounter.start(&mut events);
        assert!(encounter.nearest_living_enemy().is_some());

        encounter.set_target(None, &mut events);
        assert_eq!(encounter.nearest_living_enemy(), None);
    }

    #[test]
    fn two_strikes_kill_a_default_enemy() {
        let mut encounter = Encounter::new(&small_config());
        let mut events = Vec::new();
        encounter.start(&mut events);
        let id = EnemyId::new(0);

        encounter.strike(id, &mut events);
        assert_eq!(encounter.scheduler().alive_enemies(), 30);
        encounter.strike(id, &mut events);
        assert_eq!(encounter.scheduler().alive_enemies(), 29);
    }

    #[test]
    fn welcome_banner_comes_from_the_world() {
        let encounter = Encounter::new(&small_config());
        assert_eq!(
            Bootstrap.welcome_banner(encounter.world()),
            horde_core::WELCOME_BANNER
        );
    }
}

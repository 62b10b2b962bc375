#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Horde encounters.

use std::time::Duration;

use glam::Vec3;
use horde_core::{Command, EncounterConfig, EnemyId, Event, Timers, WELCOME_BANNER};

mod enemy;
mod pool;

pub use enemy::Enemy;
pub use pool::EnemyPool;

use enemy::StateContext;

/// Represents the authoritative encounter world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    pool: EnemyPool,
    target: Option<Vec3>,
    reclaims: Timers<EnemyId>,
    reclaim_delay: Duration,
    tick_index: u64,
}

impl World {
    /// Creates a new world whose pools follow the provided configuration.
    #[must_use]
    pub fn new(config: &EncounterConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            pool: EnemyPool::new(&config.pools),
            target: config.target_position(),
            reclaims: Timers::new(),
            reclaim_delay: config.reclaim_delay(),
            tick_index: 0,
        }
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut due = Vec::new();
        self.reclaims.advance(dt, &mut due);
        for id in due {
            self.reclaim(id, out_events);
        }

        let mut ctx = StateContext {
            target: self.target,
            reclaims: &mut self.reclaims,
            reclaim_delay: self.reclaim_delay,
            out_events,
        };
        for id in self.pool.active_ids() {
            if let Some(enemy) = self.pool.get_mut(id) {
                enemy.update(dt, &mut ctx);
            }
        }
    }

    fn reclaim(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        match self.pool.release(id) {
            Ok(kind) => {
                tracing::debug!(enemy = id.get(), kind = kind.name(), "enemy returned to pool");
                out_events.push(Event::EnemyReclaimed { enemy: id, kind });
            }
            Err(error) => {
                tracing::error!(enemy = id.get(), %error, "failed to reclaim enemy");
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(&EncounterConfig::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt, out_events);
        }
        Command::SetTarget { position } => {
            world.target = position;
        }
        Command::SpawnEnemy {
            kind,
            position,
            orientation,
        } => match world.pool.acquire(kind, position, orientation) {
            Ok(enemy) => {
                out_events.push(Event::EnemySpawned {
                    enemy: enemy.id(),
                    kind,
                    position,
                });
                let mut ctx = StateContext {
                    target: world.target,
                    reclaims: &mut world.reclaims,
                    reclaim_delay: world.reclaim_delay,
                    out_events,
                };
                enemy.begin(&mut ctx);
            }
            Err(reason) => {
                out_events.push(Event::SpawnRejected { kind, reason });
            }
        },
        Command::DamageEnemy { enemy, amount } => {
            let Some(target) = world.pool.get_mut(enemy) else {
                tracing::debug!(enemy = enemy.get(), "damage addressed to unknown enemy");
                return;
            };
            let mut ctx = StateContext {
                target: world.target,
                reclaims: &mut world.reclaims,
                reclaim_delay: world.reclaim_delay,
                out_events,
            };
            let _ = target.take_damage(amount, &mut ctx);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::{Quat, Vec3};
    use horde_core::{EnemyId, EnemyStateTag, EnemyType};

    use super::{EnemyPool, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the enemy pool.
    #[must_use]
    pub fn pool(world: &World) -> &EnemyPool {
        &world.pool
    }

    /// Position of the tracked target, if any.
    #[must_use]
    pub fn target(world: &World) -> Option<Vec3> {
        world.target
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Number of dead enemies still waiting to be returned to the pool.
    #[must_use]
    pub fn pending_reclaims(world: &World) -> usize {
        world.reclaims.len()
    }

    /// Identifiers of every enemy that is active and not yet dead, in ascending order.
    #[must_use]
    pub fn living_enemies(world: &World) -> Vec<EnemyId> {
        world
            .pool
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| enemy.id())
            .collect()
    }

    /// Captures a read-only view of the active enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .pool
            .iter()
            .filter(|enemy| enemy.is_active())
            .map(|enemy| EnemySnapshot {
                id: enemy.id(),
                kind: enemy.kind(),
                state: enemy.state(),
                health: enemy.current_health(),
                max_health: enemy.max_health(),
                position: enemy.position(),
                orientation: enemy.orientation(),
            })
            .collect();
        EnemyView { snapshots }
    }

    /// Read-only snapshot describing all active enemies.
    #[derive(Clone, Debug)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Looks up the snapshot of a single enemy.
        #[must_use]
        pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
            self.snapshots.iter().find(|snapshot| snapshot.id == id)
        }

        /// Number of active enemies captured.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether no enemy was active.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }

        /// Consumes the view, yielding the underlying snapshots.
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Identifier of the pooled instance.
        pub id: EnemyId,
        /// Type bucket of the instance.
        pub kind: EnemyType,
        /// Behavior state at capture time.
        pub state: EnemyStateTag,
        /// Remaining health.
        pub health: i32,
        /// Health restored on activation.
        pub max_health: i32,
        /// World-space position.
        pub position: Vec3,
        /// World-space orientation.
        pub orientation: Quat,
    }
}

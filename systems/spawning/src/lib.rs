#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use glam::{Quat, Vec3};
use horde_core::{Command, EncounterConfig, EnemySpawner, EnemyType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug)]
pub struct Config {
    anchors: Vec<Vec3>,
    offset_range: f32,
    kinds: Vec<EnemyType>,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration scattering enemies around `anchors`.
    ///
    /// Enemy types are drawn uniformly from every [`EnemyType`].
    #[must_use]
    pub fn new(anchors: Vec<Vec3>, offset_range: f32, rng_seed: u64) -> Self {
        Self {
            anchors,
            offset_range,
            kinds: EnemyType::ALL.to_vec(),
            rng_seed,
        }
    }

    /// Derives the spawning configuration from an encounter description.
    ///
    /// Random types are restricted to the types the encounter registers pools for.
    #[must_use]
    pub fn from_encounter(config: &EncounterConfig) -> Self {
        let mut kinds: Vec<EnemyType> = config.pools.iter().map(|pool| pool.kind).collect();
        kinds.sort();
        kinds.dedup();

        Self::new(
            config.spawn_anchors(),
            config.spawn_offset_range,
            config.rng_seed,
        )
        .with_kinds(kinds)
    }

    /// Restricts random type selection to `kinds`. An empty list keeps every type.
    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<EnemyType>) -> Self {
        if !kinds.is_empty() {
            self.kinds = kinds;
        }
        self
    }
}

/// Pure system that places enemies near randomly chosen spawn anchors.
#[derive(Debug)]
pub struct Spawning {
    anchors: Vec<Vec3>,
    offset_range: f32,
    kinds: Vec<EnemyType>,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    ///
    /// Without anchors every enemy is placed around the world origin.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let anchors = if config.anchors.is_empty() {
            vec![Vec3::ZERO]
        } else {
            config.anchors
        };

        Self {
            anchors,
            offset_range: config.offset_range.max(0.0),
            kinds: config.kinds,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Emits a spawn command for an enemy of the provided type.
    pub fn spawn_enemy(&mut self, kind: EnemyType, out: &mut Vec<Command>) {
        let anchor = self.select_anchor();
        let offset = self.random_offset();
        out.push(Command::SpawnEnemy {
            kind,
            position: anchor + offset,
            orientation: Quat::IDENTITY,
        });
    }

    /// Emits a spawn command for an enemy of a uniformly chosen type.
    pub fn spawn_random_enemy(&mut self, out: &mut Vec<Command>) {
        let kind = self.select_kind();
        self.spawn_enemy(kind, out);
    }

    fn select_anchor(&mut self) -> Vec3 {
        let index = self.rng.gen_range(0..self.anchors.len());
        self.anchors[index]
    }

    fn select_kind(&mut self) -> EnemyType {
        let index = self.rng.gen_range(0..self.kinds.len());
        self.kinds[index]
    }

    fn random_offset(&mut self) -> Vec3 {
        let range = self.offset_range;
        Vec3::new(
            self.rng.gen_range(-range..=range),
            0.0,
            self.rng.gen_range(-range..=range),
        )
    }
}

impl EnemySpawner for Spawning {
    fn spawn_enemies(&mut self, count: u32, out: &mut Vec<Command>) {
        for _ in 0..count {
            self.spawn_random_enemy(out);
        }
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Horde encounter engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams
//! and respond exclusively with new command batches.

use std::time::Duration;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod timers;

pub use timers::{TimerHandle, Timers};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "The horde approaches.";

/// Damage dealt by a single player strike against an enemy.
pub const STRIKE_DAMAGE: u32 = 50;

/// Damage applied to every active enemy when the encounter is cleared by force.
pub const LETHAL_DAMAGE: u32 = 9_999;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Moves the tracked target, or clears it when `None`.
    SetTarget {
        /// Position of the target in world space.
        position: Option<Vec3>,
    },
    /// Requests that the pool activate an enemy of the provided type.
    SpawnEnemy {
        /// Type of enemy to activate.
        kind: EnemyType,
        /// Position the enemy should occupy once active.
        position: Vec3,
        /// Orientation the enemy should face once active.
        orientation: Quat,
    },
    /// Applies damage to an active enemy.
    DamageEnemy {
        /// Identifier of the enemy receiving damage.
        enemy: EnemyId,
        /// Amount of health removed from the enemy.
        amount: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the pool activated an enemy.
    EnemySpawned {
        /// Identifier of the activated enemy.
        enemy: EnemyId,
        /// Type of the activated enemy.
        kind: EnemyType,
        /// Position the enemy occupies after activation.
        position: Vec3,
    },
    /// Reports that a spawn request could not be satisfied.
    SpawnRejected {
        /// Type requested by the spawn command.
        kind: EnemyType,
        /// Specific reason the spawn failed.
        reason: SimError,
    },
    /// Announces that an enemy left a behavior state.
    EnemyStateExited {
        /// Identifier of the enemy changing state.
        enemy: EnemyId,
        /// State that was exited.
        state: EnemyStateTag,
    },
    /// Announces that an enemy entered a behavior state.
    EnemyStateEntered {
        /// Identifier of the enemy changing state.
        enemy: EnemyId,
        /// State that became active.
        state: EnemyStateTag,
    },
    /// Requests playback of an animation cue on an enemy.
    CuePlayed {
        /// Identifier of the enemy the cue applies to.
        enemy: EnemyId,
        /// Cue that should be played.
        cue: AnimationCue,
    },
    /// Confirms that an enemy lost health without dying.
    EnemyDamaged {
        /// Identifier of the damaged enemy.
        enemy: EnemyId,
        /// Health remaining after the damage was applied.
        remaining: i32,
    },
    /// Notifies listeners that an enemy died.
    EnemyDied {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Type of the enemy that died.
        kind: EnemyType,
    },
    /// Confirms that a dead enemy was returned to its pool.
    EnemyReclaimed {
        /// Identifier of the reclaimed enemy.
        enemy: EnemyId,
        /// Type bucket the enemy was returned to.
        kind: EnemyType,
    },
}

/// Placement collaborator that turns a spawn request into world commands.
pub trait EnemySpawner {
    /// Emits one [`Command::SpawnEnemy`] per requested enemy.
    fn spawn_enemies(&mut self, count: u32, out: &mut Vec<Command>);
}

/// Unique identifier assigned to a pooled enemy instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Closed set of enemy types that pools are keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    /// Fast, fragile apparition.
    Ghost,
    /// Heavy brute.
    Large,
    /// Baseline invader.
    Alien,
}

impl EnemyType {
    /// Every enemy type, in declaration order.
    pub const ALL: [EnemyType; 3] = [EnemyType::Ghost, EnemyType::Large, EnemyType::Alien];

    /// Human readable name of the type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EnemyType::Ghost => "Ghost",
            EnemyType::Large => "Large",
            EnemyType::Alien => "Alien",
        }
    }
}

/// Behavioral state of a single enemy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnemyStateTag {
    /// Waiting for the target to come within chase range.
    #[default]
    Idle,
    /// Moving toward the target.
    Chase,
    /// Facing the target within attack range.
    Attack,
    /// Terminal state awaiting reclamation by the pool.
    Dead,
}

/// Named animation triggers broadcast to the animation collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationCue {
    /// Resting loop.
    Idle,
    /// Locomotion loop.
    Walk,
    /// Attack swing.
    Attack,
    /// Death animation.
    Die,
}

impl AnimationCue {
    /// Clip name understood by animation adapters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            AnimationCue::Idle => "Idle",
            AnimationCue::Walk => "Walk",
            AnimationCue::Attack => "Attack",
            AnimationCue::Die => "Die",
        }
    }
}

/// Tuning applied to every instance a pool builds for one enemy type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTemplate {
    /// Health restored whenever the enemy is activated.
    pub max_health: i32,
    /// Distance at which an idle enemy starts chasing the target.
    pub chase_range: f32,
    /// Distance at which a chasing enemy starts attacking.
    pub attack_range: f32,
    /// Horizontal distance travelled per second while chasing.
    pub move_speed: f32,
    /// Interpolation rate applied when turning toward the target.
    pub rotation_speed: f32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            max_health: 100,
            chase_range: 60.0,
            attack_range: 2.0,
            move_speed: 3.0,
            rotation_speed: 5.0,
        }
    }
}

/// Pool setup for a single enemy type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Type bucket the configuration applies to.
    pub kind: EnemyType,
    /// Template used for every instance of the type.
    #[serde(default)]
    pub template: EnemyTemplate,
    /// Number of inactive instances built up front.
    #[serde(default)]
    pub initial_count: u32,
}

impl PoolConfig {
    /// Creates a pool configuration using the default template.
    #[must_use]
    pub fn new(kind: EnemyType, initial_count: u32) -> Self {
        Self {
            kind,
            template: EnemyTemplate::default(),
            initial_count,
        }
    }

    /// Replaces the template used by the pool.
    #[must_use]
    pub fn with_template(mut self, template: EnemyTemplate) -> Self {
        self.template = template;
        self
    }
}

/// Complete configuration of an encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Pool buckets created when the world is built.
    pub pools: Vec<PoolConfig>,
    /// Delay between clearing a wave and starting the next one, in seconds.
    pub delay_between_waves_secs: f32,
    /// Delay between an enemy dying and its return to the pool, in seconds.
    pub reclaim_delay_secs: f32,
    /// Anchors that spawned enemies are scattered around.
    pub spawn_points: Vec<[f32; 3]>,
    /// Maximum offset applied on the X and Z axes around a spawn anchor.
    pub spawn_offset_range: f32,
    /// Seed for the spawn placement generator.
    pub rng_seed: u64,
    /// Initial position of the tracked target.
    pub target: Option<[f32; 3]>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            pools: EnemyType::ALL
                .iter()
                .map(|kind| PoolConfig::new(*kind, 20))
                .collect(),
            delay_between_waves_secs: 5.0,
            reclaim_delay_secs: 2.0,
            spawn_points: vec![
                [40.0, 0.0, 40.0],
                [-40.0, 0.0, 40.0],
                [40.0, 0.0, -40.0],
                [-40.0, 0.0, -40.0],
            ],
            spawn_offset_range: 10.0,
            rng_seed: 0x5eed_0f_4011,
            target: Some([0.0, 0.0, 0.0]),
        }
    }
}

impl EncounterConfig {
    /// Delay between clearing a wave and starting the next one.
    #[must_use]
    pub fn delay_between_waves(&self) -> Duration {
        seconds(self.delay_between_waves_secs)
    }

    /// Delay between an enemy dying and its return to the pool.
    #[must_use]
    pub fn reclaim_delay(&self) -> Duration {
        seconds(self.reclaim_delay_secs)
    }

    /// Spawn anchors expressed as world-space vectors.
    #[must_use]
    pub fn spawn_anchors(&self) -> Vec<Vec3> {
        self.spawn_points.iter().copied().map(Vec3::from).collect()
    }

    /// Initial target position expressed as a world-space vector.
    #[must_use]
    pub fn target_position(&self) -> Option<Vec3> {
        self.target.map(Vec3::from)
    }
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

/// Failures raised by the pool, the state machine and the wave bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    /// The requested enemy type has no registered pool.
    #[error("no pool registered for enemy type {}", .0.name())]
    UnknownType(EnemyType),
    /// The identifier does not name an instance owned by the pool.
    #[error("enemy {} is not owned by this pool", .0.get())]
    UnknownEnemy(EnemyId),
    /// The instance was released while already inactive.
    #[error("enemy {} released while already inactive", .0.get())]
    DoubleRelease(EnemyId),
    /// A distance was requested while no target is tracked.
    #[error("no target is currently tracked")]
    MissingTarget,
    /// A death notification arrived while the alive count was already zero.
    #[error("alive enemy count would drop below zero")]
    CounterUnderflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_names_match_animation_clips() {
        let names: Vec<_> = [
            AnimationCue::Idle,
            AnimationCue::Walk,
            AnimationCue::Attack,
            AnimationCue::Die,
        ]
        .iter()
        .map(|cue| cue.name())
        .collect();
        assert_eq!(names, ["Idle", "Walk", "Attack", "Die"]);
    }

    #[test]
    fn default_config_registers_every_type() {
        let config = EncounterConfig::default();
        let kinds: Vec<_> = config.pools.iter().map(|pool| pool.kind).collect();
        assert_eq!(kinds, EnemyType::ALL);
        assert_eq!(config.delay_between_waves(), Duration::from_secs(5));
        assert_eq!(config.reclaim_delay(), Duration::from_secs(2));
    }

    #[test]
    fn negative_delays_collapse_to_zero() {
        let config = EncounterConfig {
            delay_between_waves_secs: -1.0,
            ..EncounterConfig::default()
        };
        assert_eq!(config.delay_between_waves(), Duration::ZERO);
    }

    #[test]
    fn parses_partial_toml_config() {
        let config: EncounterConfig = toml::from_str(
            r#"
            delay_between_waves_secs = 3.5
            spawn_points = [[1.0, 0.0, 2.0]]

            [[pools]]
            kind = "ghost"
            initial_count = 4

            [pools.template]
            max_health = 40
            "#,
        )
        .expect("config parses");

        assert_eq!(config.delay_between_waves(), Duration::from_millis(3_500));
        assert_eq!(config.spawn_anchors(), vec![Vec3::new(1.0, 0.0, 2.0)]);
        assert_eq!(config.pools.len(), 1);
        let pool = config.pools[0];
        assert_eq!(pool.kind, EnemyType::Ghost);
        assert_eq!(pool.initial_count, 4);
        assert_eq!(pool.template.max_health, 40);
        assert_eq!(pool.template.chase_range, EnemyTemplate::default().chase_range);
        assert_eq!(config.reclaim_delay_secs, 2.0);
    }

    #[test]
    fn errors_render_operator_messages() {
        assert_eq!(
            SimError::UnknownType(EnemyType::Large).to_string(),
            "no pool registered for enemy type Large"
        );
        assert_eq!(
            SimError::DoubleRelease(EnemyId::new(7)).to_string(),
            "enemy 7 released while already inactive"
        );
    }
}

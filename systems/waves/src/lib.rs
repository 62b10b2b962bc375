#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduling system that keeps the encounter supplied with enemies.
//!
//! The scheduler owns the wave counter and the alive-count bookkeeping. It
//! consumes world events, requests spawns through an [`EnemySpawner`] and
//! arms a single cooperative countdown whenever the current wave is cleared.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use horde_core::{
    Command, EncounterConfig, EnemyId, EnemySpawner, Event, SimError, TimerHandle, Timers,
    LETHAL_DAMAGE,
};

/// Number of enemies spawned for the provided wave.
///
/// The first three waves are fixed at 30, 50 and 70 enemies. Every later
/// wave adds ten more. Wave zero denotes "no wave yet" and spawns nothing.
#[must_use]
pub fn wave_size(wave: u32) -> u32 {
    match wave {
        0 => 0,
        1 => 30,
        2 => 50,
        3 => 70,
        n => (n - 3).saturating_mul(10).saturating_add(70),
    }
}

/// Presentation collaborator notified whenever the wave or alive count changes.
///
/// Displays travel with the scheduler, so they must be [`Send`].
pub trait WaveDisplay: Send {
    /// Shows the number of the wave in progress.
    fn report_wave(&mut self, wave: u32);

    /// Shows how many enemies of the current wave remain alive.
    fn report_alive_count(&mut self, alive: u32);
}

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    delay_between_waves: Duration,
}

impl Config {
    /// Creates a configuration that waits `delay_between_waves` after each clear.
    #[must_use]
    pub const fn new(delay_between_waves: Duration) -> Self {
        Self {
            delay_between_waves,
        }
    }

    /// Derives the scheduler configuration from an encounter description.
    #[must_use]
    pub fn from_encounter(config: &EncounterConfig) -> Self {
        Self::new(config.delay_between_waves())
    }

    /// Delay between clearing a wave and starting the next one.
    #[must_use]
    pub const fn delay_between_waves(&self) -> Duration {
        self.delay_between_waves
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WaveTask {
    StartNextWave,
}

/// Pure system that sequences waves and tracks the survivors of the current one.
pub struct WaveScheduler {
    delay_between_waves: Duration,
    current_wave: u32,
    alive_enemies: u32,
    paused: bool,
    timers: Timers<WaveTask>,
    pending: Option<TimerHandle>,
    already_counted: BTreeSet<EnemyId>,
    clear_requested: bool,
    display: Option<Box<dyn WaveDisplay>>,
}

impl WaveScheduler {
    /// Creates a scheduler that has not started any wave yet.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            delay_between_waves: config.delay_between_waves,
            current_wave: 0,
            alive_enemies: 0,
            paused: false,
            timers: Timers::new(),
            pending: None,
            already_counted: BTreeSet::new(),
            clear_requested: false,
            display: None,
        }
    }

    /// Attaches the display that receives wave and alive-count updates.
    #[must_use]
    pub fn with_display(mut self, display: Box<dyn WaveDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    /// Number of the wave in progress, zero before the first wave starts.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Enemies of the current wave that have not died yet.
    #[must_use]
    pub fn alive_enemies(&self) -> u32 {
        self.alive_enemies
    }

    /// Reports whether wave progression is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reports whether the next wave is counting down.
    #[must_use]
    pub fn has_pending_wave(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes world events, emitting spawn commands for any wave that starts.
    pub fn handle(
        &mut self,
        events: &[Event],
        spawner: &mut dyn EnemySpawner,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.advance(*dt, spawner, out),
                Event::EnemySpawned { enemy, .. } => {
                    let _ = self.already_counted.remove(enemy);
                }
                Event::EnemyDied { enemy, .. } => {
                    if self.already_counted.contains(enemy) {
                        continue;
                    }
                    self.on_enemy_died();
                }
                Event::SpawnRejected { kind, reason } => {
                    tracing::warn!(
                        kind = kind.name(),
                        %reason,
                        "spawn rejected; dropping enemy from the alive count"
                    );
                    self.on_enemy_died();
                }
                _ => {}
            }
        }

        if self.clear_requested {
            self.clear_requested = false;
            self.force_clear();
        }
    }

    /// Starts the next wave unless the scheduler is paused.
    ///
    /// Any pending countdown is canceled. The alive count is replaced by the
    /// size of the new wave.
    pub fn start_next_wave(&mut self, spawner: &mut dyn EnemySpawner, out: &mut Vec<Command>) {
        if self.paused {
            return;
        }

        self.cancel_pending();
        self.clear_requested = false;
        self.current_wave = self.current_wave.saturating_add(1);
        let enemy_count = wave_size(self.current_wave);
        self.alive_enemies = enemy_count;
        tracing::info!(
            wave = self.current_wave,
            enemies = enemy_count,
            "starting wave"
        );

        spawner.spawn_enemies(enemy_count, out);
        self.report_wave();
        self.report_alive_count();
    }

    /// Flips the paused flag.
    ///
    /// Resuming with no survivors and no countdown starts the next wave at once.
    pub fn toggle_pause(&mut self, spawner: &mut dyn EnemySpawner, out: &mut Vec<Command>) {
        self.paused = !self.paused;
        if self.paused {
            tracing::info!(wave = self.current_wave, "wave progression paused");
            return;
        }

        tracing::info!(wave = self.current_wave, "wave progression resumed");
        if self.alive_enemies == 0 && self.pending.is_none() {
            self.start_next_wave(spawner, out);
        }
    }

    /// Advances to the next wave without waiting for the current one to clear.
    ///
    /// Only the shortfall between the new wave size and the survivors is spawned.
    pub fn skip_wave(&mut self, spawner: &mut dyn EnemySpawner, out: &mut Vec<Command>) {
        self.current_wave = self.current_wave.saturating_add(1);
        let shortfall = wave_size(self.current_wave).saturating_sub(self.alive_enemies);
        tracing::info!(
            wave = self.current_wave,
            spawned = shortfall,
            survivors = self.alive_enemies,
            "skipping to wave"
        );

        if shortfall > 0 {
            spawner.spawn_enemies(shortfall, out);
            self.alive_enemies = self.alive_enemies.saturating_add(shortfall);
        }
        self.report_wave();
        self.report_alive_count();
        self.cancel_pending();
    }

    /// Emits lethal damage for every enemy in `living` and clears the wave.
    ///
    /// The damage lands first: the alive count is forced to zero and reported
    /// at the end of the next [`WaveScheduler::handle`] call, after the deaths
    /// of the batch have been observed. Those deaths are not counted a second
    /// time. With nobody alive the clear happens at once. Either way the
    /// countdown to the next wave is armed as for any other clear.
    pub fn kill_all_enemies(&mut self, living: &[EnemyId], out: &mut Vec<Command>) {
        tracing::info!(
            wave = self.current_wave,
            enemies = living.len(),
            "killing every enemy"
        );
        for enemy in living {
            let _ = self.already_counted.insert(*enemy);
            out.push(Command::DamageEnemy {
                enemy: *enemy,
                amount: LETHAL_DAMAGE,
            });
        }

        if living.is_empty() {
            self.force_clear();
        } else {
            self.clear_requested = true;
        }
    }

    fn force_clear(&mut self) {
        self.alive_enemies = 0;
        self.report_alive_count();
        self.arm_next_wave();
    }

    fn advance(&mut self, dt: Duration, spawner: &mut dyn EnemySpawner, out: &mut Vec<Command>) {
        let mut fired = Vec::new();
        self.timers.advance(dt, &mut fired);
        for task in fired {
            match task {
                WaveTask::StartNextWave => {
                    self.pending = None;
                    self.start_next_wave(spawner, out);
                }
            }
        }
    }

    fn on_enemy_died(&mut self) {
        debug_assert!(self.alive_enemies > 0, "{}", SimError::CounterUnderflow);
        if self.alive_enemies == 0 {
            tracing::error!(
                wave = self.current_wave,
                error = %SimError::CounterUnderflow,
                "death reported with no enemies alive"
            );
        }
        self.alive_enemies = self.alive_enemies.saturating_sub(1);
        self.report_alive_count();
        self.arm_next_wave();
    }

    fn arm_next_wave(&mut self) {
        if self.alive_enemies > 0 || self.paused || self.pending.is_some() {
            return;
        }

        tracing::info!(
            wave = self.current_wave,
            delay = ?self.delay_between_waves,
            "wave cleared; next wave scheduled"
        );
        self.pending = Some(
            self.timers
                .schedule(self.delay_between_waves, WaveTask::StartNextWave),
        );
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = self.timers.cancel(handle);
        }
    }

    fn report_wave(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.report_wave(self.current_wave);
        }
    }

    fn report_alive_count(&mut self) {
        if let Some(display) = self.display.as_mut() {
            display.report_alive_count(self.alive_enemies);
        }
    }
}

impl fmt::Debug for WaveScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveScheduler")
            .field("delay_between_waves", &self.delay_between_waves)
            .field("current_wave", &self.current_wave)
            .field("alive_enemies", &self.alive_enemies)
            .field("paused", &self.paused)
            .field("pending", &self.pending)
            .field("already_counted", &self.already_counted.len())
            .field("clear_requested", &self.clear_requested)
            .field("display", &self.display.is_some())
            .finish()
    }
}

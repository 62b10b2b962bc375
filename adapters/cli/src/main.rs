#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Horde encounter.

mod config;
mod control;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use horde_core::Event;
use horde_system_bootstrap::{Bootstrap, Encounter};
use horde_system_waves::WaveDisplay;
use horde_world::query;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use control::{parse_control, ControlScript, ScheduledControl};

/// Command-line arguments accepted by the encounter driver.
#[derive(Debug, Parser)]
#[command(name = "horde", about = "Runs a headless wave encounter")]
struct Cli {
    /// TOML encounter configuration; the built-in encounter is used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Simulated seconds to run.
    #[arg(long, default_value_t = 60.0)]
    seconds: f32,

    /// Length of one simulation tick in milliseconds.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: u64,

    /// Player strikes landed on the enemy nearest the target every tick.
    #[arg(long, default_value_t = 1)]
    strikes_per_tick: u32,

    /// Overrides the spawn placement seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Scripted control as `<seconds>:<pause|skip|kill-all>`; may be repeated.
    #[arg(long = "control", value_parser = parse_control)]
    controls: Vec<ScheduledControl>,
}

/// Prints the wave HUD lines to standard output.
#[derive(Debug, Default)]
struct ConsoleDisplay;

impl WaveDisplay for ConsoleDisplay {
    fn report_wave(&mut self, wave: u32) {
        println!("Wave: {wave}");
    }

    fn report_alive_count(&mut self, alive: u32) {
        println!("Enemies: {alive}");
    }
}

/// Totals gathered from the event stream over a run.
#[derive(Debug, Default)]
struct Summary {
    ticks: u64,
    spawned: u64,
    rejected: u64,
    killed: u64,
    reclaimed: u64,
}

impl Summary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => self.ticks += 1,
                Event::EnemySpawned { .. } => self.spawned += 1,
                Event::SpawnRejected { .. } => self.rejected += 1,
                Event::EnemyDied { .. } => self.killed += 1,
                Event::EnemyReclaimed { .. } => self.reclaimed += 1,
                _ => {}
            }
        }
    }
}

/// Entry point for the Horde command-line interface.
fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();
    run(cli)
}

fn init_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to install the log subscriber")
}

fn run(cli: Cli) -> Result<()> {
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }

    let total = Duration::try_from_secs_f32(cli.seconds)
        .with_context(|| format!("invalid --seconds value {}", cli.seconds))?;
    let dt = Duration::from_millis(cli.tick_ms);

    let mut encounter = Encounter::new(&config).with_display(Box::new(ConsoleDisplay));
    let mut script = ControlScript::new(cli.controls);
    let mut summary = Summary::default();
    let mut events = Vec::new();

    println!("{}", Bootstrap.welcome_banner(encounter.world()));
    encounter.start(&mut events);

    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        encounter.advance(dt, &mut events);
        elapsed += dt;
        script.run_due(elapsed, &mut encounter, &mut events);

        for _ in 0..cli.strikes_per_tick {
            let Some(enemy) = encounter.nearest_living_enemy() else {
                break;
            };
            encounter.strike(enemy, &mut events);
        }

        summary.record(&events);
        events.clear();
    }
    summary.record(&events);

    let scheduler = encounter.scheduler();
    tracing::info!(
        ticks = summary.ticks,
        spawned = summary.spawned,
        rejected = summary.rejected,
        killed = summary.killed,
        reclaimed = summary.reclaimed,
        "encounter finished"
    );
    println!(
        "Finished after {:.1}s on wave {} with {} enemies alive ({} living in world, {} killed)",
        elapsed.as_secs_f32(),
        scheduler.current_wave(),
        scheduler.alive_enemies(),
        query::living_enemies(encounter.world()).len(),
        summary.killed,
    );
    Ok(())
}

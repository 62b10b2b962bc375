use std::sync::{Arc, Mutex};
use std::time::Duration;

use glam::Vec3;
use horde_core::{
    AnimationCue, EncounterConfig, EnemyStateTag, EnemyType, Event, PoolConfig, LETHAL_DAMAGE,
};
use horde_system_bootstrap::Encounter;
use horde_system_waves::WaveDisplay;
use horde_world::query;

#[derive(Clone, Default)]
struct HudLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl HudLog {
    fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("hud lock").clone()
    }
}

impl WaveDisplay for HudLog {
    fn report_wave(&mut self, wave: u32) {
        self.lines.lock().expect("hud lock").push(format!("Wave: {wave}"));
    }

    fn report_alive_count(&mut self, alive: u32) {
        self.lines
            .lock()
            .expect("hud lock")
            .push(format!("Enemies: {alive}"));
    }
}

fn assert_send<T: Send>() {}

#[test]
fn encounter_can_move_between_threads() {
    assert_send::<Encounter>();

    let hud = HudLog::default();
    let mut encounter =
        Encounter::new(&EncounterConfig::default()).with_display(Box::new(hud.clone()));
    let handle = std::thread::spawn(move || {
        let mut events = Vec::new();
        encounter.start(&mut events);
        encounter.scheduler().current_wave()
    });

    assert_eq!(handle.join().expect("encounter thread"), 1);
    assert_eq!(hud.lines(), vec!["Wave: 1".to_owned(), "Enemies: 30".to_owned()]);
}

fn started(config: &EncounterConfig) -> (Encounter, Vec<Event>) {
    let mut encounter = Encounter::new(config);
    let mut events = Vec::new();
    encounter.start(&mut events);
    (encounter, events)
}

fn kill_every_living_enemy(encounter: &mut Encounter, events: &mut Vec<Event>) {
    for id in query::living_enemies(encounter.world()) {
        encounter.damage(id, LETHAL_DAMAGE, events);
    }
}

#[test]
fn first_wave_spawns_thirty_enemies() {
    let (encounter, events) = started(&EncounterConfig::default());

    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count();
    assert_eq!(spawned, 30);
    assert_eq!(encounter.scheduler().alive_enemies(), 30);
    assert_eq!(query::living_enemies(encounter.world()).len(), 30);
}

#[test]
fn clearing_a_wave_starts_the_next_after_the_delay() {
    let (mut encounter, mut events) = started(&EncounterConfig::default());
    kill_every_living_enemy(&mut encounter, &mut events);
    assert_eq!(encounter.scheduler().alive_enemies(), 0);
    assert!(encounter.scheduler().has_pending_wave());

    encounter.advance(Duration::from_secs(2), &mut events);
    assert_eq!(query::pending_reclaims(encounter.world()), 0);
    assert_eq!(query::enemy_view(encounter.world()).len(), 0);
    assert_eq!(encounter.scheduler().current_wave(), 1);

    encounter.advance(Duration::from_secs(3), &mut events);
    assert_eq!(encounter.scheduler().current_wave(), 2);
    assert_eq!(encounter.scheduler().alive_enemies(), 50);
    assert_eq!(query::living_enemies(encounter.world()).len(), 50);
}

#[test]
fn reclaimed_instances_are_reused_before_growing() {
    let config = EncounterConfig {
        pools: vec![PoolConfig::new(EnemyType::Alien, 30)],
        ..EncounterConfig::default()
    };
    let (mut encounter, mut events) = started(&config);
    let pool = query::pool(encounter.world());
    assert_eq!(pool.instance_count(EnemyType::Alien), 30);
    assert_eq!(pool.free_count(EnemyType::Alien), 0);

    kill_every_living_enemy(&mut encounter, &mut events);
    encounter.advance(Duration::from_secs(5), &mut events);

    let pool = query::pool(encounter.world());
    assert_eq!(encounter.scheduler().current_wave(), 2);
    assert_eq!(pool.instance_count(EnemyType::Alien), 50);
    assert_eq!(pool.free_count(EnemyType::Alien), 0);
    assert!(query::enemy_view(encounter.world())
        .iter()
        .all(|snapshot| snapshot.health == snapshot.max_health));
}

#[test]
fn kill_all_counts_each_death_once() {
    let (mut encounter, mut events) = started(&EncounterConfig::default());
    events.clear();

    encounter.kill_all_enemies(&mut events);

    let deaths = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyDied { .. }))
        .count();
    assert_eq!(deaths, 30);
    assert_eq!(encounter.scheduler().alive_enemies(), 0);
    assert!(encounter.scheduler().has_pending_wave());
    assert!(query::living_enemies(encounter.world()).is_empty());

    encounter.advance(Duration::from_secs(5), &mut events);
    assert_eq!(encounter.scheduler().current_wave(), 2);
    assert_eq!(encounter.scheduler().alive_enemies(), 50);
}

#[test]
fn paused_encounter_holds_the_next_wave() {
    let (mut encounter, mut events) = started(&EncounterConfig::default());
    encounter.toggle_pause(&mut events);
    kill_every_living_enemy(&mut encounter, &mut events);
    encounter.advance(Duration::from_secs(10), &mut events);

    assert_eq!(encounter.scheduler().current_wave(), 1);
    assert!(!encounter.scheduler().has_pending_wave());

    encounter.toggle_pause(&mut events);
    assert_eq!(encounter.scheduler().current_wave(), 2);
    assert_eq!(query::living_enemies(encounter.world()).len(), 50);
}

#[test]
fn skip_wave_tops_up_survivors() {
    let (mut encounter, mut events) = started(&EncounterConfig::default());
    let living = query::living_enemies(encounter.world());
    for id in living.iter().take(10) {
        encounter.damage(*id, LETHAL_DAMAGE, &mut events);
    }
    assert_eq!(encounter.scheduler().alive_enemies(), 20);

    encounter.skip_wave(&mut events);

    assert_eq!(encounter.scheduler().current_wave(), 2);
    assert_eq!(encounter.scheduler().alive_enemies(), 50);
    assert_eq!(query::living_enemies(encounter.world()).len(), 50);
}

#[test]
fn display_receives_wave_and_alive_updates() {
    let hud = HudLog::default();
    let mut encounter =
        Encounter::new(&EncounterConfig::default()).with_display(Box::new(hud.clone()));
    let mut events = Vec::new();
    encounter.start(&mut events);

    let id = query::living_enemies(encounter.world())[0];
    encounter.damage(id, LETHAL_DAMAGE, &mut events);

    assert_eq!(
        hud.lines(),
        vec![
            "Wave: 1".to_owned(),
            "Enemies: 30".to_owned(),
            "Enemies: 29".to_owned(),
        ]
    );
}

#[test]
fn enemies_close_in_on_the_target_and_attack() {
    let config = EncounterConfig {
        pools: vec![PoolConfig::new(EnemyType::Ghost, 1)],
        spawn_points: vec![[6.0, 0.0, 0.0]],
        spawn_offset_range: 0.0,
        target: Some([0.0, 0.0, 0.0]),
        ..EncounterConfig::default()
    };
    let (mut encounter, mut events) = started(&config);
    events.clear();

    for _ in 0..40 {
        encounter.advance(Duration::from_millis(50), &mut events);
    }

    let attacking: Vec<_> = query::enemy_view(encounter.world())
        .iter()
        .filter(|snapshot| snapshot.state == EnemyStateTag::Attack)
        .map(|snapshot| snapshot.position)
        .collect();
    assert!(!attacking.is_empty(), "someone reached the target");
    assert!(attacking
        .iter()
        .all(|position| position.distance(Vec3::ZERO) < 2.5));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::CuePlayed {
            cue: AnimationCue::Attack,
            ..
        }
    )));
}

#[test]
fn deterministic_replay_produces_identical_event_streams() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay() -> Vec<Event> {
    let (mut encounter, mut events) = started(&EncounterConfig::default());
    for step in 0..120 {
        encounter.advance(Duration::from_millis(100), &mut events);
        if step % 3 == 0 {
            if let Some(id) = encounter.nearest_living_enemy() {
                encounter.strike(id, &mut events);
            }
        }
    }
    events
}

#[test]
fn kill_all_reports_the_clear_once_after_the_deaths() {
    let hud = HudLog::default();
    let mut encounter =
        Encounter::new(&EncounterConfig::default()).with_display(Box::new(hud.clone()));
    let mut events = Vec::new();
    encounter.start(&mut events);
    events.clear();

    encounter.kill_all_enemies(&mut events);

    assert_eq!(
        hud.lines(),
        vec![
            "Wave: 1".to_owned(),
            "Enemies: 30".to_owned(),
            "Enemies: 0".to_owned(),
        ]
    );
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::EnemyDied { .. })));
    assert_eq!(encounter.scheduler().alive_enemies(), 0);
}

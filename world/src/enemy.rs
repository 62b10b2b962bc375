//! Enemy entities and the behavior state machine that drives them.

use std::time::Duration;

use glam::{Quat, Vec3};
use horde_core::{
    AnimationCue, EnemyId, EnemyStateTag, EnemyTemplate, EnemyType, Event, SimError, TimerHandle,
    Timers,
};

/// One pooled combatant.
///
/// Instances are built by [`crate::EnemyPool`] and never destroyed while the
/// pool lives. The pool owns the instance outright; the entity only remembers
/// its slot identifier and type so a finished death can be routed back to the
/// right bucket.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyType,
    template: EnemyTemplate,
    current_health: i32,
    position: Vec3,
    orientation: Quat,
    state: EnemyStateTag,
    active: bool,
    pending_reclaim: Option<TimerHandle>,
}

/// Collaborators a state hook may touch while it runs.
pub(crate) struct StateContext<'a> {
    pub(crate) target: Option<Vec3>,
    pub(crate) reclaims: &'a mut Timers<EnemyId>,
    pub(crate) reclaim_delay: Duration,
    pub(crate) out_events: &'a mut Vec<Event>,
}

impl Enemy {
    pub(crate) fn new(id: EnemyId, kind: EnemyType, template: EnemyTemplate) -> Self {
        Self {
            id,
            kind,
            template,
            current_health: template.max_health,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            state: EnemyStateTag::Idle,
            active: false,
            pending_reclaim: None,
        }
    }

    /// Identifier of the pool slot occupied by the enemy.
    #[must_use]
    pub fn id(&self) -> EnemyId {
        self.id
    }

    /// Type bucket the enemy belongs to for its whole lifetime.
    #[must_use]
    pub fn kind(&self) -> EnemyType {
        self.kind
    }

    /// Health restored on every activation.
    #[must_use]
    pub fn max_health(&self) -> i32 {
        self.template.max_health
    }

    /// Health remaining. Zero or below once dead.
    #[must_use]
    pub fn current_health(&self) -> i32 {
        self.current_health
    }

    /// Distance at which the enemy notices the target.
    #[must_use]
    pub fn chase_range(&self) -> f32 {
        self.template.chase_range
    }

    /// Distance at which the enemy stops to attack.
    #[must_use]
    pub fn attack_range(&self) -> f32 {
        self.template.attack_range
    }

    /// World-space position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World-space orientation.
    #[must_use]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Current behavior state.
    #[must_use]
    pub fn state(&self) -> EnemyStateTag {
        self.state
    }

    /// Reports whether the pool has handed the enemy out.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Reports whether the enemy is active and not yet dead.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.active && self.state != EnemyStateTag::Dead
    }

    /// Horizontal distance to the target, ignoring vertical offset.
    pub fn distance_to(&self, target: Option<Vec3>) -> Result<f32, SimError> {
        let target = target.ok_or(SimError::MissingTarget)?;
        Ok(horizontal(target - self.position).length())
    }

    /// Resets the instance for reuse. Health is restored and the state returns to idle.
    pub(crate) fn activate(&mut self, position: Vec3, orientation: Quat) {
        self.current_health = self.template.max_health;
        self.state = EnemyStateTag::Idle;
        self.position = position;
        self.orientation = orientation;
        self.pending_reclaim = None;
        self.active = true;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.pending_reclaim = None;
    }

    /// Runs the idle enter hook once the pool has activated the instance.
    pub(crate) fn begin(&mut self, ctx: &mut StateContext<'_>) {
        let state = self.state;
        state.enter(self, ctx);
    }

    /// Performs the current state's per-tick action.
    pub(crate) fn update(&mut self, dt: Duration, ctx: &mut StateContext<'_>) {
        if !self.active {
            return;
        }
        let state = self.state;
        state.update(self, dt, ctx);
    }

    /// Exits the current state, swaps it, then enters the next one.
    pub(crate) fn change_state(&mut self, next: EnemyStateTag, ctx: &mut StateContext<'_>) {
        let previous = self.state;
        previous.exit(self, ctx);
        self.state = next;
        next.enter(self, ctx);
    }

    /// Applies damage, announcing the death before entering the dead state.
    ///
    /// Returns whether the damage killed the enemy. Damage against an inactive
    /// or already dead enemy is ignored.
    pub(crate) fn take_damage(&mut self, amount: u32, ctx: &mut StateContext<'_>) -> bool {
        if !self.is_alive() {
            return false;
        }

        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.current_health = self.current_health.saturating_sub(amount);

        if self.current_health > 0 {
            ctx.out_events.push(Event::EnemyDamaged {
                enemy: self.id,
                remaining: self.current_health,
            });
            return false;
        }

        ctx.out_events.push(Event::EnemyDied {
            enemy: self.id,
            kind: self.kind,
        });
        self.change_state(EnemyStateTag::Dead, ctx);
        true
    }

    fn tracked_distance(&self, target: Option<Vec3>) -> f32 {
        match self.distance_to(target) {
            Ok(distance) => distance,
            Err(error) => {
                tracing::trace!(enemy = self.id.get(), %error, "treating target as unreachable");
                f32::INFINITY
            }
        }
    }

    fn heading_to(&self, target: Vec3) -> Option<Vec3> {
        horizontal(target - self.position).try_normalize()
    }

    fn turn_toward(&mut self, heading: Vec3, dt: f32) {
        let facing = Quat::from_rotation_y(heading.x.atan2(heading.z));
        let blend = (self.template.rotation_speed * dt).clamp(0.0, 1.0);
        self.orientation = self.orientation.slerp(facing, blend);
    }

    fn chase(&mut self, target: Option<Vec3>, dt: f32) {
        let Some(heading) = target.and_then(|target| self.heading_to(target)) else {
            return;
        };
        self.turn_toward(heading, dt);
        self.position += heading * self.template.move_speed * dt;
    }

    fn face(&mut self, target: Option<Vec3>, dt: f32) {
        if let Some(heading) = target.and_then(|target| self.heading_to(target)) {
            self.turn_toward(heading, dt);
        }
    }

    fn play(&self, cue: AnimationCue, ctx: &mut StateContext<'_>) {
        ctx.out_events.push(Event::CuePlayed { enemy: self.id, cue });
    }
}

/// Hooks every behavior state provides.
trait StateHooks {
    fn enter(self, enemy: &mut Enemy, ctx: &mut StateContext<'_>);
    fn update(self, enemy: &mut Enemy, dt: Duration, ctx: &mut StateContext<'_>);
    fn exit(self, enemy: &mut Enemy, ctx: &mut StateContext<'_>);
}

impl StateHooks for EnemyStateTag {
    fn enter(self, enemy: &mut Enemy, ctx: &mut StateContext<'_>) {
        ctx.out_events.push(Event::EnemyStateEntered {
            enemy: enemy.id,
            state: self,
        });

        match self {
            EnemyStateTag::Idle => enemy.play(AnimationCue::Idle, ctx),
            EnemyStateTag::Chase => enemy.play(AnimationCue::Walk, ctx),
            // Damage to the target belongs to the combat collaborator.
            EnemyStateTag::Attack => enemy.play(AnimationCue::Attack, ctx),
            EnemyStateTag::Dead => {
                enemy.play(AnimationCue::Die, ctx);
                let handle = ctx.reclaims.schedule(ctx.reclaim_delay, enemy.id);
                if let Some(stale) = enemy.pending_reclaim.replace(handle) {
                    let _ = ctx.reclaims.cancel(stale);
                }
            }
        }
    }

    fn update(self, enemy: &mut Enemy, dt: Duration, ctx: &mut StateContext<'_>) {
        let seconds = dt.as_secs_f32();
        let target = ctx.target;

        match self {
            EnemyStateTag::Idle => {
                if enemy.tracked_distance(target) <= enemy.chase_range() {
                    enemy.change_state(EnemyStateTag::Chase, ctx);
                }
            }
            EnemyStateTag::Chase => {
                let distance = enemy.tracked_distance(target);
                enemy.chase(target, seconds);

                if distance < enemy.attack_range() {
                    enemy.change_state(EnemyStateTag::Attack, ctx);
                } else if distance > enemy.chase_range() {
                    enemy.change_state(EnemyStateTag::Idle, ctx);
                }
            }
            EnemyStateTag::Attack => {
                let distance = enemy.tracked_distance(target);
                enemy.face(target, seconds);

                if distance > enemy.attack_range() {
                    enemy.change_state(EnemyStateTag::Chase, ctx);
                }
            }
            EnemyStateTag::Dead => {}
        }
    }

    fn exit(self, enemy: &mut Enemy, ctx: &mut StateContext<'_>) {
        ctx.out_events.push(Event::EnemyStateExited {
            enemy: enemy.id,
            state: self,
        });
    }
}

fn horizontal(value: Vec3) -> Vec3 {
    Vec3::new(value.x, 0.0, value.z)
}

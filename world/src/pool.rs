//! Type-keyed pool that issues and reclaims enemy instances.

use std::collections::{BTreeMap, VecDeque};

use glam::{Quat, Vec3};
use horde_core::{EnemyId, EnemyTemplate, EnemyType, PoolConfig, SimError};

use crate::enemy::Enemy;

/// Owns every enemy instance, grouped by type.
///
/// Each bucket keeps the identifiers of its members plus a FIFO queue of the
/// inactive ones. An instance is either active or waiting in its bucket's
/// queue, never both. Buckets grow on demand and never shrink.
#[derive(Debug, Default)]
pub struct EnemyPool {
    enemies: Vec<Enemy>,
    buckets: BTreeMap<EnemyType, Bucket>,
}

#[derive(Debug)]
struct Bucket {
    template: EnemyTemplate,
    members: Vec<EnemyId>,
    free: VecDeque<EnemyId>,
}

impl EnemyPool {
    /// Builds a pool, pre-allocating `initial_count` inactive instances per configuration.
    #[must_use]
    pub fn new(configs: &[PoolConfig]) -> Self {
        let mut pool = Self::default();
        for config in configs {
            if pool.buckets.contains_key(&config.kind) {
                tracing::warn!(
                    kind = config.kind.name(),
                    "duplicate pool configuration; extending the existing bucket"
                );
            } else {
                let _ = pool.buckets.insert(
                    config.kind,
                    Bucket {
                        template: config.template,
                        members: Vec::new(),
                        free: VecDeque::new(),
                    },
                );
            }

            for _ in 0..config.initial_count {
                if let Some(id) = pool.allocate(config.kind) {
                    pool.enqueue_free(config.kind, id);
                }
            }
        }
        pool
    }

    /// Hands out an idle, fully healed instance of the requested type.
    ///
    /// The oldest queued instance is reused first. When the queue is empty a
    /// new instance is allocated. Unregistered types yield
    /// [`SimError::UnknownType`] and no instance.
    pub fn acquire(
        &mut self,
        kind: EnemyType,
        position: Vec3,
        orientation: Quat,
    ) -> Result<&mut Enemy, SimError> {
        let Some(bucket) = self.buckets.get_mut(&kind) else {
            tracing::warn!(kind = kind.name(), "no pool registered for enemy type");
            return Err(SimError::UnknownType(kind));
        };

        let id = match bucket.free.pop_front() {
            Some(id) => id,
            None => {
                tracing::debug!(kind = kind.name(), "expanding pool");
                self.allocate(kind).ok_or(SimError::UnknownType(kind))?
            }
        };

        let enemy = self.slot_mut(id).ok_or(SimError::UnknownEnemy(id))?;
        enemy.activate(position, orientation);
        Ok(enemy)
    }

    /// Deactivates an instance and queues it at the back of its type's free list.
    ///
    /// Releasing an instance that is already inactive fails with
    /// [`SimError::DoubleRelease`] and leaves the queue untouched.
    pub fn release(&mut self, id: EnemyId) -> Result<EnemyType, SimError> {
        let enemy = self.slot_mut(id).ok_or(SimError::UnknownEnemy(id))?;
        if !enemy.is_active() {
            return Err(SimError::DoubleRelease(id));
        }

        enemy.deactivate();
        let kind = enemy.kind();
        self.enqueue_free(kind, id);
        Ok(kind)
    }

    /// Looks up an instance by identifier.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(slot_index(id))
    }

    /// Iterates every instance owned by the pool in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    /// Identifiers of every active instance in ascending order.
    #[must_use]
    pub fn active_ids(&self) -> Vec<EnemyId> {
        self.enemies
            .iter()
            .filter(|enemy| enemy.is_active())
            .map(Enemy::id)
            .collect()
    }

    /// Reports whether a bucket exists for the type.
    #[must_use]
    pub fn is_registered(&self, kind: EnemyType) -> bool {
        self.buckets.contains_key(&kind)
    }

    /// Number of inactive instances queued for the type.
    #[must_use]
    pub fn free_count(&self, kind: EnemyType) -> usize {
        self.buckets.get(&kind).map_or(0, |bucket| bucket.free.len())
    }

    /// Number of instances ever built for the type.
    #[must_use]
    pub fn instance_count(&self, kind: EnemyType) -> usize {
        self.buckets.get(&kind).map_or(0, |bucket| bucket.members.len())
    }

    /// Reports whether the instance currently waits in its free queue.
    #[must_use]
    pub fn is_queued(&self, id: EnemyId) -> bool {
        self.get(id)
            .and_then(|enemy| self.buckets.get(&enemy.kind()))
            .is_some_and(|bucket| bucket.free.contains(&id))
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.slot_mut(id)
    }

    fn slot_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(slot_index(id))
    }

    fn allocate(&mut self, kind: EnemyType) -> Option<EnemyId> {
        let bucket = self.buckets.get_mut(&kind)?;
        let Ok(raw) = u32::try_from(self.enemies.len()) else {
            tracing::error!(kind = kind.name(), "enemy identifier space exhausted");
            return None;
        };
        let id = EnemyId::new(raw);
        bucket.members.push(id);
        self.enemies.push(Enemy::new(id, kind, bucket.template));
        Some(id)
    }

    fn enqueue_free(&mut self, kind: EnemyType, id: EnemyId) {
        if let Some(bucket) = self.buckets.get_mut(&kind) {
            bucket.free.push_back(id);
        }
    }
}

fn slot_index(id: EnemyId) -> usize {
    id.get() as usize
}

//! Sprite registry.
//!
//! [`SpriteRegistry`] owns every live sprite and is the only state shared
//! between the host thread, the scheduler thread and the simulation worker.
//! Internally it is an ECS [`World`] plus the tick [`Schedule`], both behind
//! a single mutex: every public operation takes the lock once and releases
//! it before returning, so callbacks and event delivery always happen
//! unlocked.
//!
//! Insertion order is tracked separately so that eviction and release scans
//! work oldest first and snapshots come out in a stable order.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use fastrand::Rng;
use log::debug;

use crate::components::sprite::{Highlight, Sprite, SpriteSnapshot};
use crate::events::sprite::SpriteEvent;
use crate::resources::canvas::CanvasSize;
use crate::resources::providers::Providers;
use crate::resources::simrng::SimRng;
use crate::systems::advance::advance_sprites;
use crate::systems::collision::{avoid_collisions, detect_collisions};
use crate::systems::highlight::expire_highlights;
use crate::systems::sequence::finish_sequences;

/// Handle of a sprite inside a registry.
pub type SpriteId = Entity;

/// Chance in percent that a scanned sprite is released.
const RELEASE_CHANCE: u32 = 50;

struct RegistryInner {
    world: World,
    schedule: Schedule,
    order: VecDeque<Entity>,
    max_sprites: usize,
    hover_linger: Duration,
}

impl RegistryInner {
    fn count(&self) -> usize {
        self.order.len()
    }

    fn detach(&mut self, entity: Entity) -> Option<Sprite> {
        let position = self.order.iter().position(|e| *e == entity)?;
        self.order.remove(position);
        let mut sprite = self.world.get::<Sprite>(entity).cloned();
        self.world.despawn(entity);
        if let Some(sprite) = sprite.as_mut() {
            sprite.close();
        }
        sprite
    }

    fn snapshot(&self) -> Vec<SpriteSnapshot> {
        self.order
            .iter()
            .filter_map(|&entity| {
                let sprite = self.world.get::<Sprite>(entity)?;
                let highlight = self.world.get::<Highlight>(entity);
                Some(SpriteSnapshot::new(entity, sprite, highlight))
            })
            .collect()
    }

    fn reap_closed(&mut self) {
        let world = &mut self.world;
        self.order.retain(|&entity| {
            let closed = world.get::<Sprite>(entity).is_none_or(|s| s.closed);
            if closed {
                world.despawn(entity);
            }
            !closed
        });
    }
}

fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            advance_sprites,
            detect_collisions,
            avoid_collisions,
            finish_sequences,
            expire_highlights,
        )
            .chain(),
    );
    schedule
}

/// Capped, lock-guarded collection of sprites.
pub struct SpriteRegistry {
    inner: Mutex<RegistryInner>,
}

impl SpriteRegistry {
    pub fn new(canvas: CanvasSize, max_sprites: usize, providers: Providers) -> Self {
        Self::with_rng(canvas, max_sprites, providers, SimRng::default())
    }

    /// Registry whose tick randomness comes from `rng`.
    pub fn with_rng(
        canvas: CanvasSize,
        max_sprites: usize,
        providers: Providers,
        rng: SimRng,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(canvas);
        world.insert_resource(providers);
        world.insert_resource(rng);
        world.insert_resource(Messages::<SpriteEvent>::default());
        SpriteRegistry {
            inner: Mutex::new(RegistryInner {
                world,
                schedule: tick_schedule(),
                order: VecDeque::new(),
                max_sprites,
                hover_linger: Duration::from_secs(2),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a sprite; returns `None` when the registry is full or the
    /// sprite is already closed. Bounded sprites are clamped to the canvas.
    pub fn add(&self, mut sprite: Sprite) -> Option<SpriteId> {
        let mut inner = self.lock();
        if sprite.closed || inner.count() >= inner.max_sprites {
            return None;
        }
        let canvas = *inner.world.resource::<CanvasSize>();
        sprite.clamp_to(canvas);
        sprite.cycle_ended = None;
        debug!(
            "adding {} at ({:.1}, {:.1}) heading {:?}",
            sprite.asset, sprite.x, sprite.y, sprite.direction
        );
        let entity = inner.world.spawn((sprite, Highlight::default())).id();
        inner.order.push_back(entity);
        Some(entity)
    }

    /// Remove a sprite, returning it closed.
    pub fn remove(&self, id: SpriteId) -> Option<Sprite> {
        self.lock().detach(id)
    }

    /// Call `f` on a snapshot of every sprite, oldest first, without holding
    /// the lock.
    pub fn for_each(&self, mut f: impl FnMut(&SpriteSnapshot)) {
        let snapshot = self.snapshot();
        for sprite in &snapshot {
            f(sprite);
        }
    }

    pub fn snapshot(&self) -> Vec<SpriteSnapshot> {
        self.lock().snapshot()
    }

    /// Copy of one sprite's state.
    pub fn get(&self, id: SpriteId) -> Option<Sprite> {
        let inner = self.lock();
        if !inner.order.contains(&id) {
            return None;
        }
        inner.world.get::<Sprite>(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn max_sprites(&self) -> usize {
        self.lock().max_sprites
    }

    /// Change the cap, evicting the oldest sprites until the population fits.
    /// Evicted sprites are returned closed, oldest first.
    pub fn set_max_sprites(&self, max_sprites: usize) -> Vec<Sprite> {
        let mut inner = self.lock();
        inner.max_sprites = max_sprites;
        let mut evicted = Vec::new();
        while inner.count() > max_sprites {
            let Some(&oldest) = inner.order.front() else {
                break;
            };
            // detach always drops `oldest` from the order
            if let Some(sprite) = inner.detach(oldest) {
                evicted.push(sprite);
            }
        }
        if !evicted.is_empty() {
            debug!("evicted {} sprites for cap {}", evicted.len(), max_sprites);
        }
        evicted
    }

    /// Remove every sprite, returning them closed.
    pub fn clear(&self) -> Vec<Sprite> {
        let mut inner = self.lock();
        let order: Vec<Entity> = inner.order.iter().copied().collect();
        order
            .into_iter()
            .filter_map(|entity| inner.detach(entity))
            .collect()
    }

    pub fn canvas(&self) -> CanvasSize {
        *self.lock().world.resource::<CanvasSize>()
    }

    /// Resize the canvas and pull bounded sprites back inside it.
    pub fn set_canvas(&self, canvas: CanvasSize) {
        let mut inner = self.lock();
        inner.world.insert_resource(canvas);
        let mut query = inner.world.query::<&mut Sprite>();
        for mut sprite in query.iter_mut(&mut inner.world) {
            sprite.clamp_to(canvas);
        }
    }

    pub fn providers(&self) -> Providers {
        self.lock().world.resource::<Providers>().clone()
    }

    pub fn set_hover_linger(&self, linger: Duration) {
        self.lock().hover_linger = linger;
    }

    /// Let a sprite leave the canvas. Returns false if it is unknown, closed
    /// or already unbounded.
    pub fn unbind(&self, id: SpriteId) -> bool {
        let mut inner = self.lock();
        if !inner.order.contains(&id) {
            return false;
        }
        match inner.world.get_mut::<Sprite>(id) {
            Some(mut sprite) if sprite.bounded && !sprite.closed => {
                sprite.bounded = false;
                true
            }
            _ => false,
        }
    }

    /// Scan bounded sprites oldest first, releasing each with even odds.
    /// The first release ends the scan.
    pub fn release_one(&self, rng: &mut Rng) -> Option<SpriteId> {
        let mut inner = self.lock();
        let candidates: Vec<Entity> = inner.order.iter().copied().collect();
        for entity in candidates {
            let Some(mut sprite) = inner.world.get_mut::<Sprite>(entity) else {
                continue;
            };
            if !sprite.bounded || sprite.closed {
                continue;
            }
            if rng.u32(0..100) < RELEASE_CHANCE {
                sprite.bounded = false;
                debug!("released {} at ({:.1}, {:.1})", sprite.asset, sprite.x, sprite.y);
                return Some(entity);
            }
        }
        None
    }

    /// Update hover highlights for a pointer at `(x, y)`.
    ///
    /// Sprites under the pointer light up and cancel any pending clear;
    /// highlighted sprites the pointer left schedule a clear after the
    /// linger delay. Returns true when a highlight turned on.
    pub fn pointer_moved(&self, x: f64, y: f64) -> bool {
        let mut inner = self.lock();
        let clear_at = Instant::now() + inner.hover_linger;
        let mut lit = false;
        let mut query = inner.world.query::<(&Sprite, &mut Highlight)>();
        for (sprite, mut highlight) in query.iter_mut(&mut inner.world) {
            if sprite.closed {
                continue;
            }
            if sprite.contains_point(x, y) {
                lit |= !highlight.active;
                highlight.show();
            } else {
                highlight.schedule_clear(clear_at);
            }
        }
        lit
    }

    /// Run one simulation step and return the events it raised.
    ///
    /// Closed sprites are removed before the lock is released.
    pub fn tick(&self) -> Vec<SpriteEvent> {
        let mut inner = self.lock();
        let RegistryInner { world, schedule, .. } = &mut *inner;
        schedule.run(world);
        let mut messages = world.resource_mut::<Messages<SpriteEvent>>();
        let events: Vec<SpriteEvent> = messages.drain().collect();
        inner.reap_closed();
        events
    }
}

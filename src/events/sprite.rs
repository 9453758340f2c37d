//! Sprite lifecycle events reported to the host.
//!
//! The simulation produces a [`SpriteEvent`] whenever something noteworthy
//! happens to a sprite during a tick:
//!
//! - [`SpriteEvent::SequenceEnded`] – the sprite finished one full cycle of
//!   its action sequence
//! - [`SpriteEvent::BoundsHit`] – a bounded sprite was about to cross one or
//!   more canvas edges and was reflected
//! - [`SpriteEvent::Collision`] – two sprites' personal spaces will overlap
//!   next tick; raised once for each participant
//! - [`SpriteEvent::Vanished`] – an unbounded sprite left the canvas for good
//!
//! Events collected during a tick are handed out only after the registry lock
//! is released, so listeners may call back into the engine freely.

use std::fmt;

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;

use crate::components::direction::Edge;
use crate::components::sequence::Sequence;

/// Set of canvas edges, as a bitmask (top = 1, left = 2, bottom = 4, right = 8).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Edges(pub u8);

impl Edges {
    pub const NONE: Edges = Edges(0);
    pub const TOP: Edges = Edges(1);
    pub const LEFT: Edges = Edges(2);
    pub const BOTTOM: Edges = Edges(4);
    pub const RIGHT: Edges = Edges(8);

    pub fn of(edge: Edge) -> Edges {
        match edge {
            Edge::Top => Edges::TOP,
            Edge::Left => Edges::LEFT,
            Edge::Bottom => Edges::BOTTOM,
            Edge::Right => Edges::RIGHT,
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, edge: Edge) -> bool {
        self.0 & Edges::of(edge).0 != 0
    }

    pub fn insert(&mut self, edge: Edge) {
        self.0 |= Edges::of(edge).0;
    }

    /// Flagged edges in composition order (top, left, bottom, right).
    pub fn iter(self) -> impl Iterator<Item = Edge> {
        Edge::ALL.into_iter().filter(move |e| self.contains(*e))
    }
}

impl fmt::Debug for Edges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Something that happened to a sprite during a tick.
///
/// Systems write these into the world's `Messages<SpriteEvent>` mailbox,
/// which the registry drains at the end of every tick.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum SpriteEvent {
    SequenceEnded { sprite: Entity, sequence: Sequence },
    BoundsHit { sprite: Entity, edges: Edges },
    Collision { sprite: Entity, other: Entity },
    Vanished { sprite: Entity },
}

impl SpriteEvent {
    /// The sprite the event is about.
    pub fn sprite(&self) -> Entity {
        match self {
            SpriteEvent::SequenceEnded { sprite, .. }
            | SpriteEvent::BoundsHit { sprite, .. }
            | SpriteEvent::Collision { sprite, .. }
            | SpriteEvent::Vanished { sprite } => *sprite,
        }
    }

    /// The `(sprite, other)` pair of a collision event.
    pub fn collision_pair(&self) -> Option<(Entity, Entity)> {
        match self {
            SpriteEvent::Collision { sprite, other } => Some((*sprite, *other)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_bitmask() {
        let mut edges = Edges::NONE;
        assert!(edges.is_empty());
        edges.insert(Edge::Right);
        edges.insert(Edge::Top);
        assert_eq!(edges.0, 9);
        assert!(edges.contains(Edge::Top));
        assert!(!edges.contains(Edge::Left));
        let order: Vec<Edge> = edges.iter().collect();
        assert_eq!(order, vec![Edge::Top, Edge::Right]);
    }

    #[test]
    fn test_collision_pair_only_for_collisions() {
        let mut world = bevy_ecs::world::World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        assert_eq!(SpriteEvent::Vanished { sprite: a }.collision_pair(), None);
        let hit = SpriteEvent::Collision { sprite: a, other: b };
        assert_eq!(hit.collision_pair(), Some((a, b)));
        assert_eq!(hit.sprite(), a);
    }

    #[test]
    fn test_messages_drain_in_write_order() {
        let mut world = bevy_ecs::world::World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut messages = bevy_ecs::message::Messages::<SpriteEvent>::default();
        messages.write(SpriteEvent::Vanished { sprite: a });
        messages.write(SpriteEvent::Collision { sprite: a, other: b });
        let drained: Vec<_> = messages.drain().collect();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0], SpriteEvent::Vanished { sprite: a });
        assert!(messages.is_empty());
    }
}

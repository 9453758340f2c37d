//! Collision detection between sprites.
//!
//! Two sprites collide when the circles of their personal space, placed at
//! their *predicted* next positions (`position + advance`), overlap:
//!
//! ```text
//! (ax - bx)^2 + (ay - by)^2 < (space_a + space_b)^2
//! ```
//!
//! Every colliding pair raises a [`SpriteEvent::Collision`] for each
//! participant in the same tick. There is no pushback: the only reaction is
//! that a moving sprite turns away from its partner ([`avoid_collisions`]).
//!
//! The pair test is O(n²); populations are capped at a few dozen sprites.

use bevy_ecs::prelude::*;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::components::direction::turn_away;
use crate::components::sprite::Sprite;
use crate::events::sprite::SpriteEvent;
use crate::resources::providers::Providers;
use crate::resources::simrng::SimRng;

/// Whether two personal-space circles overlap.
#[inline]
pub fn collides(a: (f64, f64), space_a: f64, b: (f64, f64), space_b: f64) -> bool {
    let (dx, dy) = (a.0 - b.0, a.1 - b.1);
    let reach = space_a + space_b;
    dx * dx + dy * dy < reach * reach
}

/// Raise a collision event for both participants of every overlapping pair.
pub fn detect_collisions(
    query: Query<(Entity, &Sprite)>,
    mut events: MessageWriter<SpriteEvent>,
) {
    let bodies: SmallVec<[(Entity, (f64, f64), f64); 16]> = query
        .iter()
        .filter(|(_, sprite)| !sprite.closed)
        .map(|(entity, sprite)| (entity, sprite.predicted_position(), sprite.space))
        .collect();

    for (i, &(a, pos_a, space_a)) in bodies.iter().enumerate() {
        for &(b, pos_b, space_b) in &bodies[i + 1..] {
            if collides(pos_a, space_a, pos_b, space_b) {
                events.write(SpriteEvent::Collision { sprite: a, other: b });
                events.write(SpriteEvent::Collision { sprite: b, other: a });
            }
        }
    }
}

/// Turn moving sprites away from the first partner they collided with.
///
/// Stationary sprites keep their facing so that two idle neighbours do not
/// spin in place every tick.
pub fn avoid_collisions(
    mut query: Query<&mut Sprite>,
    mut events: MessageReader<SpriteEvent>,
    providers: Res<Providers>,
    mut rng: ResMut<SimRng>,
) {
    let mut turned: FxHashSet<Entity> = FxHashSet::default();
    for (entity, other) in events.read().filter_map(SpriteEvent::collision_pair) {
        if turned.contains(&entity) {
            continue;
        }
        let Ok(partner) = query.get(other) else {
            continue;
        };
        let (ox, oy) = (partner.x, partner.y);
        let Ok(mut sprite) = query.get_mut(entity) else {
            continue;
        };
        if sprite.closed || !sprite.is_moving() {
            continue;
        }
        if let Some(direction) = turn_away(sprite.x, sprite.y, ox, oy, &mut rng.0) {
            sprite.turn(direction, providers.frames.as_ref());
            turned.insert(entity);
        }
    }
}

//! Per-tick sprite kinematics.
//!
//! [`advance_sprites`] moves every live sprite one step:
//!
//! 1. Step the frame index, remembering whether the cycle just completed
//! 2. For bounded sprites, reflect off any edge the next step would cross
//!    (see [`crate::systems::boundary`]) and raise `BoundsHit`
//! 3. Apply the advance vector, then clamp bounded sprites to the canvas
//! 4. Close unbounded sprites whose whole frame left the canvas and raise
//!    `Vanished`
//!
//! Completed cycles are recorded on the sprite and handled later in the tick
//! by [`crate::systems::sequence::finish_sequences`], after collisions.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::sprite::Sprite;
use crate::events::sprite::SpriteEvent;
use crate::resources::canvas::CanvasSize;
use crate::resources::providers::{FrameProvider, Providers};
use crate::systems::boundary::reflect;

/// Advance one sprite and return the events it raised: at most one
/// `BoundsHit` and one `Vanished`.
pub fn advance_sprite(
    entity: Entity,
    sprite: &mut Sprite,
    canvas: CanvasSize,
    frames: &dyn FrameProvider,
) -> ArrayVec<SpriteEvent, 2> {
    let mut raised = ArrayVec::new();
    if sprite.closed {
        return raised;
    }
    let completed = sprite.advance_frame();

    if sprite.bounded {
        let edges = reflect(sprite, canvas, frames);
        if !edges.is_empty() {
            raised.push(SpriteEvent::BoundsHit {
                sprite: entity,
                edges,
            });
        }
    }

    let (dx, dy) = sprite.advance_vector();
    sprite.x += dx;
    sprite.y += dy;
    sprite.clamp_to(canvas);

    if !sprite.bounded && sprite.is_outside(canvas, frames) {
        debug!("{} vanished at ({:.1}, {:.1})", sprite.asset, sprite.x, sprite.y);
        sprite.close();
        raised.push(SpriteEvent::Vanished { sprite: entity });
        return raised;
    }

    sprite.cycle_ended = completed.then_some(sprite.sequence);
    raised
}

/// Advance all sprites by one tick.
pub fn advance_sprites(
    mut query: Query<(Entity, &mut Sprite)>,
    canvas: Res<CanvasSize>,
    providers: Res<Providers>,
    mut events: MessageWriter<SpriteEvent>,
) {
    let frames = providers.frames.as_ref();
    for (entity, mut sprite) in query.iter_mut() {
        events.write_batch(advance_sprite(entity, &mut sprite, *canvas, frames));
    }
}

//! Hover highlight expiry.
//!
//! Pointer hover is handled on the host thread by
//! [`SpriteRegistry::pointer_moved`](crate::resources::registry::SpriteRegistry::pointer_moved),
//! which turns highlights on and schedules delayed clears. This system runs
//! at the end of each tick and applies clears that have come due.

use std::time::Instant;

use bevy_ecs::prelude::*;

use crate::components::sprite::Highlight;

pub fn expire_highlights(mut query: Query<&mut Highlight>) {
    let now = Instant::now();
    for mut highlight in query.iter_mut() {
        if highlight.clear_at.is_some() {
            highlight.expire(now);
        }
    }
}

//! Action-sequence state machine.
//!
//! Whenever a sprite completes one cycle of its current sequence, the
//! [`finish_sequences`] system raises [`SpriteEvent::SequenceEnded`] and asks
//! [`next_action`] what the sprite does next. The decision policy, first
//! match wins:
//!
//! 1. casting sequences recover to standing or walking
//! 2. fidget-style assets cycle through stand/stance fidgets while idle
//! 3. moving sprites occasionally drop back to walking, idle ones often
//!    start walking
//! 4. otherwise a small chance to try something from
//!    [`EXPLORATION_SEQUENCES`]
//!
//! A chosen sequence the asset cannot play is substituted along a short
//! fallback chain, at most [`MAX_FALLBACK_RETRIES`] times, after which
//! walking is forced. When no new sequence was chosen the sprite may drift
//! to a new random heading instead.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use fastrand::Rng;
use log::{debug, warn};

use crate::components::direction::Direction;
use crate::components::sequence::{AnimationStyle, EXPLORATION_SEQUENCES, Sequence};
use crate::components::sprite::Sprite;
use crate::events::sprite::SpriteEvent;
use crate::resources::providers::{AssetId, FrameProvider, Providers};
use crate::resources::simrng::SimRng;

/// Substitutions tried before walking is forced.
pub const MAX_FALLBACK_RETRIES: u8 = 3;
const MAX_ATTEMPTS: usize = MAX_FALLBACK_RETRIES as usize + 1;

/// Percent chance a moving sprite switches back to plain walking.
pub const WALK_CHANCE: u32 = 5;
/// Percent chance an idle sprite starts walking.
pub const START_CHANCE: u32 = 50;
/// Percent chance to try a random action.
pub const EXPLORE_CHANCE: u32 = 10;
/// Percent chance to pick a new heading when the sequence is unchanged.
pub const DRIFT_CHANCE: u32 = 25;
/// Percent chance a fidget-style idle rolls its fidget table.
pub const FIDGET_CHANCE: u32 = 50;

/// Outcome of one state machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    pub sequence: Option<Sequence>,
    pub direction: Option<Direction>,
    /// Fallback substitutions used to reach `sequence`.
    pub retries: u8,
}

#[inline]
fn roll(rng: &mut Rng, percent: u32) -> bool {
    rng.u32(0..100) < percent
}

fn weighted_pick(weights: &[(Sequence, u32)], rng: &mut Rng) -> Option<Sequence> {
    let total: u32 = weights.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }
    let mut pick = rng.u32(0..total);
    for &(sequence, weight) in weights {
        if pick < weight {
            return Some(sequence);
        }
        pick -= weight;
    }
    None
}

/// Idle cycling for fidget-style assets.
fn fidget_transition(ended: Sequence, rng: &mut Rng) -> Option<Sequence> {
    if let Some(base) = ended.fidget_base() {
        return Some(base);
    }
    let weights: &[(Sequence, u32)] = match ended {
        Sequence::Stand => &[
            (Sequence::Stand, 6),
            (Sequence::StandFidget1, 2),
            (Sequence::StandFidget2, 2),
            (Sequence::Stance, 1),
        ],
        Sequence::Stance => &[
            (Sequence::Stance, 6),
            (Sequence::StanceFidget1, 2),
            (Sequence::StanceFidget2, 2),
            (Sequence::Stand, 1),
        ],
        _ => return None,
    };
    if !roll(rng, FIDGET_CHANCE) {
        return None;
    }
    weighted_pick(weights, rng)
}

/// Raw policy choice, before availability checks.
fn choose_sequence(ended: Sequence, style: AnimationStyle, rng: &mut Rng) -> Option<Sequence> {
    if ended.is_cast() {
        return Some(if rng.bool() {
            Sequence::Stand
        } else {
            Sequence::Walk
        });
    }
    if style == AnimationStyle::Fidget && !ended.is_moving() {
        if let Some(next) = fidget_transition(ended, rng) {
            return Some(next);
        }
    }
    if ended.is_moving() {
        if roll(rng, WALK_CHANCE) {
            return Some(Sequence::Walk);
        }
    } else if roll(rng, START_CHANCE) {
        return Some(Sequence::Walk);
    }
    if roll(rng, EXPLORE_CHANCE) {
        return Some(EXPLORATION_SEQUENCES[rng.usize(0..EXPLORATION_SEQUENCES.len())]);
    }
    None
}

/// Next link of the fallback chain for an unavailable sequence.
pub fn substitute(sequence: Sequence, rng: &mut Rng) -> Sequence {
    if sequence.is_cast() {
        if rng.bool() {
            Sequence::Stand
        } else {
            Sequence::Walk
        }
    } else if sequence.is_idle() || sequence.is_moving() {
        Sequence::Walk
    } else {
        Sequence::Stand
    }
}

/// Resolve `wanted` to a sequence the asset can play.
///
/// Returns the sequence and the number of substitutions used. After
/// [`MAX_FALLBACK_RETRIES`] failed substitutions, [`Sequence::Walk`] is
/// returned whether or not the asset reports it.
pub fn validate(
    asset: &AssetId,
    wanted: Sequence,
    frames: &dyn FrameProvider,
    rng: &mut Rng,
) -> (Sequence, u8) {
    let mut tried: ArrayVec<Sequence, MAX_ATTEMPTS> = ArrayVec::new();
    let mut candidate = wanted;
    for retry in 0..=MAX_FALLBACK_RETRIES {
        tried.push(candidate);
        if frames.is_sequence_available(asset, candidate) {
            return (candidate, retry);
        }
        if retry < MAX_FALLBACK_RETRIES {
            candidate = substitute(candidate, rng);
        }
    }
    debug!("{}: none of {:?} available, forcing walk", asset, tried);
    (Sequence::Walk, MAX_FALLBACK_RETRIES)
}

/// Decide what a sprite does after `ended` completed a cycle.
pub fn next_action(
    ended: Sequence,
    sprite: &Sprite,
    frames: &dyn FrameProvider,
    rng: &mut Rng,
) -> Decision {
    let mut decision = Decision::default();
    if let Some(wanted) = choose_sequence(ended, sprite.style, rng).filter(|s| *s != ended) {
        let (sequence, retries) = validate(&sprite.asset, wanted, frames, rng);
        decision.retries = retries;
        decision.sequence = (sequence != ended).then_some(sequence);
    }
    if decision.sequence.is_none() && roll(rng, DRIFT_CHANCE) {
        decision.direction = Some(Direction::random(rng));
    }
    decision
}

/// Apply a decision to the sprite.
///
/// A sequence whose cycle cannot be loaded falls back to walking; if even
/// that fails the sprite is closed and will be dropped at the end of the tick.
pub fn apply_decision(sprite: &mut Sprite, decision: Decision, frames: &dyn FrameProvider) {
    if let Some(direction) = decision.direction {
        sprite.turn(direction, frames);
    }
    let Some(sequence) = decision.sequence else {
        return;
    };
    if let Err(e) = sprite.apply_sequence(sequence, frames) {
        warn!("{}: {}", sprite.asset, e);
        if sequence == Sequence::Walk || sprite.apply_sequence(Sequence::Walk, frames).is_err() {
            warn!("{}: no playable cycle left, closing sprite", sprite.asset);
            sprite.close();
        }
    }
}

/// Report finished cycles and pick each sprite's next action.
pub fn finish_sequences(
    mut query: Query<(Entity, &mut Sprite)>,
    providers: Res<Providers>,
    mut rng: ResMut<SimRng>,
    mut events: MessageWriter<SpriteEvent>,
) {
    let frames = providers.frames.as_ref();
    for (entity, mut sprite) in query.iter_mut() {
        let Some(ended) = sprite.cycle_ended.take() else {
            continue;
        };
        if sprite.closed {
            continue;
        }
        events.write(SpriteEvent::SequenceEnded {
            sprite: entity,
            sequence: ended,
        });
        let decision = next_action(ended, &sprite, frames, &mut rng.0);
        apply_decision(&mut sprite, decision, frames);
    }
}

//! Creature sprite component.
//!
//! A [`Sprite`] holds everything the simulation knows about one wandering
//! creature: where it is, where it is heading, which action sequence it plays
//! and which frame of that sequence is showing. Frame data itself lives in
//! the external [`FrameProvider`]; the sprite only tracks the cycle length so
//! that `frame_index < cycle_length` holds at all times.
//!
//! Two directions are tracked. `direction` drives movement. `cycle_direction`
//! is the closest direction the asset actually has frames for, and is what a
//! renderer uses to pick images.

use std::time::Instant;

use bevy_ecs::prelude::{Component, Entity};
use fastrand::Rng;
use serde::Serialize;

use crate::components::direction::Direction;
use crate::components::sequence::{AnimationStyle, Sequence};
use crate::resources::canvas::CanvasSize;
use crate::resources::providers::{AssetError, AssetId, FrameBounds, FrameProvider, Motion, Providers};

/// One animated creature on the canvas.
#[derive(Component, Clone, Debug)]
pub struct Sprite {
    pub asset: AssetId,
    pub style: AnimationStyle,
    /// Center x in canvas pixels.
    pub x: f64,
    /// Center y in canvas pixels.
    pub y: f64,
    pub direction: Direction,
    pub cycle_direction: Direction,
    pub sequence: Sequence,
    pub frame_index: u32,
    pub cycle_length: u32,
    /// Pixels per tick at move factor 1.
    pub speed: f64,
    /// Personal-space radius used for edges and collisions.
    pub space: f64,
    /// Reflect at canvas edges when true, free to leave when false.
    pub bounded: bool,
    /// Terminal: the sprite is inert and about to be dropped.
    pub closed: bool,
    /// Set by the advance step when the cycle wrapped this tick.
    pub(crate) cycle_ended: Option<Sequence>,
}

impl Sprite {
    /// Build a sprite from already-resolved parameters.
    ///
    /// `cycle_length` is clamped to at least one frame.
    pub fn new(
        asset: impl Into<AssetId>,
        motion: Motion,
        position: (f64, f64),
        direction: Direction,
        sequence: Sequence,
        cycle_length: u32,
    ) -> Self {
        Sprite {
            asset: asset.into(),
            style: AnimationStyle::Standard,
            x: position.0,
            y: position.1,
            direction,
            cycle_direction: direction,
            sequence,
            frame_index: 0,
            cycle_length: cycle_length.max(1),
            speed: motion.speed.max(0.0),
            space: motion.space.max(0.0),
            bounded: true,
            closed: false,
            cycle_ended: None,
        }
    }

    pub fn with_style(mut self, style: AnimationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.bounded = false;
        self
    }

    /// Create a bounded, walking sprite for `asset` at a random spot and
    /// heading inside `canvas`.
    pub fn spawn(
        asset: AssetId,
        providers: &Providers,
        canvas: CanvasSize,
        rng: &mut Rng,
    ) -> Result<Sprite, AssetError> {
        let motion = providers.motion.motion(&asset)?;
        if !motion.speed.is_finite() || !motion.space.is_finite() {
            return Err(AssetError::Malformed {
                asset,
                reason: format!("non-finite motion {:?}", motion),
            });
        }
        let (x_lo, x_hi) = CanvasSize::axis_range(canvas.w, motion.space.max(0.0));
        let (y_lo, y_hi) = CanvasSize::axis_range(canvas.h, motion.space.max(0.0));
        let position = (
            x_lo + rng.f64() * (x_hi - x_lo),
            y_lo + rng.f64() * (y_hi - y_lo),
        );
        let style = providers.frames.animation_style(&asset);
        let mut sprite = Sprite::new(
            asset,
            motion,
            position,
            Direction::random(rng),
            Sequence::Walk,
            1,
        )
        .with_style(style);
        sprite.apply_sequence(Sequence::Walk, providers.frames.as_ref())?;
        Ok(sprite)
    }

    /// Advance vector for this tick: heading times speed times move factor.
    pub fn advance_vector(&self) -> (f64, f64) {
        let (ux, uy) = self.direction.unit();
        let scale = self.speed * self.sequence.move_factor();
        (ux * scale, uy * scale)
    }

    /// Center position after this tick's advance.
    pub fn predicted_position(&self) -> (f64, f64) {
        let (dx, dy) = self.advance_vector();
        (self.x + dx, self.y + dy)
    }

    pub fn is_moving(&self) -> bool {
        self.sequence.is_moving() && self.speed > 0.0
    }

    /// Switch to `sequence`, restarting at frame 0.
    ///
    /// The cycle direction is re-resolved against the asset. On failure the
    /// sprite is left unchanged.
    pub fn apply_sequence(
        &mut self,
        sequence: Sequence,
        frames: &dyn FrameProvider,
    ) -> Result<(), AssetError> {
        let cycle_direction = frames.existing_direction(&self.asset, self.direction);
        let length = frames.cycle_length(&self.asset, sequence, cycle_direction)?;
        if length == 0 {
            return Err(AssetError::NoCycle {
                asset: self.asset.clone(),
                sequence,
            });
        }
        self.sequence = sequence;
        self.cycle_direction = cycle_direction;
        self.cycle_length = length;
        self.frame_index = 0;
        Ok(())
    }

    /// Change heading, keeping the current sequence.
    ///
    /// If the asset resolves the new heading to a different cycle, the frame
    /// index is wrapped into the new cycle. When that cycle cannot be loaded
    /// the old one keeps playing.
    pub fn turn(&mut self, direction: Direction, frames: &dyn FrameProvider) {
        self.direction = direction;
        let cycle_direction = frames.existing_direction(&self.asset, direction);
        if cycle_direction == self.cycle_direction {
            return;
        }
        match frames.cycle_length(&self.asset, self.sequence, cycle_direction) {
            Ok(length) if length > 0 => {
                self.cycle_direction = cycle_direction;
                self.cycle_length = length;
                self.frame_index %= length;
            }
            Ok(_) => {}
            Err(e) => log::warn!("keeping {:?} cycle: {}", self.cycle_direction, e),
        }
    }

    /// Step the frame index; returns true when the cycle just completed.
    pub fn advance_frame(&mut self) -> bool {
        let length = self.cycle_length.max(1);
        let completed = self.frame_index + 1 >= length;
        self.frame_index = (self.frame_index + 1) % length;
        completed
    }

    /// Pull a bounded sprite back so its personal space lies inside `canvas`.
    pub fn clamp_to(&mut self, canvas: CanvasSize) {
        if !self.bounded {
            return;
        }
        let (x_lo, x_hi) = CanvasSize::axis_range(canvas.w, self.space);
        let (y_lo, y_hi) = CanvasSize::axis_range(canvas.h, self.space);
        self.x = self.x.clamp(x_lo, x_hi);
        self.y = self.y.clamp(y_lo, y_hi);
    }

    /// Bounding box of the current frame relative to the center.
    pub fn frame_bounds(&self, frames: &dyn FrameProvider) -> FrameBounds {
        frames
            .frame_bounds(
                &self.asset,
                self.sequence,
                self.cycle_direction,
                self.frame_index,
            )
            .unwrap_or_else(|| FrameBounds::square(self.space))
    }

    /// Whether the whole frame lies outside the canvas.
    pub fn is_outside(&self, canvas: CanvasSize, frames: &dyn FrameProvider) -> bool {
        let b = self.frame_bounds(frames);
        self.x + b.right < 0.0
            || self.x + b.left > canvas.w
            || self.y + b.bottom < 0.0
            || self.y + b.top > canvas.h
    }

    /// Whether `(px, py)` falls inside the personal-space circle.
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        let (dx, dy) = (px - self.x, py - self.y);
        dx * dx + dy * dy <= self.space * self.space
    }

    /// Mark the sprite terminal.
    pub fn close(&mut self) {
        self.closed = true;
        self.cycle_ended = None;
    }
}

/// Display-only hover highlight with a cancellable delayed clear.
///
/// When the pointer leaves the sprite the highlight lingers until
/// `clear_at`. Re-entering cancels the pending clear. Both operations are
/// idempotent, and the pending clear disappears with the entity.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Highlight {
    pub active: bool,
    pub clear_at: Option<Instant>,
}

impl Highlight {
    pub fn show(&mut self) {
        self.active = true;
        self.clear_at = None;
    }

    /// Schedule the highlight to clear at `at` unless one is already pending.
    pub fn schedule_clear(&mut self, at: Instant) {
        if self.active && self.clear_at.is_none() {
            self.clear_at = Some(at);
        }
    }

    pub fn cancel_clear(&mut self) {
        self.clear_at = None;
    }

    /// Apply a pending clear if due. Returns true when the highlight went off.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.clear_at {
            Some(at) if at <= now => {
                self.active = false;
                self.clear_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Read-only copy of a sprite handed to the host for drawing.
#[derive(Debug, Clone, Serialize)]
pub struct SpriteSnapshot {
    #[serde(skip)]
    pub entity: Entity,
    pub id: u64,
    pub asset: String,
    pub x: f64,
    pub y: f64,
    pub direction: Direction,
    pub cycle_direction: Direction,
    pub sequence: Sequence,
    pub frame_index: u32,
    pub space: f64,
    pub bounded: bool,
    pub highlighted: bool,
}

impl SpriteSnapshot {
    pub fn new(entity: Entity, sprite: &Sprite, highlight: Option<&Highlight>) -> Self {
        SpriteSnapshot {
            entity,
            id: entity.to_bits(),
            asset: sprite.asset.to_string(),
            x: sprite.x,
            y: sprite.y,
            direction: sprite.direction,
            cycle_direction: sprite.cycle_direction,
            sequence: sprite.sequence,
            frame_index: sprite.frame_index,
            space: sprite.space,
            bounded: sprite.bounded,
            highlighted: highlight.is_some_and(|h| h.active),
        }
    }
}

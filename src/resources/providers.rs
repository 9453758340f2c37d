//! Capabilities the engine consumes from the asset layer.
//!
//! The simulation never decodes creature assets itself. Three traits describe
//! what it needs:
//!
//! - [`AssetPool`] – which assets exist and which are safe to animate
//! - [`FrameProvider`] – cycle lengths, frame bounds, sequence availability
//!   and direction substitution per asset
//! - [`MotionProvider`] – base speed and personal-space radius per asset
//!
//! [`Providers`] bundles one implementation of each as an ECS resource so
//! systems running inside the registry can reach them.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::components::direction::Direction;
use crate::components::sequence::{AnimationStyle, Sequence};

/// Identifier of a creature asset.
pub type AssetId = Arc<str>;

/// Failure to materialize data for an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// The asset is unknown to the provider.
    Missing(AssetId),
    /// The asset has no cycle for the requested sequence.
    NoCycle { asset: AssetId, sequence: Sequence },
    /// The asset's data could not be interpreted.
    Malformed { asset: AssetId, reason: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Missing(asset) => write!(f, "asset '{}' not found", asset),
            AssetError::NoCycle { asset, sequence } => {
                write!(f, "asset '{}' has no cycle for {:?}", asset, sequence)
            }
            AssetError::Malformed { asset, reason } => {
                write!(f, "asset '{}' is malformed: {}", asset, reason)
            }
        }
    }
}

impl std::error::Error for AssetError {}

/// Source of candidate assets.
pub trait AssetPool: Send + Sync {
    fn list_candidate_assets(&self) -> Vec<AssetId>;
    /// Whether the asset passes the validity heuristics for animation.
    fn is_animatable(&self, asset: &AssetId) -> bool;
}

/// Bounding box of a frame relative to the sprite center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameBounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl FrameBounds {
    /// Square box of half-size `space` around the center.
    pub fn square(space: f64) -> Self {
        FrameBounds {
            left: -space,
            top: -space,
            right: space,
            bottom: space,
        }
    }
}

/// Animation cycle data per asset.
pub trait FrameProvider: Send + Sync {
    /// Number of frames in the cycle for `(asset, sequence, direction)`.
    fn cycle_length(
        &self,
        asset: &AssetId,
        sequence: Sequence,
        direction: Direction,
    ) -> Result<u32, AssetError>;

    /// Bounding box of one frame, if the provider knows it.
    fn frame_bounds(
        &self,
        asset: &AssetId,
        sequence: Sequence,
        direction: Direction,
        index: u32,
    ) -> Option<FrameBounds>;

    fn is_sequence_available(&self, asset: &AssetId, sequence: Sequence) -> bool;

    /// Nearest direction the asset actually defines.
    fn existing_direction(&self, asset: &AssetId, requested: Direction) -> Direction;

    fn animation_style(&self, _asset: &AssetId) -> AnimationStyle {
        AnimationStyle::Standard
    }
}

/// Base movement parameters of an asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Pixels per tick at move factor 1.
    pub speed: f64,
    /// Personal-space radius in pixels.
    pub space: f64,
}

pub trait MotionProvider: Send + Sync {
    fn motion(&self, asset: &AssetId) -> Result<Motion, AssetError>;
}

/// The three asset capabilities, shared between threads.
#[derive(Resource, Clone)]
pub struct Providers {
    pub pool: Arc<dyn AssetPool>,
    pub frames: Arc<dyn FrameProvider>,
    pub motion: Arc<dyn MotionProvider>,
}

impl Providers {
    pub fn new(
        pool: Arc<dyn AssetPool>,
        frames: Arc<dyn FrameProvider>,
        motion: Arc<dyn MotionProvider>,
    ) -> Self {
        Self {
            pool,
            frames,
            motion,
        }
    }

    /// Use one object for all three capabilities.
    pub fn from_catalog<T>(catalog: Arc<T>) -> Self
    where
        T: AssetPool + FrameProvider + MotionProvider + 'static,
    {
        Self {
            pool: catalog.clone(),
            frames: catalog.clone(),
            motion: catalog,
        }
    }
}

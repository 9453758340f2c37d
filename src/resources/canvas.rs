//! Canvas size resource.
//!
//! Stores the dimensions of the surface sprites wander on. Boundary
//! reflection, vanish checks and spawn placement all read it.

use bevy_ecs::prelude::Resource;

/// Drawing surface size in pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    /// Width in pixels.
    pub w: f64,
    /// Height in pixels.
    pub h: f64,
}

impl CanvasSize {
    pub fn new(w: f64, h: f64) -> Self {
        Self {
            w: w.max(0.0),
            h: h.max(0.0),
        }
    }

    /// Valid range for a center coordinate along one axis given a radius.
    ///
    /// When the axis is narrower than the personal space the range collapses
    /// to the axis midpoint.
    pub fn axis_range(extent: f64, space: f64) -> (f64, f64) {
        if extent >= 2.0 * space {
            (space, extent - space)
        } else {
            (extent / 2.0, extent / 2.0)
        }
    }
}

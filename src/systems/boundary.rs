//! Canvas edge reflection for bounded sprites.
//!
//! Before a bounded sprite moves, its look-ahead position
//! (`position + advance`) is tested against the four canvas edges, padded by
//! the sprite's personal space. Every flagged edge mirrors the heading
//! through that edge's table, composed in the order top, left, bottom,
//! right, so a corner hit turns the sprite back out of the corner in one go.
//! The test is repeated up to [`MAX_REFLECTIONS`] times until no edge is
//! flagged any more.

use crate::components::direction::Edge;
use crate::components::sprite::Sprite;
use crate::events::sprite::Edges;
use crate::resources::canvas::CanvasSize;
use crate::resources::providers::FrameProvider;

/// Upper bound on reflection passes per tick.
pub const MAX_REFLECTIONS: usize = 4;

/// Edges the circle of radius `space` around `(x, y) + advance` would cross.
pub fn edges_crossed(x: f64, y: f64, advance: (f64, f64), space: f64, canvas: CanvasSize) -> Edges {
    let (nx, ny) = (x + advance.0, y + advance.1);
    let mut edges = Edges::NONE;
    if ny - space < 0.0 {
        edges.insert(Edge::Top);
    }
    if nx - space < 0.0 {
        edges.insert(Edge::Left);
    }
    if ny + space > canvas.h {
        edges.insert(Edge::Bottom);
    }
    if nx + space > canvas.w {
        edges.insert(Edge::Right);
    }
    edges
}

/// Turn `sprite` away from any edge its next step would cross.
///
/// Returns the edges flagged on the first pass (empty when the path was
/// clear). The heading is updated through [`Sprite::turn`] so the frame
/// cycle follows the new direction.
pub fn reflect(sprite: &mut Sprite, canvas: CanvasSize, frames: &dyn FrameProvider) -> Edges {
    let mut first_hit = None;
    for _ in 0..MAX_REFLECTIONS {
        let edges = edges_crossed(sprite.x, sprite.y, sprite.advance_vector(), sprite.space, canvas);
        first_hit.get_or_insert(edges);
        if edges.is_empty() {
            break;
        }
        let mirrored = edges
            .iter()
            .fold(sprite.direction, |dir, edge| dir.mirrored(edge));
        if mirrored == sprite.direction {
            // tables are idempotent: another pass would change nothing
            break;
        }
        sprite.turn(mirrored, frames);
    }
    first_hit.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::direction::Direction;
    use crate::components::sequence::Sequence;
    use crate::resources::catalog::{AssetCatalog, AssetEntry};
    use crate::resources::providers::Motion;

    fn catalog() -> AssetCatalog {
        AssetCatalog::new(vec![AssetEntry::walker("ogre", 30.0, 10.0, 8)])
    }

    fn sprite_at(x: f64, y: f64, direction: Direction) -> Sprite {
        Sprite::new(
            "ogre",
            Motion {
                speed: 30.0,
                space: 10.0,
            },
            (x, y),
            direction,
            Sequence::Walk,
            8,
        )
    }

    #[test]
    fn test_edges_crossed_clear_path() {
        let canvas = CanvasSize::new(200.0, 200.0);
        assert!(edges_crossed(100.0, 100.0, (5.0, 5.0), 10.0, canvas).is_empty());
    }

    #[test]
    fn test_edges_crossed_corner() {
        let canvas = CanvasSize::new(200.0, 200.0);
        let edges = edges_crossed(190.0, 12.0, (5.0, -5.0), 10.0, canvas);
        assert!(edges.contains(Edge::Top));
        assert!(edges.contains(Edge::Right));
        assert!(!edges.contains(Edge::Left));
        assert!(!edges.contains(Edge::Bottom));
    }

    #[test]
    fn test_reflect_right_edge() {
        let catalog = catalog();
        let canvas = CanvasSize::new(200.0, 200.0);
        let mut s = sprite_at(190.0, 100.0, Direction::E);
        let edges = reflect(&mut s, canvas, &catalog);
        assert_eq!(edges, Edges::RIGHT);
        assert_eq!(s.direction, Direction::W);
    }

    #[test]
    fn test_reflect_corner_heads_back_out() {
        let catalog = catalog();
        let canvas = CanvasSize::new(200.0, 200.0);
        let mut s = sprite_at(185.0, 15.0, Direction::NE);
        let edges = reflect(&mut s, canvas, &catalog);
        assert!(edges.contains(Edge::Top) && edges.contains(Edge::Right));
        assert_eq!(s.direction, Direction::SW);
        assert!(edges_crossed(s.x, s.y, s.advance_vector(), s.space, canvas).is_empty());
    }

    #[test]
    fn test_reflect_leaves_clear_path_alone() {
        let catalog = catalog();
        let canvas = CanvasSize::new(200.0, 200.0);
        let mut s = sprite_at(100.0, 100.0, Direction::NNE);
        assert!(reflect(&mut s, canvas, &catalog).is_empty());
        assert_eq!(s.direction, Direction::NNE);
    }
}

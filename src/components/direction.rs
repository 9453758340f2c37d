//! Sixteen-point compass headings and the vector math behind them.
//!
//! Ordinals run clockwise starting at south (`S = 0`, `W = 4`, `N = 8`,
//! `E = 12`), matching the order in which creature assets store their
//! direction cycles. Screen coordinates are used: X+ is right, Y+ is down.
//!
//! Each heading maps to a unit vector with vertical perspective compression:
//! the y-component is scaled by [`PERSPECTIVE_Y`] before normalization, so
//! sprites appear to cover less ground when walking "into" the screen.
//!
//! The edge mirror tables ([`MIRROR_TOP`], [`MIRROR_LEFT`], [`MIRROR_BOTTOM`],
//! [`MIRROR_RIGHT`]) are fixed arrays indexed by ordinal. A direction that is
//! not heading into a given edge maps to itself on that edge's table.

use std::sync::LazyLock;

use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Vertical compression applied to heading vectors before normalization.
pub const PERSPECTIVE_Y: f64 = 0.75;

/// Number of compass headings.
pub const DIRECTION_COUNT: usize = 16;

/// One of the 16 compass headings.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
}

impl Direction {
    /// All headings in ordinal order.
    pub const ALL: [Direction; DIRECTION_COUNT] = [
        Direction::S,
        Direction::SSW,
        Direction::SW,
        Direction::WSW,
        Direction::W,
        Direction::WNW,
        Direction::NW,
        Direction::NNW,
        Direction::N,
        Direction::NNE,
        Direction::NE,
        Direction::ENE,
        Direction::E,
        Direction::ESE,
        Direction::SE,
        Direction::SSE,
    ];

    /// Ordinal in `0..16`.
    #[inline]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Heading for an arbitrary (possibly negative) ordinal, wrapped into range.
    #[inline]
    pub const fn from_ordinal(ordinal: i32) -> Direction {
        Direction::ALL[ordinal.rem_euclid(DIRECTION_COUNT as i32) as usize]
    }

    /// Rotate clockwise by `steps` headings (negative rotates counter-clockwise).
    #[inline]
    pub const fn rotated(self, steps: i32) -> Direction {
        Direction::from_ordinal(self as i32 + steps)
    }

    /// The heading pointing the other way.
    #[inline]
    pub const fn opposite(self) -> Direction {
        self.rotated(DIRECTION_COUNT as i32 / 2)
    }

    /// Uniformly random heading.
    pub fn random(rng: &mut Rng) -> Direction {
        Direction::ALL[rng.usize(0..DIRECTION_COUNT)]
    }

    /// Unit movement vector, perspective-compressed.
    #[inline]
    pub fn unit(self) -> (f64, f64) {
        UNIT_VECTORS[self.ordinal()]
    }

    /// Shortest distance between two headings, in heading steps (`0..=8`).
    pub fn distance(self, other: Direction) -> usize {
        let d = (self.ordinal() as i32 - other.ordinal() as i32).rem_euclid(DIRECTION_COUNT as i32)
            as usize;
        d.min(DIRECTION_COUNT - d)
    }

    /// Heading mirrored on the given canvas edge.
    #[inline]
    pub fn mirrored(self, edge: Edge) -> Direction {
        let table = match edge {
            Edge::Top => &MIRROR_TOP,
            Edge::Left => &MIRROR_LEFT,
            Edge::Bottom => &MIRROR_BOTTOM,
            Edge::Right => &MIRROR_RIGHT,
        };
        table[self.ordinal()]
    }
}

/// One side of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Left,
    Bottom,
    Right,
}

impl Edge {
    /// Edges in the order mirror tables are composed.
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Left, Edge::Bottom, Edge::Right];
}

static UNIT_VECTORS: LazyLock<[(f64, f64); DIRECTION_COUNT]> = LazyLock::new(|| {
    let mut table = [(0.0, 0.0); DIRECTION_COUNT];
    for (i, slot) in table.iter_mut().enumerate() {
        let theta = (i as f64) * std::f64::consts::TAU / DIRECTION_COUNT as f64;
        // S = (0, 1), W = (-1, 0), N = (0, -1), E = (1, 0)
        let dx = -theta.sin();
        let dy = theta.cos() * PERSPECTIVE_Y;
        let len = (dx * dx + dy * dy).sqrt();
        *slot = (dx / len, dy / len);
    }
    table
});

/// Horizontal component sign of a heading: -1 (west), 0, or 1 (east).
const fn x_sign(ordinal: usize) -> i32 {
    match ordinal {
        0 | 8 => 0,
        1..=7 => -1,
        _ => 1,
    }
}

/// Vertical component sign of a heading: -1 (north), 0, or 1 (south).
const fn y_sign(ordinal: usize) -> i32 {
    match ordinal {
        4 | 12 => 0,
        5..=11 => -1,
        _ => 1,
    }
}

/// Builds a mirror table. `flip_x` mirrors across a vertical edge (left/right),
/// otherwise across a horizontal edge (top/bottom). Only headings whose
/// component sign equals `offending` are mirrored.
const fn build_mirror(flip_x: bool, offending: i32) -> [Direction; DIRECTION_COUNT] {
    let mut table = Direction::ALL;
    let mut i = 0;
    while i < DIRECTION_COUNT {
        if flip_x {
            if x_sign(i) == offending {
                table[i] = Direction::from_ordinal(DIRECTION_COUNT as i32 - i as i32);
            }
        } else if y_sign(i) == offending {
            table[i] = Direction::from_ordinal(DIRECTION_COUNT as i32 / 2 - i as i32);
        }
        i += 1;
    }
    table
}

/// Mirror table for the top edge (north-bound headings turn south).
pub const MIRROR_TOP: [Direction; DIRECTION_COUNT] = build_mirror(false, -1);
/// Mirror table for the left edge (west-bound headings turn east).
pub const MIRROR_LEFT: [Direction; DIRECTION_COUNT] = build_mirror(true, -1);
/// Mirror table for the bottom edge (south-bound headings turn north).
pub const MIRROR_BOTTOM: [Direction; DIRECTION_COUNT] = build_mirror(false, 1);
/// Mirror table for the right edge (east-bound headings turn west).
pub const MIRROR_RIGHT: [Direction; DIRECTION_COUNT] = build_mirror(true, 1);

/// Heading whose unit vector is angularly closest to the vector from
/// `(x1, y1)` to `(x2, y2)`.
///
/// Returns `None` when the two points coincide.
pub fn find_direction(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Direction> {
    let (dx, dy) = (x2 - x1, y2 - y1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return None;
    }
    let (nx, ny) = (dx / len, dy / len);
    Direction::ALL
        .iter()
        .map(|&dir| {
            let (ux, uy) = dir.unit();
            let angle = (nx * ux + ny * uy).clamp(-1.0, 1.0).acos();
            (dir, angle)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(dir, _)| dir)
}

/// Heading a sprite at `(x1, y1)` takes to move away from a partner at
/// `(x2, y2)`: the closest heading towards the partner, jittered by up to two
/// headings either way, then reversed.
pub fn turn_away(x1: f64, y1: f64, x2: f64, y2: f64, rng: &mut Rng) -> Option<Direction> {
    let toward = find_direction(x1, y1, x2, y2)?;
    Some(toward.rotated(rng.i32(-2..=2)).opposite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_ordinals_round_trip() {
        for (i, dir) in Direction::ALL.iter().enumerate() {
            assert_eq!(dir.ordinal(), i);
            assert_eq!(Direction::from_ordinal(i as i32), *dir);
        }
        assert_eq!(Direction::from_ordinal(-1), Direction::SSE);
        assert_eq!(Direction::from_ordinal(17), Direction::SSW);
    }

    #[test]
    fn test_opposites() {
        assert_eq!(Direction::N.opposite(), Direction::S);
        assert_eq!(Direction::E.opposite(), Direction::W);
        assert_eq!(Direction::NNE.opposite(), Direction::SSW);
    }

    #[test]
    fn test_unit_vectors_are_normalized() {
        for dir in Direction::ALL {
            let (x, y) = dir.unit();
            assert!(approx_eq(x * x + y * y, 1.0), "{:?} not unit", dir);
        }
    }

    #[test]
    fn test_cardinal_unit_vectors() {
        let (x, y) = Direction::E.unit();
        assert!(approx_eq(x, 1.0) && approx_eq(y, 0.0));
        let (x, y) = Direction::S.unit();
        assert!(approx_eq(x, 0.0) && approx_eq(y, 1.0));
        let (x, y) = Direction::W.unit();
        assert!(approx_eq(x, -1.0) && approx_eq(y, 0.0));
    }

    #[test]
    fn test_perspective_flattens_diagonals() {
        // SE would be (0.707, 0.707) without compression
        let (x, y) = Direction::SE.unit();
        assert!(x > y);
        assert!(approx_eq(y / x, PERSPECTIVE_Y));
    }

    #[test]
    fn test_mirror_right_edge() {
        assert_eq!(MIRROR_RIGHT[Direction::E.ordinal()], Direction::W);
        assert_eq!(MIRROR_RIGHT[Direction::NE.ordinal()], Direction::NW);
        assert_eq!(MIRROR_RIGHT[Direction::ESE.ordinal()], Direction::WSW);
        // not heading right: untouched
        assert_eq!(MIRROR_RIGHT[Direction::W.ordinal()], Direction::W);
        assert_eq!(MIRROR_RIGHT[Direction::N.ordinal()], Direction::N);
    }

    #[test]
    fn test_mirror_top_and_bottom() {
        assert_eq!(MIRROR_TOP[Direction::N.ordinal()], Direction::S);
        assert_eq!(MIRROR_TOP[Direction::NNW.ordinal()], Direction::SSW);
        assert_eq!(MIRROR_TOP[Direction::E.ordinal()], Direction::E);
        assert_eq!(MIRROR_BOTTOM[Direction::S.ordinal()], Direction::N);
        assert_eq!(MIRROR_BOTTOM[Direction::SE.ordinal()], Direction::NE);
        assert_eq!(MIRROR_BOTTOM[Direction::NE.ordinal()], Direction::NE);
    }

    #[test]
    fn test_mirror_tables_are_idempotent() {
        for table in [&MIRROR_TOP, &MIRROR_LEFT, &MIRROR_BOTTOM, &MIRROR_RIGHT] {
            for dir in Direction::ALL {
                let once = table[dir.ordinal()];
                assert_eq!(table[once.ordinal()], once);
            }
        }
    }

    #[test]
    fn test_corner_composition() {
        // heading into the top-right corner comes back out towards bottom-left
        let out = Direction::NE.mirrored(Edge::Top).mirrored(Edge::Right);
        assert_eq!(out, Direction::SW);
    }

    #[test]
    fn test_find_direction_cardinals() {
        assert_eq!(find_direction(0.0, 0.0, 10.0, 0.0), Some(Direction::E));
        assert_eq!(find_direction(0.0, 0.0, 0.0, -10.0), Some(Direction::N));
        assert_eq!(find_direction(5.0, 5.0, 5.0, 5.0), None);
    }

    #[test]
    fn test_turn_away_stays_in_opposite_cone() {
        let mut rng = Rng::with_seed(7);
        for _ in 0..64 {
            let dir = turn_away(0.0, 0.0, 10.0, 0.0, &mut rng).unwrap();
            assert!(dir.distance(Direction::W) <= 2, "{:?}", dir);
        }
    }

    #[test]
    fn test_distance_wraps() {
        assert_eq!(Direction::S.distance(Direction::SSE), 1);
        assert_eq!(Direction::S.distance(Direction::N), 8);
        assert_eq!(Direction::E.distance(Direction::E), 0);
    }
}

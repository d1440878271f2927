//! Road piece selection from neighbour connectivity.
//!
//! A road tile's appearance is derived, never set by a caller: the 4-bit
//! connectivity mask (one bit per cardinal neighbour carrying road) maps
//! to exactly one (shape, rotation) pair. The mapping is total over all 16
//! masks; the isolated and fully-connected cases both resolve to an
//! unrotated cross, which is the intended degenerate piece for both.

use serde::{Deserialize, Serialize};

/// The shapes of road piece that exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoadShape {
    Cross,
    Straight,
    Corner,
    End,
    TJunction,
}

/// A resolved road piece: shape plus rotation in quarter turns (0-3,
/// clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadPiece {
    pub shape: RoadShape,
    pub rotation: u8,
}

impl RoadPiece {
    pub fn new(shape: RoadShape, rotation: u8) -> Self {
        Self { shape, rotation }
    }
}

/// Resolve the road piece for a connectivity mask.
///
/// Bit layout: North = 1, East = 2, South = 4, West = 8 (see
/// [`Direction::mask_bit`]). Values above 15 cannot arise from a 4-bit
/// mask and are a logic error in the caller.
///
/// [`Direction::mask_bit`]: crate::Direction::mask_bit
pub fn resolve_piece(mask: u8) -> RoadPiece {
    use RoadShape::*;
    debug_assert!(mask < 16, "connectivity mask out of range: {mask:#06b}");
    let (shape, rotation) = match mask & 0b1111 {
        0b0000 => (Cross, 0),
        0b0001 => (End, 0),
        0b0010 => (End, 1),
        0b0011 => (Corner, 0),
        0b0100 => (End, 2),
        0b0101 => (Straight, 0),
        0b0110 => (Corner, 1),
        0b0111 => (TJunction, 0),
        0b1000 => (End, 3),
        0b1001 => (Corner, 3),
        0b1010 => (Straight, 1),
        0b1011 => (TJunction, 3),
        0b1100 => (Corner, 2),
        0b1101 => (TJunction, 2),
        0b1110 => (TJunction, 1),
        _ => (Cross, 0),
    };
    RoadPiece { shape, rotation }
}

//! Hamlet Grid -- tiles, roads, and spatial search for the Hamlet core.
//!
//! This crate supplies the geometry the core deliberately knows nothing
//! about: a bounded tile grid, the road auto-tiling resolver, and a
//! [`world::World`] that wires grid queries into the core engine
//! (placement, removal, recipient discovery, construction finalization).

use serde::{Deserialize, Serialize};

pub mod road;
pub mod tile;
pub mod world;

pub use road::{RoadPiece, RoadShape};
pub use tile::{GridError, RetileEvent, Tile, TileContent, TileGrid};
pub use world::{World, WorldError};

/// A position on the tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: i32,
    pub y: i32,
}

impl GridPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance. Monotone in true distance, so it is
    /// used directly for radius checks and nearest-first ordering.
    pub fn distance_sq(&self, other: &GridPosition) -> u64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        (dx * dx + dy * dy) as u64
    }

    /// The neighbouring position in a direction. May be out of bounds;
    /// callers go through [`TileGrid::neighbours`] for bounds checking.
    pub fn step(&self, dir: Direction) -> GridPosition {
        let (dx, dy) = dir.offset();
        GridPosition::new(self.x + dx, self.y + dy)
    }
}

/// Cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four cardinal directions, in mask-bit order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Offset for this direction. North is -y.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    /// This direction's bit in a road connectivity mask.
    pub fn mask_bit(&self) -> u8 {
        match self {
            Direction::North => 0b0001,
            Direction::East => 0b0010,
            Direction::South => 0b0100,
            Direction::West => 0b1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_sq_is_euclidean() {
        let a = GridPosition::new(0, 0);
        let b = GridPosition::new(3, 4);
        assert_eq!(a.distance_sq(&b), 25);
        assert_eq!(a.distance_sq(&a), 0);

        let c = GridPosition::new(-2, 5);
        let d = GridPosition::new(3, -1);
        assert_eq!(c.distance_sq(&d), 61);
    }

    #[test]
    fn direction_offsets_are_unit_steps() {
        let origin = GridPosition::new(5, 5);
        assert_eq!(origin.step(Direction::North), GridPosition::new(5, 4));
        assert_eq!(origin.step(Direction::East), GridPosition::new(6, 5));
        assert_eq!(origin.step(Direction::South), GridPosition::new(5, 6));
        assert_eq!(origin.step(Direction::West), GridPosition::new(4, 5));
    }

    #[test]
    fn mask_bits_are_distinct() {
        let combined: u8 = Direction::all().iter().map(|d| d.mask_bit()).sum();
        assert_eq!(combined, 0b1111);
    }
}

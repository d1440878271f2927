//! The bounded tile grid: occupancy, road masks, and retile propagation.
//!
//! Every cell holds at most one piece of content (a building footprint or
//! a road piece). Road pieces are never set directly; placing or removing
//! road recomputes the affected piece and its four neighbours from the
//! connectivity mask, and the grid reports each recomputation as a
//! [`RetileEvent`] so the presentation layer can swap sprites.

use hamlet_core::id::BuildingId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::road::{self, RoadPiece};
use crate::{Direction, GridPosition};

/// Errors from tile placement and removal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("position out of bounds: ({0}, {1})")]
    OutOfBounds(i32, i32),
    #[error("tile already occupied at ({0}, {1})")]
    Occupied(i32, i32),
    #[error("tile empty at ({0}, {1})")]
    Empty(i32, i32),
}

/// What a tile holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileContent {
    Building(BuildingId),
    Road(RoadPiece),
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Tile {
    pub content: Option<TileContent>,
}

/// A road piece that changed appearance during a structural edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetileEvent {
    pub position: GridPosition,
    pub piece: RoadPiece,
}

/// A bounded rectangular tile grid, row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: GridPosition) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width as usize + pos.x as usize)
    }

    /// The tile at a position, if in bounds.
    pub fn get(&self, pos: GridPosition) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    /// In-bounds cardinal neighbours, in mask-bit (N, E, S, W) order.
    pub fn neighbours(&self, pos: GridPosition) -> impl Iterator<Item = (Direction, GridPosition)> + '_ {
        Direction::all()
            .into_iter()
            .map(move |dir| (dir, pos.step(dir)))
            .filter(|(_, next)| self.in_bounds(*next))
    }

    pub fn is_road(&self, pos: GridPosition) -> bool {
        matches!(
            self.get(pos),
            Some(Tile {
                content: Some(TileContent::Road(_)),
            })
        )
    }

    /// Whether any cardinal neighbour carries road.
    pub fn has_road_neighbour(&self, pos: GridPosition) -> bool {
        self.neighbours(pos).any(|(_, next)| self.is_road(next))
    }

    /// The 4-bit road connectivity mask at a position.
    pub fn road_mask(&self, pos: GridPosition) -> u8 {
        self.neighbours(pos)
            .filter(|(_, next)| self.is_road(*next))
            .map(|(dir, _)| dir.mask_bit())
            .sum()
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Place road at an empty tile. The new piece and every road
    /// neighbour are recomputed; the returned events cover all of them,
    /// the new piece first.
    pub fn place_road(&mut self, pos: GridPosition) -> Result<Vec<RetileEvent>, GridError> {
        let index = self
            .index(pos)
            .ok_or(GridError::OutOfBounds(pos.x, pos.y))?;
        if self.tiles[index].content.is_some() {
            return Err(GridError::Occupied(pos.x, pos.y));
        }
        let piece = road::resolve_piece(self.road_mask(pos));
        self.tiles[index].content = Some(TileContent::Road(piece));

        let mut events = vec![RetileEvent { position: pos, piece }];
        events.extend(self.retile_neighbours(pos));
        Ok(events)
    }

    /// Place a building footprint at an empty tile.
    pub fn place_building(&mut self, pos: GridPosition, id: BuildingId) -> Result<(), GridError> {
        let index = self
            .index(pos)
            .ok_or(GridError::OutOfBounds(pos.x, pos.y))?;
        if self.tiles[index].content.is_some() {
            return Err(GridError::Occupied(pos.x, pos.y));
        }
        self.tiles[index].content = Some(TileContent::Building(id));
        Ok(())
    }

    /// Clear a tile, returning what it held. Removing road retiles the
    /// surviving road neighbours.
    pub fn remove_content(
        &mut self,
        pos: GridPosition,
    ) -> Result<(TileContent, Vec<RetileEvent>), GridError> {
        let index = self
            .index(pos)
            .ok_or(GridError::OutOfBounds(pos.x, pos.y))?;
        let content = self.tiles[index]
            .content
            .take()
            .ok_or(GridError::Empty(pos.x, pos.y))?;

        let events = match content {
            TileContent::Road(_) => self.retile_neighbours(pos),
            TileContent::Building(_) => Vec::new(),
        };
        Ok((content, events))
    }

    /// Recompute the piece of every road neighbour of `pos`. Propagation
    /// is one layer: a neighbour's new shape depends only on its own
    /// mask, so second-ring tiles cannot change.
    fn retile_neighbours(&mut self, pos: GridPosition) -> Vec<RetileEvent> {
        let mut events = Vec::new();
        for dir in Direction::all() {
            let next = pos.step(dir);
            if !self.is_road(next) {
                continue;
            }
            let piece = road::resolve_piece(self.road_mask(next));
            if let Some(index) = self.index(next) {
                self.tiles[index].content = Some(TileContent::Road(piece));
                events.push(RetileEvent {
                    position: next,
                    piece,
                });
            }
        }
        events
    }
}

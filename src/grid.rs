// Board geometry: bounds and the 4-neighbour adjacency rule

use crate::error::EngineError;
use crate::types::{Coord, Direction};

/// Rectangular board bounds, `0 <= x < width`, `0 <= y < height`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Result<Self, EngineError> {
        if width <= 0 || height <= 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        Ok(Grid { width, height })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    /// In-bounds 4-neighbours of `coord`, in `Direction::all()` order
    pub fn neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        Direction::all()
            .into_iter()
            .map(move |dir| dir.apply(&coord))
            .filter(move |next| self.contains(next))
    }

    /// Every cell of the board, column by column
    pub fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Coord::new(x, y)))
    }

    pub fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

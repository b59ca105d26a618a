// Board extraction: derives the cell sets the engine reasons about from raw
// board state.

use std::collections::HashSet;

use crate::error::EngineError;
use crate::grid::Grid;
use crate::types::{Battlesnake, Board, Coord};

/// Another snake on the board, as seen from our own snake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub id: String,
    pub head: Coord,
    pub length: i32,
}

/// Read-only view of a board from the perspective of one snake
#[derive(Debug, Clone)]
pub struct BoardView<'a> {
    grid: Grid,
    board: &'a Board,
    you: &'a Battlesnake,
}

impl<'a> BoardView<'a> {
    /// Binds a board to the snake identified by `you_id`
    ///
    /// # Errors
    /// * `InvalidDimensions` - width or height is not positive
    /// * `MissingSelf` - no snake on the board carries `you_id`
    /// * `EmptyBody` - our snake has no body segments
    pub fn new(board: &'a Board, you_id: &str) -> Result<Self, EngineError> {
        let grid = Grid::new(board.width, board.height)?;
        let you = board
            .snakes
            .iter()
            .find(|s| s.id == you_id)
            .ok_or_else(|| EngineError::MissingSelf {
                id: you_id.to_string(),
            })?;

        if you.body.is_empty() {
            return Err(EngineError::EmptyBody {
                id: you.id.clone(),
            });
        }

        Ok(BoardView { grid, board, you })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn head(&self) -> Coord {
        self.you.head
    }

    pub fn health(&self) -> i32 {
        self.you.health
    }

    pub fn length(&self) -> i32 {
        self.you.length
    }

    fn others(&self) -> impl Iterator<Item = &'a Battlesnake> + '_ {
        let you_id = &self.you.id;
        self.board.snakes.iter().filter(move |s| &s.id != you_id)
    }

    /// Union of every snake body; with `ignore_halo == false` the in-bounds
    /// neighbours of every other snake's head are added as well.
    ///
    /// Our own head is never part of the result.
    pub fn occupied(&self, ignore_halo: bool) -> HashSet<Coord> {
        let mut cells: HashSet<Coord> = self
            .board
            .snakes
            .iter()
            .flat_map(|s| s.body.iter().copied())
            .collect();

        if !ignore_halo {
            for other in self.others() {
                cells.extend(self.grid.neighbors(other.head));
            }
        }

        cells.remove(&self.you.head);
        cells
    }

    /// Food cells in the order the board lists them
    pub fn food(&self) -> Vec<Coord> {
        self.board.food.clone()
    }

    pub fn opponents(&self) -> Vec<Opponent> {
        self.others()
            .map(|s| Opponent {
                id: s.id.clone(),
                head: s.head,
                length: s.length,
            })
            .collect()
    }

    pub fn opponent_heads(&self) -> Vec<Coord> {
        self.others().map(|s| s.head).collect()
    }

    /// Opponent lengths; a single dummy length of 1 when we are alone
    pub fn opponent_lengths(&self) -> Vec<i32> {
        let lengths: Vec<i32> = self.others().map(|s| s.length).collect();
        if lengths.is_empty() {
            vec![1]
        } else {
            lengths
        }
    }

    /// Opponent whose head is closest (Manhattan) to our head; the first
    /// listed wins ties
    pub fn nearest_opponent(&self) -> Option<Opponent> {
        let head = self.head();
        self.opponents()
            .into_iter()
            .min_by_key(|o| o.head.manhattan(&head))
    }
}

// Battlesnake API Types
// See https://docs.battlesnake.com/api

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::ops::{Add, Sub};

/// Game metadata including ID, ruleset, and timeout
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Game {
    pub id: String,
    pub ruleset: HashMap<String, Value>,
    pub timeout: u32,
    #[serde(default)]
    pub source: String,
}

/// Board state including dimensions, food, snakes, and hazards
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Board {
    pub height: i32,
    pub width: i32,
    pub food: Vec<Coord>,
    pub snakes: Vec<Battlesnake>,
    #[serde(default)]
    pub hazards: Vec<Coord>,
}

/// Snake representation with all state information
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Battlesnake {
    pub id: String,
    pub name: String,
    pub health: i32,
    pub body: Vec<Coord>,
    pub head: Coord,
    pub length: i32,
    #[serde(default)]
    pub latency: String,
    #[serde(default)]
    pub shout: Option<String>,
}

/// 2D coordinate on the board
///
/// Ordered by `x` then `y` so that node sets iterate deterministically.
#[derive(
    Deserialize, Serialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Manhattan distance between two coordinates
    pub fn manhattan(&self, other: &Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Represents the four possible movement directions for a Battlesnake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    /// Converts direction to string representation for API response
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Parses an API direction token, case-insensitively
    pub fn parse(s: &str) -> Option<Direction> {
        match s.to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    /// Unit offset of a single step in this direction
    pub fn offset(&self) -> Coord {
        match self {
            Direction::Up => Coord::new(0, 1),
            Direction::Down => Coord::new(0, -1),
            Direction::Left => Coord::new(-1, 0),
            Direction::Right => Coord::new(1, 0),
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        *coord + self.offset()
    }

    /// Direction of the step from `from` toward `to`.
    ///
    /// The x axis is compared first; a colocated target yields `Up`.
    pub fn toward(from: &Coord, to: &Coord) -> Direction {
        if to.x < from.x {
            Direction::Left
        } else if to.x > from.x {
            Direction::Right
        } else if to.y < from.y {
            Direction::Down
        } else {
            Direction::Up
        }
    }
}

/// Complete game state received from the API
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GameState {
    pub game: Game,
    pub turn: i32,
    pub board: Board,
    pub you: Battlesnake,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_match_apply() {
        let origin = Coord::new(5, 5);
        assert_eq!(Direction::Up.apply(&origin), Coord::new(5, 6));
        assert_eq!(Direction::Down.apply(&origin), Coord::new(5, 4));
        assert_eq!(Direction::Left.apply(&origin), Coord::new(4, 5));
        assert_eq!(Direction::Right.apply(&origin), Coord::new(6, 5));
    }

    #[test]
    fn test_toward_inverts_apply() {
        let head = Coord::new(3, 3);
        for dir in Direction::all() {
            assert_eq!(Direction::toward(&head, &dir.apply(&head)), dir);
        }
    }

    #[test]
    fn test_toward_colocated_defaults_up() {
        let head = Coord::new(2, 2);
        assert_eq!(Direction::toward(&head, &head), Direction::Up);
    }

    #[test]
    fn test_coord_arithmetic_and_distance() {
        let a = Coord::new(1, 4);
        let b = Coord::new(4, 0);
        assert_eq!(a + b, Coord::new(5, 4));
        assert_eq!(b - a, Coord::new(3, -4));
        assert_eq!(a.manhattan(&b), 7);
        assert_eq!(b.manhattan(&a), 7);
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!(Direction::parse("UP"), Some(Direction::Up));
        assert_eq!(Direction::parse("left"), Some(Direction::Left));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[test]
    fn test_game_state_deserializes_with_optional_fields_missing() {
        let raw = r#"{
            "game": {"id": "g", "ruleset": {}, "timeout": 500},
            "turn": 3,
            "board": {
                "height": 11, "width": 11, "food": [{"x": 5, "y": 5}],
                "snakes": [{
                    "id": "me", "name": "me", "health": 90,
                    "body": [{"x": 0, "y": 0}], "head": {"x": 0, "y": 0}, "length": 1
                }]
            },
            "you": {
                "id": "me", "name": "me", "health": 90,
                "body": [{"x": 0, "y": 0}], "head": {"x": 0, "y": 0}, "length": 1
            }
        }"#;
        let state: GameState = serde_json::from_str(raw).unwrap();
        assert_eq!(state.board.food, vec![Coord::new(5, 5)]);
        assert!(state.board.hazards.is_empty());
        assert_eq!(state.you.shout, None);
    }
}

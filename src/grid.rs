//! Grid coordinates and movement directions.
//!
//! Grounded labels and operator arguments name board cells as `c_<row>_<col>`.
//! This module extracts those coordinates and maps unit steps between cells
//! onto the four canonical directions used by directional plans.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

fn cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)c_(\d+)_(\d+)").expect("cell pattern is a valid regex"))
}

/// A board cell addressed by row and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Finds the first `c_<row>_<col>` occurrence in `text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sas_sim::Cell;
    ///
    /// assert_eq!(Cell::parse("Atom agent-at(c_2_3)"), Some(Cell::new(2, 3)));
    /// assert_eq!(Cell::parse("Atom got-gem()"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Cell> {
        let caps = cell_pattern().captures(text)?;
        let row = caps.get(1)?.as_str().parse().ok()?;
        let col = caps.get(2)?.as_str().parse().ok()?;
        Some(Cell { row, col })
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c_{}_{}", self.row, self.col)
    }
}

/// One of the four canonical movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Direction of a unit orthogonal step from `from` to `to`.
    ///
    /// Rows grow downwards, so a decreasing row is `Up`.
    pub fn between(from: Cell, to: Cell) -> Option<Direction> {
        let dr = to.row as i64 - from.row as i64;
        let dc = to.col as i64 - from.col as i64;
        match (dr, dc) {
            (-1, 0) => Some(Direction::Up),
            (1, 0) => Some(Direction::Down),
            (0, -1) => Some(Direction::Left),
            (0, 1) => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direction token after alias normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionToken {
    Move(Direction),
    Noop,
}

impl DirectionToken {
    /// Normalises a token through the alias table, case-insensitively.
    pub fn lookup(token: &str) -> Option<DirectionToken> {
        let token = token.trim().to_ascii_lowercase();
        let mapped = match token.as_str() {
            "up" | "u" | "w" | "n" | "north" => DirectionToken::Move(Direction::Up),
            "down" | "s" | "south" => DirectionToken::Move(Direction::Down),
            "left" | "a" | "l" | "west" => DirectionToken::Move(Direction::Left),
            "right" | "d" | "r" | "east" => DirectionToken::Move(Direction::Right),
            "noop" | "no-op" | "stay" => DirectionToken::Noop,
            _ => return None,
        };
        Some(mapped)
    }
}

impl FromStr for Direction {
    type Err = SimError;

    /// Parses a direction token. Unknown tokens and no-op tokens are both
    /// rejected; the simulator has no operator for standing still.
    fn from_str(s: &str) -> Result<Self> {
        match DirectionToken::lookup(s) {
            Some(DirectionToken::Move(direction)) => Ok(direction),
            Some(DirectionToken::Noop) => Err(SimError::parse(
                0,
                "a movement direction (no-op is unsupported)",
                s.trim(),
            )),
            None => Err(SimError::parse(0, "a direction token", s.trim())),
        }
    }
}

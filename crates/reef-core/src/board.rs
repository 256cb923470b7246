//! Game board representation.
//!
//! This module contains:
//! - `Cell`: a coordinate and what sits on it
//! - `Board`: the fixed hexagonal region of cells, with piece queries
//! - Chain (connected component) measurement used by victory detection

use crate::hex::{region, HexCoord};
use crate::player::{Color, Piece};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// A single cell on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub coord: HexCoord,
    pub piece: Option<Piece>,
}

impl Cell {
    pub fn empty(coord: HexCoord) -> Self {
        Self { coord, piece: None }
    }

    pub fn is_empty(&self) -> bool {
        self.piece.is_none()
    }
}

/// Errors when rebuilding a board from its serialized form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("cell {0} lies outside a board of radius {1}")]
    OutsideRegion(HexCoord, u32),

    #[error("cell {0} appears more than once")]
    DuplicateCell(HexCoord),
}

/// The game board: every cell within `radius` of the origin.
///
/// Membership is fixed at creation; only the pieces on cells change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardJson", into = "BoardJson")]
pub struct Board {
    radius: u32,
    /// All cells indexed by coordinate
    cells: HashMap<HexCoord, Cell>,
}

impl Board {
    /// Create an empty board of the given radius
    pub fn new(radius: u32) -> Self {
        let cells = region(radius)
            .into_iter()
            .map(|coord| (coord, Cell::empty(coord)))
            .collect();
        Self { radius, cells }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Check whether a coordinate is part of the board
    pub fn contains(&self, coord: &HexCoord) -> bool {
        self.cells.contains_key(coord)
    }

    pub fn get_cell(&self, coord: &HexCoord) -> Option<&Cell> {
        self.cells.get(coord)
    }

    /// Piece on a cell; `None` for empty or off-board cells
    pub fn piece_at(&self, coord: &HexCoord) -> Option<Piece> {
        self.cells.get(coord).and_then(|cell| cell.piece)
    }

    /// Check if a cell is on the board and unoccupied
    pub fn is_vacant(&self, coord: &HexCoord) -> bool {
        self.cells.get(coord).is_some_and(Cell::is_empty)
    }

    /// All cells in a stable (q, r) order
    pub fn cells(&self) -> Vec<&Cell> {
        let mut cells: Vec<&Cell> = self.cells.values().collect();
        cells.sort_by_key(|cell| cell.coord);
        cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.cells.values().filter(|cell| !cell.is_empty()).count()
    }

    /// Coordinates holding a piece of the given color
    pub fn occupied_by(&self, color: Color) -> impl Iterator<Item = HexCoord> + '_ {
        self.cells
            .values()
            .filter(move |cell| cell.piece.is_some_and(|p| p.color == color))
            .map(|cell| cell.coord)
    }

    // ==================== Mutation ====================

    /// Put a piece on a cell, replacing whatever was there.
    /// Returns false for off-board coordinates.
    pub(crate) fn place(&mut self, coord: HexCoord, piece: Piece) -> bool {
        match self.cells.get_mut(&coord) {
            Some(cell) => {
                cell.piece = Some(piece);
                true
            }
            None => false,
        }
    }

    /// Take the piece off a cell
    pub(crate) fn remove(&mut self, coord: &HexCoord) -> Option<Piece> {
        self.cells.get_mut(coord).and_then(|cell| cell.piece.take())
    }

    // ==================== Chains ====================

    /// The chain (connected same-color group) containing `start`.
    /// Empty if the cell holds no piece.
    pub fn chain_at(&self, start: HexCoord) -> HashSet<HexCoord> {
        let mut chain = HashSet::new();
        let Some(color) = self.piece_at(&start).map(|p| p.color) else {
            return chain;
        };

        let mut queue = VecDeque::from([start]);
        chain.insert(start);

        while let Some(current) = queue.pop_front() {
            for neighbor in current.neighbors() {
                if self.piece_at(&neighbor).is_some_and(|p| p.color == color)
                    && chain.insert(neighbor)
                {
                    queue.push_back(neighbor);
                }
            }
        }

        chain
    }

    /// Size of the largest chain for a color. Every piece kind counts.
    pub fn largest_chain(&self, color: Color) -> usize {
        let mut visited: HashSet<HexCoord> = HashSet::new();
        let mut largest = 0;

        for coord in self.occupied_by(color) {
            if visited.contains(&coord) {
                continue;
            }
            let chain = self.chain_at(coord);
            largest = largest.max(chain.len());
            visited.extend(chain);
        }

        largest
    }
}

/// JSON-friendly board representation with an array instead of a HashMap.
/// JSON doesn't support complex types as keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardJson {
    pub radius: u32,
    pub cells: Vec<Cell>,
}

impl From<Board> for BoardJson {
    fn from(board: Board) -> Self {
        let cells = board.cells().into_iter().copied().collect();
        BoardJson {
            radius: board.radius,
            cells,
        }
    }
}

impl TryFrom<BoardJson> for Board {
    type Error = BoardError;

    fn try_from(json: BoardJson) -> Result<Self, Self::Error> {
        let mut board = Board::new(json.radius);
        let mut seen = HashSet::new();
        for cell in json.cells {
            if !board.contains(&cell.coord) {
                return Err(BoardError::OutsideRegion(cell.coord, json.radius));
            }
            if !seen.insert(cell.coord) {
                return Err(BoardError::DuplicateCell(cell.coord));
            }
            if let Some(piece) = cell.piece {
                board.place(cell.coord, piece);
            }
        }
        Ok(board)
    }
}

//! Klotski sliding-block search engine.
//!
//! # Grid
//!
//! ```text
//!         x=0 x=1 x=2 x=3
//!   y=0    .   .   .   .
//!   y=1    .   .   .   .
//!   y=2    .   .   .   .
//!   y=3    .   .   .   .
//!   y=4    .   .   .   .
//!              exit
//! ```
//!
//! Cells are `(x, y)` with `x` the column and `y` the row, origin top-left.
//! A piece is a rectangle identified by its anchor (minimum x, minimum y)
//! and one of four footprints: 1×1, 1×2, 2×1, 2×2.
//!
//! # Signatures
//!
//! Arrangements are deduplicated by a 31-bit Zobrist signature over
//! `(cell, shape category)` pairs, see [`zobrist`]. Pieces of the same
//! shape are interchangeable as far as the signature is concerned.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod layout;
pub mod render;
pub mod search;
pub mod zobrist;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{load_config, load_default_config, ConfigError, Goal, SolverConfig};
pub use layout::{classic_layout, Layout, LayoutError, PieceSpec};
pub use render::render;
pub use search::{Board, MoveError, ReplayError, SearchStats, SolutionStep, SolveError};
pub use zobrist::ZobristTable;

/// Grid width in cells.
pub const WIDTH: i8 = 4;
/// Grid height in cells.
pub const HEIGHT: i8 = 5;

/// Zobrist category for "cell occupied", independent of shape.
pub const OCCUPIED: usize = 0;

/// One of the four orthogonal unit moves.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Down,
    Right,
    Up,
    Left,
}

impl Direction {
    /// Expansion order used by the search.
    pub const ALL: [Direction; 4] = [
        Direction::Down,
        Direction::Right,
        Direction::Up,
        Direction::Left,
    ];

    /// Unit offset `(dx, dy)`.
    #[inline]
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
        }
    }

    /// Direction named by the sign pattern of an offset.
    ///
    /// Offsets with both components zero or both nonzero have no name.
    pub fn from_delta(dx: i8, dy: i8) -> Option<Direction> {
        match (dx.signum(), dy.signum()) {
            (0, 1) => Some(Direction::Down),
            (1, 0) => Some(Direction::Right),
            (0, -1) => Some(Direction::Up),
            (-1, 0) => Some(Direction::Left),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Left => "left",
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid coordinate. May lie outside the grid while probing moves.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i8,
    pub y: i8,
}

impl Cell {
    #[inline]
    pub const fn new(x: i8, y: i8) -> Cell {
        Cell { x, y }
    }

    #[inline]
    pub fn in_bounds(self) -> bool {
        (0..WIDTH).contains(&self.x) && (0..HEIGHT).contains(&self.y)
    }

    #[inline]
    pub fn shifted(self, direction: Direction) -> Cell {
        let (dx, dy) = direction.delta();
        Cell::new(self.x + dx, self.y + dy)
    }

    /// Manhattan distance to another cell.
    pub fn distance(self, other: Cell) -> u8 {
        ((self.x - other.x).unsigned_abs()) + ((self.y - other.y).unsigned_abs())
    }
}

/// Piece footprint.
///
/// The discriminant is the Zobrist shape category (1-4); category 0 is
/// reserved for [`OCCUPIED`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Shape {
    /// 1 wide, 2 tall.
    Tall = 1,
    /// 2×2.
    Square = 2,
    /// 2 wide, 1 tall.
    Wide = 3,
    /// 1×1.
    Single = 4,
}

impl Shape {
    pub fn from_dims(width: i8, height: i8) -> Option<Shape> {
        match (width, height) {
            (1, 2) => Some(Shape::Tall),
            (2, 2) => Some(Shape::Square),
            (2, 1) => Some(Shape::Wide),
            (1, 1) => Some(Shape::Single),
            _ => None,
        }
    }

    #[inline]
    pub fn width(self) -> i8 {
        match self {
            Shape::Tall | Shape::Single => 1,
            Shape::Square | Shape::Wide => 2,
        }
    }

    #[inline]
    pub fn height(self) -> i8 {
        match self {
            Shape::Wide | Shape::Single => 1,
            Shape::Tall | Shape::Square => 2,
        }
    }

    #[inline]
    pub fn category(self) -> usize {
        self as usize
    }
}

/// A labelled rectangle on the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub label: char,
    pub shape: Shape,
    /// Top-left cell ("starting block").
    pub anchor: Cell,
}

impl Piece {
    pub fn new(label: char, shape: Shape, anchor: Cell) -> Piece {
        Piece {
            label,
            shape,
            anchor,
        }
    }

    #[inline]
    pub fn width(&self) -> i8 {
        self.shape.width()
    }

    #[inline]
    pub fn height(&self) -> i8 {
        self.shape.height()
    }

    /// Occupied cells in row-major order. Always `width * height` cells.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let Cell { x, y } = self.anchor;
        let (width, height) = (self.width(), self.height());
        (y..y + height).flat_map(move |cy| (x..x + width).map(move |cx| Cell::new(cx, cy)))
    }

    /// The same piece one cell further in `direction`.
    pub fn shifted(&self, direction: Direction) -> Piece {
        Piece {
            anchor: self.anchor.shifted(direction),
            ..*self
        }
    }
}

/// The piece and direction that produced an arrangement from its parent.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct PieceMove {
    /// Fixed index into [`Arrangement::pieces`].
    pub piece: usize,
    pub label: char,
    pub direction: Direction,
}

impl PieceMove {
    /// Same piece moved the same way.
    #[inline]
    pub fn same_slide(&self, other: &PieceMove) -> bool {
        self.piece == other.piece && self.direction == other.direction
    }
}

/// One node of the search: a full placement of every piece.
///
/// Arrangements live in the [`Board`] arena and refer to their parent by
/// index. They are never mutated after being appended.
#[derive(Clone, Debug, Serialize)]
pub struct Arrangement {
    pub pieces: Vec<Piece>,
    pub signature: u32,
    /// Arena index of the arrangement this one was derived from.
    pub parent: Option<usize>,
    pub step: u32,
    pub last_move: Option<PieceMove>,
}

impl Arrangement {
    /// A root arrangement with no parent.
    pub fn root(pieces: Vec<Piece>, signature: u32) -> Arrangement {
        Arrangement {
            pieces,
            signature,
            parent: None,
            step: 0,
            last_move: None,
        }
    }

    pub fn occupancy(&self) -> Occupancy {
        Occupancy::from_pieces(&self.pieces)
    }

    /// Anchor cell of the piece at `index`.
    #[inline]
    pub fn anchor(&self, index: usize) -> Cell {
        self.pieces[index].anchor
    }

    /// Index of the piece carrying `label`.
    pub fn find(&self, label: char) -> Option<usize> {
        self.pieces.iter().position(|p| p.label == label)
    }

    /// Copy of the piece list with one piece shifted by a unit step.
    pub fn moved_pieces(&self, index: usize, direction: Direction) -> Vec<Piece> {
        let mut pieces = self.pieces.clone();
        pieces[index] = pieces[index].shifted(direction);
        pieces
    }
}

impl fmt::Display for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

/// Which piece index, if any, occupies each cell.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Occupancy {
    cells: [[Option<u8>; WIDTH as usize]; HEIGHT as usize],
}

impl Occupancy {
    /// Build the grid. Cells outside the grid are ignored.
    pub fn from_pieces(pieces: &[Piece]) -> Occupancy {
        let mut cells = [[None; WIDTH as usize]; HEIGHT as usize];
        for (index, piece) in pieces.iter().enumerate() {
            for cell in piece.cells().filter(|c| c.in_bounds()) {
                cells[cell.y as usize][cell.x as usize] = Some(index as u8);
            }
        }
        Occupancy { cells }
    }

    /// Piece index at `cell`; `None` when empty or off the grid.
    #[inline]
    pub fn get(&self, cell: Cell) -> Option<usize> {
        if !cell.in_bounds() {
            return None;
        }
        self.cells[cell.y as usize][cell.x as usize].map(usize::from)
    }

    /// In bounds and unoccupied.
    #[inline]
    pub fn is_free(&self, cell: Cell) -> bool {
        cell.in_bounds() && self.cells[cell.y as usize][cell.x as usize].is_none()
    }

    pub fn free_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..HEIGHT)
            .flat_map(|y| (0..WIDTH).map(move |x| Cell::new(x, y)))
            .filter(|&c| self.is_free(c))
    }
}

/// Whether `piece` can shift exactly one cell in `direction`.
///
/// Only the edge of the rectangle facing the move is examined: every cell
/// just beyond it must be inside the grid and free in `grid`.
pub fn can_move(piece: &Piece, grid: &Occupancy, direction: Direction) -> bool {
    let Cell { x, y } = piece.anchor;
    let (width, height) = (piece.width(), piece.height());

    match direction {
        Direction::Down => (x..x + width).all(|cx| grid.is_free(Cell::new(cx, y + height))),
        Direction::Right => (y..y + height).all(|cy| grid.is_free(Cell::new(x + width, cy))),
        Direction::Up => (x..x + width).all(|cx| grid.is_free(Cell::new(cx, y - 1))),
        Direction::Left => (y..y + height).all(|cy| grid.is_free(Cell::new(x - 1, cy))),
    }
}

//! Initial piece placements and their validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Cell, Piece, Shape, HEIGHT, WIDTH};

/// A piece as written in a layout: footprint plus anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieceSpec {
    pub label: char,
    pub width: i8,
    pub height: i8,
    pub x: i8,
    pub y: i8,
}

impl PieceSpec {
    pub const fn new(label: char, width: i8, height: i8, x: i8, y: i8) -> PieceSpec {
        PieceSpec {
            label,
            width,
            height,
            x,
            y,
        }
    }
}

impl From<Piece> for PieceSpec {
    fn from(piece: Piece) -> Self {
        PieceSpec::new(
            piece.label,
            piece.width(),
            piece.height(),
            piece.anchor.x,
            piece.anchor.y,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("unsupported grid {width}x{height}, only 4x5 is supported")]
    UnsupportedDimensions { width: i8, height: i8 },
    #[error("piece {label}: unsupported footprint {width}x{height}")]
    UnsupportedShape { label: char, width: i8, height: i8 },
    #[error("piece {label}: cell ({x},{y}) is off the grid")]
    OutOfBounds { label: char, x: i8, y: i8 },
    #[error("piece {label}: cell ({x},{y}) already taken by {other}")]
    Overlap { label: char, other: char, x: i8, y: i8 },
    #[error("duplicate piece label {0}")]
    DuplicateLabel(char),
    #[error("goal piece {0} is not on the board")]
    MissingGoalPiece(char),
    #[error("goal anchor ({x},{y}) puts piece {label} off the grid")]
    GoalOutOfBounds { label: char, x: i8, y: i8 },
}

/// Grid dimensions plus the ordered piece list.
///
/// Piece order is significant: it fixes each piece's index for the whole
/// search and the order in which pieces are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub width: i8,
    pub height: i8,
    pub pieces: Vec<PieceSpec>,
}

impl Layout {
    pub fn new(pieces: Vec<PieceSpec>) -> Layout {
        Layout {
            width: WIDTH,
            height: HEIGHT,
            pieces,
        }
    }

    /// Validate and convert to pieces.
    pub fn build(&self) -> Result<Vec<Piece>, LayoutError> {
        if (self.width, self.height) != (WIDTH, HEIGHT) {
            return Err(LayoutError::UnsupportedDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let mut owners = [[None::<char>; WIDTH as usize]; HEIGHT as usize];
        let mut pieces: Vec<Piece> = Vec::with_capacity(self.pieces.len());

        for spec in &self.pieces {
            let shape = Shape::from_dims(spec.width, spec.height).ok_or(LayoutError::UnsupportedShape {
                label: spec.label,
                width: spec.width,
                height: spec.height,
            })?;

            if pieces.iter().any(|p| p.label == spec.label) {
                return Err(LayoutError::DuplicateLabel(spec.label));
            }

            let anchor = Cell::new(spec.x, spec.y);
            if !anchor.in_bounds() {
                return Err(LayoutError::OutOfBounds {
                    label: spec.label,
                    x: spec.x,
                    y: spec.y,
                });
            }

            let piece = Piece::new(spec.label, shape, anchor);
            for cell in piece.cells() {
                if !cell.in_bounds() {
                    return Err(LayoutError::OutOfBounds {
                        label: spec.label,
                        x: cell.x,
                        y: cell.y,
                    });
                }
                let owner = &mut owners[cell.y as usize][cell.x as usize];
                if let Some(other) = *owner {
                    return Err(LayoutError::Overlap {
                        label: spec.label,
                        other,
                        x: cell.x,
                        y: cell.y,
                    });
                }
                *owner = Some(spec.label);
            }

            pieces.push(piece);
        }

        Ok(pieces)
    }
}

/// The ten-piece starting layout.
///
/// ```text
/// a b b c
/// a b b c
/// d e e f
/// d g h f
/// i _ _ j
/// ```
pub fn classic_layout() -> Layout {
    Layout::new(vec![
        PieceSpec::new('a', 1, 2, 0, 0),
        PieceSpec::new('b', 2, 2, 1, 0),
        PieceSpec::new('c', 1, 2, 3, 0),
        PieceSpec::new('d', 1, 2, 0, 2),
        PieceSpec::new('e', 2, 1, 1, 2),
        PieceSpec::new('f', 1, 2, 3, 2),
        PieceSpec::new('g', 1, 1, 1, 3),
        PieceSpec::new('h', 1, 1, 2, 3),
        PieceSpec::new('i', 1, 1, 0, 4),
        PieceSpec::new('j', 1, 1, 3, 4),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_layout_builds() {
        let pieces = classic_layout().build().unwrap();
        assert_eq!(pieces.len(), 10);

        let squares = pieces.iter().filter(|p| p.shape == Shape::Square).count();
        let talls = pieces.iter().filter(|p| p.shape == Shape::Tall).count();
        let wides = pieces.iter().filter(|p| p.shape == Shape::Wide).count();
        let singles = pieces.iter().filter(|p| p.shape == Shape::Single).count();
        assert_eq!((squares, talls, wides, singles), (1, 4, 1, 4));

        let area: usize = pieces.iter().map(|p| p.cells().count()).sum();
        assert_eq!(area, 18);
    }

    #[test]
    fn test_piece_spec_roundtrip() {
        let layout = classic_layout();
        let specs: Vec<PieceSpec> = layout.build().unwrap().into_iter().map(PieceSpec::from).collect();
        assert_eq!(specs, layout.pieces);
    }

    #[test]
    fn test_rejects_wrong_dimensions() {
        let mut layout = classic_layout();
        layout.width = 5;
        assert_eq!(
            layout.build(),
            Err(LayoutError::UnsupportedDimensions { width: 5, height: 5 })
        );
    }

    #[test]
    fn test_rejects_unknown_shape() {
        let layout = Layout::new(vec![PieceSpec::new('x', 3, 1, 0, 0)]);
        assert_eq!(
            layout.build(),
            Err(LayoutError::UnsupportedShape { label: 'x', width: 3, height: 1 })
        );
    }

    #[test]
    fn test_rejects_off_grid() {
        let layout = Layout::new(vec![PieceSpec::new('b', 2, 2, 3, 0)]);
        assert_eq!(
            layout.build(),
            Err(LayoutError::OutOfBounds { label: 'b', x: 4, y: 0 })
        );
    }

    #[test]
    fn test_rejects_anchor_far_off_grid() {
        let layout = Layout::new(vec![PieceSpec::new('a', 1, 2, 127, 0)]);
        assert_eq!(
            layout.build(),
            Err(LayoutError::OutOfBounds { label: 'a', x: 127, y: 0 })
        );

        let layout = Layout::new(vec![PieceSpec::new('b', 2, 2, 0, i8::MAX)]);
        assert_eq!(
            layout.build(),
            Err(LayoutError::OutOfBounds { label: 'b', x: 0, y: i8::MAX })
        );

        let layout = Layout::new(vec![PieceSpec::new('g', 1, 1, -1, i8::MIN)]);
        assert!(matches!(layout.build(), Err(LayoutError::OutOfBounds { .. })));
    }

    #[test]
    fn test_rejects_overlap() {
        let layout = Layout::new(vec![
            PieceSpec::new('a', 1, 2, 0, 0),
            PieceSpec::new('e', 2, 1, 0, 1),
        ]);
        assert_eq!(
            layout.build(),
            Err(LayoutError::Overlap { label: 'e', other: 'a', x: 0, y: 1 })
        );
    }

    #[test]
    fn test_rejects_duplicate_label() {
        let layout = Layout::new(vec![
            PieceSpec::new('g', 1, 1, 0, 0),
            PieceSpec::new('g', 1, 1, 1, 0),
        ]);
        assert_eq!(layout.build(), Err(LayoutError::DuplicateLabel('g')));
    }
}

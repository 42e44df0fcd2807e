//! Zobrist signatures.
//!
//! # Table Layout
//!
//! ```text
//! keys[y][x][category]
//!   category 0:   cell occupied (any piece)
//!   category 1-4: cell occupied by a Tall / Square / Wide / Single piece
//! ```
//!
//! Every occupied cell contributes `keys[y][x][0] ^ keys[y][x][shape]`.
//! XOR makes the signature independent of piece order and lets a single
//! move be applied by XOR-ing its old cells out and its new cells in.
//!
//! Signatures are 31-bit and treated as exact identity: two arrangements
//! with the same signature are assumed to be the same arrangement. No
//! confirmation pass is made against the full state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Arrangement, Cell, Direction, Piece, Shape, HEIGHT, OCCUPIED, WIDTH};

/// Number of key categories per cell.
pub const CATEGORIES: usize = 5;

const SIGNATURE_BITS: u32 = 31;

/// Fixed random keys for one board. Never regenerated during a search.
#[derive(Clone, Debug)]
pub struct ZobristTable {
    keys: [[[u32; CATEGORIES]; WIDTH as usize]; HEIGHT as usize],
    seed: u64,
}

impl ZobristTable {
    /// Fill every slot from one stream seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut keys = [[[0u32; CATEGORIES]; WIDTH as usize]; HEIGHT as usize];

        for row in keys.iter_mut() {
            for slot in row.iter_mut() {
                for key in slot.iter_mut() {
                    *key = rng.random_range(0..1u32 << SIGNATURE_BITS);
                }
            }
        }

        Self { keys, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Raw key for a cell and category. `cell` must be on the grid.
    #[inline]
    pub fn key(&self, cell: Cell, category: usize) -> u32 {
        self.keys[cell.y as usize][cell.x as usize][category]
    }

    /// Combined contribution of one occupied cell.
    #[inline]
    fn cell_key(&self, cell: Cell, shape: Shape) -> u32 {
        let slot = &self.keys[cell.y as usize][cell.x as usize];
        slot[OCCUPIED] ^ slot[shape.category()]
    }

    /// Signature of a whole arrangement.
    pub fn full_signature(&self, pieces: &[Piece]) -> u32 {
        pieces
            .iter()
            .flat_map(|piece| piece.cells().map(move |cell| (cell, piece.shape)))
            .fold(0, |hash, (cell, shape)| hash ^ self.cell_key(cell, shape))
    }

    /// Signature of `state` after `piece` shifts one cell in `direction`.
    ///
    /// `piece` is given in its pre-move position and the move must keep it
    /// on the grid. Equals `full_signature` of the moved arrangement.
    pub fn incremental_signature(&self, state: &Arrangement, piece: &Piece, direction: Direction) -> u32 {
        piece.cells().fold(state.signature, |hash, cell| {
            hash ^ self.cell_key(cell, piece.shape) ^ self.cell_key(cell.shifted(direction), piece.shape)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{can_move, classic_layout};

    fn classic_root(table: &ZobristTable) -> Arrangement {
        let pieces = classic_layout().build().unwrap();
        let signature = table.full_signature(&pieces);
        Arrangement::root(pieces, signature)
    }

    #[test]
    fn test_keys_fit_in_31_bits() {
        let table = ZobristTable::new(7);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                for category in 0..CATEGORIES {
                    assert!(table.key(Cell::new(x, y), category) < 1 << 31);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = ZobristTable::new(42);
        let b = ZobristTable::new(42);
        let c = ZobristTable::new(43);
        assert_eq!(a.keys, b.keys);
        assert_ne!(a.keys, c.keys);
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_empty_signature_is_zero() {
        let table = ZobristTable::new(1);
        assert_eq!(table.full_signature(&[]), 0);
    }

    #[test]
    fn test_signature_ignores_piece_order() {
        let table = ZobristTable::new(3);
        let mut pieces = classic_layout().build().unwrap();
        let forward = table.full_signature(&pieces);
        pieces.reverse();
        assert_eq!(table.full_signature(&pieces), forward);
        pieces.swap(0, 4);
        assert_eq!(table.full_signature(&pieces), forward);
    }

    #[test]
    fn test_signature_ignores_labels_of_same_shape() {
        let table = ZobristTable::new(3);
        let pieces = classic_layout().build().unwrap();
        let before = table.full_signature(&pieces);

        // g and h are both 1x1: swapping their positions keeps the cell -> shape map
        let mut swapped = pieces.clone();
        let (g, h) = (swapped[6].anchor, swapped[7].anchor);
        swapped[6].anchor = h;
        swapped[7].anchor = g;
        assert_eq!(table.full_signature(&swapped), before);
    }

    #[test]
    fn test_signature_changes_when_piece_moves() {
        let table = ZobristTable::new(3);
        let pieces = classic_layout().build().unwrap();
        let before = table.full_signature(&pieces);

        // j slides left: a different cell is now empty
        let mut moved = pieces.clone();
        moved[9] = moved[9].shifted(Direction::Left);
        assert_ne!(table.full_signature(&moved), before);
    }

    #[test]
    fn test_incremental_matches_full_from_root() {
        let table = ZobristTable::new(11);
        let root = classic_root(&table);
        let grid = root.occupancy();

        for (index, piece) in root.pieces.iter().enumerate() {
            for direction in Direction::ALL {
                if !can_move(piece, &grid, direction) {
                    continue;
                }
                let incremental = table.incremental_signature(&root, piece, direction);
                let full = table.full_signature(&root.moved_pieces(index, direction));
                assert_eq!(incremental, full, "{} {}", piece.label, direction);
            }
        }
    }

    #[test]
    fn test_incremental_is_reversible() {
        let table = ZobristTable::new(5);
        let root = classic_root(&table);

        let piece = root.pieces[9];
        let there = table.incremental_signature(&root, &piece, Direction::Left);
        let moved = Arrangement::root(root.moved_pieces(9, Direction::Left), there);
        let back = table.incremental_signature(&moved, &moved.pieces[9], Direction::Right);
        assert_eq!(back, root.signature);
    }
}

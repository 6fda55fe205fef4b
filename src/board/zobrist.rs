//! Zobrist keys for incremental position hashing
//!
//! Each (cell, color) pair gets a fixed 64-bit random key, plus one key for
//! the side to move. Placing or removing a stone XORs its key in or out, so
//! the position hash is maintained in O(1) by the bitboard.
//!
//! The table is seeded with a fixed constant: identical positions hash
//! identically across runs, which keeps search results reproducible.

use once_cell::sync::Lazy;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{Player, Pos, BOARD_SIZE};

/// Fixed seed for the key table. Changing it invalidates nothing but
/// determinism tests; any constant works.
const ZOBRIST_SEED: u64 = 123_456_789;

/// Process-wide Zobrist key table.
pub struct ZobristKeys {
    /// Per-cell keys, indexed [row][col][color]
    cells: [[[u64; 2]; BOARD_SIZE]; BOARD_SIZE],
    /// XORed whenever the side to move flips
    side: u64,
}

impl ZobristKeys {
    fn generate() -> Self {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(ZOBRIST_SEED);

        let mut cells = [[[0u64; 2]; BOARD_SIZE]; BOARD_SIZE];
        for row in cells.iter_mut() {
            for cell in row.iter_mut() {
                cell[0] = rng.next_u64();
                cell[1] = rng.next_u64();
            }
        }

        Self {
            cells,
            side: rng.next_u64(),
        }
    }

    /// Key for a stone of the given color at the given cell.
    #[inline]
    pub fn cell(&self, pos: Pos, player: Player) -> u64 {
        self.cells[pos.row as usize][pos.col as usize][player.index()]
    }

    /// Side-to-move key.
    #[inline]
    pub fn side(&self) -> u64 {
        self.side
    }
}

static KEYS: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::generate);

/// Shared key table, generated once per process.
#[inline]
pub fn zobrist() -> &'static ZobristKeys {
    &KEYS
}

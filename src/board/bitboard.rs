//! Bit-encoded board state with incremental hashing
//!
//! Each player's stones are projected onto four families of lines (columns,
//! rows, and both diagonal directions) as 15-bit masks, so the evaluator can
//! classify shapes with plain shift/AND arithmetic instead of walking cells.
//! The board also tracks an occupancy layer (bit = 1 means empty), a
//! candidate-move mask (empty cells near existing stones), and a Zobrist hash
//! updated as stones are placed and removed.
//!
//! This module is pure bookkeeping: no rule checking happens here.

use smallvec::SmallVec;

use super::zobrist::zobrist;
use super::{Player, Pos, BOARD_SIZE, DIAG_LINES};

/// One straight segment of one player's stones, bit i = stone at position i.
/// 15 of the 16 bits are usable.
pub type Line = u16;

/// Snapshot of the candidate-move mask taken before a move, restored verbatim
/// on undo. Created immediately before a simulated move and consumed by the
/// matching undo; never persisted.
pub type MaskBackup = [Line; BOARD_SIZE];

/// Per-column neighborhood masks, indexed `[row][column distance]`.
///
/// The candidate neighborhood of a stone is not the full 5x5 square: it is
/// the star of cells at distance 1 and 2 along the eight rays. The stone's
/// own column gets rows r-2..=r+2, adjacent columns get rows r-1..=r+1, and
/// columns at distance 2 get rows r-2, r, r+2.
const NEIGHBOR_MASKS: [[Line; 3]; BOARD_SIZE] = neighbor_masks();

const fn neighbor_masks() -> [[Line; 3]; BOARD_SIZE] {
    let mut table = [[0u16; 3]; BOARD_SIZE];
    let mut row = 0;
    while row < BOARD_SIZE {
        let r = row as i32;
        let mut masks = [0u16; 3];
        let mut d = -2i32;
        while d <= 2 {
            let rr = r + d;
            if rr >= 0 && rr < BOARD_SIZE as i32 {
                let bit = 1u16 << rr;
                masks[0] |= bit;
                if d >= -1 && d <= 1 {
                    masks[1] |= bit;
                }
                if d % 2 == 0 {
                    masks[2] |= bit;
                }
            }
            d += 1;
        }
        table[row] = masks;
        row += 1;
    }
    table
}

/// One player's stones projected onto the four line families.
///
/// Invariant: a cell is occupied by this player iff exactly one bit is set in
/// each of the four projections for that cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerBits {
    /// Indexed by column, bit = row
    pub cols: [Line; BOARD_SIZE],
    /// Indexed by row, bit = column
    pub rows: [Line; BOARD_SIZE],
    /// Main (\) diagonals, indexed by `row - col + 14`, bit = min(row, col)
    pub diag_main: [Line; DIAG_LINES],
    /// Anti (/) diagonals, indexed by `row + col`, bit = min(row, 14 - col)
    pub diag_anti: [Line; DIAG_LINES],
}

impl PlayerBits {
    /// Number of stones this player has on the board.
    pub fn stones(&self) -> u32 {
        self.cols.iter().map(|l| l.count_ones()).sum()
    }
}

/// Complete bit-encoded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitBoard {
    pub black: PlayerBits,
    pub white: PlayerBits,
    /// Per-column occupancy, bit = 1 means empty
    pub occupancy: [Line; BOARD_SIZE],
    /// Per-column candidate mask, bit = 1 means empty and near a stone.
    /// Always a subset of `occupancy`.
    pub move_mask: [Line; BOARD_SIZE],
    /// Incremental Zobrist hash (cell keys XOR side-to-move key per ply)
    pub hash: u64,
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl BitBoard {
    /// Empty board: all planes clear, occupancy all-empty, hash zero.
    pub fn new() -> Self {
        Self {
            black: PlayerBits::default(),
            white: PlayerBits::default(),
            occupancy: [(!0u16) >> 1; BOARD_SIZE],
            move_mask: [0; BOARD_SIZE],
            hash: 0,
        }
    }

    #[inline]
    fn bits_mut(&mut self, player: Player) -> &mut PlayerBits {
        match player {
            Player::Black => &mut self.black,
            Player::White => &mut self.white,
        }
    }

    #[inline]
    pub fn bits(&self, player: Player) -> &PlayerBits {
        match player {
            Player::Black => &self.black,
            Player::White => &self.white,
        }
    }

    /// Whether the given cell is empty.
    #[inline]
    pub fn is_empty_cell(&self, pos: Pos) -> bool {
        (self.occupancy[pos.col as usize] >> pos.row) & 1 == 1
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> u32 {
        let empties: u32 = self.occupancy.iter().map(|l| l.count_ones()).sum();
        (BOARD_SIZE * BOARD_SIZE) as u32 - empties
    }

    /// Place a stone, returning the candidate-mask backup needed to undo it.
    ///
    /// Sets the four directional bits, clears the occupancy bit, XORs the
    /// cell and side keys into the hash, and expands the candidate mask over
    /// the stone's neighborhood (intersected with occupancy so occupied cells
    /// never become candidates).
    pub fn apply_move(&mut self, pos: Pos, player: Player) -> MaskBackup {
        let backup = self.move_mask;

        let (row, col) = (pos.row as usize, pos.col as usize);
        let bits = self.bits_mut(player);
        bits.cols[col] |= 1 << row;
        bits.rows[row] |= 1 << col;
        bits.diag_main[pos.diag_main()] |= 1 << pos.diag_main_bit();
        bits.diag_anti[pos.diag_anti()] |= 1 << pos.diag_anti_bit();

        let keys = zobrist();
        self.hash ^= keys.cell(pos, player) ^ keys.side();

        self.occupancy[col] &= !(1 << row);

        let lo = col.saturating_sub(2);
        let hi = (col + 2).min(BOARD_SIZE - 1);
        for c in lo..=hi {
            let dist = c.abs_diff(col);
            self.move_mask[c] |= NEIGHBOR_MASKS[row][dist];
            self.move_mask[c] &= self.occupancy[c];
        }

        backup
    }

    /// Exact inverse of [`apply_move`](Self::apply_move).
    pub fn undo_move(&mut self, pos: Pos, player: Player, backup: &MaskBackup) {
        let (row, col) = (pos.row as usize, pos.col as usize);
        let bits = self.bits_mut(player);
        bits.cols[col] &= !(1 << row);
        bits.rows[row] &= !(1 << col);
        bits.diag_main[pos.diag_main()] &= !(1 << pos.diag_main_bit());
        bits.diag_anti[pos.diag_anti()] &= !(1 << pos.diag_anti_bit());

        let keys = zobrist();
        self.hash ^= keys.cell(pos, player) ^ keys.side();

        self.occupancy[col] |= 1 << row;
        self.move_mask = *backup;
    }

    /// Place a stone outside of search, discarding the undo backup.
    /// For position setup by the game layer and tests.
    pub fn set_stone(&mut self, pos: Pos, player: Player) {
        let _ = self.apply_move(pos, player);
    }

    /// Candidate moves: cells that are empty and within the neighborhood of
    /// an existing stone. Bit-scans `move_mask & occupancy` per column, which
    /// keeps the branching factor small on an otherwise huge board.
    pub fn generate_moves(&self) -> SmallVec<[Pos; 64]> {
        let mut moves = SmallVec::new();
        for col in 0..BOARD_SIZE {
            let mut bits = self.move_mask[col] & self.occupancy[col];
            while bits != 0 {
                let row = bits.trailing_zeros() as u8;
                moves.push(Pos::new(row, col as u8));
                bits &= bits - 1;
            }
        }
        moves
    }

    /// Recompute the hash from scratch. Slow; used only when a snapshot
    /// arrives without an incrementally maintained hash.
    pub fn full_hash(&self, to_move: Player) -> u64 {
        let keys = zobrist();
        let mut hash = 0u64;
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let pos = Pos::new(row as u8, col as u8);
                if (self.black.rows[row] >> col) & 1 == 1 {
                    hash ^= keys.cell(pos, Player::Black);
                }
                if (self.white.rows[row] >> col) & 1 == 1 {
                    hash ^= keys.cell(pos, Player::White);
                }
            }
        }
        if to_move == Player::White {
            hash ^= keys.side();
        }
        hash
    }
}

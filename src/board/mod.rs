//! Board representation for the 15x15 Renju board

pub mod bitboard;
pub mod zobrist;

// Re-exports
pub use bitboard::{BitBoard, Line, MaskBackup, PlayerBits};

/// Board size (15x15)
pub const BOARD_SIZE: usize = 15;
/// Number of lines per diagonal family (2 * 15 - 1)
pub const DIAG_LINES: usize = 2 * BOARD_SIZE - 1;
/// Fixed opening move on an empty board
pub const CENTER: Pos = Pos {
    row: BOARD_SIZE as u8 / 2,
    col: BOARD_SIZE as u8 / 2,
};

/// Stone colors. Black is the restricted side under Renju forbidden-move rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    Black,
    White,
}

impl Player {
    /// Get opponent color
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::Black => Player::White,
            Player::White => Player::Black,
        }
    }

    /// Index into per-color tables (black = 0, white = 1)
    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Player::Black => 0,
            Player::White => 1,
        }
    }
}

/// Position on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub row: u8,
    pub col: u8,
}

impl Pos {
    #[inline]
    pub fn new(row: u8, col: u8) -> Self {
        debug_assert!(row < BOARD_SIZE as u8 && col < BOARD_SIZE as u8);
        Self { row, col }
    }

    /// Index of the main (\) diagonal through this cell, 0..29
    #[inline]
    pub fn diag_main(self) -> usize {
        self.row as usize + (BOARD_SIZE - 1) - self.col as usize
    }

    /// Index of the anti (/) diagonal through this cell, 0..29
    #[inline]
    pub fn diag_anti(self) -> usize {
        self.row as usize + self.col as usize
    }

    /// Bit position of this cell along its main diagonal
    #[inline]
    pub fn diag_main_bit(self) -> u32 {
        self.row.min(self.col) as u32
    }

    /// Bit position of this cell along its anti diagonal
    #[inline]
    pub fn diag_anti_bit(self) -> u32 {
        self.row.min(BOARD_SIZE as u8 - 1 - self.col) as u32
    }
}

/// Effective length of a diagonal line given its family index.
///
/// Corner diagonals are shorter than 15; anything under 5 cells can never
/// hold a five and is skipped by the evaluator.
#[inline]
pub fn diag_len(idx: usize) -> usize {
    BOARD_SIZE - idx.abs_diff(BOARD_SIZE - 1)
}

//! Incremental evaluation state maintained across make/unmake
//!
//! The board has 15 columns, 15 rows, and 29 diagonals in each family; a
//! stone sits on exactly one line of each family. `EvalState` caches the net
//! score (black minus white) of every line plus a running total, so applying
//! a move only re-evaluates the four lines through the moved cell. The
//! invariant `total_score == sum of all line scores` holds at every step;
//! `unmake_move` restores it exactly from the undo snapshot.
//!
//! For Black the per-line open-three and four counts are also cached. A move
//! that raises those counts by two or more in total is a Renju forbidden
//! move; the state signals it by forcing `total_score` to a sentinel instead
//! of erroring. This is a pruning heuristic for the search, not the
//! authoritative rule check the game layer runs on human moves.

use crate::board::{diag_len, BitBoard, MaskBackup, Player, PlayerBits, Pos, BOARD_SIZE, DIAG_LINES};

use super::patterns::{eval_lines2, eval_lines4, lanes2, LineEval, LinePack};
use super::FORBIDDEN_SCORE;

const DIR_COL: usize = 0;
const DIR_ROW: usize = 1;
const DIR_MAIN: usize = 2;
const DIR_ANTI: usize = 3;

/// Per-line score and pattern-count cache with running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalState {
    /// Net line scores (black - white), indexed [direction][line]
    line_scores: [[i32; DIAG_LINES]; 4],
    /// Black open-three count per line, for the forbidden heuristic
    live3: [[i32; DIAG_LINES]; 4],
    /// Black four count per line, for the forbidden heuristic
    fours: [[i32; DIAG_LINES]; 4],
    total_score: i32,
}

/// Snapshot reversing one [`EvalState::make_move`]. Created right before a
/// simulated move and consumed by the matching unmake.
#[derive(Debug, Clone, Copy)]
pub struct EvalUndo {
    mask_backup: MaskBackup,
    line_scores: [i32; 4],
    live3: [i32; 4],
    fours: [i32; 4],
    total_score: i32,
}

/// The four line indices through a cell: column, row, main diagonal, anti
/// diagonal.
#[inline]
fn line_indices(pos: Pos) -> [usize; 4] {
    [
        pos.col as usize,
        pos.row as usize,
        pos.diag_main(),
        pos.diag_anti(),
    ]
}

#[inline]
fn line_lengths(idx: &[usize; 4]) -> [usize; 4] {
    [
        BOARD_SIZE,
        BOARD_SIZE,
        diag_len(idx[DIR_MAIN]),
        diag_len(idx[DIR_ANTI]),
    ]
}

#[inline]
fn line_of(bits: &PlayerBits, dir: usize, idx: usize) -> u16 {
    match dir {
        DIR_COL => bits.cols[idx],
        DIR_ROW => bits.rows[idx],
        DIR_MAIN => bits.diag_main[idx],
        _ => bits.diag_anti[idx],
    }
}

/// Lane d of an [`eval_lines4`] result pack.
#[inline]
fn lane(pack: &LinePack, d: usize) -> LineEval {
    let word = if d < 2 { pack.lo } else { pack.hi };
    LineEval((word >> (32 * (d as u32 & 1))) as u32)
}

impl EvalState {
    /// Evaluate every line of the board from scratch.
    ///
    /// Columns and rows are batched pairwise (both colors of one line share
    /// a kernel pass); diagonals shorter than five are skipped and stay
    /// zero.
    pub fn from_board(board: &BitBoard) -> Self {
        let mut eval = Self {
            line_scores: [[0; DIAG_LINES]; 4],
            live3: [[0; DIAG_LINES]; 4],
            fours: [[0; DIAG_LINES]; 4],
            total_score: 0,
        };

        for i in 0..BOARD_SIZE {
            let b = board.black.cols[i];
            let w = board.white.cols[i];
            let (be, we) = lanes2(eval_lines2(b, w, BOARD_SIZE, w, b, BOARD_SIZE));
            eval.set_line(DIR_COL, i, be, we);

            let b = board.black.rows[i];
            let w = board.white.rows[i];
            let (be, we) = lanes2(eval_lines2(b, w, BOARD_SIZE, w, b, BOARD_SIZE));
            eval.set_line(DIR_ROW, i, be, we);
        }

        for i in 0..DIAG_LINES {
            let len = diag_len(i);
            if len < 5 {
                continue;
            }

            let b = board.black.diag_main[i];
            let w = board.white.diag_main[i];
            let (be, we) = lanes2(eval_lines2(b, w, len, w, b, len));
            eval.set_line(DIR_MAIN, i, be, we);

            let b = board.black.diag_anti[i];
            let w = board.white.diag_anti[i];
            let (be, we) = lanes2(eval_lines2(b, w, len, w, b, len));
            eval.set_line(DIR_ANTI, i, be, we);
        }

        eval
    }

    fn set_line(&mut self, dir: usize, idx: usize, black: LineEval, white: LineEval) {
        let net = black.score() - white.score();
        self.line_scores[dir][idx] = net;
        self.live3[dir][idx] = black.open_threes();
        self.fours[dir][idx] = black.fours();
        self.total_score += net;
    }

    /// Current total: sum of all net line scores, or the forbidden sentinel.
    #[inline]
    pub fn total(&self) -> i32 {
        self.total_score
    }

    /// Whether the last applied move was heuristically forbidden.
    #[inline]
    pub fn is_forbidden(&self) -> bool {
        self.total_score == FORBIDDEN_SCORE
    }

    /// Apply a simulated move to board and evaluation in O(1).
    ///
    /// Re-evaluates only the four lines through the cell via the batched
    /// kernel, snapshotting their previous scores and counts first. When
    /// Black creates two or more new open threes, or two or more new fours,
    /// across those lines, `total_score` is forced to [`FORBIDDEN_SCORE`].
    pub fn make_move(&mut self, board: &mut BitBoard, pos: Pos, player: Player) -> EvalUndo {
        let idx = line_indices(pos);
        let lens = line_lengths(&idx);

        let mut undo = EvalUndo {
            mask_backup: [0; BOARD_SIZE],
            line_scores: [0; 4],
            live3: [0; 4],
            fours: [0; 4],
            total_score: self.total_score,
        };
        for d in 0..4 {
            undo.line_scores[d] = self.line_scores[d][idx[d]];
            undo.live3[d] = self.live3[d][idx[d]];
            undo.fours[d] = self.fours[d][idx[d]];
            self.total_score -= undo.line_scores[d];
        }

        undo.mask_backup = board.apply_move(pos, player);

        // Pack the four touched lines for both colors; short diagonals get
        // an all-zero lane and are skipped below.
        let mut black = LinePack::default();
        let mut white = LinePack::default();
        let mut mask = LinePack::default();
        for d in 0..4 {
            if lens[d] < 5 {
                continue;
            }
            let b = line_of(&board.black, d, idx[d]) as u64;
            let w = line_of(&board.white, d, idx[d]) as u64;
            let m = (1u64 << lens[d]) - 1;
            let shift = 32 * (d as u32 & 1);
            if d < 2 {
                black.lo |= b << shift;
                white.lo |= w << shift;
                mask.lo |= m << shift;
            } else {
                black.hi |= b << shift;
                white.hi |= w << shift;
                mask.hi |= m << shift;
            }
        }

        let (b_eval, w_eval) = eval_lines4(black, white, mask);
        for d in 0..4 {
            if lens[d] < 5 {
                continue;
            }
            let be = lane(&b_eval, d);
            let we = lane(&w_eval, d);
            let net = be.score() - we.score();
            self.line_scores[d][idx[d]] = net;
            self.live3[d][idx[d]] = be.open_threes();
            self.fours[d][idx[d]] = be.fours();
            self.total_score += net;
        }

        if player == Player::Black {
            let mut new3 = 0;
            let mut new4 = 0;
            for d in 0..4 {
                if lens[d] < 5 {
                    continue;
                }
                new3 += (self.live3[d][idx[d]] - undo.live3[d]).max(0);
                new4 += (self.fours[d][idx[d]] - undo.fours[d]).max(0);
            }
            if new3 >= 2 || new4 >= 2 {
                self.total_score = FORBIDDEN_SCORE;
            }
        }

        undo
    }

    /// Exact inverse of [`make_move`](Self::make_move): restores board, the
    /// four line entries, and the total verbatim from the snapshot.
    pub fn unmake_move(
        &mut self,
        board: &mut BitBoard,
        pos: Pos,
        player: Player,
        undo: &EvalUndo,
    ) {
        board.undo_move(pos, player, &undo.mask_backup);

        self.total_score = undo.total_score;
        let idx = line_indices(pos);
        for d in 0..4 {
            self.line_scores[d][idx[d]] = undo.line_scores[d];
            self.live3[d][idx[d]] = undo.live3[d];
            self.fours[d][idx[d]] = undo.fours[d];
        }
    }
}

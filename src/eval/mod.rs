//! Position evaluation: bit-parallel shape recognition and incremental scoring

pub mod patterns;
pub mod state;

// Re-exports
pub use patterns::{eval_line, eval_lines2, eval_lines4, LineEval, LinePack};
pub use state::{EvalState, EvalUndo};

/// Shape scores, summed per line as `count * weight`.
///
/// The absolute values matter less than the ordering: a five dominates
/// everything, an open four dominates any combination of threes, and a
/// blocked four outranks an open three because it forces an answer.
pub struct PatternScore;

impl PatternScore {
    /// Five in a row - immediate win
    pub const FIVE: i32 = 100_000;
    /// Open four: _OOOO_ (two ways to complete)
    pub const OPEN_FOUR: i32 = 50_000;
    /// Blocked four: XOOOO_ or edge-blocked (one way to complete)
    pub const CLOSED_FOUR: i32 = 8_000;
    /// Open three: _OOO_ (becomes an open four if unanswered)
    pub const OPEN_THREE: i32 = 6_000;
    /// Gapped open three: _OO_O_ or _O_OO_ with both outer ends open
    pub const GAP_OPEN_THREE: i32 = 4_000;
    /// Blocked three: XOOO_ or _OOOX
    pub const CLOSED_THREE: i32 = 700;
    /// Open two: _OO_
    pub const OPEN_TWO: i32 = 100;
    /// Extra space beyond the minimal open two (__OO__), added on top of
    /// the open-two score rather than replacing it
    pub const STRONG_OPEN_TWO_BONUS: i32 = 100;
    /// Blocked two: XOO_ or _OOX
    pub const CLOSED_TWO: i32 = 20;
}

/// Static scores at or beyond this threshold are decisive: the game is won
/// (or lost) on the board and search stops descending.
pub const WIN_THRESHOLD: i32 = 90_000;

/// Sentinel planted in `EvalState::total_score` when a Black move is
/// heuristically forbidden. Far below any reachable evaluation, so the
/// search discards the move without any separate error path.
pub const FORBIDDEN_SCORE: i32 = -100_000_000;

//! Move search: iterative-deepening PVS with a shared transposition table

pub mod alphabeta;
pub mod tt;

pub use alphabeta::{SearchResult, Searcher};
pub use tt::{Bound, TranspositionTable};

/// Default iterative deepening ceiling (plies).
pub const SEARCH_DEPTH: u8 = 10;

/// Hard upper bound on search depth; sizes the killer table.
pub const MAX_PLY: usize = 20;

/// Moves kept per node after ordering.
pub const BEAM_WIDTH: usize = 11;

/// Default transposition table size in bytes.
pub const DEFAULT_TT_BYTES: usize = 64 * 1024 * 1024;

//! Engine facade: configuration, position snapshots, and move selection

use log::info;
use thiserror::Error;

use crate::board::{BitBoard, Player, Pos, CENTER};
use crate::search::{
    Searcher, TranspositionTable, BEAM_WIDTH, DEFAULT_TT_BYTES, MAX_PLY, SEARCH_DEPTH,
};

/// Rejected position snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("ply count {ply} does not match {stones} stones on the board")]
    PlyMismatch { ply: u32, stones: u32 },
    #[error("stone split {black} black / {white} white is unreachable with {to_move:?} to move")]
    ColorBalance {
        black: u32,
        white: u32,
        to_move: Player,
    },
}

/// A validated position handed to the engine: board, side to move, and the
/// number of moves already played.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    board: BitBoard,
    to_move: Player,
    ply: u32,
}

impl Snapshot {
    /// Validate that the stone counts are consistent with `ply` and
    /// `to_move` under alternating play starting with Black.
    pub fn new(board: BitBoard, to_move: Player, ply: u32) -> Result<Self, SnapshotError> {
        let black = board.bits(Player::Black).stones();
        let white = board.bits(Player::White).stones();
        if black + white != ply {
            return Err(SnapshotError::PlyMismatch {
                ply,
                stones: black + white,
            });
        }
        let balanced = match to_move {
            Player::Black => black == white,
            Player::White => black == white + 1,
        };
        if !balanced {
            return Err(SnapshotError::ColorBalance {
                black,
                white,
                to_move,
            });
        }
        Ok(Self {
            board,
            to_move,
            ply,
        })
    }

    #[inline]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    #[inline]
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    #[inline]
    pub fn ply(&self) -> u32 {
        self.ply
    }
}

/// Tunable engine limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Iterative deepening ceiling; clamped to an even value within
    /// [`MAX_PLY`]
    pub max_depth: u8,
    /// Candidate moves searched per node
    pub beam_width: usize,
    /// Transposition table budget in bytes
    pub tt_bytes: usize,
    /// Search threads; 1 disables parallel search
    pub workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: SEARCH_DEPTH,
            beam_width: BEAM_WIDTH,
            tt_bytes: DEFAULT_TT_BYTES,
            workers: 1,
        }
    }
}

/// Move-search engine with a persistent transposition table. All methods
/// take `&self`, so one engine can serve concurrent games behind an `Arc`.
pub struct Engine {
    tt: TranspositionTable,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let tt = TranspositionTable::new(config.tt_bytes);
        info!(
            "engine ready: depth {}, beam {}, {} tt entries, {} workers",
            config.max_depth.clamp(2, MAX_PLY as u8) & !1,
            config.beam_width,
            tt.capacity(),
            config.workers.max(1)
        );
        Self { tt, config }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Pick a move for the side to move, or `None` when the position has no
    /// playable candidate. The opening move is always the center.
    pub fn choose_move(&self, snapshot: &Snapshot) -> Option<Pos> {
        if snapshot.ply() == 0 {
            return Some(CENTER);
        }

        self.tt.new_generation();
        let searcher = Searcher::with_limits(&self.tt, self.config.max_depth, self.config.beam_width);
        let result = if self.config.workers > 1 {
            searcher.search_parallel(snapshot.board(), snapshot.to_move(), self.config.workers)
        } else {
            searcher.search(snapshot.board(), snapshot.to_move())
        };
        info!(
            "ply {}: depth {} score {} ({} nodes)",
            snapshot.ply(),
            result.depth,
            result.score,
            result.nodes
        );
        result.best_move
    }

    /// Drop all cached search results, e.g. between games.
    pub fn clear_cache(&self) {
        self.tt.clear();
    }
}

//! Renju move-search engine
//!
//! A 15x15 five-in-a-row engine with Renju forbidden moves for Black
//! (double open three and double four). The hot path is branch-free: lines
//! are 16-bit words, patterns are recognized by SWAR shift cascades, and the
//! evaluation is maintained incrementally across make/unmake.
//!
//! # Architecture
//!
//! - [`board`]: bit-encoded position with four directional projections,
//!   candidate-move mask, and incremental Zobrist hashing
//! - [`eval`]: SWAR line evaluator and the incremental evaluation state,
//!   including the forbidden-move heuristic
//! - [`search`]: iterative-deepening PVS over a beam of ordered moves, with
//!   a lock-free shared transposition table and optional lazy-SMP workers
//! - [`engine`]: configuration, snapshot validation, and move selection
//!
//! # Quick Start
//!
//! ```
//! use renju::{BitBoard, Engine, EngineConfig, Player, Pos, Snapshot};
//!
//! let engine = Engine::new(EngineConfig {
//!     max_depth: 4,
//!     tt_bytes: 1 << 20,
//!     ..EngineConfig::default()
//! });
//!
//! let mut board = BitBoard::new();
//! board.set_stone(Pos::new(7, 7), Player::Black);
//!
//! let snapshot = Snapshot::new(board, Player::White, 1)?;
//! if let Some(pos) = engine.choose_move(&snapshot) {
//!     board.set_stone(pos, Player::White);
//! }
//! # Ok::<(), renju::SnapshotError>(())
//! ```

pub mod board;
pub mod engine;
pub mod eval;
pub mod search;

pub use board::{BitBoard, Player, Pos, BOARD_SIZE, CENTER};
pub use engine::{Engine, EngineConfig, Snapshot, SnapshotError};
pub use eval::{EvalState, FORBIDDEN_SCORE, WIN_THRESHOLD};
pub use search::{SearchResult, Searcher, TranspositionTable};

//! Iterative-deepening principal variation search
//!
//! The driver deepens in steps of two plies so the leaf parity (whose turn
//! it is at the horizon) stays fixed across iterations. Each node probes the
//! shared transposition table, short-circuits on decisive static scores,
//! orders the candidate moves by a one-ply evaluation, and searches the
//! first move with the full window and the rest with a null window plus
//! re-search. Move ordering keeps only the best `beam_width` candidates, so
//! the tree is a beam, not exhaustive.

use smallvec::SmallVec;

use crate::board::{BitBoard, Player, Pos};
use crate::eval::{EvalState, WIN_THRESHOLD};

use super::tt::{Bound, TranspositionTable};
use super::{BEAM_WIDTH, MAX_PLY, SEARCH_DEPTH};

/// Larger than any positional score; mate scores stay inside it.
pub(crate) const INF: i32 = 100_000_000;

/// Outcome of one search request.
#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub best_move: Option<Pos>,
    pub score: i32,
    /// Deepest fully completed iteration
    pub depth: u8,
    pub nodes: u64,
}

/// Mutable per-thread search state: a private board copy, the incremental
/// evaluation, and killer moves per ply.
struct SearchContext {
    board: BitBoard,
    eval: EvalState,
    killers: [[Option<Pos>; 2]; MAX_PLY],
    nodes: u64,
}

impl SearchContext {
    fn new(board: &BitBoard, to_move: Player) -> Self {
        let mut board = *board;
        if board.hash == 0 && board.stone_count() > 0 {
            // Externally built position without incremental hashing.
            board.hash = board.full_hash(to_move);
        }
        Self {
            eval: EvalState::from_board(&board),
            board,
            killers: [[None; 2]; MAX_PLY],
            nodes: 0,
        }
    }
}

/// Score from the side to move's perspective.
#[inline]
fn persp(total: i32, player: Player) -> i32 {
    match player {
        Player::Black => total,
        Player::White => -total,
    }
}

/// Shift a mate score from ply-relative to root-relative before caching.
#[inline]
fn score_to_tt(score: i32, ply: u8) -> i32 {
    if score > WIN_THRESHOLD {
        score + ply as i32
    } else if score < -WIN_THRESHOLD {
        score - ply as i32
    } else {
        score
    }
}

#[inline]
fn score_from_tt(score: i32, ply: u8) -> i32 {
    if score > WIN_THRESHOLD {
        score - ply as i32
    } else if score < -WIN_THRESHOLD {
        score + ply as i32
    } else {
        score
    }
}

/// Alpha-beta searcher bound to a shared transposition table.
pub struct Searcher<'a> {
    tt: &'a TranspositionTable,
    max_depth: u8,
    beam_width: usize,
}

impl<'a> Searcher<'a> {
    pub fn new(tt: &'a TranspositionTable) -> Self {
        Self::with_limits(tt, SEARCH_DEPTH, BEAM_WIDTH)
    }

    pub fn with_limits(tt: &'a TranspositionTable, max_depth: u8, beam_width: usize) -> Self {
        let max_depth = max_depth.clamp(2, MAX_PLY as u8) & !1;
        Self {
            tt,
            max_depth,
            beam_width: beam_width.max(1),
        }
    }

    /// Search `board` with `to_move` to play and return the best move found.
    pub fn search(&self, board: &BitBoard, to_move: Player) -> SearchResult {
        let mut ctx = SearchContext::new(board, to_move);
        let moves = ctx.board.generate_moves();
        if moves.is_empty() {
            return SearchResult {
                best_move: None,
                score: 0,
                depth: 0,
                nodes: 0,
            };
        }
        self.deepen(&mut ctx, to_move, &moves, 2)
    }

    /// Lazy SMP: every worker runs the same iterative deepening on its own
    /// context against the shared table; helpers start at staggered depths
    /// so they populate the table ahead of the main line. The deepest result
    /// wins, ties broken by score.
    pub fn search_parallel(
        &self,
        board: &BitBoard,
        to_move: Player,
        workers: usize,
    ) -> SearchResult {
        if workers <= 1 {
            return self.search(board, to_move);
        }

        let mut ctx = SearchContext::new(board, to_move);
        let moves = ctx.board.generate_moves();
        if moves.is_empty() {
            return SearchResult {
                best_move: None,
                score: 0,
                depth: 0,
                nodes: 0,
            };
        }

        let mut results: Vec<SearchResult> = Vec::new();
        std::thread::scope(|scope| {
            let mut handles = Vec::new();
            for worker in 1..workers {
                let moves = moves.clone();
                let start = 2 + 2 * (worker as u8 % 2);
                handles.push(scope.spawn(move || {
                    let mut ctx = SearchContext::new(board, to_move);
                    self.deepen(&mut ctx, to_move, &moves, start.min(self.max_depth))
                }));
            }
            results.push(self.deepen(&mut ctx, to_move, &moves, 2));
            for handle in handles {
                if let Ok(result) = handle.join() {
                    results.push(result);
                }
            }
        });

        let nodes: u64 = results.iter().map(|r| r.nodes).sum();
        let mut best = results[0];
        for r in &results[1..] {
            if r.depth > best.depth || (r.depth == best.depth && r.score > best.score) {
                best = *r;
            }
        }
        best.nodes = nodes;
        best
    }

    /// Iterative deepening from `start_depth` to the configured ceiling in
    /// steps of two.
    fn deepen(
        &self,
        ctx: &mut SearchContext,
        to_move: Player,
        moves: &[Pos],
        start_depth: u8,
    ) -> SearchResult {
        let mut best_move = moves[0];
        let mut best_score = -INF;
        let mut completed = 0;

        let mut depth = start_depth;
        while depth <= self.max_depth {
            match self.root_iteration(ctx, to_move, moves, depth) {
                RootOutcome::Win { pos, score } => {
                    log::debug!(
                        "depth {}: immediate win at ({}, {}), {} nodes",
                        depth,
                        pos.row,
                        pos.col,
                        ctx.nodes
                    );
                    return SearchResult {
                        best_move: Some(pos),
                        score,
                        depth,
                        nodes: ctx.nodes,
                    };
                }
                RootOutcome::Done { pos, score } => {
                    // Despair guard: when every line loses, keep the move
                    // from the previous, shallower iteration.
                    if score > -WIN_THRESHOLD || completed == 0 {
                        best_move = pos;
                        best_score = score;
                    }
                    completed = depth;
                    log::debug!(
                        "depth {}: best ({}, {}) score {} ({} nodes)",
                        depth,
                        best_move.row,
                        best_move.col,
                        best_score,
                        ctx.nodes
                    );
                }
            }
            if best_score > WIN_THRESHOLD {
                break;
            }
            depth += 2;
        }

        SearchResult {
            best_move: Some(best_move),
            score: best_score,
            depth: completed,
            nodes: ctx.nodes,
        }
    }

    fn root_iteration(
        &self,
        ctx: &mut SearchContext,
        to_move: Player,
        moves: &[Pos],
        depth: u8,
    ) -> RootOutcome {
        // Seeded by the root entry the previous iteration stored below.
        let (mut wa, mut wb) = (-INF, INF);
        let tt_move = self
            .tt
            .probe(ctx.board.hash, 0, &mut wa, &mut wb)
            .best_move;
        let ordered = self.order_moves(ctx, moves, tt_move, 0, to_move);

        let mut best_score = -INF;
        let mut best_move = None;
        let mut alpha = -INF;
        let beta = INF;

        for &(_, pos) in &ordered {
            let undo = ctx.eval.make_move(&mut ctx.board, pos, to_move);
            ctx.nodes += 1;

            if to_move == Player::Black && ctx.eval.is_forbidden() {
                ctx.eval.unmake_move(&mut ctx.board, pos, to_move, &undo);
                continue;
            }

            // Winning on the spot needs no lookahead.
            let static_score = persp(ctx.eval.total(), to_move);
            if static_score > WIN_THRESHOLD {
                ctx.eval.unmake_move(&mut ctx.board, pos, to_move, &undo);
                return RootOutcome::Win {
                    pos,
                    score: static_score,
                };
            }

            let score = -self.alpha_beta(ctx, 1, depth, -beta, -alpha, to_move.opponent());
            ctx.eval.unmake_move(&mut ctx.board, pos, to_move, &undo);

            if score > best_score {
                best_score = score;
                best_move = Some(pos);
            }
            if score > alpha {
                alpha = score;
            }
        }

        if let Some(pos) = best_move {
            self.tt
                .store(ctx.board.hash, depth, best_score, Bound::Exact, Some(pos));
        }

        RootOutcome::Done {
            // All candidates forbidden: surrender the ordering's first pick.
            pos: best_move.unwrap_or(ordered[0].1),
            score: best_score,
        }
    }

    fn alpha_beta(
        &self,
        ctx: &mut SearchContext,
        ply: u8,
        max_depth: u8,
        mut alpha: i32,
        mut beta: i32,
        player: Player,
    ) -> i32 {
        let rem_depth = max_depth - ply;
        let probe = self.tt.probe(ctx.board.hash, rem_depth, &mut alpha, &mut beta);
        if let Some(value) = probe.value {
            return score_from_tt(value, ply);
        }

        // Decisive static scores (a completed five, or a forbidden move just
        // played) end the line before any expansion; note these returns skip
        // the table save below, so sentinel values are never cached.
        let current = persp(ctx.eval.total(), player);
        if current > WIN_THRESHOLD {
            return current - ply as i32;
        }
        if current < -WIN_THRESHOLD {
            return current + ply as i32;
        }
        if ply >= max_depth {
            return current;
        }

        let moves = ctx.board.generate_moves();
        if moves.is_empty() {
            return 0;
        }
        let ordered = self.order_moves(ctx, &moves, probe.best_move, ply as usize, player);

        let alpha_orig = alpha;
        let mut best_score = -INF;
        let mut best_move = None;

        for (i, &(_, pos)) in ordered.iter().enumerate() {
            let undo = ctx.eval.make_move(&mut ctx.board, pos, player);
            ctx.nodes += 1;

            let score = if i == 0 {
                -self.alpha_beta(ctx, ply + 1, max_depth, -beta, -alpha, player.opponent())
            } else {
                let null =
                    -self.alpha_beta(ctx, ply + 1, max_depth, -alpha - 1, -alpha, player.opponent());
                if null > alpha && null < beta {
                    -self.alpha_beta(ctx, ply + 1, max_depth, -beta, -alpha, player.opponent())
                } else {
                    null
                }
            };

            ctx.eval.unmake_move(&mut ctx.board, pos, player, &undo);

            if score > best_score {
                best_score = score;
                best_move = Some(pos);
                if score > alpha {
                    alpha = score;
                }
            }
            if alpha >= beta {
                let killers = &mut ctx.killers[ply as usize];
                if killers[0] != Some(pos) {
                    killers[1] = killers[0];
                    killers[0] = Some(pos);
                }
                break;
            }
        }

        let bound = if best_score <= alpha_orig {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt
            .store(ctx.board.hash, rem_depth, score_to_tt(best_score, ply), bound, best_move);

        best_score
    }

    /// Score each candidate by a one-ply make/evaluate/unmake, rank the
    /// cached table move and killers above all of them, and keep the best
    /// `beam_width` via insertion sort.
    fn order_moves(
        &self,
        ctx: &mut SearchContext,
        moves: &[Pos],
        tt_move: Option<Pos>,
        ply: usize,
        player: Player,
    ) -> SmallVec<[(i32, Pos); BEAM_WIDTH + 1]> {
        let killers = ctx.killers[ply];
        let mut ordered: SmallVec<[(i32, Pos); BEAM_WIDTH + 1]> = SmallVec::new();

        for &pos in moves {
            let score = if tt_move == Some(pos) {
                INF + 2
            } else if killers.contains(&Some(pos)) {
                INF + 1
            } else {
                let undo = ctx.eval.make_move(&mut ctx.board, pos, player);
                let s = persp(ctx.eval.total(), player);
                ctx.eval.unmake_move(&mut ctx.board, pos, player, &undo);
                s
            };

            if ordered.len() < self.beam_width
                || score > ordered[ordered.len() - 1].0
            {
                let at = ordered
                    .iter()
                    .position(|&(s, _)| s < score)
                    .unwrap_or(ordered.len());
                ordered.insert(at, (score, pos));
                ordered.truncate(self.beam_width);
            }
        }

        ordered
    }
}

enum RootOutcome {
    Win { pos: Pos, score: i32 },
    Done { pos: Pos, score: i32 },
}

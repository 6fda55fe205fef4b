use criterion::{black_box, criterion_group, criterion_main, Criterion};

use renju::board::{BitBoard, Player, Pos};
use renju::eval::{eval_line, EvalState};
use renju::search::{Searcher, TranspositionTable};

/// A quiet midgame position, eight plies in.
fn midgame() -> BitBoard {
    let mut board = BitBoard::new();
    let moves = [
        (Pos::new(7, 7), Player::Black),
        (Pos::new(7, 8), Player::White),
        (Pos::new(8, 7), Player::Black),
        (Pos::new(6, 6), Player::White),
        (Pos::new(8, 8), Player::Black),
        (Pos::new(6, 8), Player::White),
        (Pos::new(9, 6), Player::Black),
        (Pos::new(6, 7), Player::White),
    ];
    for (pos, player) in moves {
        board.set_stone(pos, player);
    }
    board
}

fn bench_eval_line(c: &mut Criterion) {
    c.bench_function("eval_line", |b| {
        b.iter(|| {
            let eval = eval_line(black_box(0b0110_1100), black_box(0b0001_0000), 15);
            black_box(eval);
        });
    });
}

fn bench_eval_from_board(c: &mut Criterion) {
    let board = midgame();
    c.bench_function("eval_from_board", |b| {
        b.iter(|| {
            let eval = EvalState::from_board(black_box(&board));
            black_box(eval.total());
        });
    });
}

fn bench_make_unmake(c: &mut Criterion) {
    let mut board = midgame();
    let mut eval = EvalState::from_board(&board);
    let pos = Pos::new(9, 9);
    c.bench_function("make_unmake", |b| {
        b.iter(|| {
            let undo = eval.make_move(&mut board, black_box(pos), Player::Black);
            eval.unmake_move(&mut board, pos, Player::Black, &undo);
        });
    });
}

fn bench_search_depth4(c: &mut Criterion) {
    let board = midgame();
    c.bench_function("search_depth4", |b| {
        b.iter(|| {
            let tt = TranspositionTable::new(1 << 22);
            let searcher = Searcher::with_limits(&tt, 4, 11);
            let result = searcher.search(black_box(&board), Player::Black);
            black_box(result.best_move);
        });
    });
}

criterion_group!(
    benches,
    bench_eval_line,
    bench_eval_from_board,
    bench_make_unmake,
    bench_search_depth4
);
criterion_main!(benches);

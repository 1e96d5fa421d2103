use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chess_ai::board::{Color, GameState};
use chess_ai::eval::{evaluate_state, EvalOptions};
use chess_ai::search::{search_root, DriverConfig, SearchParams, SearchTables};

const MIDGAME_FEN: &str = "r1bqk2r/pp2bppp/2n1pn2/2pp4/3P1B2/2P1PN2/PP1N1PPP/R2QKB1R w KQkq - 0 8";

fn bench_movegen(c: &mut Criterion) {
    let start = GameState::new();
    let midgame: GameState = MIDGAME_FEN.parse().unwrap();

    c.bench_function("movegen_start_position", |b| {
        b.iter(|| black_box(start.all_legal_moves(Color::White)).len())
    });
    c.bench_function("movegen_midgame", |b| {
        b.iter(|| black_box(midgame.all_legal_moves(Color::White)).len())
    });
}

fn bench_evaluation(c: &mut Criterion) {
    let midgame: GameState = MIDGAME_FEN.parse().unwrap();
    let core = EvalOptions::default();
    let max = EvalOptions {
        max_thinking: true,
        nnue_mix: 0.0,
    };

    c.bench_function("eval_core", |b| {
        b.iter(|| black_box(evaluate_state(&midgame, Color::White, &core)))
    });
    c.bench_function("eval_max_thinking", |b| {
        b.iter(|| black_box(evaluate_state(&midgame, Color::White, &max)))
    });
}

fn bench_apply_move(c: &mut Criterion) {
    let state = GameState::new();
    let moves = state.all_legal_moves(Color::White);

    c.bench_function("clone_and_apply", |b| {
        b.iter(|| {
            let mut child = state.clone();
            child.apply_move(black_box(moves[0])).unwrap();
            black_box(child.key())
        })
    });
}

fn bench_search(c: &mut Criterion) {
    let midgame: GameState = MIDGAME_FEN.parse().unwrap();

    c.bench_function("search_depth_2", |b| {
        b.iter(|| {
            let params = SearchParams::default();
            let mut tables = SearchTables::new(8);
            let config = DriverConfig {
                max_depth: 2,
                ..Default::default()
            };
            black_box(search_root(&midgame, &params, &mut tables, &config))
        })
    });
}

criterion_group!(
    benches,
    bench_movegen,
    bench_evaluation,
    bench_apply_move,
    bench_search
);
criterion_main!(benches);

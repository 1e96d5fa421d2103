//! Iterative-deepening driver.
//!
//! Runs the depth loop with per-candidate aspiration windows, captures
//! exact scores for every root move (the policy layer compares them), and
//! honors the time deadline and external stop signal at every cooperative
//! breakpoint: before starting a depth, between root moves, and at the
//! node gate inside the recursion. A fallback move is kept from the first
//! ordered candidate so the driver never comes back empty-handed while a
//! legal move exists.

use std::sync::Arc;
use std::time::Instant;

use crate::board::{GameState, Move};

use super::alphabeta::SearchContext;
use super::constants::{
    ASPIRATION_DELTA, ASPIRATION_MAX_DELTA, MATE_THRESHOLD, SCORE_INFINITE,
};
use super::ordering::{order_moves, OrderingContext};
use super::{mate_in, SearchLimits, SearchParams, SearchTables};

/// External stop oracle sampled at cooperative breakpoints.
pub type StopSignal = Arc<dyn Fn() -> bool + Send + Sync>;

/// Per-depth progress callback.
pub type ProgressCallback = Arc<dyn Fn(&SearchReport) + Send + Sync>;

/// Driver bounds and hooks.
#[derive(Clone, Default)]
pub struct DriverConfig {
    pub max_depth: u32,
    pub max_time_ms: Option<u64>,
    pub stop: Option<StopSignal>,
    pub on_depth: Option<ProgressCallback>,
}

/// Snapshot of one completed depth.
#[derive(Clone, Debug)]
pub struct SearchReport {
    pub depth: u32,
    pub best_move: Move,
    pub score: i32,
    pub mate_in: Option<i32>,
    pub pv: Vec<Move>,
    pub nodes: u64,
    pub seldepth: u32,
    pub elapsed_ms: u64,
    pub aspiration_retries: u32,
}

/// A root move with its exact score from the deepest completed search.
#[derive(Clone, Copy, Debug)]
pub struct RootCandidate {
    pub mv: Move,
    pub score: i32,
}

/// Outcome of the deepest fully completed iteration.
#[derive(Clone, Debug)]
pub struct DriverResult {
    pub best: Move,
    pub score: i32,
    pub depth: u32,
    pub mate_in: Option<i32>,
    pub candidates: Vec<RootCandidate>,
    pub nodes: u64,
    pub aspiration_retries: u32,
}

/// Iterative deepening from `state`. Returns `None` only when the side to
/// move has no legal move.
#[must_use]
pub fn search_root(
    state: &GameState,
    params: &SearchParams,
    tables: &mut SearchTables,
    config: &DriverConfig,
) -> Option<DriverResult> {
    let side = state.side_to_move();
    let mut moves = state.all_legal_moves(side);
    if moves.is_empty() {
        return None;
    }

    let started = Instant::now();
    let limits = SearchLimits {
        deadline: config
            .max_time_ms
            .map(|ms| started + std::time::Duration::from_millis(ms)),
        stop: config.stop.clone(),
    };

    order_moves(
        state,
        &mut moves,
        &OrderingContext {
            tables,
            tt_move: None,
            preferred: None,
            ply: 0,
            in_check: state.in_check(side),
            max_thinking: params.max_thinking,
        },
    );

    // Shallow fallback so cancellation before depth 1 completes still
    // yields a legal move.
    let mut result = DriverResult {
        best: moves[0],
        score: 0,
        depth: 0,
        mate_in: None,
        candidates: moves.iter().map(|&mv| RootCandidate { mv, score: 0 }).collect(),
        nodes: 0,
        aspiration_retries: 0,
    };

    if moves.len() == 1 {
        // Single legal move: no point searching.
        return Some(result);
    }

    let mut ctx = SearchContext::create(params, &limits, tables, 1);
    let mut previous_scores: Vec<(Move, i32)> =
        moves.iter().map(|&mv| (mv, 0)).collect();
    let mut total_retries = 0u32;

    'deepening: for depth in 1..=config.max_depth.max(1) {
        // Pre-iteration gate: never start a depth past the deadline.
        if limits.should_stop() {
            break;
        }

        // Search the previous iteration's best first, the rest in
        // descending score order.
        if depth > 1 {
            previous_scores.sort_by(|a, b| b.1.cmp(&a.1));
        }

        let mut iteration: Vec<(Move, i32)> = Vec::with_capacity(previous_scores.len());
        for (mv, prev_score) in &previous_scores {
            // Root-move boundary: another cooperative breakpoint.
            if limits.should_stop() {
                break 'deepening;
            }

            let mut child = state.clone();
            child.apply_legal(*mv);

            let score = if depth == 1 {
                -ctx.negamax(&child, 0, -SCORE_INFINITE, SCORE_INFINITE, 1, true)
            } else {
                aspiration_search(&mut ctx, &child, depth, *prev_score, &mut total_retries)
            };
            if ctx.stopped {
                break 'deepening;
            }
            iteration.push((*mv, score));
        }

        // Depth complete: adopt its scores.
        previous_scores = iteration;
        let (best, score) = previous_scores
            .iter()
            .max_by_key(|(_, s)| *s)
            .map(|(m, s)| (*m, *s))
            .unwrap_or((result.best, result.score));

        result = DriverResult {
            best,
            score,
            depth,
            mate_in: mate_in(score),
            candidates: previous_scores
                .iter()
                .map(|&(mv, score)| RootCandidate { mv, score })
                .collect(),
            nodes: ctx.stats.nodes,
            aspiration_retries: total_retries,
        };

        log::debug!(
            "depth {} best {} score {} nodes {} retries {}",
            depth,
            best,
            score,
            ctx.stats.nodes,
            total_retries
        );

        if let Some(cb) = &config.on_depth {
            let report = SearchReport {
                depth,
                best_move: best,
                score,
                mate_in: result.mate_in,
                pv: extract_pv(state, &ctx, best, depth as usize),
                nodes: ctx.stats.nodes,
                seldepth: ctx.stats.seldepth,
                elapsed_ms: started.elapsed().as_millis() as u64,
                aspiration_retries: total_retries,
            };
            cb(&report);
        }

        // A forced mate for the mover will not improve with more depth.
        if score >= MATE_THRESHOLD {
            break;
        }
    }

    Some(result)
}

/// Aspiration window around the candidate's previous-iteration score,
/// widened (doubling) on fail-low/high until the score lands inside.
fn aspiration_search(
    ctx: &mut SearchContext<'_>,
    child: &GameState,
    depth: u32,
    prev_score: i32,
    retries: &mut u32,
) -> i32 {
    let mut delta = ASPIRATION_DELTA;
    let mut alpha = prev_score.saturating_sub(delta).max(-SCORE_INFINITE);
    let mut beta = prev_score.saturating_add(delta).min(SCORE_INFINITE);

    loop {
        let score = -ctx.negamax(child, depth as i32 - 1, -beta, -alpha, 1, true);
        if ctx.stopped {
            return score;
        }
        if score.abs() >= MATE_THRESHOLD {
            return score;
        }
        if score <= alpha {
            *retries += 1;
            delta = delta.saturating_mul(2);
            alpha = prev_score.saturating_sub(delta).max(-SCORE_INFINITE);
        } else if score >= beta {
            *retries += 1;
            delta = delta.saturating_mul(2);
            beta = prev_score.saturating_add(delta).min(SCORE_INFINITE);
        } else {
            return score;
        }
        if delta > ASPIRATION_MAX_DELTA {
            alpha = -SCORE_INFINITE;
            beta = SCORE_INFINITE;
        }
    }
}

/// Walk the transposition table from the root move to rebuild the
/// principal variation. Cycles and missing entries end the line.
fn extract_pv(
    state: &GameState,
    ctx: &SearchContext<'_>,
    first: Move,
    max_len: usize,
) -> Vec<Move> {
    let mut pv = vec![first];
    let mut cursor = state.clone();
    cursor.apply_legal(first);

    let mut seen = vec![state.key(), cursor.key()];
    while pv.len() < max_len {
        let Some(entry) = ctx.tables.tt.probe(cursor.key()) else {
            break;
        };
        let Some(mv) = entry.best_move() else {
            break;
        };
        if !cursor.is_legal_move(&mv) {
            break;
        }
        let canonical = cursor
            .legal_moves_from(mv.from)
            .into_iter()
            .find(|m| m.same_action(&mv));
        let Some(canonical) = canonical else { break };
        cursor.apply_legal(canonical);
        if seen.contains(&cursor.key()) {
            break;
        }
        seen.push(cursor.key());
        pv.push(canonical);
    }
    pv
}

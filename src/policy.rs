//! Root policy layer: play-for-win shaping of the scored root candidates.
//!
//! Applied after the driver returns exact scores for every root move and
//! before the final selection. The penalty passes (repetition, two-ply
//! shuffle, drawish repeat, contempt, immediate backtrack, threefold
//! avoidance, repeat-ban window) only run when `play_for_win` is enabled
//! and never touch forced-mate candidates; the fairness window and the
//! seeded variety tie-break always run so that the same seed and state
//! produce the same move.

use rand::prelude::*;

use crate::board::{GameState, Move};
use crate::search::{mate_in, RootCandidate};

/// Penalty applied per recent-position hit, multiplied by the caller's
/// repetition scale.
const REPEAT_PENALTY_BASE: i32 = 40;

/// Penalty for a candidate that would backtrack the mover's own last move.
const BACKTRACK_PENALTY: i32 = 50;

/// Alternatives worse than this margin free a backtrack from penalty.
const BACKTRACK_ALTERNATIVE_MARGIN: i32 = 300;

/// Penalty for producing a third occurrence of a position key.
const THREEFOLD_PENALTY: i32 = 80;

/// A threefold candidate this much ahead of the field keeps its score.
const THREEFOLD_CLEAR_MARGIN: i32 = 120;

/// Positions within this much of level count as drawish for the
/// drawish-repeat nudge.
const DRAWISH_BALANCE_CP: i32 = 60;

/// Per-unit penalty for the drawish-repeat nudge.
const DRAWISH_NUDGE_BASE: i32 = 25;

/// Mate threshold guard so penalties never reorder forced mates.
fn is_mate_score(score: i32) -> bool {
    mate_in(score).is_some()
}

/// Policy parameters with safe defaults. The numeric knobs mirror the
/// configuration envelope of `choose_move`.
#[derive(Clone, Debug)]
pub struct PolicyParams {
    pub play_for_win: bool,
    /// Position keys the caller considers recent, for repetition
    /// accounting beyond the state's own counts.
    pub recent_positions: Vec<u64>,
    pub repetition_penalty_scale: i32,
    pub hard_repetition_nudge_scale: i32,
    pub repeat_ban_window_cp: i32,
    pub two_ply_repeat_penalty: i32,
    pub contempt_cp: i32,
    /// Scores below this count as clearly losing; the penalty passes hold
    /// off so a draw can be salvaged.
    pub draw_hold_threshold: i32,
    pub top_move_window: i32,
    pub fairness_window: i32,
    pub seed: Option<u64>,
}

impl Default for PolicyParams {
    fn default() -> Self {
        PolicyParams {
            play_for_win: false,
            recent_positions: Vec::new(),
            repetition_penalty_scale: 1,
            hard_repetition_nudge_scale: 1,
            repeat_ban_window_cp: 40,
            two_ply_repeat_penalty: 35,
            contempt_cp: 12,
            draw_hold_threshold: -150,
            top_move_window: 15,
            fairness_window: 8,
            seed: None,
        }
    }
}

struct Shaped {
    mv: Move,
    raw_score: i32,
    score: i32,
    next_key: u64,
    repeats_recent: bool,
    would_threefold: bool,
    gives_check: bool,
}

/// Shape the scored candidates and pick the root move. Returns `None`
/// only on an empty candidate list.
#[must_use]
pub fn select_root_move(
    state: &GameState,
    candidates: &[RootCandidate],
    params: &PolicyParams,
) -> Option<Move> {
    if candidates.is_empty() {
        return None;
    }
    if candidates.len() == 1 {
        return Some(candidates[0].mv);
    }

    let mut shaped: Vec<Shaped> = candidates
        .iter()
        .map(|c| {
            let mut child = state.clone();
            let _ = child.apply_legal(c.mv);
            let next_key = child.key();
            Shaped {
                mv: c.mv,
                raw_score: c.score,
                score: c.score,
                next_key,
                repeats_recent: params.recent_positions.contains(&next_key),
                would_threefold: state.repetition_count(next_key) + 1 >= 3,
                gives_check: child.in_check(child.side_to_move()),
            }
        })
        .collect();

    // Forced mates bypass shaping entirely: shortest mate first, and when
    // everything loses, the longest defense (both encoded in the score).
    if let Some(best_mate) = shaped
        .iter()
        .filter(|s| s.raw_score >= crate::search::MATE_THRESHOLD)
        .max_by_key(|s| s.raw_score)
    {
        return Some(best_mate.mv);
    }

    let top_raw = shaped.iter().map(|s| s.raw_score).max().unwrap_or(0);
    let not_losing = top_raw >= params.draw_hold_threshold;

    if params.play_for_win && not_losing {
        apply_penalties(state, &mut shaped, params, top_raw);
    }

    // Repeat-ban window: within the band, a non-repeat beats a repeat.
    if params.play_for_win && not_losing {
        let top = shaped.iter().map(|s| s.score).max().unwrap_or(0);
        let band_has_fresh = shaped.iter().any(|s| {
            !s.repeats_recent && !s.would_threefold && s.score >= top - params.repeat_ban_window_cp
        });
        if band_has_fresh {
            for s in shaped.iter_mut() {
                if (s.repeats_recent || s.would_threefold)
                    && s.score >= top - params.repeat_ban_window_cp
                {
                    s.score -= params.repeat_ban_window_cp;
                }
            }
        }
    }

    // Fairness window plus top-move variety: gather everything within the
    // band of the adjusted top and pick deterministically with the seeded
    // RNG. Without a seed the first (stable-ordered) member wins.
    let top = shaped.iter().map(|s| s.score).max()?;
    let window = if params.play_for_win {
        params.top_move_window.max(params.fairness_window)
    } else {
        params.fairness_window
    };
    let band: Vec<&Shaped> = shaped.iter().filter(|s| s.score >= top - window).collect();

    let pick = match params.seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed ^ state.key());
            band[rng.gen_range(0..band.len())]
        }
        None => band[0],
    };
    Some(pick.mv)
}

fn apply_penalties(state: &GameState, shaped: &mut [Shaped], params: &PolicyParams, top_raw: i32) {
    let us = state.side_to_move();
    let our_last = state.last_move_by(us);

    // Snapshot for "close alternative" tests.
    let scores: Vec<(Move, i32)> = shaped.iter().map(|s| (s.mv, s.raw_score)).collect();

    for s in shaped.iter_mut() {
        if is_mate_score(s.raw_score) || s.raw_score < params.draw_hold_threshold {
            continue;
        }

        // 1. Repetition penalty against the caller's recent keys.
        if s.repeats_recent {
            s.score -= REPEAT_PENALTY_BASE * params.repetition_penalty_scale.max(0);
        }

        // 2. Two-ply repeat: the A-B-A-B shuffle, detected as a candidate
        //    that re-reverses our own last move back into a recent key.
        let backtracks = our_last.is_some_and(|last| s.mv.reverses(&last));
        if backtracks && s.repeats_recent {
            s.score -= params.two_ply_repeat_penalty;
        }

        // 3. Drawish repeat: near-level position with a fresh, quiet
        //    alternative available.
        if (s.repeats_recent || s.would_threefold) && top_raw.abs() <= DRAWISH_BALANCE_CP {
            s.score -= DRAWISH_NUDGE_BASE * params.hard_repetition_nudge_scale.max(0);
        }

        // 4. Contempt: repeating while not losing concedes winning
        //    chances.
        if s.repeats_recent {
            s.score -= params.contempt_cp;
        }

        // 5. Immediate backtrack, only when a close alternative exists.
        if backtracks {
            let close_alternative = scores.iter().any(|(mv, score)| {
                !mv.same_action(&s.mv) && *score >= s.raw_score - BACKTRACK_ALTERNATIVE_MARGIN
            });
            if close_alternative {
                s.score -= BACKTRACK_PENALTY;
            }
        }

        // 6. Threefold avoidance, unless the candidate is clearly best.
        if s.would_threefold {
            let best_other = scores
                .iter()
                .filter(|(mv, _)| !mv.same_action(&s.mv))
                .map(|(_, score)| *score)
                .max()
                .unwrap_or(i32::MIN);
            if s.raw_score < best_other.saturating_add(THREEFOLD_CLEAR_MARGIN) {
                s.score -= THREEFOLD_PENALTY;
            }
        }
    }

    // Drawish-repeat nudge only bites when a fresh no-check alternative
    // exists; restore scores when every alternative repeats or checks.
    let has_fresh_quiet = shaped
        .iter()
        .any(|s| !s.repeats_recent && !s.would_threefold && !s.gives_check);
    if !has_fresh_quiet {
        for s in shaped.iter_mut() {
            if (s.repeats_recent || s.would_threefold) && top_raw.abs() <= DRAWISH_BALANCE_CP {
                s.score += DRAWISH_NUDGE_BASE * params.hard_repetition_nudge_scale.max(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, PieceType, Square};
    use crate::search::RootCandidate;

    fn candidate(mv: Move, score: i32) -> RootCandidate {
        RootCandidate { mv, score }
    }

    /// Two-king-and-rook scaffold where white's rook on a2 can go back to
    /// a1 (repeating) or on to a3 (fresh).
    fn rook_shuffle_state() -> GameState {
        let mut state = GameState::empty();
        state.place(Square::new(0, 4), Color::White, PieceType::King);
        state.place(Square::new(7, 4), Color::Black, PieceType::King);
        state.place(Square::new(1, 0), Color::White, PieceType::Rook);
        state
    }

    fn a2a1() -> Move {
        Move::new(Square::new(1, 0), Square::new(0, 0))
    }

    fn a2a3() -> Move {
        Move::new(Square::new(1, 0), Square::new(2, 0))
    }

    fn key_after(state: &GameState, mv: Move) -> u64 {
        let mut child = state.clone();
        child.apply_legal(mv);
        child.key()
    }

    #[test]
    fn test_empty_and_single_candidate() {
        let state = rook_shuffle_state();
        let params = PolicyParams::default();
        assert!(select_root_move(&state, &[], &params).is_none());
        let only = candidate(a2a3(), 0);
        assert_eq!(
            select_root_move(&state, &[only], &params),
            Some(a2a3())
        );
    }

    #[test]
    fn test_repetition_avoided_with_play_for_win() {
        let state = rook_shuffle_state();
        let repeat_key = key_after(&state, a2a1());
        let params = PolicyParams {
            play_for_win: true,
            recent_positions: vec![repeat_key],
            ..Default::default()
        };
        let candidates = [candidate(a2a1(), 10), candidate(a2a3(), 5)];
        // Comparable scores: the fresh move wins despite the lower raw
        // score.
        assert_eq!(
            select_root_move(&state, &candidates, &params),
            Some(a2a3())
        );
    }

    #[test]
    fn test_play_for_win_off_is_seed_deterministic() {
        let state = rook_shuffle_state();
        let repeat_key = key_after(&state, a2a1());
        let params = PolicyParams {
            play_for_win: false,
            recent_positions: vec![repeat_key],
            seed: Some(99),
            ..Default::default()
        };
        let candidates = [candidate(a2a1(), 10), candidate(a2a3(), 8)];
        let first = select_root_move(&state, &candidates, &params);
        for _ in 0..5 {
            assert_eq!(select_root_move(&state, &candidates, &params), first);
        }
    }

    #[test]
    fn test_backtrack_penalized_with_close_alternative() {
        // White just played a1a2; a2a1 would backtrack it.
        let mut state = rook_shuffle_state();
        state.last_move_by[Color::White.index()] =
            Some(Move::new(Square::new(0, 0), Square::new(1, 0)));

        let params = PolicyParams {
            play_for_win: true,
            ..Default::default()
        };
        let candidates = [candidate(a2a1(), 10), candidate(a2a3(), 0)];
        assert_eq!(
            select_root_move(&state, &candidates, &params),
            Some(a2a3())
        );
    }

    #[test]
    fn test_backtrack_kept_when_alternatives_collapse() {
        let mut state = rook_shuffle_state();
        state.last_move_by[Color::White.index()] =
            Some(Move::new(Square::new(0, 0), Square::new(1, 0)));
        let params = PolicyParams {
            play_for_win: true,
            ..Default::default()
        };
        // Every alternative is at least 300 cp worse: no penalty applies.
        let candidates = [candidate(a2a1(), 10), candidate(a2a3(), -350)];
        assert_eq!(
            select_root_move(&state, &candidates, &params),
            Some(a2a1())
        );
    }

    #[test]
    fn test_mate_preference_beats_policy() {
        let state = rook_shuffle_state();
        let repeat_key = key_after(&state, a2a1());
        let params = PolicyParams {
            play_for_win: true,
            recent_positions: vec![repeat_key],
            ..Default::default()
        };
        let mate_score = crate::search::MATE_SCORE - 1;
        let longer_mate = crate::search::MATE_SCORE - 5;
        let candidates = [
            candidate(a2a1(), mate_score),
            candidate(a2a3(), longer_mate),
        ];
        // The shorter mate wins even though a2a1 repeats.
        assert_eq!(
            select_root_move(&state, &candidates, &params),
            Some(a2a1())
        );
    }

    #[test]
    fn test_clearly_losing_skips_penalties() {
        let state = rook_shuffle_state();
        let repeat_key = key_after(&state, a2a1());
        let params = PolicyParams {
            play_for_win: true,
            recent_positions: vec![repeat_key],
            ..Default::default()
        };
        // Everything far below the draw-hold threshold: repeating to hold
        // the draw is fine.
        let candidates = [candidate(a2a1(), -400), candidate(a2a3(), -420)];
        assert_eq!(
            select_root_move(&state, &candidates, &params),
            Some(a2a1())
        );
    }

    #[test]
    fn test_seeded_variety_is_reproducible() {
        let state = rook_shuffle_state();
        let params = PolicyParams {
            play_for_win: true,
            seed: Some(1234),
            ..Default::default()
        };
        // Two equal candidates inside the top-move window.
        let candidates = [candidate(a2a1(), 20), candidate(a2a3(), 20)];
        let first = select_root_move(&state, &candidates, &params);
        for _ in 0..10 {
            assert_eq!(select_root_move(&state, &candidates, &params), first);
        }
    }
}

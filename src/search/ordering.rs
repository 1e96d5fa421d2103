//! Move ordering.
//!
//! Ranks candidates so alpha-beta cuts early: check evasions when in
//! check (captures, then blocks, then king steps, safe squares first),
//! then the transposition-table move, the previous-iteration preferred
//! move, true recaptures, winning captures by MVV-LVA (with SEE-lite
//! demotion of poisoned captures in max-thinking mode), promotions,
//! killers, the countermove, and finally quiets by history score.

use crate::board::{GameState, Move, PieceType};

use super::constants::{
    CAPTURE_BASE_SCORE, COUNTER_SCORE, EVASION_BLOCK_SCORE, EVASION_CAPTURE_SCORE,
    EVASION_KING_SCORE, EVASION_SAFE_KING_BONUS, KILLER1_SCORE, KILLER2_SCORE,
    LOSING_CAPTURE_SCORE, PREFERRED_MOVE_SCORE, PROMOTION_BASE_SCORE, RECAPTURE_SCORE,
    TT_MOVE_SCORE,
};
use super::see::see_lite;
use super::SearchTables;

/// Everything the orderer consults beyond the position itself.
pub(crate) struct OrderingContext<'a> {
    pub tables: &'a SearchTables,
    pub tt_move: Option<Move>,
    /// Previous-iteration PV move (root) or other externally preferred move.
    pub preferred: Option<Move>,
    pub ply: usize,
    pub in_check: bool,
    pub max_thinking: bool,
}

/// Score and sort moves in place, best first. Sorting is stable, so equal
/// scores keep generation order and the result is deterministic.
pub(crate) fn order_moves(state: &GameState, moves: &mut [Move], ctx: &OrderingContext<'_>) {
    let mut scored: Vec<(i32, Move)> = moves
        .iter()
        .map(|m| (score_move(state, m, ctx), *m))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    for (slot, (_, m)) in moves.iter_mut().zip(scored) {
        *slot = m;
    }
}

fn score_move(state: &GameState, mv: &Move, ctx: &OrderingContext<'_>) -> i32 {
    let is_capture = state.is_capture(mv);

    if ctx.in_check {
        return evasion_score(state, mv, is_capture);
    }

    if ctx.tt_move.as_ref().is_some_and(|tt| tt.same_action(mv)) {
        return TT_MOVE_SCORE;
    }
    if ctx.preferred.as_ref().is_some_and(|p| p.same_action(mv)) {
        return PREFERRED_MOVE_SCORE;
    }

    if is_capture {
        // True recapture: taking back on the square the opponent just
        // captured on.
        if state
            .last_move()
            .is_some_and(|last| last.captured.is_some() && last.to == mv.to)
        {
            return RECAPTURE_SCORE;
        }

        let net = see_lite(state, mv);
        if ctx.max_thinking && net < 0 {
            // Poisoned capture: below every quiet move.
            return LOSING_CAPTURE_SCORE + net;
        }
        return CAPTURE_BASE_SCORE + mvv_lva(state, mv);
    }

    if let Some(promo) = mv.promotion {
        return PROMOTION_BASE_SCORE + promo.value();
    }

    if ctx.ply < crate::board::MAX_PLY {
        let killers = &ctx.tables.killers[ctx.ply];
        if killers[0].is_some_and(|k| k.same_action(mv)) {
            return KILLER1_SCORE;
        }
        if killers[1].is_some_and(|k| k.same_action(mv)) {
            return KILLER2_SCORE;
        }
    }

    if let Some(last) = state.last_move() {
        if let Some(counter) = ctx.tables.counter(&last) {
            if counter.same_action(mv) {
                return COUNTER_SCORE;
            }
        }
    }

    ctx.tables.history_score(mv)
}

fn evasion_score(state: &GameState, mv: &Move, is_capture: bool) -> i32 {
    let mover_is_king = state
        .board
        .piece_at(mv.from)
        .is_some_and(|p| p.kind == PieceType::King);

    if is_capture {
        return EVASION_CAPTURE_SCORE + mvv_lva(state, mv);
    }
    if !mover_is_king {
        return EVASION_BLOCK_SCORE;
    }
    // King steps: prefer squares the opponent does not currently attack.
    let enemy = state.side_to_move().opponent();
    let safe = !state.is_square_attacked(mv.to, enemy);
    EVASION_KING_SCORE + if safe { EVASION_SAFE_KING_BONUS } else { 0 }
}

/// Most-valuable-victim / least-valuable-attacker capture score.
pub(crate) fn mvv_lva(state: &GameState, mv: &Move) -> i32 {
    let victim = if mv.en_passant {
        PieceType::Pawn.value()
    } else {
        state.board.piece_at(mv.to).map_or(0, |p| p.kind.value())
    };
    let attacker = state.board.piece_at(mv.from).map_or(0, |p| p.kind.value());
    victim * 10 - attacker / 10
}

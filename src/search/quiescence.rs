//! Quiescence: a capture-and-check continuation at the horizon.
//!
//! Stand-pat with the static eval, then only forcing moves: captures
//! (and, in max-thinking mode, near-horizon checks). Captures whose
//! SEE-lite net is non-positive are pruned unless they give check or the
//! side is escaping check. Hard difficulty caps the depth at 1
//! (micro-quiescence); max runs until the pruning dries the tree up.

use crate::board::{GameState, Move};

use super::alphabeta::SearchContext;
use super::constants::{DRAW_SCORE, MATE_SCORE, QSEARCH_CHECKS_DEPTH};
use super::ordering::mvv_lva;
use super::see::see_lite;

impl SearchContext<'_> {
    pub(crate) fn quiesce(
        &mut self,
        state: &GameState,
        mut alpha: i32,
        beta: i32,
        qdepth: i32,
        ply: i32,
    ) -> i32 {
        if !self.visit_node() {
            return 0;
        }
        if self.stats.seldepth < ply as u32 {
            self.stats.seldepth = ply as u32;
        }

        let side = state.side_to_move();
        let in_check = state.in_check(side);
        let stand_pat = self.evaluate(state);

        if qdepth >= self.params.qsearch_depth {
            return stand_pat;
        }

        let mut moves: Vec<Move>;
        if in_check {
            // Escaping check: every legal move is forcing.
            moves = state.all_legal_moves(side);
            if moves.is_empty() {
                return -(MATE_SCORE - ply);
            }
        } else {
            if stand_pat >= beta {
                return beta;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            moves = state.tactical_moves(side);
            if self.params.max_thinking && qdepth < QSEARCH_CHECKS_DEPTH {
                self.append_checking_quiets(state, &mut moves);
            }
            if moves.is_empty() {
                return stand_pat;
            }
        }

        // Captures of big victims first; the TT move, when present, ahead
        // of everything.
        let tt_move = if self.params.use_tt {
            self.tables.tt.probe(state.key()).and_then(|e| e.best_move())
        } else {
            None
        };
        let mut scored: Vec<(i32, Move)> = moves
            .iter()
            .map(|m| {
                let score = if tt_move.as_ref().is_some_and(|t| t.same_action(m)) {
                    i32::MAX
                } else {
                    mvv_lva(state, m)
                };
                (score, *m)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut best = if in_check { -(MATE_SCORE - ply) } else { stand_pat };
        for (_, mv) in scored {
            let is_capture = state.is_capture(&mv);

            let mut child = state.clone();
            child.apply_legal(mv);
            let gives_check = child.in_check(child.side_to_move());

            // Prune losing and even exchanges unless the move is forcing.
            if !in_check && is_capture && !gives_check && see_lite(state, &mv) <= 0 {
                continue;
            }

            // Repetition inside the forcing line is just a draw.
            if child.repetition_count(child.key()) >= 2 {
                if DRAW_SCORE >= beta {
                    return DRAW_SCORE;
                }
                if DRAW_SCORE > best {
                    best = DRAW_SCORE;
                    if DRAW_SCORE > alpha {
                        alpha = DRAW_SCORE;
                    }
                }
                continue;
            }

            let score = -self.quiesce(&child, -beta, -alpha, qdepth + 1, ply + 1);
            if self.stopped {
                return 0;
            }

            if score >= beta {
                return score;
            }
            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
        }

        best
    }

    /// Quiet moves that give check, for the near-horizon plies of
    /// max-thinking quiescence.
    fn append_checking_quiets(&self, state: &GameState, moves: &mut Vec<Move>) {
        let side = state.side_to_move();
        for mv in state.all_legal_moves(side) {
            if state.is_capture(&mv) || mv.promotion.is_some() {
                continue; // already in the tactical set
            }
            let mut child = state.clone();
            child.apply_legal(mv);
            if child.in_check(child.side_to_move()) {
                moves.push(mv);
            }
        }
    }
}

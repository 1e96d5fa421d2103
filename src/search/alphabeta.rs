//! Negamax alpha-beta with PVS, null-move pruning, LMR, and extensions.

use crate::board::{Color, GameState, Move, PieceType};
use crate::eval::evaluate_state;

use super::constants::{
    DRAW_SCORE, LMR_MIN_DEPTH, LMR_QUIET_INDEX, MATE_SCORE, NULL_MOVE_DEEP_DEPTH,
    NULL_MOVE_MIN_DEPTH, NULL_MOVE_REDUCTION, STOP_CHECK_INTERVAL,
};
use super::ordering::{order_moves, OrderingContext};
use super::tt::{score_from_tt, score_to_tt, Bound};
use super::{SearchLimits, SearchParams, SearchStats, SearchTables};

/// State for one search call: parameters, tables, statistics, and the
/// cooperative stop flag. The position itself is threaded through the
/// recursion as clones.
pub(crate) struct SearchContext<'a> {
    pub(crate) params: &'a SearchParams,
    pub(crate) limits: &'a SearchLimits,
    pub(crate) tables: &'a mut SearchTables,
    pub(crate) stats: SearchStats,
    pub(crate) generation: u16,
    pub(crate) stopped: bool,
}

impl<'a> SearchContext<'a> {
    pub(crate) fn create(
        params: &'a SearchParams,
        limits: &'a SearchLimits,
        tables: &'a mut SearchTables,
        generation: u16,
    ) -> Self {
        SearchContext {
            params,
            limits,
            tables,
            stats: SearchStats::default(),
            generation,
            stopped: false,
        }
    }

    /// Count a node and sample the deadline/stop oracle at the modulo gate.
    #[inline]
    pub(crate) fn visit_node(&mut self) -> bool {
        self.stats.nodes += 1;
        if self.stats.nodes % STOP_CHECK_INTERVAL == 0 && self.limits.should_stop() {
            self.stopped = true;
        }
        !self.stopped
    }

    #[inline]
    pub(crate) fn evaluate(&self, state: &GameState) -> i32 {
        evaluate_state(state, state.side_to_move(), &self.params.eval)
    }

    /// Negamax with alpha-beta. Scores are from the side to move's
    /// perspective; mates score `MATE_SCORE - ply`.
    pub(crate) fn negamax(
        &mut self,
        state: &GameState,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        allow_null: bool,
    ) -> i32 {
        if !self.visit_node() {
            return 0;
        }
        if self.stats.seldepth < ply as u32 {
            self.stats.seldepth = ply as u32;
        }

        // In-tree draws: a repeated position, a dead clock, or bare kings.
        if ply > 0 {
            if state.repetition_count(state.key()) >= 2
                || state.halfmove_clock() >= 100
                || state.insufficient_material()
            {
                return DRAW_SCORE;
            }
        }

        // Transposition table probe.
        let mut tt_move = None;
        if self.params.use_tt {
            if let Some(entry) = self.tables.tt.probe(state.key()) {
                tt_move = entry.best_move();
                if entry.depth() >= depth && ply > 0 {
                    let score = score_from_tt(entry.score(), ply);
                    let cutoff = match entry.bound() {
                        Bound::Exact => true,
                        Bound::Lower => score >= beta,
                        Bound::Upper => score <= alpha,
                    };
                    if cutoff {
                        self.stats.tt_hits += 1;
                        return score;
                    }
                }
            }
        }

        if depth <= 0 {
            return self.quiesce(state, alpha, beta, 0, ply);
        }

        let side = state.side_to_move();
        let in_check = state.in_check(side);

        let mut moves = state.all_legal_moves(side);
        if moves.is_empty() {
            return if in_check {
                -(MATE_SCORE - ply)
            } else {
                DRAW_SCORE
            };
        }

        // Null-move pruning: give the opponent a free move and see if the
        // position still fails high. Unsound in check, in king-and-pawn
        // endgames (zugzwang), and at very shallow depth.
        if allow_null
            && !in_check
            && depth >= NULL_MOVE_MIN_DEPTH
            && has_non_pawn_material(state, side)
        {
            let reduction = if depth >= NULL_MOVE_DEEP_DEPTH {
                NULL_MOVE_REDUCTION + 1
            } else {
                NULL_MOVE_REDUCTION
            };
            let mut child = state.clone();
            child.apply_null();
            let score = -self.negamax(
                &child,
                depth - 1 - reduction,
                -beta,
                -beta + 1,
                ply + 1,
                false,
            );
            if self.stopped {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        order_moves(
            state,
            &mut moves,
            &OrderingContext {
                tables: self.tables,
                tt_move,
                preferred: None,
                ply: ply as usize,
                in_check,
                max_thinking: self.params.max_thinking,
            },
        );

        let mut best_score = -super::SCORE_INFINITE;
        let mut best_move = None;
        let mut raised_alpha = false;
        let mut quiets_tried = 0usize;

        for (idx, mv) in moves.iter().enumerate() {
            let is_capture = state.is_capture(mv);
            let is_quiet = !is_capture && mv.promotion.is_none();

            let mut child = state.clone();
            let applied = child.apply_legal(*mv);
            let gives_check = child.in_check(child.side_to_move());

            // Forcing-move extensions: checks and true recaptures, at most
            // one ply per node.
            let recapture = applied.captured.is_some()
                && state
                    .last_move()
                    .is_some_and(|last| last.captured.is_some() && last.to == mv.to);
            let extension = i32::from(gives_check || recapture);

            // Late-move reductions for quiet moves ordered far down the
            // list, never in or into check.
            let mut reduction = 0;
            if is_quiet
                && !in_check
                && !gives_check
                && depth >= LMR_MIN_DEPTH
                && quiets_tried >= LMR_QUIET_INDEX
            {
                reduction = 1;
                if depth >= NULL_MOVE_DEEP_DEPTH && quiets_tried >= 2 * LMR_QUIET_INDEX {
                    reduction = 2;
                }
            }

            let new_depth = depth - 1 + extension;
            let mut score;
            if idx == 0 {
                score = -self.negamax(&child, new_depth, -beta, -alpha, ply + 1, true);
            } else {
                // PVS: scout with a null window, re-search on fail-high.
                score = -self.negamax(
                    &child,
                    new_depth - reduction,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    true,
                );
                if score > alpha && reduction > 0 {
                    score = -self.negamax(&child, new_depth, -alpha - 1, -alpha, ply + 1, true);
                }
                if score > alpha && score < beta {
                    score = -self.negamax(&child, new_depth, -beta, -alpha, ply + 1, true);
                }
            }

            if self.stopped {
                return 0;
            }
            if is_quiet {
                quiets_tried += 1;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(*mv);
                if score > alpha {
                    if score >= beta {
                        if is_quiet {
                            self.tables.record_killer(ply as usize, *mv);
                            self.tables.update_history(mv, depth);
                            if let Some(last) = state.last_move() {
                                self.tables.set_counter(&last, *mv);
                            }
                        }
                        self.store_tt(state, depth, score, Bound::Lower, best_move, ply);
                        return score;
                    }
                    alpha = score;
                    raised_alpha = true;
                }
            }
        }

        let bound = if raised_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.store_tt(state, depth, best_score, bound, best_move, ply);
        best_score
    }

    pub(crate) fn store_tt(
        &mut self,
        state: &GameState,
        depth: i32,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
        ply: i32,
    ) {
        if !self.params.use_tt || self.stopped {
            return;
        }
        self.tables.tt.store(
            state.key(),
            depth,
            score_to_tt(score, ply),
            bound,
            best_move,
            self.generation,
        );
    }
}

/// The side has something other than kings and pawns to move.
pub(crate) fn has_non_pawn_material(state: &GameState, side: Color) -> bool {
    state
        .board
        .pieces_of(side)
        .any(|(_, p)| !matches!(p.kind, PieceType::Pawn | PieceType::King))
}

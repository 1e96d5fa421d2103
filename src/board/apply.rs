//! Move application with full bookkeeping.
//!
//! `apply_move` is the only mutation point for a `GameState`. Effect order:
//! capture removal (en passant takes the pawn behind the destination), the
//! piece move itself, the castling rook hop, promotion, has-moved flags,
//! castling-rights recomputation, halfmove clock, en-passant target,
//! fullmove number, side flip, repetition recording, last-move tracking.
//! The position key is maintained incrementally alongside.

use super::error::RulesError;
use super::state::GameState;
use super::types::{Color, Move, PieceType, Square};
use super::zobrist::{castling_key, en_passant_key, piece_key, ZOBRIST};

impl GameState {
    /// Validate and apply a move, returning the applied move with its
    /// captured-piece id recorded.
    ///
    /// The move is matched against the legal set by (from, to, promotion),
    /// so hosts may pass a bare from/to pair; the generator's special-move
    /// markers are used for the actual application.
    ///
    /// # Errors
    ///
    /// Fails fatally on illegal input: no piece at the source, a piece of
    /// the side not on move, or a move outside the legal set.
    pub fn apply_move(&mut self, mv: Move) -> Result<Move, RulesError> {
        let piece = self
            .board
            .piece_at(mv.from)
            .ok_or(RulesError::NoPieceAtSource { square: mv.from })?;
        if piece.color != self.side_to_move {
            return Err(RulesError::NotSideToMove {
                square: mv.from,
                side: self.side_to_move,
            });
        }
        let canonical = self
            .legal_moves_from(mv.from)
            .into_iter()
            .find(|m| m.same_action(&mv))
            .ok_or_else(|| RulesError::IllegalMove {
                notation: mv.to_string(),
            })?;
        Ok(self.apply_legal(canonical))
    }

    /// Apply a move known to come from the legal-move generator. Skips
    /// validation; the search uses this on its speculative clones.
    pub(crate) fn apply_legal(&mut self, mut mv: Move) -> Move {
        let mover_color = self.side_to_move;
        let mover_id = self
            .board
            .id_at(mv.from)
            .expect("apply_legal: generated move has a piece at its source");
        let mover_kind = self
            .board
            .piece(mover_id)
            .map(|p| p.kind)
            .expect("apply_legal: mover present in the piece table");

        // 1. Capture removal. En passant takes the pawn behind the
        //    destination square, not the destination itself.
        let capture_square = if mv.en_passant {
            Square::new(mv.from.rank(), mv.to.file())
        } else {
            mv.to
        };
        let captured = self.board.piece_at(capture_square).filter(|p| p.color != mover_color);
        if let Some(victim) = captured {
            self.board.remove_at(capture_square);
            self.key ^= piece_key(victim.kind, victim.color, capture_square);
            if let Some(acc) = self.nnue.as_mut() {
                acc.remove_piece(victim.kind, victim.color, capture_square);
            }
            mv.captured = Some(victim.id);
        }

        // 2. The move itself.
        self.board.relocate(mv.from, mv.to);
        self.key ^= piece_key(mover_kind, mover_color, mv.from)
            ^ piece_key(mover_kind, mover_color, mv.to);
        if let Some(acc) = self.nnue.as_mut() {
            acc.remove_piece(mover_kind, mover_color, mv.from);
            acc.add_piece(mover_kind, mover_color, mv.to);
        }

        // 3. Castling rook hop: h-file rook to f, or a-file rook to d, on
        //    the mover's back rank.
        if mv.castle {
            let back = mover_color.back_rank();
            let (rook_from, rook_to) = if mv.to.file() == 6 {
                (Square::new(back, 7), Square::new(back, 5))
            } else {
                (Square::new(back, 0), Square::new(back, 3))
            };
            self.board.relocate(rook_from, rook_to);
            self.key ^= piece_key(PieceType::Rook, mover_color, rook_from)
                ^ piece_key(PieceType::Rook, mover_color, rook_to);
            if let Some(acc) = self.nnue.as_mut() {
                acc.remove_piece(PieceType::Rook, mover_color, rook_from);
                acc.add_piece(PieceType::Rook, mover_color, rook_to);
            }
            if let Some(rook_id) = self.board.id_at(rook_to) {
                if let Some(rook) = self.board.piece_mut(rook_id) {
                    rook.has_moved = true;
                }
            }
        }

        // 4. Promotion replaces the piece kind; identity is preserved.
        if let Some(promo) = mv.promotion {
            self.key ^= piece_key(mover_kind, mover_color, mv.to)
                ^ piece_key(promo, mover_color, mv.to);
            if let Some(acc) = self.nnue.as_mut() {
                acc.remove_piece(mover_kind, mover_color, mv.to);
                acc.add_piece(promo, mover_color, mv.to);
            }
            if let Some(p) = self.board.piece_mut(mover_id) {
                p.kind = promo;
            }
        }

        // 5. Mover has moved.
        if let Some(p) = self.board.piece_mut(mover_id) {
            p.has_moved = true;
        }

        // 6. Castling rights from the mover identity, mover origin, and any
        //    captured rook origin.
        let old_rights = self.castling;
        if mover_kind == PieceType::King {
            self.castling.revoke_both(mover_color);
        }
        if mover_kind == PieceType::Rook {
            let back = mover_color.back_rank();
            if mv.from == Square::new(back, 0) {
                self.castling.revoke(mover_color, false);
            } else if mv.from == Square::new(back, 7) {
                self.castling.revoke(mover_color, true);
            }
        }
        if captured.is_some() {
            let enemy = mover_color.opponent();
            let enemy_back = enemy.back_rank();
            if capture_square == Square::new(enemy_back, 0) {
                self.castling.revoke(enemy, false);
            } else if capture_square == Square::new(enemy_back, 7) {
                self.castling.revoke(enemy, true);
            }
        }
        self.key ^= rights_key_delta(old_rights.0 ^ self.castling.0);

        // 7. Halfmove clock: reset on pawn moves and captures.
        if mover_kind == PieceType::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        // 8. En-passant target exists only after a two-square pawn advance.
        if let Some(old_ep) = self.en_passant.take() {
            self.key ^= en_passant_key(old_ep);
        }
        let rank_delta = (mv.to.rank() as i32 - mv.from.rank() as i32).abs();
        if mover_kind == PieceType::Pawn && rank_delta == 2 {
            let ep = Square::new((mv.from.rank() + mv.to.rank()) / 2, mv.from.file());
            self.en_passant = Some(ep);
            self.key ^= en_passant_key(ep);
        }

        // 9. Fullmove number bumps when black completes a move.
        if mover_color == Color::Black {
            self.fullmove_number += 1;
        }

        // 10. Side to move flips.
        self.side_to_move = self.side_to_move.opponent();
        self.key ^= ZOBRIST.black_to_move_key;

        // 11. Record the new position.
        self.repetitions.increment(self.key);

        // 12. Last-move tracking for recapture and backtrack detection.
        self.last_move = Some(mv);
        self.last_move_by[mover_color.index()] = Some(mv);

        debug_assert_eq!(self.key, self.recompute_key());
        #[cfg(debug_assertions)]
        self.board.validate();

        mv
    }

    /// Flip the side to move without making a move. Used by null-move
    /// pruning on a scratch clone; not part of the public rules API.
    pub(crate) fn apply_null(&mut self) {
        if let Some(ep) = self.en_passant.take() {
            self.key ^= en_passant_key(ep);
        }
        self.side_to_move = self.side_to_move.opponent();
        self.key ^= ZOBRIST.black_to_move_key;
        self.last_move = None;
    }
}

fn rights_key_delta(changed_bits: u8) -> u64 {
    let mut delta = 0u64;
    for (color, kingside, bit) in [
        (Color::White, true, super::types::castle_bit(Color::White, true)),
        (Color::White, false, super::types::castle_bit(Color::White, false)),
        (Color::Black, true, super::types::castle_bit(Color::Black, true)),
        (Color::Black, false, super::types::castle_bit(Color::Black, false)),
    ] {
        if changed_bits & bit != 0 {
            delta ^= castling_key(color, kingside);
        }
    }
    delta
}

//! Move generation: pseudo-legal generation per piece type, the legality
//! filter, and the square-attack oracle.

use super::state::{Board, GameState};
use super::types::{Color, Move, PieceType, Square, PROMOTION_PIECES};

const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const STRAIGHT_DIRS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

impl Board {
    /// True if any piece of `attacker` attacks `target`: pawn diagonals,
    /// knight jumps, sliding rays stopping at the first blocker, and
    /// king adjacency.
    pub(crate) fn attacks(&self, target: Square, attacker: Color) -> bool {
        // Pawns: a pawn one rank behind the target (from the attacker's
        // point of view) on an adjacent file attacks it.
        for df in [-1, 1] {
            if let Some(sq) = target.offset(-attacker.forward(), df) {
                if let Some(p) = self.piece_at(sq) {
                    if p.color == attacker && p.kind == PieceType::Pawn {
                        return true;
                    }
                }
            }
        }

        for (dr, df) in KNIGHT_OFFSETS {
            if let Some(sq) = target.offset(dr, df) {
                if let Some(p) = self.piece_at(sq) {
                    if p.color == attacker && p.kind == PieceType::Knight {
                        return true;
                    }
                }
            }
        }

        for (dr, df) in KING_OFFSETS {
            if let Some(sq) = target.offset(dr, df) {
                if let Some(p) = self.piece_at(sq) {
                    if p.color == attacker && p.kind == PieceType::King {
                        return true;
                    }
                }
            }
        }

        self.ray_attacked(target, attacker, &STRAIGHT_DIRS, PieceType::Rook)
            || self.ray_attacked(target, attacker, &DIAGONAL_DIRS, PieceType::Bishop)
    }

    fn ray_attacked(
        &self,
        target: Square,
        attacker: Color,
        dirs: &[(i32, i32); 4],
        slider: PieceType,
    ) -> bool {
        for &(dr, df) in dirs {
            let mut sq = target.offset(dr, df);
            while let Some(s) = sq {
                if let Some(p) = self.piece_at(s) {
                    if p.color == attacker && (p.kind == slider || p.kind == PieceType::Queen) {
                        return true;
                    }
                    break;
                }
                sq = s.offset(dr, df);
            }
        }
        false
    }
}

impl GameState {
    /// True if `by` attacks `target` in the current position.
    #[must_use]
    pub fn is_square_attacked(&self, target: Square, by: Color) -> bool {
        self.board.attacks(target, by)
    }

    /// All legal moves for one side.
    #[must_use]
    pub fn all_legal_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for (sq, _) in self.board.pieces_of(color) {
            self.pseudo_moves_from(sq, &mut moves);
        }
        moves.retain(|m| self.king_safe_after(*m));
        moves
    }

    /// Legal moves for the piece on one square.
    #[must_use]
    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        let mut moves = Vec::new();
        self.pseudo_moves_from(square, &mut moves);
        moves.retain(|m| self.king_safe_after(*m));
        moves
    }

    /// Legal captures, promotions, and en-passant takes for one side.
    #[must_use]
    pub(crate) fn tactical_moves(&self, color: Color) -> Vec<Move> {
        let mut moves = self.all_legal_moves(color);
        moves.retain(|m| self.is_capture(m) || m.promotion.is_some());
        moves
    }

    /// True if a generated move captures something (including en passant).
    #[inline]
    #[must_use]
    pub(crate) fn is_capture(&self, mv: &Move) -> bool {
        mv.en_passant || self.board.piece_at(mv.to).is_some()
    }

    /// True if the move belongs to the current legal set. Matching is by
    /// action (from, to, promotion), so transposition-table seeds and
    /// host-supplied moves compare correctly.
    #[must_use]
    pub fn is_legal_move(&self, mv: &Move) -> bool {
        match self.board.piece_at(mv.from) {
            Some(p) if p.color == self.side_to_move => self
                .legal_moves_from(mv.from)
                .iter()
                .any(|m| m.same_action(mv)),
            _ => false,
        }
    }

    /// Pseudo-legal moves for the piece on `from`, appended to `out`.
    pub(crate) fn pseudo_moves_from(&self, from: Square, out: &mut Vec<Move>) {
        let Some(piece) = self.board.piece_at(from) else {
            return;
        };
        match piece.kind {
            PieceType::Pawn => self.pawn_moves(from, piece.color, out),
            PieceType::Knight => self.leaper_moves(from, piece.color, &KNIGHT_OFFSETS, out),
            PieceType::Bishop => self.slider_moves(from, piece.color, &DIAGONAL_DIRS, out),
            PieceType::Rook => self.slider_moves(from, piece.color, &STRAIGHT_DIRS, out),
            PieceType::Queen => {
                self.slider_moves(from, piece.color, &STRAIGHT_DIRS, out);
                self.slider_moves(from, piece.color, &DIAGONAL_DIRS, out);
            }
            PieceType::King => self.king_moves(from, piece.color, out),
        }
    }

    fn pawn_moves(&self, from: Square, color: Color, out: &mut Vec<Move>) {
        let dir = color.forward();
        let start_rank = match color {
            Color::White => 1,
            Color::Black => 6,
        };
        let promo_rank = match color {
            Color::White => 7,
            Color::Black => 0,
        };

        // Pushes
        if let Some(step) = from.offset(dir, 0) {
            if self.board.piece_at(step).is_none() {
                push_pawn_move(from, step, promo_rank, out);
                if from.rank() == start_rank {
                    if let Some(double) = step.offset(dir, 0) {
                        if self.board.piece_at(double).is_none() {
                            out.push(Move::new(from, double));
                        }
                    }
                }
            }
        }

        // Captures and en passant
        for df in [-1, 1] {
            let Some(to) = from.offset(dir, df) else {
                continue;
            };
            let takes_piece = self
                .board
                .piece_at(to)
                .is_some_and(|p| p.color != color);
            if takes_piece {
                push_pawn_move(from, to, promo_rank, out);
            } else if self.en_passant == Some(to) {
                out.push(Move::en_passant(from, to));
            }
        }
    }

    fn leaper_moves(
        &self,
        from: Square,
        color: Color,
        offsets: &[(i32, i32); 8],
        out: &mut Vec<Move>,
    ) {
        for &(dr, df) in offsets {
            let Some(to) = from.offset(dr, df) else {
                continue;
            };
            if self.board.piece_at(to).map_or(true, |p| p.color != color) {
                out.push(Move::new(from, to));
            }
        }
    }

    fn slider_moves(
        &self,
        from: Square,
        color: Color,
        dirs: &[(i32, i32); 4],
        out: &mut Vec<Move>,
    ) {
        for &(dr, df) in dirs {
            let mut sq = from.offset(dr, df);
            while let Some(to) = sq {
                match self.board.piece_at(to) {
                    Some(p) => {
                        if p.color != color {
                            out.push(Move::new(from, to));
                        }
                        break;
                    }
                    None => out.push(Move::new(from, to)),
                }
                sq = to.offset(dr, df);
            }
        }
    }

    fn king_moves(&self, from: Square, color: Color, out: &mut Vec<Move>) {
        self.leaper_moves(from, color, &KING_OFFSETS, out);

        // Castling. The king must stand on its original square with the
        // right intact, the rook unmoved, the path empty, and none of the
        // current, transit, or destination squares attacked.
        let back = color.back_rank();
        if from != Square::new(back, 4) {
            return;
        }
        let enemy = color.opponent();
        if self.is_square_attacked(from, enemy) {
            return;
        }

        if self.castling.kingside(color) && self.castle_path_ok(color, true) {
            let transit = Square::new(back, 5);
            let dest = Square::new(back, 6);
            if !self.is_square_attacked(transit, enemy) && !self.is_square_attacked(dest, enemy) {
                out.push(Move::castling(from, dest));
            }
        }
        if self.castling.queenside(color) && self.castle_path_ok(color, false) {
            let transit = Square::new(back, 3);
            let dest = Square::new(back, 2);
            if !self.is_square_attacked(transit, enemy) && !self.is_square_attacked(dest, enemy) {
                out.push(Move::castling(from, dest));
            }
        }
    }

    fn castle_path_ok(&self, color: Color, kingside: bool) -> bool {
        let back = color.back_rank();
        let rook_file = if kingside { 7 } else { 0 };
        let between: &[usize] = if kingside { &[5, 6] } else { &[1, 2, 3] };

        let rook_ok = self
            .board
            .piece_at(Square::new(back, rook_file))
            .is_some_and(|p| p.kind == PieceType::Rook && p.color == color && !p.has_moved);
        if !rook_ok {
            return false;
        }
        let king_unmoved = self
            .board
            .piece_at(Square::new(back, 4))
            .is_some_and(|p| p.kind == PieceType::King && !p.has_moved);
        if !king_unmoved {
            return false;
        }
        between
            .iter()
            .all(|&file| self.board.piece_at(Square::new(back, file)).is_none())
    }

    /// True if the mover's king is not attacked after the move. Simulates
    /// the move on a scratch board; the full bookkeeping of `apply_move`
    /// is not needed for an attack test.
    pub(crate) fn king_safe_after(&self, mv: Move) -> bool {
        let Some(piece) = self.board.piece_at(mv.from) else {
            return false;
        };
        let mut board = self.board.clone();
        if mv.en_passant {
            board.remove_at(Square::new(mv.from.rank(), mv.to.file()));
        } else {
            board.remove_at(mv.to);
        }
        board.relocate(mv.from, mv.to);
        if mv.castle {
            let back = piece.color.back_rank();
            if mv.to.file() == 6 {
                board.relocate(Square::new(back, 7), Square::new(back, 5));
            } else {
                board.relocate(Square::new(back, 0), Square::new(back, 3));
            }
        }
        match board.king_square(piece.color) {
            Some(king) => !board.attacks(king, piece.color.opponent()),
            None => true,
        }
    }
}

fn push_pawn_move(from: Square, to: Square, promo_rank: usize, out: &mut Vec<Move>) {
    if to.rank() == promo_rank {
        for kind in PROMOTION_PIECES {
            out.push(Move::promotion(from, to, kind));
        }
    } else {
        out.push(Move::new(from, to));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_position_has_twenty_moves() {
        let state = GameState::new();
        assert_eq!(state.all_legal_moves(Color::White).len(), 20);
        assert_eq!(state.all_legal_moves(Color::Black).len(), 20);
    }

    #[test]
    fn test_legal_moves_are_subset_of_pseudo_moves() {
        let state = GameState::new();
        for sq in Square::all() {
            let mut pseudo = Vec::new();
            state.pseudo_moves_from(sq, &mut pseudo);
            for legal in state.legal_moves_from(sq) {
                assert!(pseudo.iter().any(|m| m.same_action(&legal)));
            }
        }
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // White king e1, white rook e2, black rook e8: the rook is pinned
        // to the e-file and may only slide along it.
        let mut state = GameState::empty();
        state.place(Square::new(0, 4), Color::White, PieceType::King);
        state.place(Square::new(1, 4), Color::White, PieceType::Rook);
        state.place(Square::new(7, 4), Color::Black, PieceType::Rook);
        state.place(Square::new(7, 7), Color::Black, PieceType::King);

        let rook_moves = state.legal_moves_from(Square::new(1, 4));
        assert!(!rook_moves.is_empty());
        assert!(rook_moves.iter().all(|m| m.to.file() == 4));
    }

    #[test]
    fn test_attack_oracle_pawn_direction() {
        let mut state = GameState::empty();
        state.place(Square::new(3, 3), Color::White, PieceType::Pawn);
        // White pawn on d4 attacks c5 and e5, not c3/e3.
        assert!(state.is_square_attacked(Square::new(4, 2), Color::White));
        assert!(state.is_square_attacked(Square::new(4, 4), Color::White));
        assert!(!state.is_square_attacked(Square::new(2, 2), Color::White));
    }

    #[test]
    fn test_slider_stops_at_blocker() {
        let mut state = GameState::empty();
        state.place(Square::new(0, 0), Color::White, PieceType::Rook);
        state.place(Square::new(0, 3), Color::White, PieceType::Knight);
        assert!(state.is_square_attacked(Square::new(0, 2), Color::White));
        // Blocked past the knight on d1
        assert!(!state.is_square_attacked(Square::new(0, 5), Color::White));
    }

    #[test]
    fn test_castling_requires_empty_path_and_rights() {
        let state = GameState::new();
        // Bishops and knights still at home: no castling yet.
        let king_moves = state.legal_moves_from(Square::new(0, 4));
        assert!(king_moves.iter().all(|m| !m.castle));
    }

    #[test]
    fn test_castling_through_attacked_square_is_illegal() {
        // Clear kingside path, but a black rook eyes f1: castling must be
        // absent while Kf1 remains illegal too.
        let mut state = GameState::empty();
        state.place(Square::new(0, 4), Color::White, PieceType::King);
        state.place(Square::new(0, 7), Color::White, PieceType::Rook);
        state.place(Square::new(7, 5), Color::Black, PieceType::Rook);
        state.place(Square::new(7, 0), Color::Black, PieceType::King);
        state.castling.grant(Color::White, true);
        state.refresh_bookkeeping();

        let king_moves = state.legal_moves_from(Square::new(0, 4));
        assert!(king_moves.iter().all(|m| !m.castle));
    }

    #[test]
    fn test_castling_allowed_with_clear_safe_path() {
        let mut state = GameState::empty();
        state.place(Square::new(0, 4), Color::White, PieceType::King);
        state.place(Square::new(0, 7), Color::White, PieceType::Rook);
        state.place(Square::new(7, 0), Color::Black, PieceType::King);
        state.castling.grant(Color::White, true);
        state.refresh_bookkeeping();

        let king_moves = state.legal_moves_from(Square::new(0, 4));
        let castle = king_moves.iter().find(|m| m.castle);
        assert!(castle.is_some());
        assert_eq!(castle.unwrap().to, Square::new(0, 6));
    }
}

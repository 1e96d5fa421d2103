//! Game state: board occupancy, piece table, and game bookkeeping.

use std::collections::HashMap;

use super::types::{CastlingRights, Color, Move, Piece, PieceId, PieceType, Square};
use super::zobrist::{castling_key, en_passant_key, piece_key, ZOBRIST};
use crate::eval::nnue::NnueAccumulator;

/// Occurrence counts per position key. Counts only ever grow; play is
/// forward-only and speculative lines work on clones.
#[derive(Clone, Debug, Default)]
pub(crate) struct RepetitionTable {
    counts: HashMap<u64, u32>,
}

impl RepetitionTable {
    pub(crate) fn new() -> Self {
        RepetitionTable {
            counts: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, key: u64) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    pub(crate) fn increment(&mut self, key: u64) -> u32 {
        let entry = self.counts.entry(key).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }
}

/// The 8x8 occupancy grid plus the identity table behind it.
///
/// Invariant: every id stored in a grid cell is present in the table, and
/// every piece present in the table occupies exactly one cell. Captured
/// pieces leave the table.
#[derive(Clone, Debug)]
pub struct Board {
    squares: [Option<PieceId>; 64],
    table: Vec<Option<Piece>>,
}

impl Board {
    pub(crate) fn empty() -> Self {
        Board {
            squares: [None; 64],
            table: Vec::with_capacity(32),
        }
    }

    /// Piece occupying a square, if any.
    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()].and_then(|id| self.table[id.index()])
    }

    #[inline]
    pub(crate) fn id_at(&self, sq: Square) -> Option<PieceId> {
        self.squares[sq.index()]
    }

    #[inline]
    pub(crate) fn piece(&self, id: PieceId) -> Option<Piece> {
        self.table.get(id.index()).copied().flatten()
    }

    #[inline]
    pub(crate) fn piece_mut(&mut self, id: PieceId) -> Option<&mut Piece> {
        self.table.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Create a new piece and place it on an empty square.
    pub(crate) fn spawn(&mut self, sq: Square, color: Color, kind: PieceType) -> PieceId {
        debug_assert!(self.squares[sq.index()].is_none(), "square {sq} occupied");
        let id = PieceId(self.table.len() as u8);
        self.table.push(Some(Piece::new(id, kind, color)));
        self.squares[sq.index()] = Some(id);
        id
    }

    /// Remove the piece on a square from the grid and the table.
    pub(crate) fn remove_at(&mut self, sq: Square) -> Option<Piece> {
        let id = self.squares[sq.index()].take()?;
        self.table[id.index()].take()
    }

    /// Relocate the piece on `from` to the empty square `to`.
    pub(crate) fn relocate(&mut self, from: Square, to: Square) {
        debug_assert!(self.squares[to.index()].is_none(), "destination {to} occupied");
        self.squares[to.index()] = self.squares[from.index()].take();
    }

    /// Locate the king of a color.
    #[must_use]
    pub(crate) fn king_square(&self, color: Color) -> Option<Square> {
        self.occupied().find_map(|(sq, p)| {
            (p.kind == PieceType::King && p.color == color).then_some(sq)
        })
    }

    /// Iterate over occupied squares with their pieces.
    pub(crate) fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    /// Iterate over one side's pieces.
    pub(crate) fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, p)| p.color == color)
    }

    pub(crate) fn count_of(&self, color: Color, kind: PieceType) -> u32 {
        self.pieces_of(color)
            .filter(|(_, p)| p.kind == kind)
            .count() as u32
    }

    #[cfg(debug_assertions)]
    pub(crate) fn validate(&self) {
        let mut seen = vec![false; self.table.len()];
        for sq in Square::all() {
            if let Some(id) = self.squares[sq.index()] {
                assert!(
                    self.table[id.index()].is_some(),
                    "grid id {id:?} missing from table"
                );
                assert!(!seen[id.index()], "id {id:?} on two squares");
                seen[id.index()] = true;
            }
        }
        for (idx, slot) in self.table.iter().enumerate() {
            if slot.is_some() {
                assert!(seen[idx], "table piece {idx} not on the grid");
            }
        }
    }
}

/// How a finished game ended in a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    ThreefoldRepetition,
    InsufficientMaterial,
    FiftyMoveRule,
}

/// Terminal and in-progress game states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate { winner: Color },
    Stalemate,
    Draw { reason: DrawReason },
}

/// Full game state. Mutated only by `apply_move`; the search clones it for
/// speculative lines.
#[derive(Clone, Debug)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) last_move: Option<Move>,
    pub(crate) last_move_by: [Option<Move>; 2],
    pub(crate) key: u64,
    pub(crate) repetitions: RepetitionTable,
    pub(crate) nnue: Option<NnueAccumulator>,
}

impl GameState {
    /// Standard starting position.
    #[must_use]
    pub fn new() -> Self {
        let mut state = GameState::empty();
        let back_rank = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for (file, kind) in back_rank.iter().enumerate() {
            state.board.spawn(Square::new(0, file), Color::White, *kind);
            state.board.spawn(Square::new(1, file), Color::White, PieceType::Pawn);
            state.board.spawn(Square::new(7, file), Color::Black, *kind);
            state.board.spawn(Square::new(6, file), Color::Black, PieceType::Pawn);
        }
        state.castling = CastlingRights::all();
        state.key = state.recompute_key();
        state.repetitions.increment(state.key);
        state
    }

    /// Empty board, white to move, no castling rights. Pieces are added
    /// with `place`; used by the FEN parser and position-building tests.
    #[must_use]
    pub fn empty() -> Self {
        GameState {
            board: Board::empty(),
            side_to_move: Color::White,
            castling: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            last_move: None,
            last_move_by: [None, None],
            key: 0,
            repetitions: RepetitionTable::new(),
            nnue: None,
        }
    }

    /// Place a piece while building a position. Refreshes the key and seeds
    /// the repetition count for the resulting position.
    pub fn place(&mut self, sq: Square, color: Color, kind: PieceType) -> PieceId {
        let id = self.board.spawn(sq, color, kind);
        self.refresh_bookkeeping();
        id
    }

    /// Set the side to move while building a position.
    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
        self.refresh_bookkeeping();
    }

    pub(crate) fn refresh_bookkeeping(&mut self) {
        self.key = self.recompute_key();
        self.repetitions = RepetitionTable::new();
        self.repetitions.increment(self.key);
        if let Some(acc) = self.nnue.as_mut() {
            let weights = acc.weights();
            *acc = NnueAccumulator::build(&weights, &self.board);
        }
    }

    #[inline]
    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    #[must_use]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The most recent applied move, with its captured-piece id filled in.
    #[inline]
    #[must_use]
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// The most recent move made by a specific color.
    #[inline]
    #[must_use]
    pub fn last_move_by(&self, color: Color) -> Option<Move> {
        self.last_move_by[color.index()]
    }

    /// The position key: a stable hash over occupancy, side to move,
    /// castling rights, and en-passant target.
    #[inline]
    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Piece occupying a square, if any.
    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.piece_at(sq)
    }

    /// Occurrences of a position key over the game so far.
    #[must_use]
    pub fn repetition_count(&self, key: u64) -> u32 {
        self.repetitions.get(key)
    }

    /// Recompute the position key from scratch. `apply_move` maintains the
    /// key incrementally; the two must agree (checked by property tests).
    #[must_use]
    pub fn recompute_key(&self) -> u64 {
        let mut key = 0u64;
        for (sq, piece) in self.board.occupied() {
            key ^= piece_key(piece.kind, piece.color, sq);
        }
        if self.side_to_move == Color::Black {
            key ^= ZOBRIST.black_to_move_key;
        }
        for color in [Color::White, Color::Black] {
            if self.castling.kingside(color) {
                key ^= castling_key(color, true);
            }
            if self.castling.queenside(color) {
                key ^= castling_key(color, false);
            }
        }
        if let Some(ep) = self.en_passant {
            key ^= en_passant_key(ep);
        }
        key
    }

    /// Attach an NNUE accumulator built from the current position. The
    /// accumulator is then maintained incrementally by `apply_move`.
    pub fn enable_nnue(&mut self, weights: std::sync::Arc<crate::eval::nnue::NnueWeights>) {
        self.nnue = Some(NnueAccumulator::build(&weights, &self.board));
    }

    #[inline]
    #[must_use]
    pub(crate) fn nnue_accumulator(&self) -> Option<&NnueAccumulator> {
        self.nnue.as_ref()
    }

    /// Current game status. Test order: threefold repetition, insufficient
    /// material, no legal moves (checkmate/stalemate), fifty-move rule,
    /// check, ongoing.
    #[must_use]
    pub fn game_status(&self) -> GameStatus {
        if self.repetitions.get(self.key) >= 3 {
            return GameStatus::Draw {
                reason: DrawReason::ThreefoldRepetition,
            };
        }
        if self.insufficient_material() {
            return GameStatus::Draw {
                reason: DrawReason::InsufficientMaterial,
            };
        }
        let in_check = self.in_check(self.side_to_move);
        if self.all_legal_moves(self.side_to_move).is_empty() {
            return if in_check {
                GameStatus::Checkmate {
                    winner: self.side_to_move.opponent(),
                }
            } else {
                GameStatus::Stalemate
            };
        }
        if self.halfmove_clock >= 100 {
            return GameStatus::Draw {
                reason: DrawReason::FiftyMoveRule,
            };
        }
        if in_check {
            return GameStatus::Check;
        }
        GameStatus::Ongoing
    }

    /// Neither side can force mate: K vs K, K+minor vs K, or K+B vs K+B
    /// (any bishop square colors). Any pawn, rook, queen, or second minor
    /// is sufficient. K+N+N vs K is deliberately treated as sufficient.
    #[must_use]
    pub fn insufficient_material(&self) -> bool {
        let mut minors = [Vec::new(), Vec::new()];
        for (_, piece) in self.board.occupied() {
            match piece.kind {
                PieceType::Pawn | PieceType::Rook | PieceType::Queen => return false,
                PieceType::Knight | PieceType::Bishop => {
                    minors[piece.color.index()].push(piece.kind);
                }
                PieceType::King => {}
            }
        }
        let white = &minors[Color::White.index()];
        let black = &minors[Color::Black.index()];
        match (white.len(), black.len()) {
            (0, 0) => true,
            (1, 0) | (0, 1) => true,
            (1, 1) => white[0] == PieceType::Bishop && black[0] == PieceType::Bishop,
            _ => false,
        }
    }

    /// True if `color`'s king is attacked.
    #[must_use]
    pub fn in_check(&self, color: Color) -> bool {
        match self.board.king_square(color) {
            Some(king) => self.is_square_attacked(king, color.opponent()),
            None => false,
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

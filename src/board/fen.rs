//! FEN parsing and formatting (6-field interchange format).

use std::str::FromStr;

use super::error::FenError;
use super::state::GameState;
use super::types::{Color, PieceType, Square};

impl GameState {
    /// Parse a 6-field FEN string. The halfmove clock and fullmove number
    /// default to 0 and 1 when omitted.
    ///
    /// # Errors
    ///
    /// Returns a `FenError` describing the first malformed field.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut state = GameState::empty();

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::WrongRankCount { found: ranks.len() });
        }
        // FEN lists ranks from 8 down to 1.
        for (row, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - row;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                let kind = PieceType::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                if file >= 8 {
                    return Err(FenError::TooManyFiles { rank, files: file + 1 });
                }
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                let sq = Square::new(rank, file);
                state.board.spawn(sq, color, kind);
                if !on_start_square(kind, color, sq) {
                    if let Some(id) = state.board.id_at(sq) {
                        if let Some(p) = state.board.piece_mut(id) {
                            p.has_moved = true;
                        }
                    }
                }
                file += 1;
            }
            if file > 8 {
                return Err(FenError::TooManyFiles { rank, files: file });
            }
        }

        state.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => state.castling.grant(Color::White, true),
                    'Q' => state.castling.grant(Color::White, false),
                    'k' => state.castling.grant(Color::Black, true),
                    'q' => state.castling.grant(Color::Black, false),
                    _ => return Err(FenError::InvalidCastling { char: c }),
                }
            }
        }

        if parts[3] != "-" {
            let ep = Square::from_str(parts[3]).map_err(|_| FenError::InvalidEnPassant {
                found: parts[3].to_string(),
            })?;
            state.en_passant = Some(ep);
        }

        if let Some(half) = parts.get(4) {
            state.halfmove_clock = half.parse().map_err(|_| FenError::InvalidCounter {
                found: (*half).to_string(),
            })?;
        }
        if let Some(full) = parts.get(5) {
            state.fullmove_number = full.parse().map_err(|_| FenError::InvalidCounter {
                found: (*full).to_string(),
            })?;
        }

        state.key = state.recompute_key();
        state.repetitions.increment(state.key);
        Ok(state)
    }

    /// Format the position as a 6-field FEN string.
    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut fen = String::with_capacity(80);
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board.piece_at(Square::new(rank, file)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).unwrap_or('0'));
                            empty = 0;
                        }
                        fen.push(piece.kind.to_fen_char(piece.color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).unwrap_or('0'));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move == Color::White { 'w' } else { 'b' });
        fen.push(' ');
        fen.push_str(&self.castling.to_string());
        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

impl FromStr for GameState {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameState::from_fen(s)
    }
}

fn on_start_square(kind: PieceType, color: Color, sq: Square) -> bool {
    let back = color.back_rank();
    match kind {
        PieceType::Pawn => {
            sq.rank()
                == match color {
                    Color::White => 1,
                    Color::Black => 6,
                }
        }
        PieceType::Rook => sq.rank() == back && (sq.file() == 0 || sq.file() == 7),
        PieceType::Knight => sq.rank() == back && (sq.file() == 1 || sq.file() == 6),
        PieceType::Bishop => sq.rank() == back && (sq.file() == 2 || sq.file() == 5),
        PieceType::Queen => sq.rank() == back && sq.file() == 3,
        PieceType::King => sq.rank() == back && sq.file() == 4,
    }
}

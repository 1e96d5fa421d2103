//! Zobrist hashing for positions.
//!
//! The position key covers the occupancy snapshot (piece kind, color,
//! square), the side to move, the castling rights, and the en-passant file.
//! It is maintained incrementally by `apply_move` and recomputable from
//! scratch; the two must always agree. Threefold repetition and the
//! transposition table are both indexed by this key.

use once_cell::sync::Lazy;
use rand::prelude::*;

use super::types::{Color, PieceType, Square};

pub(crate) struct ZobristKeys {
    // piece_keys[piece_type][color][square_index]
    pub(crate) piece_keys: [[[u64; 64]; 2]; 6],
    pub(crate) black_to_move_key: u64,
    // castling_keys[color][side] : 0=White, 1=Black; 0=Kingside, 1=Queenside
    pub(crate) castling_keys: [[u64; 2]; 2],
    // en_passant_keys[file_index] (only the file matters for the EP target)
    pub(crate) en_passant_keys: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed so keys are stable across processes and sessions.
        let mut rng = StdRng::seed_from_u64(0x5EED_CA15_7113_u64);
        let mut piece_keys = [[[0; 64]; 2]; 6];
        let mut castling_keys = [[0; 2]; 2];
        let mut en_passant_keys = [0; 8];

        for piece in &mut piece_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let black_to_move_key = rng.gen();

        for color in &mut castling_keys {
            for key in color.iter_mut() {
                *key = rng.gen();
            }
        }

        for key in &mut en_passant_keys {
            *key = rng.gen();
        }

        ZobristKeys {
            piece_keys,
            black_to_move_key,
            castling_keys,
            en_passant_keys,
        }
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[inline]
pub(crate) fn piece_key(kind: PieceType, color: Color, square: Square) -> u64 {
    ZOBRIST.piece_keys[kind.index()][color.index()][square.index()]
}

#[inline]
pub(crate) fn castling_key(color: Color, kingside: bool) -> u64 {
    ZOBRIST.castling_keys[color.index()][usize::from(!kingside)]
}

#[inline]
pub(crate) fn en_passant_key(square: Square) -> u64 {
    ZOBRIST.en_passant_keys[square.file()]
}

//! Static evaluation.
//!
//! Produces a centipawn score from a chosen perspective (positive = good
//! for that side). Terms: material, piece-square tables (max-thinking
//! mode), king-ring safety while the opponent keeps a queen, rook
//! activity on pawn-free files, an early-queen-sortie penalty, and an
//! optional NNUE mix.

pub mod nnue;
mod pst;

pub use nnue::{evaluate_nnue, NnueError, NnueWeights};

use crate::board::{Color, GameState, PieceType, Square};

/// Ring-square penalty per attacked square around the king.
const KING_RING_PENALTY: i32 = 12;

/// Rook on a file with no friendly pawns.
const ROOK_SEMI_OPEN_BONUS: i32 = 12;

/// Extra when the file has no pawns of either color.
const ROOK_OPEN_BONUS: i32 = 8;

/// Extra when the pawn-free file points at the enemy king.
const ROOK_KING_FILE_BONUS: i32 = 14;

/// Queen out early while the minor pieces still sit at home.
const EARLY_QUEEN_PENALTY: i32 = 25;
const EARLY_QUEEN_PENALTY_MAX: i32 = 40;

/// Fullmove horizon for the early-queen term.
const EARLY_QUEEN_FULLMOVE_LIMIT: u32 = 10;

/// Evaluator configuration.
#[derive(Clone, Copy, Debug)]
pub struct EvalOptions {
    /// Enables the piece-square tables and the stronger early-queen
    /// penalty used at the highest difficulty.
    pub max_thinking: bool,
    /// Weight of the NNUE term in [0, 1]; 0 disables the mix.
    pub nnue_mix: f32,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            max_thinking: false,
            nnue_mix: 0.0,
        }
    }
}

/// Evaluate a position from `perspective`'s point of view.
#[must_use]
pub fn evaluate_state(state: &GameState, perspective: Color, opts: &EvalOptions) -> i32 {
    let mut white_relative = material(state)
        + king_safety(state)
        + rook_activity(state)
        + early_queen(state, opts.max_thinking);
    if opts.max_thinking {
        white_relative += piece_square(state);
    }

    if opts.nnue_mix > 0.0 {
        if let Some(nnue_score) = evaluate_nnue(state) {
            let w = f64::from(opts.nnue_mix.clamp(0.0, 1.0));
            let mixed =
                (1.0 - w) * f64::from(white_relative) + w * f64::from(nnue_score);
            white_relative = mixed.round() as i32;
        }
    }

    match perspective {
        Color::White => white_relative,
        Color::Black => -white_relative,
    }
}

fn material(state: &GameState) -> i32 {
    let mut score = 0;
    for (_, piece) in state.board.occupied() {
        let v = piece.kind.value();
        score += if piece.color == Color::White { v } else { -v };
    }
    score
}

fn piece_square(state: &GameState) -> i32 {
    let mut score = 0;
    for (sq, piece) in state.board.occupied() {
        let idx = match piece.color {
            Color::White => sq.index(),
            Color::Black => sq.flip_vertical().index(),
        };
        let bonus = match piece.kind {
            PieceType::Pawn => pst::PAWN_PST[idx],
            PieceType::Knight => pst::KNIGHT_PST[idx],
            PieceType::Bishop => pst::BISHOP_PST[idx],
            _ => 0,
        };
        score += if piece.color == Color::White { bonus } else { -bonus };
    }
    score
}

/// Penalize attacked squares in the 3x3 ring around each king, but only
/// while the opponent still has a queen to exploit the exposure.
fn king_safety(state: &GameState) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let enemy = color.opponent();
        if state.board.count_of(enemy, PieceType::Queen) == 0 {
            continue;
        }
        let Some(king) = state.board.king_square(color) else {
            continue;
        };
        let mut pressure = 0;
        for dr in -1..=1 {
            for df in -1..=1 {
                if dr == 0 && df == 0 {
                    continue;
                }
                if let Some(sq) = king.offset(dr, df) {
                    if state.is_square_attacked(sq, enemy) {
                        pressure += KING_RING_PENALTY;
                    }
                }
            }
        }
        score += if color == Color::White { -pressure } else { pressure };
    }
    score
}

fn rook_activity(state: &GameState) -> i32 {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let enemy = color.opponent();
        let enemy_king = state.board.king_square(enemy);
        let mut bonus = 0;
        for (sq, piece) in state.board.pieces_of(color) {
            if piece.kind != PieceType::Rook {
                continue;
            }
            let friendly_pawns = pawns_on_file(state, color, sq.file());
            if friendly_pawns > 0 {
                continue;
            }
            bonus += ROOK_SEMI_OPEN_BONUS;
            if pawns_on_file(state, enemy, sq.file()) == 0 {
                bonus += ROOK_OPEN_BONUS;
            }
            if let Some(king) = enemy_king {
                if sq.file_distance(king) <= 1 {
                    bonus += ROOK_KING_FILE_BONUS;
                }
            }
        }
        score += if color == Color::White { bonus } else { -bonus };
    }
    score
}

fn pawns_on_file(state: &GameState, color: Color, file: usize) -> u32 {
    (0..8)
        .filter(|&rank| {
            state
                .board
                .piece_at(Square::new(rank, file))
                .is_some_and(|p| p.kind == PieceType::Pawn && p.color == color)
        })
        .count() as u32
}

/// A queen that has left home while two or more of its minor pieces still
/// sit on the back rank, early in the game. Applied to both sides.
fn early_queen(state: &GameState, max_thinking: bool) -> i32 {
    if state.fullmove_number() > EARLY_QUEEN_FULLMOVE_LIMIT {
        return 0;
    }
    let penalty = if max_thinking {
        EARLY_QUEEN_PENALTY_MAX
    } else {
        EARLY_QUEEN_PENALTY
    };
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let queen_out = state
            .board
            .pieces_of(color)
            .any(|(_, p)| p.kind == PieceType::Queen && p.has_moved);
        if !queen_out {
            continue;
        }
        let back = color.back_rank();
        let minors_home = (0..8)
            .filter(|&file| {
                state
                    .board
                    .piece_at(Square::new(back, file))
                    .is_some_and(|p| p.color == color && p.kind.is_minor())
            })
            .count();
        if minors_home >= 2 {
            score += if color == Color::White { -penalty } else { penalty };
        }
    }
    score
}

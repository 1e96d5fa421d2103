//! Rules engine: board representation and legal chess.
//!
//! The board is an 8x8 grid of piece identities backed by a piece table, so
//! promotions keep a stable id and the host can track individual pieces
//! across the game. Speculative lines clone the state; `apply_move` is the
//! only mutation point.
//!
//! # Example
//! ```
//! use chess_ai::board::GameState;
//!
//! let state = GameState::new();
//! let moves = state.all_legal_moves(state.side_to_move());
//! assert_eq!(moves.len(), 20);
//! ```

mod apply;
mod error;
mod fen;
mod movegen;
mod state;
mod types;
mod zobrist;

#[cfg(test)]
mod proptests;

pub use error::{FenError, RulesError, SquareError};
pub use state::{Board, DrawReason, GameState, GameStatus};
pub use types::{CastlingRights, Color, Move, Piece, PieceId, PieceType, Square};

pub(crate) use types::MAX_PLY;

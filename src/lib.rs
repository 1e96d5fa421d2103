//! Chess AI core: rules engine, alpha-beta search, evaluation, and the
//! root policy layer that shapes self-play quality.
//!
//! The crate is consumed by the presentation layers of a two-player chess
//! application through a small façade:
//!
//! ```
//! use chess_ai::board::GameState;
//! use chess_ai::select::{choose_move, ChooseOptions, Difficulty};
//!
//! let state = GameState::new();
//! let opts = ChooseOptions::for_difficulty(Difficulty::Easy);
//! let mv = choose_move(&state, &opts);
//! assert!(mv.is_some());
//! ```

pub mod board;
pub mod engine;
pub mod eval;
pub mod explain;
pub mod policy;
pub mod search;
pub mod select;

//! Property-based tests over random legal play.

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng as _;

use super::state::GameState;

fn random_walk(seed: u64, len: usize) -> GameState {
    let mut state = GameState::new();
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..len {
        let moves = state.all_legal_moves(state.side_to_move());
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        state
            .apply_move(mv)
            .expect("generated moves are accepted by apply_move");
    }
    state
}

proptest! {
    /// The incrementally maintained key always equals a from-scratch
    /// recomputation.
    #[test]
    fn prop_incremental_key_matches_recompute(seed in any::<u64>(), len in 1..40usize) {
        let state = random_walk(seed, len);
        prop_assert_eq!(state.key(), state.recompute_key());
    }

    /// FEN round-trips preserve the position key and the rights.
    #[test]
    fn prop_fen_roundtrip_preserves_key(seed in any::<u64>(), len in 1..40usize) {
        let state = random_walk(seed, len);
        let restored = GameState::from_fen(&state.to_fen()).expect("emitted FEN parses");
        prop_assert_eq!(state.key(), restored.key());
        prop_assert_eq!(state.castling_rights(), restored.castling_rights());
        prop_assert_eq!(state.en_passant_target(), restored.en_passant_target());
    }

    /// No legal move ever leaves the mover's king attacked, and applying
    /// one always flips the side to move.
    #[test]
    fn prop_legal_moves_are_safe(seed in any::<u64>()) {
        let state = random_walk(seed, 12);
        let mover = state.side_to_move();
        for mv in state.all_legal_moves(mover) {
            let mut child = state.clone();
            child.apply_move(mv).expect("legal move applies");
            prop_assert_eq!(child.side_to_move(), mover.opponent());
            prop_assert!(!child.in_check(mover));
        }
    }
}

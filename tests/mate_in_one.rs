//! Data-driven mate-in-one suite: the problem set exercises both the
//! rules engine (applying the labeled move must give checkmate) and the
//! search (the engine must find a mating move on its own).

use serde::Deserialize;

use chess_ai::board::{GameState, GameStatus, Move, PieceType, Square};
use chess_ai::select::{choose_move, ChooseOptions, Difficulty};

#[derive(Deserialize)]
struct ProblemSet {
    problems: Vec<Problem>,
}

#[derive(Deserialize)]
struct Problem {
    #[serde(rename = "type")]
    kind: String,
    fen: String,
    moves: String,
}

fn uci_from_problem_moves(moves: &str) -> Move {
    let uci = moves.replace('-', "");
    let from: Square = uci[0..2].parse().expect("valid source square");
    let to: Square = uci[2..4].parse().expect("valid target square");
    let mut mv = Move::new(from, to);
    mv.promotion = uci.chars().nth(4).and_then(PieceType::from_char);
    mv
}

#[test]
fn mate_in_one_suite() {
    let data = include_str!("data/problems.json");
    let set: ProblemSet = serde_json::from_str(data).expect("invalid problems.json");

    for problem in set.problems.iter().filter(|p| p.kind == "Mate in One") {
        let mut state: GameState = problem.fen.parse().expect("valid fen");
        state
            .apply_move(uci_from_problem_moves(&problem.moves))
            .expect("labeled move is legal");

        assert!(
            matches!(state.game_status(), GameStatus::Checkmate { .. }),
            "mate in one failed for fen: {} move: {}",
            problem.fen,
            problem.moves
        );
    }
}

#[test]
fn mate_search_suite() {
    let data = include_str!("data/problems.json");
    let set: ProblemSet = serde_json::from_str(data).expect("invalid problems.json");

    for problem in set.problems.iter().filter(|p| p.kind == "Mate in One") {
        let state: GameState = problem.fen.parse().expect("valid fen");
        let best = choose_move(&state, &ChooseOptions::for_difficulty(Difficulty::Hard))
            .unwrap_or_else(|| panic!("no move for fen: {}", problem.fen));

        let mut after = state.clone();
        after.apply_move(best).expect("chosen move is legal");
        assert!(
            matches!(after.game_status(), GameStatus::Checkmate { .. }),
            "search missed the mate for fen: {} (played {})",
            problem.fen,
            best
        );
    }
}

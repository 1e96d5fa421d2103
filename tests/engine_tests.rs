//! Worker and routing integration tests: the staleness contract for
//! move, hint, and explain requests.

use std::sync::mpsc;
use std::time::Duration;

use chess_ai::board::{GameState, Move};
use chess_ai::engine::{
    EngineRequest, EngineWorker, RequestKind, RequestPayload, ResponsePayload, ResponseRouter,
};
use chess_ai::explain::ExplainOptions;
use chess_ai::select::{ChooseOptions, Difficulty};

fn mv(from: &str, to: &str) -> Move {
    Move::new(from.parse().unwrap(), to.parse().unwrap())
}

#[test]
fn move_request_round_trips_id_and_key() {
    let (tx, rx) = mpsc::channel();
    let worker = EngineWorker::spawn(RequestKind::Move, tx);
    let state = GameState::new();
    let key = state.key();

    assert!(worker.submit(EngineRequest {
        id: 7,
        position_key: key,
        payload: RequestPayload::ChooseMove {
            state,
            options: ChooseOptions::for_difficulty(Difficulty::Easy),
        },
    }));

    let response = rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert_eq!(response.id, 7);
    assert_eq!(response.position_key, key);
    assert!(matches!(response.payload, ResponsePayload::Move(Some(_))));
}

#[test]
fn superseded_request_is_discarded_by_the_router() {
    let (tx, rx) = mpsc::channel();
    let worker = EngineWorker::spawn(RequestKind::Move, tx);
    let state = GameState::new();
    let key = state.key();
    let router = ResponseRouter::new(key);

    // Two requests in flight; only the second is current.
    for id in [1u64, 2] {
        router.register(RequestKind::Move, id);
        assert!(worker.submit(EngineRequest {
            id,
            position_key: key,
            payload: RequestPayload::ChooseMove {
                state: state.clone(),
                options: ChooseOptions::for_difficulty(Difficulty::Easy),
            },
        }));
    }

    let first = rx.recv_timeout(Duration::from_secs(30)).unwrap();
    let second = rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert!(!router.accept(&first), "stale id discarded");
    assert!(router.accept(&second));
}

#[test]
fn position_change_invalidates_in_flight_responses() {
    let (tx, rx) = mpsc::channel();
    let worker = EngineWorker::spawn(RequestKind::Hint, tx);
    let state = GameState::new();
    let key = state.key();
    let router = ResponseRouter::new(key);

    router.register(RequestKind::Hint, 1);
    assert!(worker.submit(EngineRequest {
        id: 1,
        position_key: key,
        payload: RequestPayload::Hint {
            state: state.clone(),
            options: ChooseOptions::for_difficulty(Difficulty::Easy),
        },
    }));

    // The host applies a move while the hint computes.
    let mut moved = state.clone();
    moved.apply_move(mv("e2", "e4")).unwrap();
    router.set_position(moved.key());

    let response = rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert_eq!(response.position_key, key, "core carries the key through");
    assert!(!router.accept(&response), "stale key discarded");
}

#[test]
fn explain_requests_are_served_by_their_own_worker() {
    let (tx, rx) = mpsc::channel();
    let worker = EngineWorker::spawn(RequestKind::Explain, tx);
    let state = GameState::new();
    let key = state.key();
    let router = ResponseRouter::new(key);

    router.register(RequestKind::Explain, 3);
    assert!(worker.submit(EngineRequest {
        id: 3,
        position_key: key,
        payload: RequestPayload::Explain {
            state,
            mv: mv("e2", "e4"),
            options: ExplainOptions::default(),
        },
    }));

    let response = rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert!(router.accept(&response));
    match response.payload {
        ResponsePayload::Explanation(explanation) => {
            assert_eq!(explanation.move_label, "e2e4");
            assert!(!explanation.bullets.is_empty());
        }
        other => panic!("expected explanation, got {other:?}"),
    }
}

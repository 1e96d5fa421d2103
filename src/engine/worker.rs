//! Request workers and response routing.
//!
//! The host runs one worker per request kind (move, hint, explain); each
//! worker owns its search state and drains its own queue, so nothing is
//! shared between concurrent requests. Requests and responses carry a
//! request id and a position-key tag; the core copies both through
//! unchanged and the router discards any response whose id is no longer
//! the latest or whose key no longer matches the current position.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::board::{GameState, Move};
use crate::explain::{explain_move, ExplainOptions, Explanation};
use crate::select::{choose_move, ChooseOptions};

/// The three request kinds the façade serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Move,
    Hint,
    Explain,
}

impl RequestKind {
    const fn index(self) -> usize {
        match self {
            RequestKind::Move => 0,
            RequestKind::Hint => 1,
            RequestKind::Explain => 2,
        }
    }
}

/// Work item for a request worker.
pub enum RequestPayload {
    ChooseMove {
        state: GameState,
        options: ChooseOptions,
    },
    Hint {
        state: GameState,
        options: ChooseOptions,
    },
    Explain {
        state: GameState,
        mv: Move,
        options: ExplainOptions,
    },
}

pub struct EngineRequest {
    pub id: u64,
    pub position_key: u64,
    pub payload: RequestPayload,
}

/// Result of a request, tagged with the id and key it was computed for.
#[derive(Clone, Debug)]
pub enum ResponsePayload {
    Move(Option<Move>),
    Hint(Option<Move>),
    Explanation(Explanation),
}

#[derive(Clone, Debug)]
pub struct EngineResponse {
    pub id: u64,
    pub position_key: u64,
    pub payload: ResponsePayload,
}

impl EngineResponse {
    #[must_use]
    pub fn kind(&self) -> RequestKind {
        match self.payload {
            ResponsePayload::Move(_) => RequestKind::Move,
            ResponsePayload::Hint(_) => RequestKind::Hint,
            ResponsePayload::Explanation(_) => RequestKind::Explain,
        }
    }
}

/// A single request worker: one OS thread draining one queue.
pub struct EngineWorker {
    sender: Option<Sender<EngineRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl EngineWorker {
    /// Spawn a worker that posts its responses to `responses`.
    #[must_use]
    pub fn spawn(kind: RequestKind, responses: Sender<EngineResponse>) -> Self {
        let (sender, receiver) = mpsc::channel::<EngineRequest>();
        let handle = thread::Builder::new()
            .name(format!("engine-{kind:?}").to_lowercase())
            .spawn(move || worker_loop(&receiver, &responses))
            .ok();
        EngineWorker {
            sender: Some(sender),
            handle,
        }
    }

    /// Enqueue a request. Returns false when the worker has shut down.
    pub fn submit(&self, request: EngineRequest) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|s| s.send(request).is_ok())
    }
}

impl Drop for EngineWorker {
    fn drop(&mut self) {
        // Closing the queue lets the loop drain and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop(receiver: &Receiver<EngineRequest>, responses: &Sender<EngineResponse>) {
    while let Ok(request) = receiver.recv() {
        let payload = match request.payload {
            RequestPayload::ChooseMove { state, options } => {
                ResponsePayload::Move(choose_move(&state, &options))
            }
            RequestPayload::Hint { state, options } => {
                ResponsePayload::Hint(choose_move(&state, &options))
            }
            RequestPayload::Explain { state, mv, options } => {
                ResponsePayload::Explanation(explain_move(&state, &mv, &options))
            }
        };
        let response = EngineResponse {
            id: request.id,
            position_key: request.position_key,
            payload,
        };
        if responses.send(response).is_err() {
            break;
        }
    }
}

/// Host-side staleness filter. Tracks the latest request id per kind and
/// the key of the position currently on the board; everything else is
/// discarded.
pub struct ResponseRouter {
    latest_ids: Mutex<[Option<u64>; 3]>,
    current_key: Mutex<u64>,
}

impl ResponseRouter {
    #[must_use]
    pub fn new(position_key: u64) -> Self {
        ResponseRouter {
            latest_ids: Mutex::new([None; 3]),
            current_key: Mutex::new(position_key),
        }
    }

    /// Record the newest outstanding request of a kind.
    pub fn register(&self, kind: RequestKind, id: u64) {
        self.latest_ids.lock()[kind.index()] = Some(id);
    }

    /// The board changed; responses computed for older keys are stale.
    pub fn set_position(&self, key: u64) {
        *self.current_key.lock() = key;
    }

    /// Accept a response only if it is the latest of its kind and was
    /// computed for the position currently on the board.
    #[must_use]
    pub fn accept(&self, response: &EngineResponse) -> bool {
        let ids = self.latest_ids.lock();
        ids[response.kind().index()] == Some(response.id)
            && *self.current_key.lock() == response.position_key
    }
}

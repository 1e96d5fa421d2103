//! Engine host plumbing: request workers and staleness-aware routing.

mod worker;

pub use worker::{
    EngineRequest, EngineResponse, EngineWorker, RequestKind, RequestPayload, ResponsePayload,
    ResponseRouter,
};

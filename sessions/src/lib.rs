//! Session orchestration: the state machines that tie the rules engine, the
//! analysis channel and the platform backend together.
//!
//! Each session is a plain struct owned by the hosting application and driven
//! from a single task: UI input, clock ticks and engine results are all
//! funneled through `&mut self` methods, so there is no shared mutable state
//! and no locking. The discipline everywhere is last-request-wins: engine
//! results stamped with a superseded query are dropped, and moves arriving
//! for a terminated game are no-ops.

pub mod clock;
pub mod live_game;
pub mod puzzle;
pub mod review;

pub use clock::{time_control_label, ClockManager};
pub use live_game::{GamePhase, LiveGameSession, MoveOutcome, Reaction, TurnOutcome};
pub use puzzle::{PuzzleEvent, PuzzleFeedback, PuzzleMode, PuzzleSession};
pub use review::{EvalBar, GameReviewSession};

/// Errors surfaced by session operations. None of these are fatal to the
/// session; an illegal move or a backend failure leaves the state as it was.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Move rejected: {0}")]
    Rejected(#[from] chess::GameError),

    #[error("Unparseable move: {0}")]
    Unparseable(#[from] chess::UciParseError),

    #[error("Session is not accepting input in its current state")]
    NotReady,

    #[error(transparent)]
    Api(#[from] api_client::ApiError),

    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}

//! Asynchronous UCI analysis channel.
//!
//! Adapts a long-lived, line-oriented search process (Stockfish or any UCI
//! engine) into typed requests and a stream of [`EngineResult`] events. The
//! wire protocol carries no request correlation, so every inbound result is
//! stamped with the query sequence number that was current when the line
//! arrived; consumers compare the stamp against the query they issued and
//! silently drop anything stale.

pub mod channel;
pub mod parser;

pub use channel::{AnalysisChannel, EngineConfig, LineSink};

/// Monotonic identity of a best-move query. The engine itself knows nothing
/// about these; they exist purely at the channel boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryId(pub u64);

/// Engine evaluation, from the perspective of the side to move in the
/// queried position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Moves until mate; negative means the side to move gets mated.
    MateIn(i32),
}

/// A single result event. Score and best-move for the same query arrive as
/// separate, interleaved events and must both be tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResult {
    pub query: QueryId,
    pub kind: ResultKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultKind {
    /// First move of a principal-variation line, in UCI notation.
    BestMove(String),
    Score(Score),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Engine executable not found")]
    NotFound,
    #[error("Failed to spawn engine process: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Engine channel closed")]
    ChannelClosed,
}

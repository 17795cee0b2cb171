//! Tactical puzzle orchestration.
//!
//! A puzzle is solved by playing the engine's best move for a fixed number of
//! plies (or until checkmate). The session gates input on `active`: a human
//! move is only accepted once the engine's solution for the current ply is
//! known, so a move racing the engine is rejected rather than validated
//! against nothing. Wrong attempts are undone and the same puzzle stays
//! loaded; the position only ever advances along engine-validated moves.

use std::sync::Arc;

use api_client::{PlatformApi, PuzzleSource};
use chess::{
    attempt_move, classify_terminal, format_uci_move, parse_lenient, AppliedMove, Game,
    PlayerSide, TerminalState,
};
use cozy_chess::{Piece, Square};
use engine::{AnalysisChannel, EngineResult, QueryId, ResultKind};
use tracing::{debug, info, warn};

use crate::SessionError;

const PUZZLE_SEARCH_DEPTH: u8 = 15;

/// Puzzle category, passed through to the backend and deciding how many
/// correct plies count as solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleMode {
    Winning,
    Endgame,
    Opening,
}

impl PuzzleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Winning => "winning",
            Self::Endgame => "endgame",
            Self::Opening => "opening",
        }
    }

    /// Correct player plies required before the puzzle counts as solved.
    /// Endgame sequences run longer.
    pub fn ply_threshold(self) -> u32 {
        match self {
            Self::Endgame => 4,
            Self::Winning | Self::Opening => 2,
        }
    }
}

/// Feedback for a submitted puzzle move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleFeedback {
    /// Matched the solution; the opponent's reply is being fetched.
    Correct,
    /// Did not match; the move was undone, try again.
    Incorrect,
    /// Matched and the puzzle is complete.
    Solved,
}

/// What the session is waiting on from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Awaiting {
    Idle,
    Solution,
    OpponentReply,
}

/// Events surfaced to the presentation layer as engine results land.
#[derive(Debug, Clone)]
pub enum PuzzleEvent {
    /// The solution for the current ply is known; input is open.
    SolutionReady,
    /// The opponent's reply was applied to the board.
    OpponentReplied(AppliedMove),
}

/// One tactical puzzle at a time, driven by engine best moves.
pub struct PuzzleSession {
    api: Arc<dyn PlatformApi>,
    engine: AnalysisChannel,
    game: Option<Game>,
    source: Option<PuzzleSource>,
    mode: PuzzleMode,
    user_side: PlayerSide,
    solution: Option<String>,
    active: bool,
    ply_count: u32,
    awaiting: Awaiting,
    pending_query: Option<QueryId>,
}

impl PuzzleSession {
    pub fn new(api: Arc<dyn PlatformApi>, engine: AnalysisChannel) -> Self {
        Self {
            api,
            engine,
            game: None,
            source: None,
            mode: PuzzleMode::Winning,
            user_side: PlayerSide::White,
            solution: None,
            active: false,
            ply_count: 0,
            awaiting: Awaiting::Idle,
            pending_query: None,
        }
    }

    /// Whether input is currently accepted.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ply_count(&self) -> u32 {
        self.ply_count
    }

    /// The side the solver plays (the side to move in the loaded position).
    pub fn user_side(&self) -> PlayerSide {
        self.user_side
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn source(&self) -> Option<&PuzzleSource> {
        self.source.as_ref()
    }

    /// Fetch the next puzzle and query the engine for its solution. Input
    /// stays blocked until the solution arrives.
    pub async fn load_next(&mut self, mode: PuzzleMode) -> Result<(), SessionError> {
        let puzzle = self.api.next_puzzle(mode.as_str()).await?;
        let game = Game::from_fen(&puzzle.fen)?;

        self.mode = mode;
        self.user_side = game.side_to_move().into();
        self.ply_count = 0;
        self.active = false;
        self.solution = None;
        self.awaiting = Awaiting::Solution;
        self.pending_query = Some(
            self.engine
                .request_best_move(&puzzle.fen, PUZZLE_SEARCH_DEPTH)
                .await?,
        );
        info!(mode = mode.as_str(), fen = %puzzle.fen, "puzzle loaded");

        self.game = Some(game);
        self.source = Some(puzzle);
        Ok(())
    }

    /// Wait for the next engine result and fold it into the session.
    pub async fn await_engine(&mut self) -> Result<Option<PuzzleEvent>, SessionError> {
        match self.engine.next_result().await {
            Some(result) => self.handle_result(result).await,
            None => Err(SessionError::Engine(engine::EngineError::ChannelClosed)),
        }
    }

    /// Fold one engine result into the session. Results stamped with a
    /// superseded query, and score events, are dropped.
    pub async fn handle_result(
        &mut self,
        result: EngineResult,
    ) -> Result<Option<PuzzleEvent>, SessionError> {
        if Some(result.query) != self.pending_query {
            debug!(?result.query, "dropping stale engine result");
            return Ok(None);
        }
        let uci = match result.kind {
            ResultKind::BestMove(uci) => uci,
            ResultKind::Score(_) => return Ok(None),
        };

        match self.awaiting {
            Awaiting::Idle => Ok(None),
            Awaiting::Solution => {
                let game = self.game.as_ref().ok_or(SessionError::NotReady)?;
                // Normalize the engine's notation so it compares equal to
                // what attempt_move reports (castling in particular).
                let solution = match parse_lenient(game.position(), &uci) {
                    Ok(parsed) => format_uci_move(parsed.into_move()),
                    Err(e) => {
                        // e.g. "bestmove (none)"; an unmatchable solution must
                        // not open input, so keep it closed and ask again.
                        warn!(%uci, error = %e, "unusable solution move, re-querying");
                        let fen = game.to_fen();
                        self.pending_query = Some(
                            self.engine
                                .request_best_move(&fen, PUZZLE_SEARCH_DEPTH)
                                .await?,
                        );
                        return Ok(None);
                    }
                };
                debug!(%solution, "solution ready");
                self.solution = Some(solution);
                self.awaiting = Awaiting::Idle;
                self.pending_query = None;
                self.active = true;
                Ok(Some(PuzzleEvent::SolutionReady))
            }
            Awaiting::OpponentReply => {
                let game = self.game.as_mut().ok_or(SessionError::NotReady)?;
                let mv = parse_lenient(game.position(), &uci)?.into_move();
                let applied = attempt_move(game, mv.from, mv.to, mv.promotion)?;
                debug!(uci = %applied.uci, "opponent reply applied");

                // Next ply: solve the new position.
                self.awaiting = Awaiting::Solution;
                self.pending_query = Some(
                    self.engine
                        .request_best_move(&applied.fen, PUZZLE_SEARCH_DEPTH)
                        .await?,
                );
                Ok(Some(PuzzleEvent::OpponentReplied(applied)))
            }
        }
    }

    /// Try the solver's move against the known solution.
    pub async fn submit_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<PuzzleFeedback, SessionError> {
        if !self.active {
            return Err(SessionError::NotReady);
        }
        let solution = self.solution.clone().ok_or(SessionError::NotReady)?;
        let game = self.game.as_mut().ok_or(SessionError::NotReady)?;

        let applied = attempt_move(game, from, to, promotion)?;

        if applied.uci != solution {
            debug!(attempted = %applied.uci, expected = %solution, "wrong puzzle move");
            game.undo()?;
            return Ok(PuzzleFeedback::Incorrect);
        }

        self.ply_count += 1;
        let mated = matches!(classify_terminal(game), TerminalState::Checkmate { .. });
        if mated || self.ply_count >= self.mode.ply_threshold() {
            info!(plies = self.ply_count, "puzzle solved");
            self.active = false;
            self.solution = None;
            self.awaiting = Awaiting::Idle;
            self.pending_query = None;
            return Ok(PuzzleFeedback::Solved);
        }

        // Correct but not done: close input, fetch the opponent's reply.
        self.active = false;
        self.solution = None;
        self.awaiting = Awaiting::OpponentReply;
        self.pending_query = Some(
            self.engine
                .request_best_move(&applied.fen, PUZZLE_SEARCH_DEPTH)
                .await?,
        );
        Ok(PuzzleFeedback::Correct)
    }
}

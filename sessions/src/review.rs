//! Historical game replay and post-game review.
//!
//! Step-through navigation re-queries the engine at every displayed position
//! to drive a live evaluation bar; only results for the latest query are
//! applied. The aggregate review (per-move classification plus accuracy) is a
//! single backend call, the heavy analysis runs server-side.

use std::sync::Arc;

use api_client::{GameReview, HistoricalMove, PlatformApi};
use chess::PlayerSide;
use engine::{AnalysisChannel, EngineResult, QueryId, ResultKind, Score};
use tracing::{debug, info};

use crate::SessionError;

const REVIEW_SEARCH_DEPTH: u8 = 15;

/// Evaluation bar state for the displayed position, normalized to White's
/// perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalBar {
    pub score: Score,
    /// Bar fill for White, 0 to 100.
    pub percent: f64,
    /// Display label: signed pawns ("+0.50") or mate distance ("M3").
    pub label: String,
}

impl EvalBar {
    fn from_white_score(score: Score) -> Self {
        match score {
            Score::Centipawns(cp) => Self {
                score,
                percent: 50.0 + f64::from(cp.clamp(-800, 800)) / 16.0,
                label: format!("{:+.2}", f64::from(cp) / 100.0),
            },
            Score::MateIn(n) => Self {
                score,
                percent: if n > 0 { 100.0 } else { 0.0 },
                label: format!("M{}", n.abs()),
            },
        }
    }
}

/// Replays a stored game and aggregates its review.
pub struct GameReviewSession {
    api: Arc<dyn PlatformApi>,
    engine: AnalysisChannel,
    game_id: Option<String>,
    positions: Vec<HistoricalMove>,
    index: usize,
    pending_query: Option<QueryId>,
    eval: Option<EvalBar>,
    best_move: Option<String>,
    review: Option<GameReview>,
}

impl GameReviewSession {
    pub fn new(api: Arc<dyn PlatformApi>, engine: AnalysisChannel) -> Self {
        Self {
            api,
            engine,
            game_id: None,
            positions: Vec::new(),
            index: 0,
            pending_query: None,
            eval: None,
            best_move: None,
            review: None,
        }
    }

    pub fn positions(&self) -> &[HistoricalMove] {
        &self.positions
    }

    /// Index of the currently displayed ply.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_position(&self) -> Option<&HistoricalMove> {
        self.positions.get(self.index)
    }

    pub fn eval(&self) -> Option<&EvalBar> {
        self.eval.as_ref()
    }

    /// Engine's preferred move in the displayed position.
    pub fn best_move(&self) -> Option<&str> {
        self.best_move.as_deref()
    }

    pub fn review(&self) -> Option<&GameReview> {
        self.review.as_ref()
    }

    /// List stored games for selection, optionally filtered by a search term.
    pub async fn browse(
        &self,
        page: u32,
        search: Option<&str>,
    ) -> Result<api_client::GamePage, SessionError> {
        Ok(self.api.historical_games(page, search).await?)
    }

    /// Load a stored game's positions and evaluate the first one.
    pub async fn load_game(&mut self, game_id: &str) -> Result<(), SessionError> {
        let positions = self.api.game_moves(game_id).await?;
        info!(%game_id, plies = positions.len(), "historical game loaded");
        self.game_id = Some(game_id.to_string());
        self.positions = positions;
        self.review = None;
        self.index = 0;
        self.query_current().await
    }

    pub async fn first_move(&mut self) -> Result<(), SessionError> {
        self.jump_to_move(0).await
    }

    pub async fn prev_move(&mut self) -> Result<(), SessionError> {
        self.jump_to_move(self.index.saturating_sub(1)).await
    }

    pub async fn next_move(&mut self) -> Result<(), SessionError> {
        self.jump_to_move(self.index + 1).await
    }

    pub async fn last_move(&mut self) -> Result<(), SessionError> {
        self.jump_to_move(self.positions.len().saturating_sub(1)).await
    }

    /// Jump to a ply (clamped to the loaded range) and re-query the engine.
    pub async fn jump_to_move(&mut self, index: usize) -> Result<(), SessionError> {
        if self.positions.is_empty() {
            return Ok(());
        }
        self.index = index.min(self.positions.len() - 1);
        self.query_current().await
    }

    async fn query_current(&mut self) -> Result<(), SessionError> {
        let Some(position) = self.positions.get(self.index) else {
            return Ok(());
        };
        // Superseding the previous query invalidates the displayed eval.
        self.eval = None;
        self.best_move = None;
        self.pending_query = Some(
            self.engine
                .request_best_move(&position.fen, REVIEW_SEARCH_DEPTH)
                .await?,
        );
        Ok(())
    }

    /// Wait for the next engine result and fold it in. Returns true when the
    /// displayed evaluation or best move changed.
    pub async fn await_engine(&mut self) -> Result<bool, SessionError> {
        match self.engine.next_result().await {
            Some(result) => Ok(self.handle_result(result)),
            None => Err(SessionError::Engine(engine::EngineError::ChannelClosed)),
        }
    }

    /// Fold one engine result into the displayed evaluation. Stale results
    /// are dropped.
    pub fn handle_result(&mut self, result: EngineResult) -> bool {
        if Some(result.query) != self.pending_query {
            debug!(?result.query, "dropping stale evaluation");
            return false;
        }

        match result.kind {
            ResultKind::Score(score) => {
                self.eval = Some(EvalBar::from_white_score(self.normalize(score)));
                true
            }
            ResultKind::BestMove(uci) => {
                self.best_move = Some(uci);
                true
            }
        }
    }

    /// Request the server-side review for the loaded game.
    pub async fn analyze(&mut self) -> Result<&GameReview, SessionError> {
        let game_id = self.game_id.clone().ok_or(SessionError::NotReady)?;
        let review = self.api.review(&game_id).await?;
        info!(
            moves = review.moves.len(),
            white_accuracy = ?review.white_accuracy,
            black_accuracy = ?review.black_accuracy,
            "review received"
        );
        Ok(&*self.review.insert(review))
    }

    /// Engine scores are from the side to move; flip when Black is on move so
    /// the bar always reads from White's side.
    fn normalize(&self, score: Score) -> Score {
        let side = self
            .current_position()
            .map(|p| fen_side_to_move(&p.fen))
            .unwrap_or(PlayerSide::White);
        match (side, score) {
            (PlayerSide::White, s) => s,
            (PlayerSide::Black, Score::Centipawns(cp)) => Score::Centipawns(-cp),
            (PlayerSide::Black, Score::MateIn(n)) => Score::MateIn(-n),
        }
    }
}

fn fen_side_to_move(fen: &str) -> PlayerSide {
    match fen.split_whitespace().nth(1) {
        Some("b") => PlayerSide::Black,
        _ => PlayerSide::White,
    }
}

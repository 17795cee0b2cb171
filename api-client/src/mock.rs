//! Scripted in-memory backend for tests.
//!
//! Responses are queued per endpoint and consumed in order; every call is
//! recorded so tests can assert on what the session asked for.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::traits::PlatformApi;
use crate::types::{GamePage, GameRecord, GameReview, HistoricalMove, PuzzleSource};

/// A recorded call against the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    BotMove { fen: String },
    NextPuzzle { mode: String },
    HistoricalGames { page: u32, search: Option<String> },
    GameMoves { game_id: String },
    Review { game_id: String },
    SaveGame,
}

#[derive(Default)]
struct Inner {
    bot_moves: VecDeque<ApiResult<String>>,
    puzzles: VecDeque<ApiResult<PuzzleSource>>,
    pages: VecDeque<ApiResult<GamePage>>,
    moves: VecDeque<ApiResult<Vec<HistoricalMove>>>,
    reviews: VecDeque<ApiResult<GameReview>>,
    save_results: VecDeque<ApiResult<()>>,
    saved_games: Vec<GameRecord>,
    calls: Vec<ApiCall>,
}

/// Scripted [`PlatformApi`] implementation.
#[derive(Clone, Default)]
pub struct MockApi {
    inner: Arc<Mutex<Inner>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bot_move(&self, uci: &str) {
        self.lock().bot_moves.push_back(Ok(uci.to_string()));
    }

    pub fn push_bot_move_error(&self, err: ApiError) {
        self.lock().bot_moves.push_back(Err(err));
    }

    pub fn push_puzzle(&self, puzzle: PuzzleSource) {
        self.lock().puzzles.push_back(Ok(puzzle));
    }

    pub fn push_puzzle_error(&self, err: ApiError) {
        self.lock().puzzles.push_back(Err(err));
    }

    pub fn push_page(&self, page: GamePage) {
        self.lock().pages.push_back(Ok(page));
    }

    pub fn push_game_moves(&self, moves: Vec<HistoricalMove>) {
        self.lock().moves.push_back(Ok(moves));
    }

    pub fn push_review(&self, review: GameReview) {
        self.lock().reviews.push_back(Ok(review));
    }

    pub fn push_save_result(&self, result: ApiResult<()>) {
        self.lock().save_results.push_back(result);
    }

    /// Games handed to `save_game`, in call order.
    pub fn saved_games(&self) -> Vec<GameRecord> {
        self.lock().saved_games.clone()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn take<T>(queue: &mut VecDeque<ApiResult<T>>, what: &str) -> ApiResult<T> {
        queue
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::NotConfigured(what.to_string())))
    }
}

#[async_trait]
impl PlatformApi for MockApi {
    async fn bot_move(&self, fen: &str) -> ApiResult<String> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::BotMove {
            fen: fen.to_string(),
        });
        Self::take(&mut inner.bot_moves, "bot_move")
    }

    async fn next_puzzle(&self, mode: &str) -> ApiResult<PuzzleSource> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::NextPuzzle {
            mode: mode.to_string(),
        });
        Self::take(&mut inner.puzzles, "next_puzzle")
    }

    async fn historical_games(&self, page: u32, search: Option<&str>) -> ApiResult<GamePage> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::HistoricalGames {
            page,
            search: search.map(str::to_string),
        });
        Self::take(&mut inner.pages, "historical_games")
    }

    async fn game_moves(&self, game_id: &str) -> ApiResult<Vec<HistoricalMove>> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::GameMoves {
            game_id: game_id.to_string(),
        });
        Self::take(&mut inner.moves, "game_moves")
    }

    async fn review(&self, game_id: &str) -> ApiResult<GameReview> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::Review {
            game_id: game_id.to_string(),
        });
        Self::take(&mut inner.reviews, "review")
    }

    async fn save_game(&self, record: &GameRecord) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls.push(ApiCall::SaveGame);
        let result = Self::take(&mut inner.save_results, "save_game");
        if result.is_ok() {
            inner.saved_games.push(record.clone());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scripted_in_order() {
        let api = MockApi::new();
        api.push_bot_move("e7e5");
        api.push_bot_move("g8f6");

        assert_eq!(api.bot_move("fen-a").await.unwrap(), "e7e5");
        assert_eq!(api.bot_move("fen-b").await.unwrap(), "g8f6");
        assert!(matches!(
            api.bot_move("fen-c").await,
            Err(ApiError::NotConfigured(_))
        ));

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            ApiCall::BotMove {
                fen: "fen-a".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_mock_records_saved_games() {
        let api = MockApi::new();
        api.push_save_result(Ok(()));
        let record = GameRecord {
            white_player: "Guest".into(),
            black_player: "Bot".into(),
            result: "1-0".into(),
            pgn: "1. e4".into(),
            time_control: "Blitz".into(),
        };
        api.save_game(&record).await.unwrap();
        assert_eq!(api.saved_games(), vec![record]);
    }
}

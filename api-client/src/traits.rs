//! The seam between sessions and the backend.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::types::{GamePage, GameRecord, GameReview, HistoricalMove, PuzzleSource};

/// Everything the session layer needs from the platform backend.
///
/// Sessions hold a `dyn PlatformApi` so tests can substitute a scripted
/// implementation without a running server.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Ask the bot opponent for its move in the given position.
    ///
    /// Returns the move in UCI notation as plain text.
    async fn bot_move(&self, fen: &str) -> ApiResult<String>;

    /// Fetch the next training puzzle for the given mode.
    async fn next_puzzle(&self, mode: &str) -> ApiResult<PuzzleSource>;

    /// Fetch a page of historical games, optionally filtered by a search term.
    async fn historical_games(&self, page: u32, search: Option<&str>) -> ApiResult<GamePage>;

    /// Fetch the stored positions of a historical game.
    async fn game_moves(&self, game_id: &str) -> ApiResult<Vec<HistoricalMove>>;

    /// Request a full review of a finished game.
    async fn review(&self, game_id: &str) -> ApiResult<GameReview>;

    /// Persist a finished game.
    async fn save_game(&self, record: &GameRecord) -> ApiResult<()>;
}

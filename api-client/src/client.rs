//! The real HTTP implementation of [`PlatformApi`].

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::get_api_base_url;
use crate::error::{ApiError, ApiResult};
use crate::traits::PlatformApi;
use crate::types::{GamePage, GameRecord, GameReview, HistoricalMove, PuzzleSource, ReviewPayload};

/// REST client for the platform backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the configured base URL.
    pub fn new() -> Self {
        Self::with_base_url(get_api_base_url())
    }

    /// Create a client against an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn check_status(response: &reqwest::Response) -> ApiResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            warn!(status = status.as_u16(), url = %response.url(), "backend request failed");
            Err(ApiError::Status(status.as_u16()))
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformApi for ApiClient {
    async fn bot_move(&self, fen: &str) -> ApiResult<String> {
        let response = self
            .http
            .get(self.url("/api/bot/move"))
            .query(&[("fen", fen)])
            .send()
            .await?;
        Self::check_status(&response)?;

        let uci = response.text().await?.trim().to_string();
        if uci.is_empty() {
            return Err(ApiError::InvalidData("empty bot move".to_string()));
        }
        debug!(%uci, "bot move received");
        Ok(uci)
    }

    async fn next_puzzle(&self, mode: &str) -> ApiResult<PuzzleSource> {
        let response = self
            .http
            .get(self.url("/api/training/puzzle"))
            .query(&[("type", mode)])
            .send()
            .await?;

        // The puzzle pool is finite; a non-success status means it ran dry.
        if !response.status().is_success() {
            return Err(ApiError::NoMorePuzzles);
        }
        Ok(response.json().await?)
    }

    async fn historical_games(&self, page: u32, search: Option<&str>) -> ApiResult<GamePage> {
        let mut request = self
            .http
            .get(self.url("/api/historical/games"))
            .query(&[("page", page)]);
        if let Some(term) = search {
            request = request.query(&[("search", term)]);
        }
        let response = request.send().await?;
        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    async fn game_moves(&self, game_id: &str) -> ApiResult<Vec<HistoricalMove>> {
        let response = self
            .http
            .get(self.url("/api/historical/game-moves"))
            .query(&[("gameId", game_id)])
            .send()
            .await?;
        Self::check_status(&response)?;
        Ok(response.json().await?)
    }

    async fn review(&self, game_id: &str) -> ApiResult<GameReview> {
        let response = self
            .http
            .get(self.url(&format!("/api/analysis/review/{game_id}")))
            .send()
            .await?;
        Self::check_status(&response)?;

        let payload: ReviewPayload = response.json().await?;
        Ok(payload.into())
    }

    async fn save_game(&self, record: &GameRecord) -> ApiResult<()> {
        let response = self
            .http
            .post(self.url("/api/platform/save"))
            .json(record)
            .send()
            .await?;
        Self::check_status(&response)?;
        debug!(result = %record.result, "game saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::with_base_url("http://example.test:9000");
        assert_eq!(
            client.url("/api/platform/save"),
            "http://example.test:9000/api/platform/save"
        );
    }
}

//! HTTP client for the chess platform backend.
//!
//! Wraps the REST endpoints the sessions depend on: the bot opponent, the
//! puzzle source, historical games, the review service, and game persistence.
//! The [`PlatformApi`] trait is the seam the sessions are written against;
//! [`ApiClient`] is the real implementation and, with the `mock` feature, a
//! scripted [`mock::MockApi`] is available for tests.

mod client;
mod config;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod traits;
mod types;

pub use client::ApiClient;
pub use config::get_api_base_url;
pub use error::{ApiError, ApiResult};
pub use traits::PlatformApi;
pub use types::{
    GamePage, GameRecord, GameReview, GameSummary, HistoricalMove, MoveQuality, PuzzleSource,
    ReviewMove,
};

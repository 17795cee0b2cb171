//! Wire payloads for the platform backend (camelCase JSON).

use serde::{Deserialize, Deserializer, Serialize};

/// A puzzle position served by `/api/training/puzzle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleSource {
    pub fen: String,
    /// The historical game the puzzle was extracted from, when known.
    #[serde(default)]
    pub game_id: Option<String>,
}

/// One row of the historical games list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub white_player: Option<String>,
    #[serde(default)]
    pub black_player: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub date_played: Option<String>,
}

/// Paginated historical games payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePage {
    #[serde(default)]
    pub content: Vec<GameSummary>,
}

/// One stored position of a historical game, as served by
/// `/api/historical/game-moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalMove {
    pub fen: String,
    #[serde(default)]
    pub played_move: Option<String>,
    #[serde(default, deserialize_with = "lenient_quality")]
    pub classification: Option<MoveQuality>,
}

/// Move quality taxonomy used by the review service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveQuality {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Book,
    Inaccuracy,
    Mistake,
    Blunder,
    Forced,
}

impl MoveQuality {
    /// Parse a backend label. Unknown labels are tolerated as `None` rather
    /// than failing the whole payload.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "BRILLIANT" => Some(Self::Brilliant),
            "GREAT" => Some(Self::Great),
            "BEST" => Some(Self::Best),
            "EXCELLENT" => Some(Self::Excellent),
            "GOOD" => Some(Self::Good),
            "BOOK" => Some(Self::Book),
            "INACCURACY" => Some(Self::Inaccuracy),
            "MISTAKE" => Some(Self::Mistake),
            "BLUNDER" => Some(Self::Blunder),
            "FORCED" => Some(Self::Forced),
            _ => None,
        }
    }

    /// Short glyph for move-list iconography.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Brilliant => "!!",
            Self::Great => "!",
            Self::Best => "*",
            Self::Excellent => "^",
            Self::Good => "+",
            Self::Book => "=",
            Self::Inaccuracy => "?!",
            Self::Mistake => "?",
            Self::Blunder => "??",
            Self::Forced => ">",
        }
    }
}

fn lenient_quality<'de, D>(deserializer: D) -> Result<Option<MoveQuality>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(MoveQuality::parse))
}

/// One analyzed move from the review endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMove {
    #[serde(default)]
    pub move_number: Option<u32>,
    #[serde(default)]
    pub played_move: Option<String>,
    #[serde(default)]
    pub fen: Option<String>,
    /// "w"/"White" or "b"/"Black" depending on backend vintage.
    #[serde(default)]
    pub turn: Option<String>,
    #[serde(default)]
    pub eval_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_quality")]
    pub classification: Option<MoveQuality>,
}

/// Aggregate review of a finished game.
#[derive(Debug, Clone, Default)]
pub struct GameReview {
    pub moves: Vec<ReviewMove>,
    pub white_accuracy: Option<f64>,
    pub black_accuracy: Option<f64>,
}

/// The review endpoint has two vintages: the current object shape and a
/// legacy bare array of moves with no accuracy pair.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ReviewPayload {
    Full {
        moves: Vec<ReviewMove>,
        #[serde(rename = "whiteAccuracy")]
        white_accuracy: Option<f64>,
        #[serde(rename = "blackAccuracy")]
        black_accuracy: Option<f64>,
    },
    Legacy(Vec<ReviewMove>),
}

impl From<ReviewPayload> for GameReview {
    fn from(payload: ReviewPayload) -> Self {
        match payload {
            ReviewPayload::Full {
                moves,
                white_accuracy,
                black_accuracy,
            } => Self {
                moves,
                white_accuracy,
                black_accuracy,
            },
            ReviewPayload::Legacy(moves) => Self {
                moves,
                white_accuracy: None,
                black_accuracy: None,
            },
        }
    }
}

/// A finished game, as posted to `/api/platform/save`. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub white_player: String,
    pub black_player: String,
    /// "1-0", "0-1", "1/2-1/2" or "*".
    pub result: String,
    pub pgn: String,
    /// "Bullet", "Blitz", "Rapid" or "Standard".
    pub time_control: String,
}

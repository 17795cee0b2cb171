//! Canonical side and result types for the project.
//! cozy-chess types are internal implementation details.

/// Project-owned color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerSide {
    White,
    Black,
}

impl PlayerSide {
    pub fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl From<cozy_chess::Color> for PlayerSide {
    fn from(c: cozy_chess::Color) -> Self {
        match c {
            cozy_chess::Color::White => Self::White,
            cozy_chess::Color::Black => Self::Black,
        }
    }
}

impl From<PlayerSide> for cozy_chess::Color {
    fn from(s: PlayerSide) -> Self {
        match s {
            PlayerSide::White => Self::White,
            PlayerSide::Black => Self::Black,
        }
    }
}

impl std::fmt::Display for PlayerSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final game outcome in archival notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    Ongoing,
}

impl GameResult {
    /// The PGN result token ("1-0", "0-1", "1/2-1/2", "*").
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }

    pub fn win_for(side: PlayerSide) -> Self {
        match side {
            PlayerSide::White => Self::WhiteWins,
            PlayerSide::Black => Self::BlackWins,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent() {
        assert_eq!(PlayerSide::White.opponent(), PlayerSide::Black);
        assert_eq!(PlayerSide::Black.opponent(), PlayerSide::White);
    }

    #[test]
    fn test_result_notation() {
        assert_eq!(GameResult::win_for(PlayerSide::White).as_str(), "1-0");
        assert_eq!(GameResult::win_for(PlayerSide::Black).as_str(), "0-1");
        assert_eq!(GameResult::Draw.as_str(), "1/2-1/2");
        assert_eq!(GameResult::Ongoing.as_str(), "*");
    }
}

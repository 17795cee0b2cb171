pub mod fen;
pub mod game;
pub mod pgn;
pub mod types;
pub mod uci;
pub mod validator;

pub use game::{Game, GameError, HistoryEntry, StartPosition};
pub use pgn::export_pgn;
pub use types::{GameResult, PlayerSide};
pub use uci::{format_uci_move, parse_lenient, parse_uci_move, ParsedMove, UciParseError};
pub use validator::{attempt_move, classify_terminal, AppliedMove, DrawReason, TerminalState};

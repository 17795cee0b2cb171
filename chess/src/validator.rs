//! Move validation and terminal-state classification on top of [`Game`].

use cozy_chess::{BitBoard, GameStatus, Move, Piece, Rank, Square};

use crate::game::{Game, GameError};
use crate::types::{GameResult, PlayerSide};
use crate::uci;

/// A move accepted by [`attempt_move`], with everything the presentation
/// layer needs to react to it.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub mv: Move,
    pub uci: String,
    pub san: String,
    pub is_capture: bool,
    /// The opponent is in check after this move.
    pub gives_check: bool,
    /// FEN of the resulting position.
    pub fen: String,
}

/// Why an ongoing-looking position is actually drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
}

/// Terminal classification of the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalState {
    None,
    Checkmate { winner: PlayerSide },
    Stalemate,
    Draw(DrawReason),
}

impl TerminalState {
    pub fn result(self) -> GameResult {
        match self {
            Self::None => GameResult::Ongoing,
            Self::Checkmate { winner } => GameResult::win_for(winner),
            Self::Stalemate | Self::Draw(_) => GameResult::Draw,
        }
    }
}

/// Validate and apply a (from, to) move. On success the game advances and the
/// applied move is returned; on failure the game is untouched and the caller's
/// presentation layer should snap the piece back.
///
/// A missing promotion piece on a last-rank pawn move defaults to queen;
/// UCI-style castling input (e1g1) is accepted and normalized.
pub fn attempt_move(
    game: &mut Game,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
) -> Result<AppliedMove, GameError> {
    let board = game.position();

    let promotion = match promotion {
        Some(p) => Some(p),
        None if board.piece_on(from) == Some(Piece::Pawn)
            && matches!(to.rank(), Rank::First | Rank::Eighth) =>
        {
            Some(Piece::Queen)
        }
        None => None,
    };

    let mut legal = Vec::new();
    board.generate_moves(|mvs| {
        legal.extend(mvs);
        false
    });

    let mv = uci::convert_castling(
        Move {
            from,
            to,
            promotion,
        },
        &legal,
    );

    let entry = game.make_move(mv)?;

    Ok(AppliedMove {
        mv,
        uci: uci::format_uci_move(mv),
        san: entry.san.clone(),
        is_capture: entry.captured.is_some(),
        gives_check: game.is_check(),
        fen: entry.fen,
    })
}

/// Classify the current position. Checkmate resolves to the opponent of the
/// side to move; stalemate, fifty-move, threefold repetition and insufficient
/// material resolve to draws.
pub fn classify_terminal(game: &Game) -> TerminalState {
    let board = game.position();

    match board.status() {
        GameStatus::Won => {
            let winner = PlayerSide::from(board.side_to_move()).opponent();
            TerminalState::Checkmate { winner }
        }
        GameStatus::Drawn => {
            // cozy_chess reports Drawn for both stalemate and the fifty-move
            // rule; stalemate is the no-legal-moves case.
            if game.legal_moves().is_empty() && !game.is_check() {
                TerminalState::Stalemate
            } else {
                TerminalState::Draw(DrawReason::FiftyMoveRule)
            }
        }
        GameStatus::Ongoing => {
            if is_threefold_repetition(game) {
                TerminalState::Draw(DrawReason::ThreefoldRepetition)
            } else if is_insufficient_material(game) {
                TerminalState::Draw(DrawReason::InsufficientMaterial)
            } else {
                TerminalState::None
            }
        }
    }
}

/// Compare positions by the first four FEN fields (placement, side to move,
/// castling rights, en passant) — the move counters do not matter for
/// repetition.
fn position_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

fn is_threefold_repetition(game: &Game) -> bool {
    let current = position_key(&game.to_fen());

    let mut count = 1; // the position on the board
    if position_key(&game.start_fen()) == current && !game.history().is_empty() {
        count += 1;
    }
    for entry in game.history().iter().take(game.history().len().saturating_sub(1)) {
        if position_key(&entry.fen) == current {
            count += 1;
        }
    }

    count >= 3
}

fn is_insufficient_material(game: &Game) -> bool {
    let board = game.position();

    let pawns = board.pieces(Piece::Pawn);
    let majors = board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !(pawns | majors).is_empty() {
        return false;
    }

    let knights = board.pieces(Piece::Knight);
    let bishops = board.pieces(Piece::Bishop);
    let minors = knights | bishops;

    match minors.len() {
        0 | 1 => true,
        2 => {
            // Two bishops on same-colored squares cannot mate (one per side).
            knights.is_empty()
                && bishops.len() == 2
                && same_square_color(bishops)
        }
        _ => false,
    }
}

fn same_square_color(bb: BitBoard) -> bool {
    let mut colors = bb.into_iter().map(|sq| (sq.file() as u8 + sq.rank() as u8) % 2);
    let first = colors.next();
    colors.all(|c| Some(c) == first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::{File, Rank};

    fn sq(s: &str) -> Square {
        let bytes = s.as_bytes();
        Square::new(
            File::index((bytes[0] - b'a') as usize),
            Rank::index((bytes[1] - b'1') as usize),
        )
    }

    #[test]
    fn test_attempt_move_legal() {
        let mut game = Game::new();
        let applied = attempt_move(&mut game, sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(applied.uci, "e2e4");
        assert!(!applied.is_capture);
        assert!(!applied.gives_check);
        assert_eq!(game.side_to_move(), cozy_chess::Color::Black);
    }

    #[test]
    fn test_attempt_move_illegal_is_idempotent() {
        let mut game = Game::new();
        let before = game.to_fen();
        assert!(attempt_move(&mut game, sq("e2"), sq("e5"), None).is_err());
        assert!(attempt_move(&mut game, sq("e2"), sq("e5"), None).is_err());
        assert_eq!(game.to_fen(), before);
    }

    #[test]
    fn test_all_legal_moves_are_accepted() {
        let game = Game::new();
        for mv in game.legal_moves() {
            let mut fresh = Game::new();
            let applied = attempt_move(&mut fresh, mv.from, mv.to, mv.promotion).unwrap();
            assert_eq!(applied.mv, mv);
            assert_eq!(fresh.side_to_move(), cozy_chess::Color::Black);
        }
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut game = Game::from_fen("8/4P3/8/8/8/2k5/8/4K3 w - - 0 1").unwrap();
        let applied = attempt_move(&mut game, sq("e7"), sq("e8"), None).unwrap();
        assert_eq!(applied.uci, "e7e8q");
    }

    #[test]
    fn test_classify_checkmate() {
        // Fool's mate position, white is mated.
        let game = Game::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert_eq!(
            classify_terminal(&game),
            TerminalState::Checkmate {
                winner: PlayerSide::Black
            }
        );
        assert_eq!(classify_terminal(&game).result(), GameResult::BlackWins);
    }

    #[test]
    fn test_classify_stalemate() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(classify_terminal(&game), TerminalState::Stalemate);
        assert_eq!(classify_terminal(&game).result(), GameResult::Draw);
    }

    #[test]
    fn test_classify_insufficient_material() {
        let game = Game::from_fen("8/8/4k3/8/2N5/2K5/8/8 w - - 0 1").unwrap();
        assert_eq!(
            classify_terminal(&game),
            TerminalState::Draw(DrawReason::InsufficientMaterial)
        );
    }

    #[test]
    fn test_classify_ongoing() {
        let game = Game::new();
        assert_eq!(classify_terminal(&game), TerminalState::None);
    }

    #[test]
    fn test_classify_threefold_repetition() {
        let mut game = Game::new();
        // Shuffle the knights back and forth until the start position has
        // occurred three times.
        for _ in 0..2 {
            attempt_move(&mut game, sq("g1"), sq("f3"), None).unwrap();
            attempt_move(&mut game, sq("g8"), sq("f6"), None).unwrap();
            attempt_move(&mut game, sq("f3"), sq("g1"), None).unwrap();
            attempt_move(&mut game, sq("f6"), sq("g8"), None).unwrap();
        }
        assert_eq!(
            classify_terminal(&game),
            TerminalState::Draw(DrawReason::ThreefoldRepetition)
        );
    }
}

use cozy_chess::{Board, Color, GameStatus, Move, Piece, Square};

/// Main game state wrapper around cozy-chess Board
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    start_position: StartPosition,
}

/// Snapshot of a played move (also used for undo via replay)
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub mv: Move,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub piece_color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub san: String,
    /// FEN after this move.
    pub fen: String,
}

/// Starting position of the game
#[derive(Debug, Clone)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::default(),
            history: Vec::new(),
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let position = crate::fen::parse_fen(fen)?;
        Ok(Self {
            position,
            history: Vec::new(),
            start_position: StartPosition::Fen(fen.to_string()),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, GameError> {
        if !self.legal_moves().contains(&mv) {
            return Err(GameError::IllegalMove);
        }

        let piece = self
            .position
            .piece_on(mv.from)
            .ok_or(GameError::IllegalMove)?;
        let piece_color = self
            .position
            .color_on(mv.from)
            .ok_or(GameError::IllegalMove)?;

        // En passant lands on an empty square but is still a capture; castling
        // is encoded king-onto-own-rook and is not one.
        let captured = match (self.position.piece_on(mv.to), self.position.color_on(mv.to)) {
            (Some(p), Some(c)) if c != piece_color => Some(p),
            (None, _) if piece == Piece::Pawn && mv.from.file() != mv.to.file() => {
                Some(Piece::Pawn)
            }
            _ => None,
        };

        let mut san = generate_san(&self.position, mv, piece, captured.is_some());

        // cozy_chess boards are value types; play on a copy and swap in.
        let mut new_position = self.position.clone();
        new_position.play_unchecked(mv);

        match new_position.status() {
            GameStatus::Won => san.push('#'),
            _ => {
                if !new_position.checkers().is_empty() {
                    san.push('+');
                }
            }
        }

        self.position = new_position;
        let fen = self.to_fen();

        let entry = HistoryEntry {
            mv,
            from: mv.from,
            to: mv.to,
            piece,
            piece_color,
            captured,
            promotion: mv.promotion,
            san,
            fen,
        };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Undo the last move
    pub fn undo(&mut self) -> Result<(), GameError> {
        if self.history.is_empty() {
            return Err(GameError::NothingToUndo);
        }

        self.history.pop();
        self.rebuild_position()
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.position.generate_moves(|mvs| {
            moves.extend(mvs);
            false
        });
        moves
    }

    /// Get the current game status
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Whether the side to move is currently in check
    pub fn is_check(&self) -> bool {
        !self.position.checkers().is_empty()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.position)
    }

    /// The FEN the game started from.
    pub fn start_fen(&self) -> String {
        match &self.start_position {
            StartPosition::Standard => Board::default().to_string(),
            StartPosition::Fen(fen) => fen.clone(),
        }
    }

    /// Rebuild position from start + history (for undo)
    fn rebuild_position(&mut self) -> Result<(), GameError> {
        let mut board = match &self.start_position {
            StartPosition::Standard => Board::default(),
            StartPosition::Fen(fen) => crate::fen::parse_fen(fen)?,
        };

        for entry in &self.history {
            board
                .try_play(entry.mv)
                .map_err(|_| GameError::IllegalMove)?;
        }

        self.position = board;
        Ok(())
    }
}

/// Generate simplified SAN notation for a move (no disambiguation)
fn generate_san(board: &Board, mv: Move, piece: Piece, is_capture: bool) -> String {
    // Castling is encoded king-to-rook by cozy_chess.
    if piece == Piece::King && board.color_on(mv.to) == board.color_on(mv.from) {
        return if mv.to.file() > mv.from.file() {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let mut san = String::new();

    match piece {
        Piece::King => san.push('K'),
        Piece::Queen => san.push('Q'),
        Piece::Rook => san.push('R'),
        Piece::Bishop => san.push('B'),
        Piece::Knight => san.push('N'),
        Piece::Pawn => {
            if is_capture {
                san.push(file_char(mv.from));
            }
        }
    }

    if is_capture {
        san.push('x');
    }

    san.push(file_char(mv.to));
    san.push(rank_char(mv.to));

    if let Some(promo) = mv.promotion {
        san.push('=');
        san.push(match promo {
            Piece::Queen => 'Q',
            Piece::Rook => 'R',
            Piece::Bishop => 'B',
            Piece::Knight => 'N',
            _ => '?',
        });
    }

    san
}

fn file_char(square: Square) -> char {
    (b'a' + square.file() as u8) as char
}

fn rank_char(square: Square) -> char {
    (b'1' + square.rank() as u8) as char
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Illegal move")]
    IllegalMove,
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("FEN parse error: {0}")]
    FenError(#[from] crate::fen::FenError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::{File, Rank};

    fn sq(file: File, rank: Rank) -> Square {
        Square::new(file, rank)
    }

    fn mv(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    #[test]
    fn test_make_move_flips_side() {
        let mut game = Game::new();
        let e2e4 = mv(sq(File::E, Rank::Second), sq(File::E, Rank::Fourth));
        let entry = game.make_move(e2e4).unwrap();
        assert_eq!(entry.san, "e4");
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn test_illegal_move_leaves_state_unchanged() {
        let mut game = Game::new();
        let before = game.to_fen();
        let bad = mv(sq(File::E, Rank::Second), sq(File::E, Rank::Fifth));
        assert!(matches!(game.make_move(bad), Err(GameError::IllegalMove)));
        assert_eq!(game.to_fen(), before);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_undo_restores_previous_position() {
        let mut game = Game::new();
        let before = game.to_fen();
        game.make_move(mv(sq(File::E, Rank::Second), sq(File::E, Rank::Fourth)))
            .unwrap();
        game.undo().unwrap();
        assert_eq!(game.to_fen(), before);
        assert!(game.history().is_empty());
    }

    #[test]
    fn test_undo_rebuilds_through_multiple_moves() {
        let mut game = Game::new();
        game.make_move(mv(sq(File::E, Rank::Second), sq(File::E, Rank::Fourth)))
            .unwrap();
        game.make_move(mv(sq(File::E, Rank::Seventh), sq(File::E, Rank::Fifth)))
            .unwrap();
        game.make_move(mv(sq(File::G, Rank::First), sq(File::F, Rank::Third)))
            .unwrap();

        game.undo().unwrap();
        assert_eq!(game.history().len(), 2);
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn test_undo_on_empty_history_fails() {
        let mut game = Game::new();
        assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));
    }

    #[test]
    fn test_capture_san() {
        let mut game = Game::new();
        game.make_move(mv(sq(File::E, Rank::Second), sq(File::E, Rank::Fourth)))
            .unwrap();
        game.make_move(mv(sq(File::D, Rank::Seventh), sq(File::D, Rank::Fifth)))
            .unwrap();
        let entry = game
            .make_move(mv(sq(File::E, Rank::Fourth), sq(File::D, Rank::Fifth)))
            .unwrap();
        assert_eq!(entry.san, "exd5");
        assert_eq!(entry.captured, Some(Piece::Pawn));
    }

    #[test]
    fn test_from_fen_preserves_start_for_undo() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let mut game = Game::from_fen(fen).unwrap();
        game.make_move(mv(sq(File::G, Rank::First), sq(File::F, Rank::Third)))
            .unwrap();
        game.undo().unwrap();
        assert_eq!(game.to_fen(), fen);
    }

    #[test]
    fn test_checkmate_status() {
        // Scholar's mate
        let mut game = Game::new();
        let moves = [
            (sq(File::E, Rank::Second), sq(File::E, Rank::Fourth)),
            (sq(File::E, Rank::Seventh), sq(File::E, Rank::Fifth)),
            (sq(File::D, Rank::First), sq(File::H, Rank::Fifth)),
            (sq(File::B, Rank::Eighth), sq(File::C, Rank::Sixth)),
            (sq(File::F, Rank::First), sq(File::C, Rank::Fourth)),
            (sq(File::G, Rank::Eighth), sq(File::F, Rank::Sixth)),
        ];
        for (from, to) in moves {
            game.make_move(mv(from, to)).unwrap();
        }
        let mate = game
            .make_move(mv(sq(File::H, Rank::Fifth), sq(File::F, Rank::Seventh)))
            .unwrap();
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(mate.san, "Qxf7#");
    }
}

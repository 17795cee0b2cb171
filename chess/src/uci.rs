//! UCI move string parsing and formatting.
//!
//! Two entry points: [`parse_uci_move`] is the strict 4-5 character parser,
//! [`parse_lenient`] is the forgiving variant used for moves coming back from
//! the bot endpoint, which may omit a required promotion piece. The lenient
//! path reports which stage accepted the input so callers (and tests) can tell
//! a strict parse from a promotion-defaulted one.

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UciParseError {
    #[error("Invalid move string: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion piece: {0}")]
    InvalidPromotion(String),
}

/// Outcome of the lenient parse, tagged by which stage accepted the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedMove {
    /// The string was well-formed UCI as-is.
    Strict(Move),
    /// The string omitted a required promotion; queen was assumed.
    Defaulted(Move),
}

impl ParsedMove {
    pub fn into_move(self) -> Move {
        match self {
            Self::Strict(mv) | Self::Defaulted(mv) => mv,
        }
    }
}

/// Parse strict UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<Move, UciParseError> {
    let s = s.trim();
    if s.len() < 4 || !s.is_ascii() {
        return Err(UciParseError::InvalidMove(s.to_string()));
    }

    let from = parse_square(&s[0..2])?;
    let to = parse_square(&s[2..4])?;

    let promotion = match s.len() {
        4 => None,
        5 => Some(match &s[4..5] {
            "q" => Piece::Queen,
            "r" => Piece::Rook,
            "b" => Piece::Bishop,
            "n" => Piece::Knight,
            _ => return Err(UciParseError::InvalidPromotion(s.to_string())),
        }),
        _ => return Err(UciParseError::InvalidMove(s.to_string())),
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

/// Lenient parse against a concrete position: strict UCI first, then a
/// promotion-defaulting fallback when the move pushes a pawn to the last rank
/// without naming a piece. Castling is normalized to cozy_chess's
/// king-onto-rook encoding.
pub fn parse_lenient(board: &Board, s: &str) -> Result<ParsedMove, UciParseError> {
    let mut parsed = parse_uci_move(s)?;
    let mut defaulted = false;

    if parsed.promotion.is_none() && promotion_required(board, parsed.from, parsed.to) {
        parsed.promotion = Some(Piece::Queen);
        defaulted = true;
    }

    let mut legal = Vec::new();
    board.generate_moves(|mvs| {
        legal.extend(mvs);
        false
    });
    let converted = convert_castling(parsed, &legal);

    if defaulted {
        Ok(ParsedMove::Defaulted(converted))
    } else {
        Ok(ParsedMove::Strict(converted))
    }
}

fn promotion_required(board: &Board, from: Square, to: Square) -> bool {
    board.piece_on(from) == Some(Piece::Pawn)
        && matches!(to.rank(), Rank::First | Rank::Eighth)
}

/// Convert UCI castling notation to cozy_chess notation.
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8.
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8.
pub fn convert_castling(mv: Move, legal_moves: &[Move]) -> Move {
    let is_back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let from_e = matches!(mv.from.file(), File::E);
    let to_g_or_c = matches!(mv.to.file(), File::G | File::C);

    if is_back_rank && from_e && to_g_or_c && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };
        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

fn parse_square(s: &str) -> Result<Square, UciParseError> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 {
        return Err(UciParseError::InvalidSquare(s.to_string()));
    }

    let file = match bytes[0] {
        b'a'..=b'h' => File::index((bytes[0] - b'a') as usize),
        _ => return Err(UciParseError::InvalidSquare(s.to_string())),
    };
    let rank = match bytes[1] {
        b'1'..=b'8' => Rank::index((bytes[1] - b'1') as usize),
        _ => return Err(UciParseError::InvalidSquare(s.to_string())),
    };

    Ok(Square::new(file, rank))
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", format_square(mv.from), format_square(mv.to));
    if let Some(promo) = mv.promotion {
        s.push(match promo {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => '?',
        });
    }
    s
}

pub fn format_square(sq: Square) -> String {
    let file = (b'a' + sq.file() as u8) as char;
    let rank = (b'1' + sq.rank() as u8) as char;
    format!("{}{}", file, rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_move() {
        let mv = parse_uci_move("e2e4").unwrap();
        assert_eq!(format_uci_move(mv), "e2e4");
        assert_eq!(mv.promotion, None);
    }

    #[test]
    fn test_parse_promotion() {
        let mv = parse_uci_move("e7e8q").unwrap();
        assert_eq!(mv.promotion, Some(Piece::Queen));
        assert_eq!(format_uci_move(mv), "e7e8q");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_uci_move("e2").is_err());
        assert!(parse_uci_move("z9z9").is_err());
        assert!(parse_uci_move("e7e8x").is_err());
        assert!(parse_uci_move("e2e4e6").is_err());
    }

    #[test]
    fn test_lenient_strict_passthrough() {
        let board = Board::default();
        let parsed = parse_lenient(&board, "e2e4").unwrap();
        assert!(matches!(parsed, ParsedMove::Strict(_)));
        assert_eq!(format_uci_move(parsed.into_move()), "e2e4");
    }

    #[test]
    fn test_lenient_defaults_promotion_to_queen() {
        // White pawn on e7, promotion square empty.
        let board: Board = "8/4P3/8/8/8/2k5/8/4K3 w - - 0 1".parse().unwrap();
        let parsed = parse_lenient(&board, "e7e8").unwrap();
        match parsed {
            ParsedMove::Defaulted(mv) => assert_eq!(mv.promotion, Some(Piece::Queen)),
            other => panic!("expected defaulted parse, got {:?}", other),
        }
    }

    #[test]
    fn test_lenient_does_not_default_non_promotion() {
        let board = Board::default();
        let parsed = parse_lenient(&board, "g1f3").unwrap();
        assert!(matches!(parsed, ParsedMove::Strict(_)));
    }

    #[test]
    fn test_castling_conversion() {
        // White ready to castle kingside.
        let board: Board =
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4"
                .parse()
                .unwrap();
        let parsed = parse_lenient(&board, "e1g1").unwrap();
        assert_eq!(format_uci_move(parsed.into_move()), "e1h1");
    }

    #[test]
    fn test_non_castling_king_move_untouched() {
        let board: Board = "8/8/8/8/8/2k5/8/4K3 w - - 0 1".parse().unwrap();
        let parsed = parse_lenient(&board, "e1d1").unwrap();
        assert_eq!(format_uci_move(parsed.into_move()), "e1d1");
    }
}

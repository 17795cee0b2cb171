//! PGN movetext export for archival of finished games.

use crate::game::Game;
use crate::types::GameResult;

/// Render the game's move list as PGN movetext, terminated by the result
/// token unless the game is still ongoing.
///
/// Games that started from a non-standard position get `SetUp`/`FEN` tag
/// pairs so the movetext can be replayed.
pub fn export_pgn(game: &Game, result: GameResult) -> String {
    let mut out = String::new();

    if let crate::game::StartPosition::Fen(fen) = game_start(game) {
        out.push_str(&format!("[SetUp \"1\"]\n[FEN \"{}\"]\n\n", fen));
    }

    let start_board = game.start_fen();
    // Whose move it is on the first ply decides the numbering style.
    let black_starts = start_board
        .split_whitespace()
        .nth(1)
        .map(|s| s == "b")
        .unwrap_or(false);

    let mut move_number = start_board
        .split_whitespace()
        .nth(5)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1);

    for (i, entry) in game.history().iter().enumerate() {
        let white_to_move = if black_starts { i % 2 == 1 } else { i % 2 == 0 };
        if white_to_move {
            out.push_str(&format!("{}. ", move_number));
        } else if i == 0 {
            out.push_str(&format!("{}... ", move_number));
        }
        out.push_str(&entry.san);
        out.push(' ');
        if !white_to_move {
            move_number += 1;
        }
    }

    if result != GameResult::Ongoing {
        out.push_str(result.as_str());
    }

    out.trim_end().to_string()
}

fn game_start(game: &Game) -> crate::game::StartPosition {
    match game.start_fen().as_str() {
        fen if fen == cozy_chess::Board::default().to_string() => {
            crate::game::StartPosition::Standard
        }
        fen => crate::game::StartPosition::Fen(fen.to_string()),
    }
}

//! Parsing of inbound engine lines.
//!
//! Only two shapes matter to consumers: score fragments (`score cp N` /
//! `score mate N`) and principal-variation fragments (` pv <move> ...`),
//! both carried on `info` lines, plus the final `bestmove` line. Anything
//! else is protocol noise and is ignored rather than treated as an error.

use crate::Score;

/// What a single engine output line contained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLine {
    pub score: Option<Score>,
    /// First move of the principal variation, if the line carried one.
    pub pv_first: Option<String>,
    /// Move from a `bestmove` line.
    pub best_move: Option<String>,
}

/// Parse one line of engine output. Never fails; unrecognized content
/// yields an empty [`ParsedLine`].
pub fn parse_line(line: &str) -> ParsedLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut parsed = ParsedLine::default();

    match tokens.first() {
        Some(&"bestmove") => {
            parsed.best_move = tokens.get(1).map(|s| s.to_string());
        }
        Some(&"info") => {
            let mut i = 1;
            while i < tokens.len() {
                match tokens[i] {
                    "score" => {
                        let kind = tokens.get(i + 1);
                        let value = tokens.get(i + 2).and_then(|s| s.parse::<i32>().ok());
                        parsed.score = match (kind, value) {
                            (Some(&"cp"), Some(v)) => Some(Score::Centipawns(v)),
                            (Some(&"mate"), Some(v)) => Some(Score::MateIn(v)),
                            _ => None,
                        };
                        i += 3;
                    }
                    "pv" => {
                        parsed.pv_first = tokens.get(i + 1).map(|s| s.to_string());
                        // pv is always the trailing keyword
                        break;
                    }
                    _ => {
                        i += 1;
                    }
                }
            }
        }
        _ => {}
    }

    parsed
}

//! Human-vs-bot game orchestration.
//!
//! The session is a four-state machine (Setup, AwaitingHumanMove,
//! AwaitingBotMove, Terminated). Every termination path builds one
//! [`GameRecord`] and hands it to the backend exactly once; after that the
//! session is immutable and late-arriving bot moves are dropped.

use std::sync::Arc;

use api_client::{GameRecord, PlatformApi};
use chess::{
    attempt_move, classify_terminal, export_pgn, parse_lenient, AppliedMove, Game, GameResult,
    PlayerSide, TerminalState,
};
use cozy_chess::{Piece, Square};
use tracing::{debug, info, warn};

use crate::clock::{time_control_label, ClockManager};
use crate::SessionError;

const HUMAN_NAME: &str = "Guest";
const BOT_NAME: &str = "PawnBot";

/// Lifecycle of a live game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Setup,
    AwaitingHumanMove,
    AwaitingBotMove,
    Terminated,
}

/// Flavor text cues for the presentation layer, spoken in the bot's voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Intro,
    Capture,
    Check,
    Win,
    Loss,
    Draw,
    Timeout,
}

impl Reaction {
    pub fn line(self) -> &'static str {
        match self {
            Self::Intro => "Let's see what you've got.",
            Self::Capture => "I'll be taking that.",
            Self::Check => "Check. Careful now.",
            Self::Win => "Good game. Better luck next time.",
            Self::Loss => "Well played. You got me.",
            Self::Draw => "A draw. Honors even.",
            Self::Timeout => "Your flag fell. The clock is part of the game.",
        }
    }
}

/// What happened when a move was applied.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub applied: AppliedMove,
    pub reaction: Option<Reaction>,
    pub terminal: TerminalState,
}

/// A full human turn: the human's move plus the bot's answer, when one was
/// obtained. `bot` is `None` when the game ended on the human's move or the
/// backend request failed and the bot's turn is still pending.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub human: MoveOutcome,
    pub bot: Option<MoveOutcome>,
}

/// One human-vs-bot game from setup to persistence.
pub struct LiveGameSession {
    api: Arc<dyn PlatformApi>,
    game: Game,
    phase: GamePhase,
    user_side: PlayerSide,
    clock: ClockManager,
    time_control: Option<u64>,
    record: Option<GameRecord>,
    final_reaction: Option<Reaction>,
}

impl LiveGameSession {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        let mut clock = ClockManager::start(None);
        clock.stop();
        Self {
            api,
            game: Game::new(),
            phase: GamePhase::Setup,
            user_side: PlayerSide::White,
            clock,
            time_control: None,
            record: None,
            final_reaction: None,
        }
    }

    /// Begin a game from the standard start position. If the human plays
    /// Black the session immediately awaits the bot's first move; the caller
    /// should follow up with [`play_bot_turn`].
    ///
    /// [`play_bot_turn`]: Self::play_bot_turn
    pub fn start(&mut self, user_side: PlayerSide, time_control_seconds: Option<u64>) -> Reaction {
        self.game = Game::new();
        self.user_side = user_side;
        self.time_control = time_control_seconds;
        self.clock = ClockManager::start(time_control_seconds);
        self.record = None;
        self.final_reaction = None;
        self.phase = match user_side {
            PlayerSide::White => GamePhase::AwaitingHumanMove,
            PlayerSide::Black => GamePhase::AwaitingBotMove,
        };
        info!(side = %user_side, time_control = ?time_control_seconds, "game started");
        Reaction::Intro
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn user_side(&self) -> PlayerSide {
        self.user_side
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn clock(&self) -> &ClockManager {
        &self.clock
    }

    /// The record built at termination, if the game has ended.
    pub fn record(&self) -> Option<&GameRecord> {
        self.record.as_ref()
    }

    pub fn final_reaction(&self) -> Option<Reaction> {
        self.final_reaction
    }

    /// Apply the human's move and answer it. Valid only in AwaitingHumanMove;
    /// an illegal move is rejected with the position untouched so the board
    /// can snap the piece back. On success the bot-move request for the
    /// resulting position is issued immediately; if the backend fails, the
    /// session stays in AwaitingBotMove and [`play_bot_turn`] retries.
    ///
    /// [`play_bot_turn`]: Self::play_bot_turn
    pub async fn submit_human_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<TurnOutcome, SessionError> {
        if self.phase != GamePhase::AwaitingHumanMove {
            return Err(SessionError::NotReady);
        }

        let applied = attempt_move(&mut self.game, from, to, promotion)?;
        debug!(uci = %applied.uci, san = %applied.san, "human move applied");
        let human = self.advance_after_move(applied, GamePhase::AwaitingBotMove).await;
        let bot = self.play_bot_turn().await?;
        Ok(TurnOutcome { human, bot })
    }

    /// Ask the backend bot for its move and apply it. A backend failure is
    /// logged and the session stays in AwaitingBotMove so the turn can be
    /// retried.
    pub async fn play_bot_turn(&mut self) -> Result<Option<MoveOutcome>, SessionError> {
        if self.phase != GamePhase::AwaitingBotMove {
            return Ok(None);
        }

        let fen = self.game.to_fen();
        match self.api.bot_move(&fen).await {
            Ok(uci) => self.apply_bot_move(&uci).await,
            Err(e) => {
                warn!(error = %e, "bot move request failed, turn left pending");
                Ok(None)
            }
        }
    }

    /// Apply a move string from the bot. Lenient parsing: a bare promotion
    /// push gets a queen. A move arriving after the game has terminated (the
    /// request was in flight when the human resigned or flagged) is dropped.
    pub async fn apply_bot_move(&mut self, uci: &str) -> Result<Option<MoveOutcome>, SessionError> {
        match self.phase {
            GamePhase::Terminated => {
                debug!(%uci, "dropping bot move for terminated game");
                return Ok(None);
            }
            GamePhase::AwaitingBotMove => {}
            _ => return Err(SessionError::NotReady),
        }

        let mv = parse_lenient(self.game.position(), uci)?.into_move();
        let applied = attempt_move(&mut self.game, mv.from, mv.to, mv.promotion)?;
        debug!(uci = %applied.uci, san = %applied.san, "bot move applied");
        let outcome = self.advance_after_move(applied, GamePhase::AwaitingHumanMove).await;
        Ok(Some(outcome))
    }

    /// One second of clock time elapses. Returns the expired side when a flag
    /// falls; the game terminates in favor of the opponent.
    pub async fn tick(&mut self) -> Option<PlayerSide> {
        let expired = self.clock.tick()?;
        if !matches!(self.phase, GamePhase::Setup | GamePhase::Terminated) {
            self.terminate(GameResult::win_for(expired.opponent()), Reaction::Timeout)
                .await;
        }
        Some(expired)
    }

    /// The human resigns; the bot's side wins.
    pub async fn resign(&mut self) {
        if matches!(self.phase, GamePhase::Setup | GamePhase::Terminated) {
            return;
        }
        self.terminate(GameResult::win_for(self.user_side.opponent()), Reaction::Win)
            .await;
    }

    /// A draw offer was accepted.
    pub async fn accept_draw(&mut self) {
        if matches!(self.phase, GamePhase::Setup | GamePhase::Terminated) {
            return;
        }
        self.terminate(GameResult::Draw, Reaction::Draw).await;
    }

    async fn advance_after_move(
        &mut self,
        applied: AppliedMove,
        next_phase: GamePhase,
    ) -> MoveOutcome {
        let terminal = classify_terminal(&self.game);
        let reaction = if terminal != TerminalState::None {
            let result = terminal.result();
            let reaction = self.ending_reaction(result);
            self.terminate(result, reaction).await;
            Some(reaction)
        } else {
            self.phase = next_phase;
            self.clock.set_turn(self.game.side_to_move().into());
            if applied.is_capture {
                Some(Reaction::Capture)
            } else if applied.gives_check {
                Some(Reaction::Check)
            } else {
                None
            }
        };

        MoveOutcome {
            applied,
            reaction,
            terminal,
        }
    }

    fn ending_reaction(&self, result: GameResult) -> Reaction {
        match result {
            GameResult::WhiteWins | GameResult::BlackWins => {
                if result == GameResult::win_for(self.user_side) {
                    Reaction::Loss
                } else {
                    Reaction::Win
                }
            }
            GameResult::Draw | GameResult::Ongoing => Reaction::Draw,
        }
    }

    /// Stop the clock, build the record, persist it, freeze the session.
    /// Idempotent: only the first termination does anything.
    async fn terminate(&mut self, result: GameResult, reaction: Reaction) {
        if self.phase == GamePhase::Terminated {
            return;
        }
        self.phase = GamePhase::Terminated;
        self.clock.stop();

        let (white_player, black_player) = match self.user_side {
            PlayerSide::White => (HUMAN_NAME, BOT_NAME),
            PlayerSide::Black => (BOT_NAME, HUMAN_NAME),
        };
        let record = GameRecord {
            white_player: white_player.to_string(),
            black_player: black_player.to_string(),
            result: result.as_str().to_string(),
            pgn: export_pgn(&self.game, result),
            time_control: time_control_label(self.time_control).to_string(),
        };
        info!(result = %record.result, "game over");

        // Fire and forget: a failed save must not keep the game alive.
        if let Err(e) = self.api.save_game(&record).await {
            warn!(error = %e, "failed to save finished game");
        }
        self.record = Some(record);
        self.final_reaction = Some(reaction);
    }
}

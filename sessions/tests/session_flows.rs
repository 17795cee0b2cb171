//! End-to-end session flows against the scripted backend and a fake engine.

use std::sync::Arc;

use api_client::mock::{ApiCall, MockApi};
use api_client::{ApiError, PuzzleSource};
use chess::PlayerSide;
use cozy_chess::{File, Rank, Square};
use engine::AnalysisChannel;
use sessions::{
    GamePhase, LiveGameSession, PuzzleFeedback, PuzzleMode, PuzzleSession, SessionError,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sq(s: &str) -> Square {
    let bytes = s.as_bytes();
    Square::new(
        File::index((bytes[0] - b'a') as usize),
        Rank::index((bytes[1] - b'1') as usize),
    )
}

#[tokio::test]
async fn untimed_game_issues_bot_request_for_resulting_position() {
    init_tracing();
    let api = MockApi::new();
    api.push_bot_move_error(ApiError::Status(502));
    let mut session = LiveGameSession::new(Arc::new(api.clone()));
    session.start(PlayerSide::White, None);

    let outcome = session
        .submit_human_move(sq("e2"), sq("e4"), None)
        .await
        .unwrap();
    assert!(outcome.bot.is_none());
    assert_eq!(session.phase(), GamePhase::AwaitingBotMove);

    // Submitting the move is what issues the bot request.
    assert_eq!(
        api.calls(),
        vec![ApiCall::BotMove {
            fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string()
        }]
    );
}

#[tokio::test]
async fn white_flag_fall_records_black_win() {
    init_tracing();
    let api = MockApi::new();
    api.push_save_result(Ok(()));
    let mut session = LiveGameSession::new(Arc::new(api.clone()));
    session.start(PlayerSide::White, Some(1));

    assert_eq!(session.tick().await, Some(PlayerSide::White));
    assert_eq!(session.phase(), GamePhase::Terminated);

    let saved = api.saved_games();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].result, "0-1");
}

#[tokio::test]
async fn puzzle_move_racing_the_solution_is_rejected() {
    init_tracing();
    let api = MockApi::new();
    api.push_puzzle(PuzzleSource {
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".to_string(),
        game_id: None,
    });
    let (out_tx, _out_rx) = tokio::sync::mpsc::channel(64);
    let (channel, sink) = AnalysisChannel::from_line_io(out_tx);
    let mut session = PuzzleSession::new(Arc::new(api.clone()), channel);
    session.load_next(PuzzleMode::Winning).await.unwrap();

    // The human clicks before the engine has answered.
    assert!(matches!(
        session.submit_move(sq("e2"), sq("e4"), None).await,
        Err(SessionError::NotReady)
    ));

    // Once the solution lands, the same input is accepted and counted.
    sink.feed("info depth 15 score cp 30 pv e2e4").await;
    session.await_engine().await.unwrap();
    session.await_engine().await.unwrap();
    assert_eq!(
        session.submit_move(sq("e2"), sq("e4"), None).await.unwrap(),
        PuzzleFeedback::Correct
    );
    assert_eq!(session.ply_count(), 1);
}

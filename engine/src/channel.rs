//! The analysis channel: command fan-out, line fan-in, query stamping.
//!
//! All traffic flows through a single actor task fed by one mpsc queue, so
//! inbound lines and new queries are processed in arrival order. A line that
//! was queued before a new query is stamped with the old sequence number,
//! which is what lets consumers recognize it as stale.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

use crate::parser::parse_line;
use crate::{EngineError, EngineResult, QueryId, ResultKind};

/// Configuration for locating the engine executable.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Explicit path to the engine binary. When unset, `PAWNBOT_ENGINE_PATH`
    /// and then a list of common install locations are tried.
    pub path: Option<PathBuf>,
}

enum Input {
    /// A raw line read from the engine process.
    Line(String),
    /// A new best-move query; supersedes whatever search is running.
    Query { id: u64, fen: String, depth: u8 },
    /// A bare command line (handshake, stop, quit).
    Command(String),
}

/// Typed handle over a UCI engine process (or, in tests, raw line I/O).
pub struct AnalysisChannel {
    input: mpsc::Sender<Input>,
    results: mpsc::Receiver<EngineResult>,
    seq: Arc<AtomicU64>,
    initialized: bool,
    child: Option<Child>,
}

/// Test-facing handle for injecting engine output lines into a channel built
/// with [`AnalysisChannel::from_line_io`].
#[derive(Clone)]
pub struct LineSink {
    tx: mpsc::Sender<Input>,
}

impl LineSink {
    /// Feed one line of engine output. Returns false if the channel is gone.
    pub async fn feed(&self, line: impl Into<String>) -> bool {
        self.tx.send(Input::Line(line.into())).await.is_ok()
    }
}

impl AnalysisChannel {
    /// Build a channel over raw line I/O: every command line the channel
    /// writes is delivered to `outbound`, and engine output is pushed in
    /// through the returned [`LineSink`]. [`AnalysisChannel::spawn`] wires
    /// this to a real process; tests drive it directly.
    pub fn from_line_io(outbound: mpsc::Sender<String>) -> (Self, LineSink) {
        let (input_tx, input_rx) = mpsc::channel::<Input>(64);
        let (result_tx, result_rx) = mpsc::channel::<EngineResult>(64);

        tokio::spawn(run_actor(input_rx, outbound, result_tx));

        let channel = Self {
            input: input_tx.clone(),
            results: result_rx,
            seq: Arc::new(AtomicU64::new(0)),
            initialized: false,
            child: None,
        };
        (channel, LineSink { tx: input_tx })
    }

    /// Spawn the engine process and wire its stdio to a channel.
    pub async fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let path = match &config.path {
            Some(p) => p.clone(),
            None => find_engine_path().ok_or(EngineError::NotFound)?,
        };
        tracing::info!(path = %path.display(), "spawning analysis engine");

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let mut stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn(std::io::Error::other("no stdin")))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn(std::io::Error::other("no stdout")))?;

        // Writer task: drain command lines into the process.
        let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
        tokio::spawn(async move {
            while let Some(cmd) = out_rx.recv().await {
                tracing::trace!(%cmd, "UCI >>");
                if stdin.write_all(cmd.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    tracing::warn!("engine stdin closed");
                    break;
                }
            }
        });

        let (mut channel, sink) = Self::from_line_io(out_tx);
        channel.child = Some(process);

        // Reader task: forward engine output lines into the actor.
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!("engine stdout EOF");
                        break;
                    }
                    Ok(_) => {
                        if !sink.feed(line.trim_end().to_string()).await {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "error reading engine stdout");
                        break;
                    }
                }
            }
        });

        Ok(channel)
    }

    /// Send the UCI handshake. A no-op after the first call.
    pub async fn initialize(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Ok(());
        }
        self.send_command("uci").await?;
        self.initialized = true;
        Ok(())
    }

    /// Issue a best-move query for `fen` at the given depth. Cancels any
    /// in-flight search (the engine is told `stop` before the new `go`) and
    /// returns the id consumers must match results against.
    pub async fn request_best_move(
        &mut self,
        fen: &str,
        depth: u8,
    ) -> Result<QueryId, EngineError> {
        let id = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(id, %fen, depth, "issuing best-move query");
        self.input
            .send(Input::Query {
                id,
                fen: fen.to_string(),
                depth,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        Ok(QueryId(id))
    }

    /// The most recently issued query. Results stamped with anything older
    /// are stale.
    pub fn current_query(&self) -> QueryId {
        QueryId(self.seq.load(Ordering::SeqCst))
    }

    /// Wait for the next result event. None means the channel is closed.
    pub async fn next_result(&mut self) -> Option<EngineResult> {
        self.results.recv().await
    }

    /// Non-blocking poll for a result event.
    pub fn try_next_result(&mut self) -> Option<EngineResult> {
        self.results.try_recv().ok()
    }

    /// Tell the engine to abandon the current search.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        self.send_command("stop").await
    }

    /// Quit the engine and reap the process if one was spawned.
    pub async fn shutdown(mut self) {
        let _ = self.send_command("quit").await;
        if let Some(mut child) = self.child.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(1), child.wait()).await;
            let _ = child.kill().await;
        }
    }

    async fn send_command(&self, cmd: &str) -> Result<(), EngineError> {
        self.input
            .send(Input::Command(cmd.to_string()))
            .await
            .map_err(|_| EngineError::ChannelClosed)
    }
}

async fn run_actor(
    mut input: mpsc::Receiver<Input>,
    outbound: mpsc::Sender<String>,
    results: mpsc::Sender<EngineResult>,
) {
    let mut current: u64 = 0;

    while let Some(msg) = input.recv().await {
        match msg {
            Input::Command(cmd) => {
                if outbound.send(cmd).await.is_err() {
                    break;
                }
            }
            Input::Query { id, fen, depth } => {
                current = id;
                // One search at a time: cancel before re-aiming.
                let commands = [
                    "stop".to_string(),
                    format!("position fen {}", fen),
                    format!("go depth {}", depth),
                ];
                let mut closed = false;
                for cmd in commands {
                    if outbound.send(cmd).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
            Input::Line(line) => {
                tracing::trace!(%line, "UCI <<");
                let parsed = parse_line(&line);
                let query = QueryId(current);

                if let Some(score) = parsed.score {
                    if results
                        .send(EngineResult {
                            query,
                            kind: ResultKind::Score(score),
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }

                let best = parsed.pv_first.or(parsed.best_move);
                if let Some(mv) = best {
                    if results
                        .send(EngineResult {
                            query,
                            kind: ResultKind::BestMove(mv),
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }
    }
    tracing::debug!("analysis channel actor exiting");
}

/// Find the engine executable: `PAWNBOT_ENGINE_PATH` first, then common
/// install locations.
fn find_engine_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PAWNBOT_ENGINE_PATH") {
        return Some(PathBuf::from(path));
    }

    let candidates = [
        "/usr/local/bin/stockfish",
        "/usr/bin/stockfish",
        "/opt/homebrew/bin/stockfish",
        "/usr/games/stockfish",
    ];
    for candidate in candidates {
        if Path::new(candidate).exists() {
            return Some(PathBuf::from(candidate));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Score;

    fn test_channel() -> (AnalysisChannel, LineSink, mpsc::Receiver<String>) {
        let (out_tx, out_rx) = mpsc::channel(64);
        let (channel, sink) = AnalysisChannel::from_line_io(out_tx);
        (channel, sink, out_rx)
    }

    #[tokio::test]
    async fn test_initialize_sends_handshake_once() {
        let (mut channel, _sink, mut out) = test_channel();
        channel.initialize().await.unwrap();
        channel.initialize().await.unwrap();
        assert_eq!(out.recv().await.as_deref(), Some("uci"));
        assert!(out.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_request_sends_stop_position_go() {
        let (mut channel, _sink, mut out) = test_channel();
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let id = channel.request_best_move(fen, 15).await.unwrap();
        assert_eq!(id, QueryId(1));

        assert_eq!(out.recv().await.as_deref(), Some("stop"));
        assert_eq!(
            out.recv().await.as_deref(),
            Some(format!("position fen {}", fen).as_str())
        );
        assert_eq!(out.recv().await.as_deref(), Some("go depth 15"));
    }

    #[tokio::test]
    async fn test_results_are_stamped_with_issuing_query() {
        let (mut channel, sink, _out) = test_channel();
        channel.request_best_move("fen-one", 15).await.unwrap();
        sink.feed("info depth 15 score cp 42 pv e2e4 e7e5").await;

        let score = channel.next_result().await.unwrap();
        assert_eq!(score.query, QueryId(1));
        assert_eq!(score.kind, ResultKind::Score(Score::Centipawns(42)));

        let best = channel.next_result().await.unwrap();
        assert_eq!(best.query, QueryId(1));
        assert_eq!(best.kind, ResultKind::BestMove("e2e4".to_string()));
    }

    #[tokio::test]
    async fn test_superseded_results_carry_stale_stamp() {
        let (mut channel, sink, _out) = test_channel();

        let first = channel.request_best_move("fen-one", 15).await.unwrap();
        // Engine output for the first query arrives before the second query
        // is issued, so it must carry the first stamp.
        sink.feed("info depth 12 score cp -50 pv d2d4").await;
        let second = channel.request_best_move("fen-two", 15).await.unwrap();
        sink.feed("info depth 15 score cp 10 pv g8f6").await;

        assert_ne!(first, second);

        // Two events from the first line: both stale.
        let stale_score = channel.next_result().await.unwrap();
        assert_eq!(stale_score.query, first);
        assert_ne!(stale_score.query, channel.current_query());

        let stale_best = channel.next_result().await.unwrap();
        assert_eq!(stale_best.query, first);

        // Two events from the second line: both current.
        let fresh_score = channel.next_result().await.unwrap();
        assert_eq!(fresh_score.query, second);
        assert_eq!(fresh_score.query, channel.current_query());

        let fresh_best = channel.next_result().await.unwrap();
        assert_eq!(fresh_best.kind, ResultKind::BestMove("g8f6".to_string()));
    }

    #[tokio::test]
    async fn test_noise_lines_produce_no_results() {
        let (mut channel, sink, _out) = test_channel();
        channel.request_best_move("fen", 15).await.unwrap();
        sink.feed("id name Stockfish 16").await;
        sink.feed("readyok").await;
        sink.feed("info depth 1 score cp 0 pv e2e4").await;

        // The first real result comes from the info line, noise was skipped.
        let result = channel.next_result().await.unwrap();
        assert_eq!(result.kind, ResultKind::Score(Score::Centipawns(0)));
    }

    #[tokio::test]
    async fn test_bestmove_line_yields_best_move() {
        let (mut channel, sink, _out) = test_channel();
        channel.request_best_move("fen", 15).await.unwrap();
        sink.feed("bestmove e7e8q ponder d1d8").await;

        let result = channel.next_result().await.unwrap();
        assert_eq!(result.kind, ResultKind::BestMove("e7e8q".to_string()));
    }
}

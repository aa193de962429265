use std::time::Duration;

use grabtris_engine::{CommitReport, ControllerState, GameOverReason, GameSession, PieceSeed};
use serde::Serialize;

/// Final report of a headless session, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Seed used for piece generation
    pub seed: PieceSeed,
    /// Session clock at the last tick
    pub elapsed_ms: u64,
    pub committed_pieces: usize,
    pub cleared_play_rows: usize,
    pub cleared_staging_rows: usize,
    pub state: ControllerState,
    pub game_over: Option<GameOverReason>,
    /// Final board, one string per row (`.` empty, `:` staging background, `|` region
    /// separator, letters for filled cells)
    pub board: Vec<String>,
}

impl SessionSummary {
    pub fn new(seed: PieceSeed, session: &GameSession) -> Self {
        let mut this = Self {
            seed,
            elapsed_ms: 0,
            committed_pieces: 0,
            cleared_play_rows: 0,
            cleared_staging_rows: 0,
            state: session.state(),
            game_over: None,
            board: vec![],
        };
        this.update(session, Duration::ZERO);
        this
    }

    pub fn record_commit(&mut self, report: &CommitReport) {
        self.committed_pieces += 1;
        self.cleared_play_rows += report.cleared.play_rows.len();
        self.cleared_staging_rows += report.cleared.staging_rows.len();
    }

    pub fn update(&mut self, session: &GameSession, now: Duration) {
        self.elapsed_ms = u64::try_from(now.as_millis()).unwrap_or(u64::MAX);
        self.state = session.state();
        self.game_over = session.game_over_reason();
        self.board = session.board().to_string().lines().map(String::from).collect();
    }
}

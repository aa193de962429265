use std::time::Duration;

use rand::Rng as _;
use serde::Serialize;

use crate::{
    ConfigError,
    core::{Board, Piece, PieceKind},
};

use super::{
    config::GameConfig,
    controller::{CommitReport, ControllerState, GameOverReason, InteractionController, PointerOutcome},
    piece_buffer::{PieceBuffer, PieceSeed, PieceSource, RandomPieceSource},
    placement::PlacementEngine,
};

/// What happened during one [`GameSession::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Piece committed by gravity during this tick.
    pub committed: Option<CommitReport>,
    /// Whether the generation interval elapsed (the spawn may have been deferred).
    pub generated: bool,
}

/// One game from the first spawn to game over.
///
/// Owns the board, the upcoming pieces and the interaction state; nothing is global. The
/// external game loop forwards pointer input and calls [`tick`](Self::tick) with a
/// monotonic timestamp measured from the start of the session.
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    board: Board,
    placement: PlacementEngine,
    controller: InteractionController,
    now: Duration,
    last_gravity: Duration,
    last_generation: Duration,
}

impl GameSession {
    /// Creates a session with a random piece sequence.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    pub fn with_seed(config: GameConfig, seed: PieceSeed) -> Result<Self, ConfigError> {
        Self::with_source(config, RandomPieceSource::with_seed(seed))
    }

    /// Creates a session drawing its pieces from `source`.
    pub fn with_source(
        config: GameConfig,
        source: impl PieceSource + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::new(config.play_width, config.staging_width, config.height);
        let mut placement =
            PlacementEngine::new(PieceBuffer::new(source, config.preview_slots()));
        let controller = InteractionController::new(&board, &mut placement, config.settle_mode);
        Ok(Self {
            config,
            board,
            placement,
            controller,
            now: Duration::ZERO,
            last_gravity: Duration::ZERO,
            last_generation: Duration::ZERO,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn active_piece(&self) -> &Piece {
        self.controller.piece()
    }

    /// Falling piece waiting for the held piece to be dropped.
    #[must_use]
    pub fn paused_piece(&self) -> Option<&Piece> {
        self.controller.paused_piece()
    }

    /// Pieces waiting on the conveyor (or the single pre-selected next piece).
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.placement.next_pieces()
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.controller.state().is_game_over()
    }

    #[must_use]
    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.controller.game_over_reason()
    }

    #[must_use]
    pub fn is_spawn_pending(&self) -> bool {
        self.controller.is_spawn_pending()
    }

    /// Advances the session to `now`.
    ///
    /// First the held piece follows the pointer, or the falling piece takes a gravity step
    /// (at most one per gravity interval). Then the next piece is forced into play if more
    /// than the generation interval has passed since the last generation. Finally the
    /// staging region is checked for overflow.
    ///
    /// A piece that starts falling waits a full gravity interval, counted from the tick
    /// (or the input) that made it fall, before its first step.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        let mut report = TickReport::default();
        if self.is_game_over() {
            return report;
        }
        self.now = now;

        match self.controller.state() {
            ControllerState::PointerHeld => {
                self.controller.follow_pointer(&self.board);
            }
            ControllerState::Falling => {
                if now.saturating_sub(self.last_gravity) >= self.config.gravity_interval() {
                    self.last_gravity = now;
                    report.committed = self
                        .controller
                        .gravity_tick(&mut self.board, &mut self.placement);
                }
            }
            ControllerState::AwaitingPickup | ControllerState::GameOver(_) => {}
        }

        if let Some(interval) = self.config.generation_interval()
            && now.saturating_sub(self.last_generation) > interval
        {
            self.last_generation = now;
            if self.controller.force_spawn(&self.board, &mut self.placement) {
                self.last_gravity = now;
            }
            report.generated = true;
        }

        self.controller.check_overflow(&self.board);
        report
    }

    pub fn pointer_moved(&mut self, x: i32, y: i32) {
        self.controller.pointer_moved(x, y);
    }

    pub fn pointer_down(&mut self, x: i32, y: i32) -> PointerOutcome {
        let was_falling = self.controller.state().is_falling();
        let outcome = self
            .controller
            .pointer_down(&mut self.board, &mut self.placement, x, y);
        self.restart_gravity(was_falling, outcome.is_dropped());
        outcome
    }

    pub fn rotate(&mut self) -> bool {
        self.controller.rotate(&self.board)
    }

    pub fn shift(&mut self, dx: i32) -> bool {
        self.controller.shift(&self.board, dx)
    }

    /// Moves the falling piece down at once, committing it if it has landed.
    pub fn soft_drop(&mut self) -> Option<CommitReport> {
        let report = self
            .controller
            .gravity_tick(&mut self.board, &mut self.placement);
        self.restart_gravity(true, report.is_some());
        report
    }

    /// Takes the piece in conveyor `slot` into the pointer. Always `false` when the
    /// session has no conveyor.
    pub fn pick_from_conveyor(&mut self, slot: usize) -> bool {
        self.config.conveyor_slots > 0
            && self
                .controller
                .pick_from_conveyor(&self.board, &mut self.placement, slot)
    }

    /// Restarts the gravity interval when an input left a different piece falling.
    fn restart_gravity(&mut self, was_falling: bool, committed: bool) {
        if self.controller.state().is_falling() && (!was_falling || committed) {
            self.last_gravity = self.now;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use crate::{
        core::{Cell, PiecePosition, is_legal_placement},
        engine::config::SettleMode,
    };

    use super::*;

    const FRAME: Duration = Duration::from_millis(33);

    fn classic_config() -> GameConfig {
        GameConfig {
            staging_width: 0,
            ..GameConfig::default()
        }
    }

    fn repeat(kind: PieceKind) -> impl PieceSource {
        move || kind
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = GameConfig {
            height: 2,
            ..GameConfig::default()
        };
        assert!(matches!(
            GameSession::with_source(config, repeat(PieceKind::O)),
            Err(ConfigError::InvalidDimension { name: "height", .. })
        ));
    }

    #[test]
    fn test_same_seed_same_pieces() {
        let seed: PieceSeed = "00112233445566778899aabbccddeeff".parse().unwrap();
        let config = GameConfig {
            conveyor_slots: 5,
            ..GameConfig::default()
        };
        let session1 = GameSession::with_seed(config.clone(), seed).unwrap();
        let session2 = GameSession::with_seed(config, seed).unwrap();
        assert_eq!(session1.active_piece(), session2.active_piece());
        assert!(session1.next_pieces().eq(session2.next_pieces()));
        assert_eq!(session1.next_pieces().count(), 5);
    }

    #[test]
    fn test_o_piece_gravity_scenario() {
        let mut session = GameSession::with_source(classic_config(), repeat(PieceKind::O)).unwrap();
        assert_eq!(session.active_piece().position(), PiecePosition::new(4, 0));

        let mut now = Duration::ZERO;
        for step in 1..=18 {
            now += FRAME;
            let report = session.tick(now);
            assert_eq!(report.committed, None);
            assert_eq!(session.active_piece().position().y(), step);
        }

        now += FRAME;
        let report = session.tick(now);
        let committed = report.committed.unwrap();
        assert_eq!(committed.piece.position(), PiecePosition::new(4, 18));
        for (x, y) in [(4, 18), (5, 18), (4, 19), (5, 19)] {
            assert_eq!(session.board().cell_at(x, y), Ok(Cell::Filled(PieceKind::O)));
        }
        assert_eq!(session.active_piece().position(), PiecePosition::new(4, 0));
        assert!(session.state().is_falling());
    }

    #[test]
    fn test_gravity_waits_for_interval() {
        let mut session = GameSession::with_source(classic_config(), repeat(PieceKind::T)).unwrap();
        session.tick(Duration::from_millis(10));
        session.tick(Duration::from_millis(32));
        assert_eq!(session.active_piece().position().y(), 0);
        session.tick(Duration::from_millis(33));
        assert_eq!(session.active_piece().position().y(), 1);
        session.tick(Duration::from_millis(40));
        assert_eq!(session.active_piece().position().y(), 1);
    }

    #[test]
    fn test_drag_and_drop_round() {
        let mut session =
            GameSession::with_source(GameConfig::default(), repeat(PieceKind::T)).unwrap();
        assert_eq!(session.active_piece().position(), PiecePosition::new(11, 0));

        assert_eq!(session.pointer_down(12, 1), PointerOutcome::PickedUp);
        session.pointer_moved(3, 17);
        session.tick(FRAME);
        assert_eq!(session.active_piece().position(), PiecePosition::new(3, 17));

        assert!(session.rotate());
        assert_eq!(session.pointer_down(12, 17), PointerOutcome::Rejected);
        assert!(session.pointer_down(3, 17).is_dropped());
        // Rotated T: column 3 rows 17..20 plus (4, 18).
        for (x, y) in [(3, 17), (3, 18), (4, 18), (3, 19)] {
            assert_eq!(session.board().cell_at(x, y), Ok(Cell::Filled(PieceKind::T)));
        }
        assert!(session.state().is_falling());
        assert_eq!(session.active_piece().position(), PiecePosition::new(11, 0));
    }

    #[test]
    fn test_generation_interval_is_strict() {
        let config = GameConfig {
            generation_interval_ms: Some(1000),
            settle_mode: SettleMode::AwaitPickup,
            ..GameConfig::default()
        };
        let mut session = GameSession::with_source(config, repeat(PieceKind::O)).unwrap();
        session.pointer_down(11, 0);
        assert!(session.pointer_down(0, 18).is_dropped());
        assert!(session.state().is_awaiting_pickup());

        let report = session.tick(Duration::from_millis(1000));
        assert!(!report.generated);
        assert!(session.state().is_awaiting_pickup());

        let report = session.tick(Duration::from_millis(1001));
        assert!(report.generated);
        assert!(session.state().is_falling());
        assert_eq!(session.active_piece().position(), PiecePosition::new(11, 0));
        assert_eq!(session.board().cell_at(0, 18), Ok(Cell::Filled(PieceKind::O)));
    }

    #[test]
    fn test_generation_deferred_while_falling() {
        let config = GameConfig {
            staging_width: 0,
            gravity_interval_ms: 10_000,
            generation_interval_ms: Some(100),
            settle_mode: SettleMode::AwaitPickup,
            ..GameConfig::default()
        };
        let mut kinds = [PieceKind::I, PieceKind::O].into_iter().cycle();
        let mut session =
            GameSession::with_source(config, move || kinds.next().unwrap_or(PieceKind::T)).unwrap();
        let first = *session.active_piece();

        let report = session.tick(Duration::from_millis(101));
        assert!(report.generated);
        assert!(session.is_spawn_pending());
        assert_eq!(session.active_piece(), &first);

        while session.soft_drop().is_none() {}
        assert!(session.state().is_falling());
        assert_eq!(session.active_piece().kind(), PieceKind::O);
        assert!(!session.is_spawn_pending());
    }

    #[test]
    fn test_staging_overflow_is_game_over() {
        let mut session =
            GameSession::with_source(GameConfig::default(), repeat(PieceKind::I)).unwrap();
        let mut commits = 0;
        for _ in 0..1000 {
            if session.is_game_over() {
                break;
            }
            if session.soft_drop().is_some() {
                commits += 1;
            }
        }
        // Flat I fills a whole staging row, which resets at once; the pile never grows.
        assert!(!session.is_game_over());
        assert!(commits > 0);
        assert!(session.board().rows().flatten().all(|c| c.is_vacant()));

        let mut session =
            GameSession::with_source(GameConfig::default(), repeat(PieceKind::S)).unwrap();
        while !session.is_game_over() {
            session.soft_drop();
        }
        assert_eq!(
            session.game_over_reason(),
            Some(GameOverReason::StagingOverflow)
        );
        assert_eq!(session.tick(Duration::from_secs(60)), TickReport::default());
        assert_eq!(session.pointer_down(11, 0), PointerOutcome::Ignored);
    }

    #[test]
    fn test_conveyor_pick() {
        let config = GameConfig {
            settle_mode: SettleMode::AwaitPickup,
            conveyor_slots: 3,
            ..GameConfig::default()
        };
        let mut kinds = [PieceKind::I, PieceKind::O, PieceKind::T, PieceKind::L].into_iter();
        let mut session =
            GameSession::with_source(config, move || kinds.next().unwrap_or(PieceKind::Z)).unwrap();
        assert_eq!(
            session.next_pieces().collect::<Vec<_>>(),
            [PieceKind::O, PieceKind::T, PieceKind::L]
        );

        session.pointer_down(10, 0);
        assert!(!session.pick_from_conveyor(0));
        assert!(session.pointer_down(6, 19).is_dropped());

        session.pointer_moved(0, 18);
        assert!(session.pick_from_conveyor(0));
        assert_eq!(session.active_piece().kind(), PieceKind::O);
        session.tick(FRAME);
        assert_eq!(session.active_piece().position(), PiecePosition::new(0, 18));
        assert!(session.pointer_down(0, 18).is_dropped());
        assert_eq!(
            session.next_pieces().collect::<Vec<_>>(),
            [PieceKind::T, PieceKind::L, PieceKind::Z]
        );
    }

    #[test]
    fn test_conveyor_pick_needs_conveyor() {
        let mut session =
            GameSession::with_source(GameConfig::default(), repeat(PieceKind::T)).unwrap();
        assert!(!session.pick_from_conveyor(0));
        assert!(session.state().is_falling());
        assert_eq!(session.next_pieces().count(), 1);
    }

    #[test]
    fn test_extreme_input_is_rejected() {
        let mut session =
            GameSession::with_source(GameConfig::default(), repeat(PieceKind::S)).unwrap();
        assert!(!session.shift(i32::MAX));
        assert!(!session.shift(i32::MIN));

        assert_eq!(session.pointer_down(11, 0), PointerOutcome::PickedUp);
        assert_eq!(session.pointer_down(i32::MAX, 0), PointerOutcome::Rejected);
        assert_eq!(session.pointer_down(0, i32::MAX), PointerOutcome::Rejected);
        session.pointer_moved(i32::MIN, i32::MIN);
        session.tick(FRAME);
        assert_eq!(session.active_piece().position(), PiecePosition::new(11, 0));
        assert!(session.pointer_down(0, 18).is_dropped());
    }

    #[test]
    fn test_piece_spawned_by_drop_waits_full_gravity_interval() {
        let mut session =
            GameSession::with_source(GameConfig::default(), repeat(PieceKind::T)).unwrap();
        assert_eq!(session.pointer_down(12, 1), PointerOutcome::PickedUp);
        session.pointer_moved(3, 18);
        session.tick(Duration::from_millis(330));
        assert!(session.pointer_down(3, 18).is_dropped());
        assert_eq!(session.active_piece().position(), PiecePosition::new(11, 0));

        session.tick(Duration::from_millis(340));
        assert_eq!(session.active_piece().position().y(), 0);
        session.tick(Duration::from_millis(363));
        assert_eq!(session.active_piece().position().y(), 1);
    }

    #[test]
    fn test_random_input_keeps_board_and_piece_consistent() {
        const COORDS: [i32; 6] = [i32::MIN, -1, 0, 9, 13, i32::MAX];

        for settle_mode in [SettleMode::Respawn, SettleMode::AwaitPickup] {
            let config = GameConfig {
                generation_interval_ms: Some(500),
                settle_mode,
                conveyor_slots: 3,
                ..GameConfig::default()
            };
            let seed = PieceSeed::from_bytes([7; 16]);
            let mut session = GameSession::with_seed(config.clone(), seed).unwrap();
            let mut rng = Pcg32::seed_from_u64(42);
            let mut now = Duration::ZERO;
            let mut games = 0;

            for step in 0..5000 {
                if session.is_game_over() {
                    games += 1;
                    session = GameSession::with_seed(config.clone(), rng.random()).unwrap();
                    now = Duration::ZERO;
                }
                let filled_before = filled_count(session.board());
                let coord = |rng: &mut Pcg32| {
                    if rng.random_bool(0.1) {
                        COORDS[rng.random_range(0..COORDS.len())]
                    } else {
                        rng.random_range(-2..16)
                    }
                };

                let committed = match rng.random_range(0..8) {
                    0 | 1 => {
                        now += Duration::from_millis(rng.random_range(0..80));
                        session.tick(now).committed
                    }
                    2 => {
                        let (x, y) = (coord(&mut rng), coord(&mut rng));
                        match session.pointer_down(x, y) {
                            PointerOutcome::Dropped(report) => Some(report),
                            _ => None,
                        }
                    }
                    3 => {
                        let (x, y) = (coord(&mut rng), coord(&mut rng));
                        session.pointer_moved(x, y);
                        None
                    }
                    4 => {
                        session.rotate();
                        None
                    }
                    5 => {
                        session.shift(coord(&mut rng));
                        None
                    }
                    6 => session.soft_drop(),
                    _ => {
                        session.pick_from_conveyor(rng.random_range(0..4));
                        None
                    }
                };

                let board = session.board();
                assert_eq!((board.width(), board.height()), (14, 20), "step {step}");
                if matches!(
                    session.state(),
                    ControllerState::Falling | ControllerState::PointerHeld
                ) {
                    let piece = session.active_piece();
                    assert!(is_legal_placement(board, piece), "step {step}: {piece:?}");
                }
                if let Some(report) = committed
                    && report.cleared.is_empty()
                {
                    // Committed cells landed on vacant cells only.
                    assert_eq!(
                        filled_count(board),
                        filled_before + report.piece.shape().cell_count(),
                        "step {step}"
                    );
                }
            }
            assert!(games < 5000);
        }
    }

    fn filled_count(board: &Board) -> usize {
        board.rows().flatten().filter(|c| c.is_filled()).count()
    }
}

use serde::Serialize;

use crate::core::{Board, ClearedLines, Piece, PiecePosition, Region, Shape, is_legal_placement};

use super::{config::SettleMode, placement::PlacementEngine};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum GameOverReason {
    /// A committed piece reached the top row of the staging region.
    #[display("staging region overflowed")]
    StagingOverflow,
    /// A newly generated piece could not be placed at its spawn position.
    #[display("no room to spawn the next piece")]
    SpawnBlocked,
}

/// Who currently controls the active piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerState {
    /// The piece moves down one row per gravity tick.
    Falling,
    /// The piece follows the pointer until it is dropped.
    PointerHeld,
    /// The piece has been committed but may still be picked up and moved again.
    AwaitingPickup,
    /// Terminal state; every input is ignored.
    GameOver(GameOverReason),
}

/// A piece written into the board, with the rows cleared as a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub piece: Piece,
    pub cleared: ClearedLines,
}

/// Result of a pointer press.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::IsVariant)]
pub enum PointerOutcome {
    /// Nothing to pick up or drop at that cell.
    Ignored,
    /// The active piece, or a block lifted off the board, is now held by the pointer.
    PickedUp,
    /// The held piece was committed at the pointer cell.
    Dropped(CommitReport),
    /// The held piece cannot go there; it stays held at its previous anchor.
    Rejected,
}

/// State machine deciding whether the active piece is falling or pointer-controlled.
///
/// ```text
///              pointer down in bbox               pointer down, legal
///   Falling ─────────────────────────▶ PointerHeld ───────────────────▶ commit
///      ▲                                    ▲                             │
///      │ spawn                              │ pointer down in bbox        │
///      │                                    │ (lifts the piece)           ▼
///      └───────── generation ────── AwaitingPickup ◀──── await-pickup settle mode
/// ```
///
/// Any commit may end the game ([`ControllerState::GameOver`]) when the staging region
/// overflows or the next piece has no room to spawn.
///
/// Besides the active piece, the pointer can take a single filled block off the board or
/// a piece off the conveyor. A falling piece is paused meanwhile and resumes falling once
/// the held piece has been dropped, unless the drop left it no room.
///
/// The controller owns only the active piece; the board and the placement engine are
/// passed into every operation.
#[derive(Debug, Clone)]
pub struct InteractionController {
    state: ControllerState,
    piece: Piece,
    pointer: Option<PiecePosition>,
    paused: Option<Piece>,
    settle_mode: SettleMode,
    spawn_pending: bool,
}

impl InteractionController {
    /// Spawns the first piece and starts in [`ControllerState::Falling`].
    pub fn new(board: &Board, placement: &mut PlacementEngine, settle_mode: SettleMode) -> Self {
        let piece = placement.spawn_next(board);
        let mut this = Self {
            state: ControllerState::Falling,
            piece,
            pointer: None,
            paused: None,
            settle_mode,
            spawn_pending: false,
        };
        this.enter(board, piece, ControllerState::Falling);
        this
    }

    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The active piece: falling, held, or the last committed one while awaiting pickup.
    #[must_use]
    pub fn piece(&self) -> &Piece {
        &self.piece
    }

    /// Falling piece set aside while another piece is held.
    #[must_use]
    pub fn paused_piece(&self) -> Option<&Piece> {
        self.paused.as_ref()
    }

    /// Last cell reported by the pointer.
    #[must_use]
    pub fn pointer(&self) -> Option<PiecePosition> {
        self.pointer
    }

    /// Whether a forced generation is waiting for the active piece to be committed.
    #[must_use]
    pub fn is_spawn_pending(&self) -> bool {
        self.spawn_pending
    }

    #[must_use]
    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        match self.state {
            ControllerState::GameOver(reason) => Some(reason),
            _ => None,
        }
    }

    /// Records the cell under the pointer. A held piece moves there on the next
    /// [`follow_pointer`](Self::follow_pointer).
    pub fn pointer_moved(&mut self, x: i32, y: i32) {
        self.pointer = Some(PiecePosition::new(x, y));
    }

    /// Handles a pointer press at cell `(x, y)`.
    ///
    /// Pressing inside the active piece's bounding box picks it up. Pressing any other
    /// filled cell lifts that single block off the board and holds it as a one-cell piece
    /// of the same kind. Pressing while holding a piece tries to drop it with its anchor at
    /// the pressed cell; the drop is accepted only if the anchor lies in the play region and
    /// the placement is legal.
    pub fn pointer_down(
        &mut self,
        board: &mut Board,
        placement: &mut PlacementEngine,
        x: i32,
        y: i32,
    ) -> PointerOutcome {
        self.pointer_moved(x, y);
        match self.state {
            ControllerState::Falling | ControllerState::AwaitingPickup => {
                if self.piece.bounding_box_contains(x, y) {
                    if self.state.is_awaiting_pickup() {
                        board.lift_piece(&self.piece);
                    }
                    self.state = ControllerState::PointerHeld;
                    return PointerOutcome::PickedUp;
                }
                let Some(kind) = board.lift_cell(x, y) else {
                    return PointerOutcome::Ignored;
                };
                let block = Piece::new(Shape::monomino(kind), PiecePosition::new(x, y));
                self.hold(board, block);
                PointerOutcome::PickedUp
            }
            ControllerState::PointerHeld => {
                if !board.region_at(x).is_some_and(|region| region.is_play()) {
                    return PointerOutcome::Rejected;
                }
                let candidate = self.piece.moved_to(PiecePosition::new(x, y));
                match self.commit(board, placement, candidate) {
                    Some(report) => PointerOutcome::Dropped(report),
                    None => PointerOutcome::Rejected,
                }
            }
            ControllerState::GameOver(_) => PointerOutcome::Ignored,
        }
    }

    /// Rotates a falling or held piece. Returns whether the rotation was applied.
    pub fn rotate(&mut self, board: &Board) -> bool {
        match self.state {
            ControllerState::Falling | ControllerState::PointerHeld => self.piece.rotate(board),
            ControllerState::AwaitingPickup | ControllerState::GameOver(_) => false,
        }
    }

    /// Moves a falling piece sideways by `dx` columns.
    pub fn shift(&mut self, board: &Board, dx: i32) -> bool {
        self.state.is_falling() && self.piece.move_by(board, dx, 0)
    }

    /// Moves a falling piece one row down, committing it when it cannot move.
    pub fn gravity_tick(
        &mut self,
        board: &mut Board,
        placement: &mut PlacementEngine,
    ) -> Option<CommitReport> {
        if !self.state.is_falling() || self.piece.gravity_step(board) {
            return None;
        }
        let piece = self.piece;
        self.commit(board, placement, piece)
    }

    /// Moves a held piece to the last pointer cell if that placement is legal.
    pub fn follow_pointer(&mut self, board: &Board) -> bool {
        let Some(target) = self.pointer else {
            return false;
        };
        self.state.is_pointer_held()
            && self.piece.position() != target
            && self.piece.move_to(board, target)
    }

    /// Takes a piece from conveyor `slot` into the pointer at its spawn position.
    ///
    /// A piece awaiting pickup is released and stays on the board; a falling piece is
    /// paused until the taken piece has been dropped. Not possible while a piece is held.
    /// Returns whether a piece was taken.
    pub fn pick_from_conveyor(
        &mut self,
        board: &Board,
        placement: &mut PlacementEngine,
        slot: usize,
    ) -> bool {
        if !matches!(
            self.state,
            ControllerState::Falling | ControllerState::AwaitingPickup
        ) {
            return false;
        }
        let Some(piece) = placement.spawn_from_conveyor(board, slot) else {
            return false;
        };
        self.hold(board, piece);
        true
    }

    /// Forces the next piece into play.
    ///
    /// A piece awaiting pickup is released and the next one spawns at once. A falling or
    /// held piece is never replaced: the spawn is deferred until it has been committed.
    /// Returns whether a piece spawned now.
    pub fn force_spawn(&mut self, board: &Board, placement: &mut PlacementEngine) -> bool {
        match self.state {
            ControllerState::AwaitingPickup => {
                self.spawn(board, placement);
                true
            }
            ControllerState::Falling | ControllerState::PointerHeld => {
                self.spawn_pending = true;
                false
            }
            ControllerState::GameOver(_) => false,
        }
    }

    /// Ends the game if committed cells reached the top row of the staging region.
    pub fn check_overflow(&mut self, board: &Board) -> bool {
        if self.state.is_game_over() {
            return true;
        }
        if board.has_staging() && board.is_region_overflowed(Region::Staging) {
            self.state = ControllerState::GameOver(GameOverReason::StagingOverflow);
            return true;
        }
        false
    }

    fn commit(
        &mut self,
        board: &mut Board,
        placement: &mut PlacementEngine,
        piece: Piece,
    ) -> Option<CommitReport> {
        let cleared = PlacementEngine::commit(board, &piece).ok()?;
        self.piece = piece;
        if self.check_overflow(board) {
            return Some(CommitReport { piece, cleared });
        }
        if let Some(paused) = self.paused.take()
            && is_legal_placement(board, &paused)
        {
            self.piece = paused;
            self.state = ControllerState::Falling;
            return Some(CommitReport { piece, cleared });
        }
        let keep_piece = self.settle_mode == SettleMode::AwaitPickup
            && cleared.is_empty()
            && !self.spawn_pending;
        if keep_piece {
            self.state = ControllerState::AwaitingPickup;
        } else {
            self.spawn(board, placement);
        }
        Some(CommitReport { piece, cleared })
    }

    /// Puts `piece` into the pointer, pausing the falling piece if there is one.
    fn hold(&mut self, board: &Board, piece: Piece) {
        if self.state.is_falling() {
            self.paused = Some(self.piece);
        }
        self.enter(board, piece, ControllerState::PointerHeld);
    }

    fn spawn(&mut self, board: &Board, placement: &mut PlacementEngine) {
        self.spawn_pending = false;
        let piece = placement.spawn_next(board);
        self.enter(board, piece, ControllerState::Falling);
    }

    fn enter(&mut self, board: &Board, piece: Piece, state: ControllerState) {
        self.piece = piece;
        self.state = if is_legal_placement(board, &piece) {
            state
        } else {
            ControllerState::GameOver(GameOverReason::SpawnBlocked)
        };
    }
}

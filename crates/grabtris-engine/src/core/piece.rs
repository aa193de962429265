use serde::{Deserialize, Serialize};

use super::{
    board::Board,
    collision::is_legal_placement,
    shape::{PieceKind, Shape},
};

/// A piece (tetromino) at a position on the board in its current orientation.
///
/// Movement and rotation come in two flavours:
///
/// - [`moved_by`](Self::moved_by), [`moved_to`](Self::moved_to) and
///   [`rotated`](Self::rotated) return a candidate piece without looking at the board
/// - [`move_by`](Self::move_by), [`move_to`](Self::move_to), [`rotate`](Self::rotate)
///   and [`gravity_step`](Self::gravity_step) apply the candidate only if it is a legal
///   placement, leaving the piece untouched otherwise
///
/// # Coordinate System
///
/// The position is the top-left corner of the shape's bounding box. It may lie outside
/// the board (e.g. while following a pointer); legality is decided per occupied cell.
/// Coordinates saturate at the bounds of `i32`, so a saturated cell is always off the
/// board and the placement is illegal.
///
/// # Example
///
/// ```
/// use grabtris_engine::{Board, Piece, PieceKind, PiecePosition};
///
/// let board = Board::new(10, 0, 20);
/// let mut piece = Piece::new(PieceKind::T.shape(), PiecePosition::new(4, 0));
///
/// assert!(piece.move_by(&board, 1, 0));
/// assert!(piece.rotate(&board));
/// assert!(!piece.move_by(&board, 0, -1)); // would leave the board
/// assert_eq!(piece.position(), PiecePosition::new(5, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Piece {
    shape: Shape,
    position: PiecePosition,
}

impl Piece {
    #[must_use]
    pub const fn new(shape: Shape, position: PiecePosition) -> Self {
        Self { shape, position }
    }

    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.shape.kind()
    }

    #[must_use]
    pub const fn position(&self) -> PiecePosition {
        self.position
    }

    /// Iterates over the board coordinates of the occupied cells.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let PiecePosition { x, y } = self.position;
        self.shape
            .cells()
            .map(move |(dx, dy)| (x.saturating_add(offset(dx)), y.saturating_add(offset(dy))))
    }

    /// Returns whether `(x, y)` lies inside the piece's bounding box.
    #[must_use]
    pub fn bounding_box_contains(&self, x: i32, y: i32) -> bool {
        let PiecePosition { x: x0, y: y0 } = self.position;
        (x0..x0.saturating_add(offset(self.shape.width()))).contains(&x)
            && (y0..y0.saturating_add(offset(self.shape.height()))).contains(&y)
    }

    #[must_use]
    pub const fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            shape: self.shape,
            position: PiecePosition::new(
                self.position.x.saturating_add(dx),
                self.position.y.saturating_add(dy),
            ),
        }
    }

    #[must_use]
    pub const fn moved_to(&self, position: PiecePosition) -> Self {
        Self {
            shape: self.shape,
            position,
        }
    }

    /// Returns the piece turned a quarter turn around its unchanged anchor.
    #[must_use]
    pub const fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated(),
            position: self.position,
        }
    }

    /// Moves the piece by `(dx, dy)` if the result is legal. Returns whether it moved.
    pub fn move_by(&mut self, board: &Board, dx: i32, dy: i32) -> bool {
        self.try_replace(board, self.moved_by(dx, dy))
    }

    /// Moves the piece to `position` if the result is legal. Returns whether it moved.
    pub fn move_to(&mut self, board: &Board, position: PiecePosition) -> bool {
        self.try_replace(board, self.moved_to(position))
    }

    /// Rotates the piece in place if the rotated shape is legal at the current anchor.
    ///
    /// No wall kicks are attempted: a colliding rotation is simply rejected.
    pub fn rotate(&mut self, board: &Board) -> bool {
        self.try_replace(board, self.rotated())
    }

    /// Moves the piece one row down. Returns `false` when it has settled.
    pub fn gravity_step(&mut self, board: &Board) -> bool {
        self.move_by(board, 0, 1)
    }

    fn try_replace(&mut self, board: &Board, candidate: Self) -> bool {
        if !is_legal_placement(board, &candidate) {
            return false;
        }
        *self = candidate;
        true
    }
}

#[expect(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
const fn offset(d: usize) -> i32 {
    // Shape offsets never exceed `Shape::MAX_SIZE`.
    d as i32
}

/// Anchor of a piece: the top-left corner of its bounding box in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PiecePosition {
    x: i32,
    y: i32,
}

impl PiecePosition {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(self) -> i32 {
        self.y
    }
}

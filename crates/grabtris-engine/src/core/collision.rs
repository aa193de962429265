use super::{board::Board, piece::Piece};

/// Returns whether `piece` may occupy its current cells on `board`.
///
/// A placement is illegal when any occupied cell lies at a negative coordinate, at or
/// beyond the board width or height, or on a [`Filled`](super::board::Cell::Filled) cell.
/// Vacant cells of either region (`Empty` and `StagingBackground`) are free.
///
/// Every move, rotation, drop and commit routes through this check.
#[must_use]
pub fn is_legal_placement(board: &Board, piece: &Piece) -> bool {
    piece
        .occupied_positions()
        .all(|(x, y)| board.cell_at(x, y).is_ok_and(|cell| cell.is_vacant()))
}

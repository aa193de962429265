use crate::{
    PlacementError,
    core::{Board, ClearedLines, Piece, PieceKind, PiecePosition, Region, Shape, is_legal_placement},
};

use super::piece_buffer::PieceBuffer;

/// Writes pieces into the board and hands out the next ones.
#[derive(Debug)]
pub struct PlacementEngine {
    piece_buffer: PieceBuffer,
}

impl PlacementEngine {
    #[must_use]
    pub fn new(piece_buffer: PieceBuffer) -> Self {
        Self { piece_buffer }
    }

    /// Fills the cells of `piece` and clears every full row.
    ///
    /// The placement is re-checked first; an illegal piece leaves the board untouched.
    pub fn commit(board: &mut Board, piece: &Piece) -> Result<ClearedLines, PlacementError> {
        if !is_legal_placement(board, piece) {
            return Err(PlacementError::IllegalPlacement);
        }
        board.fill_piece(piece);
        Ok(board.clear_lines())
    }

    /// Returns the anchor where a freshly generated `shape` appears.
    ///
    /// The shape is centred on the top row of the staging region, or of the play region
    /// when the board has no staging.
    #[must_use]
    pub fn spawn_position(board: &Board, shape: &Shape) -> PiecePosition {
        let region = if board.has_staging() {
            Region::Staging
        } else {
            Region::Play
        };
        let columns = board.columns(region);
        let x = (columns.start + columns.len() / 2).saturating_sub(shape.width() / 2);
        PiecePosition::new(i32::try_from(x).unwrap_or(i32::MAX), 0)
    }

    /// Draws the pre-selected piece and places it at its spawn position.
    ///
    /// The returned piece is not validated; an illegal spawn means the board is full.
    pub fn spawn_next(&mut self, board: &Board) -> Piece {
        let kind = self.piece_buffer.pop_next();
        Self::spawn(board, kind)
    }

    /// Takes the piece in conveyor `slot` and places it at its spawn position.
    pub fn spawn_from_conveyor(&mut self, board: &Board, slot: usize) -> Option<Piece> {
        let kind = self.piece_buffer.take(slot)?;
        Some(Self::spawn(board, kind))
    }

    fn spawn(board: &Board, kind: PieceKind) -> Piece {
        let shape = kind.shape();
        Piece::new(shape, Self::spawn_position(board, &shape))
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.piece_buffer.next_pieces()
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Cell;

    use super::*;

    fn engine(kinds: &'static [PieceKind], slots: usize) -> PlacementEngine {
        let mut i = 0;
        let source = move || {
            let kind = kinds[i % kinds.len()];
            i += 1;
            kind
        };
        PlacementEngine::new(PieceBuffer::new(source, slots))
    }

    #[test]
    fn test_commit_fills_cells() {
        let mut board = Board::new(10, 0, 20);
        let piece = Piece::new(PieceKind::O.shape(), PiecePosition::new(4, 18));
        let cleared = PlacementEngine::commit(&mut board, &piece).unwrap();
        assert!(cleared.is_empty());
        for (x, y) in [(4, 18), (5, 18), (4, 19), (5, 19)] {
            assert_eq!(board.cell_at(x, y), Ok(Cell::Filled(PieceKind::O)));
        }
        let filled = board.rows().flatten().filter(|c| c.is_filled()).count();
        assert_eq!(filled, 4);
    }

    #[test]
    fn test_commit_rejects_illegal_placement() {
        let mut board = Board::from_ascii(
            4,
            0,
            4,
            "
            ....
            .TTT
            ",
        );
        let before = board.clone();
        let piece = Piece::new(PieceKind::O.shape(), PiecePosition::new(1, 2));
        assert_eq!(
            PlacementEngine::commit(&mut board, &piece),
            Err(PlacementError::IllegalPlacement)
        );
        assert_eq!(board, before);

        let piece = Piece::new(PieceKind::O.shape(), PiecePosition::new(3, 0));
        assert!(PlacementEngine::commit(&mut board, &piece).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_commit_clears_bottom_row() {
        let mut board = Board::from_ascii(
            10,
            0,
            20,
            "
            ..........
            ..........
            ..........
            .ZZSSTTJJL
            ",
        );
        let piece = Piece::new(PieceKind::I.shape().rotated(), PiecePosition::new(0, 16));
        let cleared = PlacementEngine::commit(&mut board, &piece).unwrap();
        assert_eq!(cleared.play_rows, [19]);
        assert!(cleared.staging_rows.is_empty());

        let expected = Board::from_ascii(
            10,
            0,
            20,
            "
            I.........
            I.........
            I.........
            ",
        );
        assert_eq!(board, expected);
    }

    #[test]
    fn test_commit_in_staging_region_resets_full_staging_row() {
        let mut board = Board::from_ascii(
            4,
            4,
            4,
            "
            ....|::::
            ....|::::
            ....|::::
            ....|ZZ::
            ",
        );
        let piece = Piece::new(PieceKind::S.shape(), PiecePosition::new(5, 2));
        // S would cover (5, 3), which the Z already fills.
        let cleared = PlacementEngine::commit(&mut board, &piece);
        assert_eq!(cleared, Err(PlacementError::IllegalPlacement));

        let piece = Piece::new(PieceKind::O.shape(), PiecePosition::new(6, 2));
        let cleared = PlacementEngine::commit(&mut board, &piece).unwrap();
        assert_eq!(cleared.staging_rows, [3]);
        assert!(cleared.play_rows.is_empty());
        assert_eq!(board.cell_at(6, 2), Ok(Cell::Filled(PieceKind::O)));
        assert_eq!(board.cell_at(7, 2), Ok(Cell::Filled(PieceKind::O)));
        for x in 4..8 {
            assert_eq!(board.cell_at(x, 3), Ok(Cell::StagingBackground));
        }
    }

    #[test]
    fn test_spawn_position_centres_over_staging() {
        let board = Board::new(10, 4, 20);
        let at = |kind: PieceKind| PlacementEngine::spawn_position(&board, &kind.shape());
        assert_eq!(at(PieceKind::I), PiecePosition::new(10, 0));
        assert_eq!(at(PieceKind::O), PiecePosition::new(11, 0));
        assert_eq!(at(PieceKind::T), PiecePosition::new(11, 0));
    }

    #[test]
    fn test_spawn_position_without_staging() {
        let board = Board::new(10, 0, 20);
        let at = |kind: PieceKind| PlacementEngine::spawn_position(&board, &kind.shape());
        assert_eq!(at(PieceKind::I), PiecePosition::new(3, 0));
        assert_eq!(at(PieceKind::O), PiecePosition::new(4, 0));
        assert_eq!(at(PieceKind::L), PiecePosition::new(4, 0));
    }

    #[test]
    fn test_spawn_next_draws_one_step_ahead() {
        let board = Board::new(10, 0, 20);
        let mut engine = engine(&[PieceKind::T, PieceKind::J, PieceKind::I], 1);
        assert_eq!(engine.next_pieces().collect::<Vec<_>>(), [PieceKind::T]);

        let piece = engine.spawn_next(&board);
        assert_eq!(piece.kind(), PieceKind::T);
        assert_eq!(piece.position(), PiecePosition::new(4, 0));
        assert_eq!(engine.next_pieces().collect::<Vec<_>>(), [PieceKind::J]);
    }

    #[test]
    fn test_spawn_from_conveyor() {
        let board = Board::new(10, 4, 20);
        let mut engine = engine(&[PieceKind::T, PieceKind::J, PieceKind::I], 3);

        let piece = engine.spawn_from_conveyor(&board, 2).unwrap();
        assert_eq!(piece.kind(), PieceKind::I);
        assert_eq!(piece.position(), PiecePosition::new(10, 0));
        assert_eq!(
            engine.next_pieces().collect::<Vec<_>>(),
            [PieceKind::T, PieceKind::J, PieceKind::T]
        );
        assert!(engine.spawn_from_conveyor(&board, 3).is_none());
    }
}

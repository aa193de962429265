use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};

use crate::OutOfBoundsError;

use super::{piece::Piece, shape::PieceKind};

/// State of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Cell {
    /// Vacant play-region cell.
    #[default]
    Empty,
    /// Vacant staging-region cell.
    StagingBackground,
    /// Cell occupied by a committed piece of the given kind.
    Filled(PieceKind),
}

impl Cell {
    #[must_use]
    pub fn is_filled(self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    #[must_use]
    pub fn is_vacant(self) -> bool {
        !self.is_filled()
    }

    const fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::StagingBackground => ':',
            Cell::Filled(kind) => kind.as_char(),
        }
    }
}

/// Column partition of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum Region {
    /// Columns `0..play_width`, where pieces are finally placed and lines clear.
    Play,
    /// Columns `play_width..play_width + staging_width`, where new pieces arrive.
    Staging,
}

/// Rows removed or reset by a single line-clear pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearedLines {
    /// Play-region rows removed, as indices before the shift (bottom to top).
    pub play_rows: Vec<usize>,
    /// Staging-region rows reset to background (bottom to top).
    pub staging_rows: Vec<usize>,
}

impl ClearedLines {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.play_rows.is_empty() && self.staging_rows.is_empty()
    }
}

/// Fixed-size occupancy grid, optionally split into a play region and a staging region.
///
/// # Coordinate System
///
/// - `(0, 0)` is the top-left cell
/// - X increases rightward, Y increases downward
/// - Play region occupies columns `0..play_width`, staging region the remaining
///   `staging_width` columns on the right
///
/// Cells are stored row-major in a flat vector. Dimensions never change after
/// construction.
///
/// # Line clearing
///
/// The two regions clear independently:
///
/// - a full play-region row is removed and the play columns above it shift down by one,
///   staging columns stay where they are
/// - a full staging-region row is reset in place to [`Cell::StagingBackground`]
///
/// # Example
///
/// ```
/// use grabtris_engine::{Board, Cell, PieceKind};
///
/// let mut board = Board::new(10, 4, 20);
/// assert_eq!(board.cell_at(3, 19), Ok(Cell::Empty));
/// assert_eq!(board.cell_at(12, 0), Ok(Cell::StagingBackground));
/// assert!(board.cell_at(14, 0).is_err());
///
/// board.set_cell(3, 19, Cell::Filled(PieceKind::T));
/// assert!(board.cell_at(3, 19).unwrap().is_filled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    play_width: usize,
    staging_width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates an empty board.
    ///
    /// # Panics
    ///
    /// Panics if `play_width` or `height` is zero.
    #[must_use]
    pub fn new(play_width: usize, staging_width: usize, height: usize) -> Self {
        assert!(play_width > 0, "play region must have at least one column");
        assert!(height > 0, "board must have at least one row");
        let width = play_width + staging_width;
        let mut board = Self {
            play_width,
            staging_width,
            height,
            cells: vec![Cell::Empty; width * height],
        };
        for y in 0..height {
            board.row_mut(y)[play_width..].fill(Cell::StagingBackground);
        }
        board
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.play_width + self.staging_width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn play_width(&self) -> usize {
        self.play_width
    }

    #[must_use]
    pub fn staging_width(&self) -> usize {
        self.staging_width
    }

    #[must_use]
    pub fn has_staging(&self) -> bool {
        self.staging_width > 0
    }

    /// Returns the columns covered by `region`.
    #[must_use]
    pub fn columns(&self, region: Region) -> Range<usize> {
        match region {
            Region::Play => 0..self.play_width,
            Region::Staging => self.play_width..self.width(),
        }
    }

    /// Returns the region owning column `x`, or `None` outside the board.
    #[must_use]
    pub fn region_at(&self, x: i32) -> Option<Region> {
        let x = usize::try_from(x).ok()?;
        if x < self.play_width {
            Some(Region::Play)
        } else if x < self.width() {
            Some(Region::Staging)
        } else {
            None
        }
    }

    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width() && y < self.height).then(|| y * self.width() + x)
    }

    fn row(&self, y: usize) -> &[Cell] {
        let width = self.width();
        &self.cells[y * width..][..width]
    }

    fn row_mut(&mut self, y: usize) -> &mut [Cell] {
        let width = self.width();
        &mut self.cells[y * width..][..width]
    }

    /// Returns the state of cell `(x, y)`.
    pub fn cell_at(&self, x: i32, y: i32) -> Result<Cell, OutOfBoundsError> {
        self.index(x, y)
            .map(|i| self.cells[i])
            .ok_or(OutOfBoundsError { x, y })
    }

    /// Overwrites cell `(x, y)` without any validation.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the board.
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        assert!(x < self.width() && y < self.height, "({x}, {y}) is outside the board");
        let width = self.width();
        self.cells[y * width + x] = cell;
    }

    /// Returns the vacant state of column `x` (`Empty` or `StagingBackground`).
    fn vacant_cell(&self, x: usize) -> Cell {
        if x < self.play_width {
            Cell::Empty
        } else {
            Cell::StagingBackground
        }
    }

    /// Iterates over the rows from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks_exact(self.width())
    }

    /// Writes every occupied cell of `piece` with its tag.
    ///
    /// Cells outside the board are skipped; callers are expected to validate the
    /// placement with [`is_legal_placement`](super::collision::is_legal_placement) first.
    pub fn fill_piece(&mut self, piece: &Piece) {
        let cell = Cell::Filled(piece.kind());
        for (x, y) in piece.occupied_positions() {
            if let Some(i) = self.index(x, y) {
                self.cells[i] = cell;
            }
        }
    }

    /// Removes a previously committed `piece` from the board.
    ///
    /// Only cells still holding the piece's tag are vacated; cells changed since the
    /// commit are left alone. Returns the number of cells vacated.
    pub fn lift_piece(&mut self, piece: &Piece) -> usize {
        let filled = Cell::Filled(piece.kind());
        let mut lifted = 0;
        for (x, y) in piece.occupied_positions() {
            let Some(i) = self.index(x, y) else {
                continue;
            };
            if self.cells[i] == filled {
                self.cells[i] = self.vacant_cell(i % self.width());
                lifted += 1;
            }
        }
        lifted
    }

    /// Vacates the filled cell `(x, y)` and returns the tag it held.
    ///
    /// Returns `None` (and leaves the board alone) for vacant or off-board cells.
    pub fn lift_cell(&mut self, x: i32, y: i32) -> Option<PieceKind> {
        let i = self.index(x, y)?;
        let Cell::Filled(kind) = self.cells[i] else {
            return None;
        };
        self.cells[i] = self.vacant_cell(i % self.width());
        Some(kind)
    }

    /// Returns whether every cell of `region` in row `y` is filled.
    ///
    /// An empty region (a board without staging) is never full.
    #[must_use]
    pub fn is_region_row_full(&self, region: Region, y: usize) -> bool {
        let columns = self.columns(region);
        !columns.is_empty() && self.row(y)[columns].iter().all(|c| c.is_filled())
    }

    /// Returns whether the topmost row of `region` holds any filled cell.
    #[must_use]
    pub fn is_region_overflowed(&self, region: Region) -> bool {
        let columns = self.columns(region);
        self.row(0)[columns].iter().any(|c| c.is_filled())
    }

    /// Removes play-region row `y` and shifts the play-region rows above it down by one.
    ///
    /// The topmost play-region row becomes empty. Staging columns are not touched.
    ///
    /// # Panics
    ///
    /// Panics if `y` is outside the board.
    pub fn clear_row(&mut self, y: usize) {
        assert!(y < self.height, "row {y} is outside the board");
        let width = self.width();
        let play = self.play_width;
        for row in (1..=y).rev() {
            let src = (row - 1) * width;
            self.cells.copy_within(src..src + play, row * width);
        }
        self.row_mut(0)[..play].fill(Cell::Empty);
    }

    /// Resets the staging-region cells of row `y` to background.
    pub fn reset_staging_row(&mut self, y: usize) {
        let columns = self.columns(Region::Staging);
        self.row_mut(y)[columns].fill(Cell::StagingBackground);
    }

    /// Clears every full row of both regions and reports what was cleared.
    pub fn clear_lines(&mut self) -> ClearedLines {
        let mut cleared = ClearedLines::default();

        for y in (0..self.height).rev() {
            if self.is_region_row_full(Region::Staging, y) {
                self.reset_staging_row(y);
                cleared.staging_rows.push(y);
            }
        }

        let width = self.width();
        let play = self.play_width;
        let mut count = 0;
        for y in (0..self.height).rev() {
            if self.is_region_row_full(Region::Play, y) {
                cleared.play_rows.push(y);
                count += 1;
                continue;
            }
            if count > 0 {
                let src = y * width;
                self.cells.copy_within(src..src + play, (y + count) * width);
            }
        }
        for y in 0..count {
            self.row_mut(y)[..play].fill(Cell::Empty);
        }

        cleared
    }

    /// Creates a board from ASCII art, mainly for tests and fixtures.
    ///
    /// Each line is one row from top to bottom. `.` and `:` are vacant cells, piece
    /// letters (`I`, `O`, `T`, `S`, `Z`, `L`, `J`) are filled cells, `|` (the region
    /// separator) and whitespace are ignored. Missing rows at the top are vacant.
    ///
    /// # Panics
    ///
    /// Panics if a row does not have `play_width + staging_width` cells or there are
    /// more rows than `height`.
    ///
    /// # Example
    ///
    /// ```
    /// use grabtris_engine::{Board, Cell, PieceKind};
    ///
    /// let board = Board::from_ascii(
    ///     4,
    ///     2,
    ///     3,
    ///     "
    ///     ....|::
    ///     .T..|::
    ///     TTT.|OO
    ///     ",
    /// );
    /// assert_eq!(board.cell_at(1, 1), Ok(Cell::Filled(PieceKind::T)));
    /// assert_eq!(board.cell_at(5, 0), Ok(Cell::StagingBackground));
    /// ```
    #[must_use]
    pub fn from_ascii(play_width: usize, staging_width: usize, height: usize, art: &str) -> Self {
        let mut board = Self::new(play_width, staging_width, height);
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        assert!(
            lines.len() <= height,
            "expected at most {height} rows, got {}",
            lines.len()
        );
        let offset = height - lines.len();

        for (i, line) in lines.iter().enumerate() {
            let cells: Vec<char> = line
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '|')
                .collect();
            assert_eq!(
                cells.len(),
                board.width(),
                "Each row must have exactly {} cells, got {} at row {}",
                board.width(),
                cells.len(),
                i
            );
            for (x, &ch) in cells.iter().enumerate() {
                let cell = match ch {
                    '.' | ':' => board.vacant_cell(x),
                    _ => Cell::Filled(
                        PieceKind::from_char(ch)
                            .unwrap_or_else(|| panic!("invalid cell character {ch:?}")),
                    ),
                };
                board.set_cell(x, i + offset, cell);
            }
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for (x, cell) in row.iter().enumerate() {
                if x == self.play_width && self.has_staging() {
                    f.write_str("|")?;
                }
                write!(f, "{}", cell.as_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

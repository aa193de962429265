use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

/// Display tag of a piece, one per canonical tetromino.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// T-piece.
    T = 2,
    /// S-piece.
    S = 3,
    /// Z-piece.
    Z = 4,
    /// L-piece.
    L = 5,
    /// J-piece.
    J = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl PieceKind {
    /// Number of piece kinds (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::L,
        PieceKind::J,
    ];

    /// Returns the canonical spawn orientation of this kind.
    #[must_use]
    pub const fn shape(self) -> Shape {
        CATALOG[self as usize]
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use grabtris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::T => 'T',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::L => 'L',
            PieceKind::J => 'J',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use grabtris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('S'), Some(PieceKind::S));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'T' => Some(PieceKind::T),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'L' => Some(PieceKind::L),
            'J' => Some(PieceKind::J),
            _ => None,
        }
    }
}

/// Cell layout of a piece in one orientation, plus its display tag.
///
/// The layout is a tight bounding box of at most 4×4 cells stored as one bitmask per row
/// (bit `x` of `rows[y]` is set when cell `(x, y)` is occupied). Shapes are plain values:
/// rotating produces a new `Shape` and never touches the catalog returned by
/// [`PieceKind::shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Shape {
    kind: PieceKind,
    width: u8,
    height: u8,
    rows: [u8; Shape::MAX_SIZE],
}

impl Shape {
    /// Largest bounding box side supported by a shape.
    pub const MAX_SIZE: usize = 4;

    const fn new(kind: PieceKind, width: u8, height: u8, rows: [u8; Self::MAX_SIZE]) -> Self {
        assert!(width >= 1 && width as usize <= Self::MAX_SIZE);
        assert!(height >= 1 && height as usize <= Self::MAX_SIZE);
        let mut y = 0;
        while y < Self::MAX_SIZE {
            if y >= height as usize {
                assert!(rows[y] == 0);
            } else {
                assert!(rows[y] >> width == 0);
            }
            y += 1;
        }
        Self {
            kind,
            width,
            height,
            rows,
        }
    }

    /// A single cell carrying `kind`'s tag, used for blocks lifted off the board.
    #[must_use]
    pub const fn monomino(kind: PieceKind) -> Self {
        Self::new(kind, 1, 1, [1, 0, 0, 0])
    }

    #[must_use]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width as usize
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height as usize
    }

    /// Returns whether `(x, y)` (relative to the top-left of the bounding box) is occupied.
    #[must_use]
    pub const fn is_occupied(&self, x: usize, y: usize) -> bool {
        x < self.width as usize && y < self.height as usize && (self.rows[y] >> x) & 1 != 0
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(|row| row.count_ones() as usize).sum()
    }

    /// Iterates over occupied cells as `(dx, dy)` offsets, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.height()).flat_map(move |dy| {
            (0..self.width()).filter_map(move |dx| self.is_occupied(dx, dy).then_some((dx, dy)))
        })
    }

    /// Returns this shape turned a quarter turn.
    ///
    /// The cell matrix is transposed and its row order reversed, so the result is
    /// `height × width` and the new cell `(x, y)` is the old cell `(width - 1 - y, x)`.
    #[must_use]
    pub const fn rotated(&self) -> Self {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut rows = [0; Self::MAX_SIZE];
        let mut y = 0;
        while y < width {
            let mut x = 0;
            while x < height {
                if self.is_occupied(width - 1 - y, x) {
                    rows[y] |= 1 << x;
                }
                x += 1;
            }
            y += 1;
        }
        Self::new(self.kind, self.height, self.width, rows)
    }
}

const CATALOG: [Shape; PieceKind::LEN] = {
    const fn m(bits: &[bool]) -> u8 {
        let mut mask = 0;
        let mut i = 0;
        while i < bits.len() {
            if bits[i] {
                mask |= 1 << i;
            }
            i += 1;
        }
        mask
    }

    const C: bool = true;
    const E: bool = false;

    [
        // I-piece
        Shape::new(PieceKind::I, 4, 1, [m(&[C, C, C, C]), 0, 0, 0]),
        // O-piece
        Shape::new(PieceKind::O, 2, 2, [m(&[C, C]), m(&[C, C]), 0, 0]),
        // T-piece
        Shape::new(PieceKind::T, 3, 2, [m(&[C, C, C]), m(&[E, C, E]), 0, 0]),
        // S-piece
        Shape::new(PieceKind::S, 3, 2, [m(&[E, C, C]), m(&[C, C, E]), 0, 0]),
        // Z-piece
        Shape::new(PieceKind::Z, 3, 2, [m(&[C, C, E]), m(&[E, C, C]), 0, 0]),
        // L-piece
        Shape::new(PieceKind::L, 3, 2, [m(&[E, E, C]), m(&[C, C, C]), 0, 0]),
        // J-piece
        Shape::new(PieceKind::J, 3, 2, [m(&[C, E, E]), m(&[C, C, C]), 0, 0]),
    ]
};

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn to_ascii(shape: &Shape) -> Vec<String> {
        (0..shape.height())
            .map(|y| {
                (0..shape.width())
                    .map(|x| if shape.is_occupied(x, y) { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_catalog_matches_kinds() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.kind(), kind);
            assert_eq!(shape.cell_count(), 4, "{kind:?} must be a tetromino");
        }
    }

    #[test]
    fn test_catalog_layouts() {
        assert_eq!(to_ascii(&PieceKind::I.shape()), ["####"]);
        assert_eq!(to_ascii(&PieceKind::O.shape()), ["##", "##"]);
        assert_eq!(to_ascii(&PieceKind::T.shape()), ["###", ".#."]);
        assert_eq!(to_ascii(&PieceKind::S.shape()), [".##", "##."]);
        assert_eq!(to_ascii(&PieceKind::Z.shape()), ["##.", ".##"]);
        assert_eq!(to_ascii(&PieceKind::L.shape()), ["..#", "###"]);
        assert_eq!(to_ascii(&PieceKind::J.shape()), ["#..", "###"]);
    }

    #[test]
    fn test_rotated_transposes_and_reverses_rows() {
        let t = PieceKind::T.shape().rotated();
        assert_eq!((t.width(), t.height()), (2, 3));
        assert_eq!(to_ascii(&t), ["#.", "##", "#."]);

        let i = PieceKind::I.shape().rotated();
        assert_eq!((i.width(), i.height()), (1, 4));
        assert_eq!(to_ascii(&i), ["#", "#", "#", "#"]);

        let l = PieceKind::L.shape().rotated();
        assert_eq!(to_ascii(&l), ["##", ".#", ".#"]);
    }

    #[test]
    fn test_four_rotations_restore_shape() {
        for kind in PieceKind::ALL {
            let shape = kind.shape();
            let mut rotated = shape;
            for _ in 0..4 {
                rotated = rotated.rotated();
                assert_eq!(rotated.cell_count(), shape.cell_count());
                assert_eq!(rotated.kind(), kind);
            }
            assert_eq!(rotated, shape, "{kind:?}");
        }
    }

    #[test]
    fn test_monomino_keeps_tag() {
        let block = Shape::monomino(PieceKind::Z);
        assert_eq!(block.kind(), PieceKind::Z);
        assert_eq!(to_ascii(&block), ["#"]);
        assert_eq!(block.rotated(), block);
    }

    #[test]
    fn test_cells_iterates_row_major() {
        let cells: Vec<_> = PieceKind::T.shape().cells().collect();
        assert_eq!(cells, [(0, 0), (1, 0), (2, 0), (1, 1)]);
    }

    #[test]
    fn test_random_kind_covers_catalog() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; PieceKind::LEN];
        for _ in 0..500 {
            let kind: PieceKind = rng.random();
            seen[kind as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_piece_kind_char_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
        assert_eq!(PieceKind::from_char('.'), None);
    }
}

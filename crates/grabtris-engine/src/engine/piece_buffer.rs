use std::{collections::VecDeque, fmt, fmt::Write as _, str::FromStr};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PieceKind;

/// Supplier of new piece kinds.
///
/// Any `FnMut() -> PieceKind` closure is a source, which makes scripted sequences easy to
/// inject:
///
/// ```
/// use grabtris_engine::{PieceBuffer, PieceKind};
///
/// let mut buffer = PieceBuffer::new(|| PieceKind::O, 1);
/// assert_eq!(buffer.pop_next(), PieceKind::O);
/// ```
pub trait PieceSource {
    fn next_kind(&mut self) -> PieceKind;
}

impl<F> PieceSource for F
where
    F: FnMut() -> PieceKind,
{
    fn next_kind(&mut self) -> PieceKind {
        self()
    }
}

/// Uniform draw over the seven piece kinds.
#[derive(Debug, Clone)]
pub struct RandomPieceSource {
    rng: Pcg32,
}

impl Default for RandomPieceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPieceSource {
    /// Creates a source with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random())
    }

    /// Like [`Self::new`], but with a specific seed for deterministic piece generation.
    #[must_use]
    pub fn with_seed(seed: PieceSeed) -> Self {
        Self {
            rng: Pcg32::from_seed(seed.0),
        }
    }
}

impl PieceSource for RandomPieceSource {
    fn next_kind(&mut self) -> PieceKind {
        self.rng.random()
    }
}

/// Seed for deterministic piece generation.
///
/// A 128-bit seed for the piece generator, written as 32 hex digits (big-endian) in JSON
/// and on the command line. The same seed always yields the same piece sequence.
///
/// # Example
///
/// ```
/// use grabtris_engine::PieceSeed;
///
/// let seed: PieceSeed = "0123456789abcdeffedcba9876543210".parse().unwrap();
/// assert_eq!(seed.to_string(), "0123456789abcdeffedcba9876543210");
/// assert!("xyz".parse::<PieceSeed>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed([u8; 16]);

impl PieceSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

/// A seed string was not 32 hex digits.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed `{input}`: expected 32 hex digits")]
pub struct ParseSeedError {
    input: String,
}

impl FromStr for PieceSeed {
    type Err = ParseSeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || ParseSeedError {
            input: s.to_owned(),
        };
        if s.len() != 32 {
            return Err(error());
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| error())?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl fmt::Display for PieceSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl Serialize for PieceSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{self}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for PieceSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random `PieceSeed` values with `rng.random()`.
impl Distribution<PieceSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        PieceSeed(seed)
    }
}

/// Upcoming pieces, kept in fixed preview slots and refilled from a [`PieceSource`].
///
/// With one slot this is the classic "next piece" preview: popping promotes the
/// pre-selected piece and draws a new one behind it. With several slots it is the
/// conveyor belt: any slot may be taken, later slots move forward and the belt refills at
/// its tail.
///
/// # Example
///
/// ```
/// use grabtris_engine::{PieceBuffer, PieceKind};
///
/// let mut kinds = [PieceKind::I, PieceKind::O, PieceKind::T, PieceKind::S].into_iter();
/// let mut buffer = PieceBuffer::new(move || kinds.next().unwrap_or(PieceKind::Z), 3);
///
/// assert_eq!(buffer.take(1), Some(PieceKind::O));
/// let upcoming: Vec<_> = buffer.next_pieces().collect();
/// assert_eq!(upcoming, [PieceKind::I, PieceKind::T, PieceKind::S]);
/// ```
pub struct PieceBuffer {
    source: Box<dyn PieceSource>,
    slots: VecDeque<PieceKind>,
    capacity: usize,
}

impl fmt::Debug for PieceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PieceBuffer")
            .field("slots", &self.slots)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl PieceBuffer {
    /// Creates a buffer with `capacity` preview slots (at least one), filled immediately.
    #[must_use]
    pub fn new(source: impl PieceSource + 'static, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut this = Self {
            source: Box::new(source),
            slots: VecDeque::with_capacity(capacity),
            capacity,
        };
        this.refill();
        this
    }

    fn refill(&mut self) {
        while self.slots.len() < self.capacity {
            self.slots.push_back(self.source.next_kind());
        }
    }

    /// Draws the piece in the first slot.
    pub fn pop_next(&mut self) -> PieceKind {
        self.take(0).unwrap_or_else(|| self.source.next_kind())
    }

    /// Removes the piece in `slot`, or returns `None` if there is no such slot.
    pub fn take(&mut self, slot: usize) -> Option<PieceKind> {
        let kind = self.slots.remove(slot)?;
        self.refill();
        Some(kind)
    }

    /// Iterates over the preview slots, first slot first.
    pub fn next_pieces(&self) -> impl Iterator<Item = PieceKind> + '_ {
        self.slots.iter().copied()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

//! Grid occupancy and piece-placement engine for a drag-and-drop falling-block puzzle.
//!
//! Pieces are generated once and then either fall under gravity or are picked up by a
//! pointer, dragged to any legal cell, optionally rotated, and committed to the board.
//!
//! - [`core`] holds the pure data structures: [`Shape`], [`Board`], [`Piece`] and the
//!   [`is_legal_placement`] collision rule.
//! - [`engine`] orchestrates them: [`PlacementEngine`], [`InteractionController`] and the
//!   [`GameSession`] aggregate driven by an external game loop.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use grabtris_engine::{GameConfig, GameSession, PieceSeed};
//!
//! let seed: PieceSeed = "000102030405060708090a0b0c0d0e0f".parse().unwrap();
//! let mut session = GameSession::with_seed(GameConfig::default(), seed).unwrap();
//!
//! let piece = *session.active_piece();
//! let (x, y) = (piece.position().x(), piece.position().y());
//! session.pointer_down(x, y); // pick the piece up
//! session.pointer_moved(2, 15);
//! session.tick(Duration::from_millis(33));
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// A board query addressed a cell outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cell ({x}, {y}) is outside the board")]
pub struct OutOfBoundsError {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PlacementError {
    #[display("piece overlaps a filled cell or leaves the board")]
    IllegalPlacement,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("`{name}` must be between {min} and {max}, got {value}")]
    InvalidDimension {
        name: &'static str,
        value: usize,
        min: usize,
        max: usize,
    },
    #[display("gravity interval must be positive")]
    ZeroGravityInterval,
    #[display("generation interval must be positive when set")]
    ZeroGenerationInterval,
}

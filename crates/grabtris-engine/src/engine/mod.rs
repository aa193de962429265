//! Game engine logic and state management.
//!
//! This module orchestrates the core data structures into a playable session:
//!
//! - [`GameConfig`] - Board dimensions, timing and variant switches
//! - [`PieceBuffer`] - Upcoming pieces (next-piece preview or conveyor belt)
//! - [`PieceSeed`] - Seed for deterministic piece generation
//! - [`PlacementEngine`] - Commits pieces to the board and spawns the next ones
//! - [`InteractionController`] - Falling / pointer-held / awaiting-pickup state machine
//! - [`GameSession`] - Aggregate driven by the external game loop
//!
//! # Game Flow
//!
//! 1. A piece spawns at the top of the staging region (or the play region)
//! 2. It falls one row per gravity interval, or the player picks it up with the pointer
//!    (the pointer may also lift a single placed block or take a piece off the conveyor)
//! 3. A held piece follows the pointer and may be rotated
//! 4. Pressing again drops it; a legal drop anchored in the play region commits it
//! 5. Full rows are cleared and the next piece spawns
//! 6. The game ends when the staging region overflows or a spawn is blocked

pub use self::{config::*, controller::*, game_session::*, piece_buffer::*, placement::*};

mod config;
mod controller;
mod game_session;
mod piece_buffer;
mod placement;

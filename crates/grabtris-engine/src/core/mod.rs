pub use self::{board::*, collision::*, piece::*, shape::*};

pub(crate) mod board;
pub(crate) mod collision;
pub(crate) mod piece;
pub(crate) mod shape;

pub use self::{board::*, direction::*, tile::*};

pub(crate) mod board;
pub(crate) mod direction;
pub(crate) mod tile;

//! Turn-level rules on top of the board.
//!
//! - [`Action`] - An agent's move: slide, place a tile, or pass
//! - [`TileBag`] - Supply of basic tiles used for placements and hints

pub use self::{action::*, tile_bag::*};

mod action;
pub(crate) mod tile_bag;

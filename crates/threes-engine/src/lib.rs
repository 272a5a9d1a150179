//! Board rules for Threes! on a 4×4 grid.
//!
//! This crate is the board oracle consumed by the agents in `threes-agent`:
//!
//! - [`Board`] - Packed 4×4 grid of tile ranks with the slide/merge/score rule,
//!   symmetry transforms, and the environment bookkeeping (hint tile, tile bag,
//!   last slide direction)
//! - [`Direction`] - The four slide directions, numbered `Up = 0` to `Left = 3`
//! - [`Action`] - What an agent may do on its turn: slide, place a tile, or pass
//! - [`TileBag`] - The shuffled supply of basic tiles the environment draws from
//!
//! # Example
//!
//! ```
//! use threes_engine::{Board, Direction};
//!
//! let board = Board::from_cells([
//!     1, 2, 0, 0, //
//!     0, 0, 0, 0, //
//!     0, 0, 0, 0, //
//!     0, 0, 0, 0, //
//! ]);
//!
//! let (after, reward) = board.slide(Direction::Left).unwrap();
//! assert_eq!(after.cell_at(0), 3);
//! assert_eq!(reward, 3);
//!
//! // Nothing can move upward on this board.
//! assert!(board.slide(Direction::Up).is_none());
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Error returned when an action cannot be applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum IllegalActionError {
    #[display("sliding {_0} does not change the board")]
    Slide(#[error(not(source))] Direction),
    #[display("cell {_0} is out of range or already occupied")]
    OccupiedCell(#[error(not(source))] usize),
    #[display("tile {_0} is not available from the bag or hint")]
    UnavailableTile(#[error(not(source))] Tile),
    #[display("no-op actions cannot be applied")]
    NoOp,
}

use threes_engine::{Board, Direction, Reward, Tile};

/// The board operations the learning agents rely on.
///
/// [`Board`] is the implementation used in play. The agents and the network
/// are generic over this trait so their decision rules can be exercised on
/// boards with hand-picked outcomes.
pub trait GameBoard: Copy {
    /// Returns the afterstate and reward of sliding in `direction`, or `None`
    /// if the slide would leave the board unchanged.
    fn slide(&self, direction: Direction) -> Option<(Self, Reward)>;

    /// Returns the tile rank at cell `index` (row-major, `0..16`).
    fn cell_at(&self, index: usize) -> Tile;

    /// Rotates the board 90° clockwise.
    #[must_use]
    fn rotate_clockwise(&self) -> Self;

    /// Mirrors the board left to right.
    #[must_use]
    fn reflect_horizontal(&self) -> Self;
}

impl GameBoard for Board {
    fn slide(&self, direction: Direction) -> Option<(Self, Reward)> {
        Board::slide(self, direction)
    }

    fn cell_at(&self, index: usize) -> Tile {
        Board::cell_at(self, index)
    }

    fn rotate_clockwise(&self) -> Self {
        Board::rotate_clockwise(self)
    }

    fn reflect_horizontal(&self) -> Self {
        Board::reflect_horizontal(self)
    }
}

use arrayvec::ArrayVec;

use crate::core::tile::Tile;

/// The bag of basic tiles (1, 2 and 3) new tiles are drawn from.
///
/// A full bag holds one of each tile. Draws remove tiles until the bag is empty,
/// at which point the board refills it, so every three consecutive placements
/// see each basic tile exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileBag {
    counts: [u8; 3],
}

impl Default for TileBag {
    fn default() -> Self {
        Self::FULL
    }
}

impl TileBag {
    pub const FULL: Self = Self { counts: [1; 3] };
    pub const EMPTY: Self = Self { counts: [0; 3] };

    /// Returns how many copies of `tile` remain (0 for tiles outside 1..=3).
    #[must_use]
    pub const fn count(&self, tile: Tile) -> u8 {
        match tile {
            1..=3 => self.counts[tile as usize - 1],
            _ => 0,
        }
    }

    /// Returns the total number of tiles left.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.iter().map(|&c| usize::from(c)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists the remaining tiles in ascending order, one entry per copy.
    #[must_use]
    pub fn tiles(&self) -> ArrayVec<Tile, 3> {
        let mut tiles = ArrayVec::new();
        for tile in 1..=3 {
            for _ in 0..self.count(tile) {
                tiles.push(tile);
            }
        }
        tiles
    }

    /// Removes one copy of `tile`, returning `false` if there was none.
    pub fn take(&mut self, tile: Tile) -> bool {
        if self.count(tile) == 0 {
            return false;
        }
        self.counts[usize::from(tile) - 1] -= 1;
        true
    }
}

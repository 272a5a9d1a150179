use std::{fmt, sync::OnceLock};

use serde::{Deserialize, Serialize};

use crate::{
    IllegalActionError,
    core::{
        direction::Direction,
        tile::{self, Reward, Tile},
    },
    engine::tile_bag::TileBag,
};

/// Number of cells on the board.
pub const CELL_COUNT: usize = 16;

/// Number of cells per row and per column.
pub const SIDE: usize = 4;

const ROW_TABLE_SIZE: usize = 1 << 16;
const CELL_MASK: u64 = 0xf;
const ROW_MASK: u64 = 0xffff;

/// Slide results for every possible packed row, sliding toward column 0.
struct RowTable {
    rows: Box<[u16]>,
    rewards: Box<[Reward]>,
}

static ROW_TABLE: OnceLock<RowTable> = OnceLock::new();

fn row_table() -> &'static RowTable {
    ROW_TABLE.get_or_init(|| {
        let mut rows = Vec::with_capacity(ROW_TABLE_SIZE);
        let mut rewards = Vec::with_capacity(ROW_TABLE_SIZE);
        for row in 0..=u16::MAX {
            let (slid, reward) = slide_row_left(row);
            rows.push(slid);
            rewards.push(reward);
        }
        RowTable {
            rows: rows.into_boxed_slice(),
            rewards: rewards.into_boxed_slice(),
        }
    })
}

/// Slides one packed row (cell 0 in the low nibble) toward cell 0.
///
/// Each tile moves at most one cell: into an empty neighbour, or onto a
/// neighbour it can merge with. A cell that received a merge is left behind by
/// the scan, so it never merges twice.
fn slide_row_left(row: u16) -> (u16, Reward) {
    let mut cells = [0; SIDE];
    for (i, cell) in cells.iter_mut().enumerate() {
        *cell = ((row >> (4 * i)) & 0xf) as Tile;
    }

    let mut reward = 0;
    for c in 1..SIDE {
        let incoming = cells[c];
        if incoming == 0 {
            continue;
        }
        let target = cells[c - 1];
        if target == 0 {
            cells[c - 1] = incoming;
            cells[c] = 0;
        } else if let Some(merged) = tile::merge(target, incoming) {
            reward += tile::tile_score(merged) - tile::tile_score(target) - tile::tile_score(incoming);
            cells[c - 1] = merged;
            cells[c] = 0;
        }
    }

    let packed = cells
        .iter()
        .enumerate()
        .fold(0u16, |acc, (i, &cell)| acc | (u16::from(cell) << (4 * i)));
    (packed, reward)
}

/// A Threes! board: 16 tile ranks plus the environment's bookkeeping.
///
/// Cells are packed row-major into a `u64`, 4 bits per cell, cell `i` occupying
/// bits `4i..4i + 4`. Cell indices run
///
/// ```text
///  0  1  2  3
///  4  5  6  7
///  8  9 10 11
/// 12 13 14 15
/// ```
///
/// Besides the cells the board remembers the direction of the last slide (which
/// edge the next tile enters from), the hint tile announced for the next
/// placement, and the remaining contents of the tile bag. Boards are values: every
/// transform returns a new board.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: u64,
    hint: Tile,
    bag: TileBag,
    last_slide: Option<Direction>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Creates an empty board with a full bag and no hint.
    #[must_use]
    pub const fn new() -> Self {
        Self::from_raw(0)
    }

    /// Creates a board from packed cells, with a full bag and no hint.
    #[must_use]
    pub const fn from_raw(cells: u64) -> Self {
        Self {
            cells,
            hint: 0,
            bag: TileBag::FULL,
            last_slide: None,
        }
    }

    /// Creates a board from row-major cell ranks.
    ///
    /// # Panics
    ///
    /// Panics if any rank does not fit in 4 bits.
    #[must_use]
    pub fn from_cells(cells: [Tile; CELL_COUNT]) -> Self {
        let packed = cells.iter().enumerate().fold(0u64, |acc, (i, &cell)| {
            assert!(cell <= tile::MAX_RANK, "tile rank {cell} does not fit in a cell");
            acc | (u64::from(cell) << (4 * i))
        });
        Self::from_raw(packed)
    }

    /// Returns the packed cells.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.cells
    }

    /// Returns the rank at a linear cell index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 16`.
    #[inline]
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Tile {
        assert!(index < CELL_COUNT, "cell index {index} out of range");
        ((self.cells >> (4 * index)) & CELL_MASK) as Tile
    }

    /// Returns all cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> [Tile; CELL_COUNT] {
        std::array::from_fn(|i| self.cell_at(i))
    }

    /// Returns the hint tile for the next placement (0 before the first one).
    #[must_use]
    pub const fn hint(&self) -> Tile {
        self.hint
    }

    /// Returns the remaining tile bag.
    #[must_use]
    pub const fn bag(&self) -> &TileBag {
        &self.bag
    }

    /// Returns the direction of the last slide, or `None` while the initial tiles
    /// are being placed.
    #[must_use]
    pub const fn last_slide(&self) -> Option<Direction> {
        self.last_slide
    }

    /// Returns the indices of the empty cells in ascending order.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        (0..CELL_COUNT).filter(|&i| self.cell_at(i) == 0)
    }

    /// Returns the number of empty cells.
    #[must_use]
    pub fn count_empty(&self) -> usize {
        self.empty_cells().count()
    }

    /// Returns the largest rank on the board.
    #[must_use]
    pub fn max_tile(&self) -> Tile {
        (0..CELL_COUNT).map(|i| self.cell_at(i)).max().unwrap_or(0)
    }

    /// Returns the board score: the sum of [`tile_score`](tile::tile_score) over
    /// all cells.
    #[must_use]
    pub fn score(&self) -> Reward {
        (0..CELL_COUNT).map(|i| tile::tile_score(self.cell_at(i))).sum()
    }

    /// Slides all tiles in `direction`.
    ///
    /// Returns the resulting board and the points gained, or `None` if the slide
    /// does not move any tile.
    #[must_use]
    pub fn slide(&self, direction: Direction) -> Option<(Self, Reward)> {
        let (cells, reward) = match direction {
            Direction::Left => slide_rows_left(self.cells),
            Direction::Right => {
                let (cells, reward) = slide_rows_left(reflect_cells(self.cells));
                (reflect_cells(cells), reward)
            }
            Direction::Up => {
                let (cells, reward) = slide_rows_left(transpose_cells(self.cells));
                (transpose_cells(cells), reward)
            }
            Direction::Down => {
                let transposed = reflect_cells(transpose_cells(self.cells));
                let (cells, reward) = slide_rows_left(transposed);
                (transpose_cells(reflect_cells(cells)), reward)
            }
        };
        if cells == self.cells {
            return None;
        }
        let board = Self {
            cells,
            last_slide: Some(direction),
            ..*self
        };
        Some((board, reward))
    }

    /// Returns whether any slide is legal.
    #[must_use]
    pub fn can_slide(&self) -> bool {
        Direction::ALL.into_iter().any(|dir| self.slide(dir).is_some())
    }

    /// Returns the board rotated 90° clockwise.
    #[must_use]
    pub fn rotate_clockwise(&self) -> Self {
        self.with_cells(map_cells(self.cells, |r, c| (SIDE - 1 - c, r)))
    }

    /// Returns the board mirrored left to right.
    #[must_use]
    pub fn reflect_horizontal(&self) -> Self {
        self.with_cells(reflect_cells(self.cells))
    }

    /// Returns the board mirrored along the main diagonal.
    #[must_use]
    pub fn transpose(&self) -> Self {
        self.with_cells(transpose_cells(self.cells))
    }

    /// Places `tile` on the empty cell `position` and announces `hint` as the
    /// next tile.
    ///
    /// Before the first placement the board has no hint and `tile` is drawn from
    /// the bag; afterwards `tile` must be the announced hint. The new hint is
    /// always drawn from the bag, which refills once it runs empty.
    pub fn place(
        &mut self,
        position: usize,
        tile: Tile,
        hint: Tile,
    ) -> Result<(), IllegalActionError> {
        if position >= CELL_COUNT || self.cell_at(position) != 0 {
            return Err(IllegalActionError::OccupiedCell(position));
        }

        let mut bag = self.bag;
        if self.hint == 0 {
            if !bag.take(tile) {
                return Err(IllegalActionError::UnavailableTile(tile));
            }
        } else if tile != self.hint {
            return Err(IllegalActionError::UnavailableTile(tile));
        }
        if !bag.take(hint) {
            return Err(IllegalActionError::UnavailableTile(hint));
        }
        if bag.is_empty() {
            bag = TileBag::FULL;
        }

        self.cells |= u64::from(tile) << (4 * position);
        self.hint = hint;
        self.bag = bag;
        Ok(())
    }

    fn with_cells(&self, cells: u64) -> Self {
        Self { cells, ..*self }
    }
}

fn slide_rows_left(cells: u64) -> (u64, Reward) {
    let table = row_table();
    let mut result = 0;
    let mut reward = 0;
    for r in 0..SIDE {
        let row = ((cells >> (16 * r)) & ROW_MASK) as usize;
        result |= u64::from(table.rows[row]) << (16 * r);
        reward += table.rewards[row];
    }
    (result, reward)
}

/// Builds new cells where cell `(r, c)` takes the value of `source(r, c)`.
fn map_cells<F>(cells: u64, source: F) -> u64
where
    F: Fn(usize, usize) -> (usize, usize),
{
    let mut result = 0;
    for r in 0..SIDE {
        for c in 0..SIDE {
            let (sr, sc) = source(r, c);
            let value = (cells >> (4 * (sr * SIDE + sc))) & CELL_MASK;
            result |= value << (4 * (r * SIDE + c));
        }
    }
    result
}

fn reflect_cells(cells: u64) -> u64 {
    map_cells(cells, |r, c| (r, SIDE - 1 - c))
}

fn transpose_cells(cells: u64) -> u64 {
    map_cells(cells, |r, c| (c, r))
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("cells", &format_args!("{:#018x}", self.cells))
            .field("hint", &self.hint)
            .field("bag", &self.bag)
            .field("last_slide", &self.last_slide)
            .finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+------------------------+")?;
        for r in 0..SIDE {
            write!(f, "|")?;
            for c in 0..SIDE {
                write!(f, "{:6}", tile::face_value(self.cell_at(r * SIDE + c)))?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "+------------------------+")?;
        write!(f, "hint: {}", tile::face_value(self.hint))
    }
}

/// Serialized as the packed cells in 16 hex digits, cell 15 first.
///
/// Only the grid is kept; a deserialized board starts with a full bag and no
/// hint.
impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:016x}", self.cells))
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.len() != 16 {
            return Err(serde::de::Error::custom(format!(
                "invalid board: expected 16 hex digits, got {}",
                s.len()
            )));
        }
        let cells = u64::from_str_radix(&s, 16)
            .map_err(|e| serde::de::Error::custom(format!("invalid board: {s} ({e})")))?;
        Ok(Self::from_raw(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(cells: [Tile; CELL_COUNT]) -> Board {
        Board::from_cells(cells)
    }

    #[test]
    fn test_slide_row_moves_one_step() {
        let b = board([0, 1, 2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let (after, reward) = b.slide(Direction::Left).unwrap();
        assert_eq!(after.cells()[..4], [1, 2, 3, 0]);
        assert_eq!(reward, 0);
    }

    #[test]
    fn test_slide_merges_once_per_row() {
        let b = board([3, 3, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let (after, reward) = b.slide(Direction::Left).unwrap();
        assert_eq!(after.cells()[..4], [4, 3, 0, 0]);
        assert_eq!(reward, 3);
    }

    #[test]
    fn test_slide_does_not_merge_equal_basic_tiles() {
        let b = board([1, 1, 0, 0, 2, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(b.slide(Direction::Left).is_none());
        let (after, reward) = b.slide(Direction::Right).unwrap();
        assert_eq!(after.cells()[..8], [0, 1, 1, 0, 0, 2, 2, 0]);
        assert_eq!(reward, 0);
    }

    #[test]
    fn test_slide_vertical() {
        let b = board([1, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 6, 0, 0, 0]);
        let (up, reward) = b.slide(Direction::Up).unwrap();
        assert_eq!(up.cells(), [3, 0, 0, 0, 0, 0, 0, 0, 6, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(reward, 3);
        assert_eq!(up.last_slide(), Some(Direction::Up));

        let (down, reward) = b.slide(Direction::Down).unwrap();
        assert_eq!(down.cells(), [0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 6, 0, 0, 0]);
        assert_eq!(reward, 0);
    }

    #[test]
    fn test_illegal_slide_on_locked_board() {
        let b = board([3, 4, 3, 4, 4, 3, 4, 3, 3, 4, 3, 4, 4, 3, 4, 3]);
        for dir in Direction::ALL {
            assert!(b.slide(dir).is_none(), "{dir} should be illegal");
        }
        assert!(!b.can_slide());
    }

    #[test]
    fn test_rotate_clockwise() {
        let cells = std::array::from_fn(|i| (i % 15) as Tile + 1);
        let b = board(cells);
        let rotated = b.rotate_clockwise();
        // top-left comes from bottom-left, top-right from top-left
        assert_eq!(rotated.cell_at(0), b.cell_at(12));
        assert_eq!(rotated.cell_at(3), b.cell_at(0));
        assert_eq!(rotated.cell_at(15), b.cell_at(3));
        let full_turn = rotated.rotate_clockwise().rotate_clockwise().rotate_clockwise();
        assert_eq!(full_turn, b);
    }

    #[test]
    fn test_reflect_horizontal() {
        let cells = std::array::from_fn(|i| (i % 15) as Tile + 1);
        let b = board(cells);
        let reflected = b.reflect_horizontal();
        for r in 0..SIDE {
            for c in 0..SIDE {
                assert_eq!(reflected.cell_at(r * SIDE + c), b.cell_at(r * SIDE + SIDE - 1 - c));
            }
        }
        assert_eq!(reflected.reflect_horizontal(), b);
    }

    #[test]
    fn test_score_and_max_tile() {
        let b = board([1, 2, 3, 4, 5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(b.score(), 3 + 9 + 27);
        assert_eq!(b.max_tile(), 5);
        assert_eq!(b.count_empty(), 11);
    }

    #[test]
    fn test_slide_reward_matches_score_difference() {
        let b = board([1, 2, 3, 3, 4, 4, 0, 5, 2, 1, 1, 2, 6, 6, 6, 0]);
        for dir in Direction::ALL {
            if let Some((after, reward)) = b.slide(dir) {
                assert_eq!(after.score() - b.score(), reward, "direction {dir}");
            }
        }
    }

    #[test]
    fn test_place_draws_from_bag() {
        let mut b = Board::new();
        b.place(5, 1, 2).unwrap();
        assert_eq!(b.cell_at(5), 1);
        assert_eq!(b.hint(), 2);
        assert_eq!(b.bag().count(3), 1);
        assert_eq!(b.bag().len(), 1);

        // The announced hint must be placed next.
        assert_eq!(
            b.place(6, 3, 3),
            Err(IllegalActionError::UnavailableTile(3))
        );
        b.place(6, 2, 3).unwrap();
        assert_eq!(b.hint(), 3);
        // Bag emptied by taking the hint, so it was refilled.
        assert_eq!(b.bag().len(), 3);
    }

    #[test]
    fn test_place_on_occupied_cell() {
        let mut b = Board::new();
        b.place(0, 1, 2).unwrap();
        assert_eq!(b.place(0, 2, 3), Err(IllegalActionError::OccupiedCell(0)));
        assert_eq!(b.place(16, 2, 3), Err(IllegalActionError::OccupiedCell(16)));
    }

    #[test]
    fn test_board_serialization() {
        let b = board([1, 2, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 15]);
        let serialized = serde_json::to_string(&b).unwrap();
        assert_eq!(serialized, "\"f000000000000321\"");
        let deserialized: Board = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.cells(), b.cells());

        let result: Result<Board, _> = serde_json::from_str("\"123\"");
        assert!(result.unwrap_err().to_string().contains("invalid board"));
    }
}

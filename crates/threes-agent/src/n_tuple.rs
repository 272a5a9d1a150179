//! N-tuple networks over the 4×4 board.
//!
//! A tuple shape is a short list of cell indices. Reading those cells from a
//! board, 4 bits each, gives a key into one weight table; the network's value
//! for a board is the sum of the weights its features select.
//!
//! With symmetry expansion, every shape is read from all eight rotations and
//! reflections of the board, and each (symmetry, shape) pair owns its own
//! table. Features are always produced symmetry-major:
//!
//! | symmetry | board transform                     |
//! |----------|-------------------------------------|
//! | 0        | identity                            |
//! | 1-3      | rotated clockwise 1-3 times         |
//! | 4        | reflected left to right             |
//! | 5-7      | reflected, then rotated 1-3 times   |
//!
//! so the feature for symmetry `s` and shape `i` uses table
//! `s * shape_count + i`.

use arrayvec::ArrayVec;
use threes_engine::{CELL_COUNT, Tile};

use crate::{
    ConfigurationError,
    board::GameBoard,
    weights::{Feature, WeightStore},
};

/// Longest supported tuple.
pub const MAX_TUPLE_LEN: usize = 6;

/// Most features a network may extract from one board.
pub const MAX_FEATURES: usize = 32;

/// Number of board symmetries used by expanded networks.
pub const SYMMETRY_COUNT: usize = 8;

const CELL_BITS: usize = 4;

/// Ordered cell indices read together into one table key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleShape {
    cells: ArrayVec<u8, MAX_TUPLE_LEN>,
}

impl TupleShape {
    /// Creates a shape from distinct cell indices below 16.
    pub fn new(cells: &[usize]) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidShape {
            cells: cells.to_vec(),
        };
        if cells.is_empty() || cells.len() > MAX_TUPLE_LEN {
            return Err(invalid());
        }
        let mut shape = ArrayVec::new();
        for &cell in cells {
            if cell >= CELL_COUNT || shape.contains(&(cell as u8)) {
                return Err(invalid());
            }
            shape.push(cell as u8);
        }
        Ok(Self { cells: shape })
    }

    fn preset(cells: [u8; MAX_TUPLE_LEN]) -> Self {
        Self {
            cells: ArrayVec::from(cells),
        }
    }

    fn row(first: u8, step: u8) -> Self {
        Self {
            cells: (0..4).map(|i| first + i * step).collect(),
        }
    }

    #[must_use]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of distinct keys, `16^len`.
    #[must_use]
    pub fn table_size(&self) -> usize {
        1 << (CELL_BITS * self.len())
    }

    /// Packs the shape's cells of `board` into a key: cell `j` of the shape
    /// occupies bits `4j..4j+4`.
    #[must_use]
    pub fn key<B>(&self, board: &B) -> usize
    where
        B: GameBoard,
    {
        self.cells
            .iter()
            .enumerate()
            .fold(0, |key, (j, &cell)| {
                key | (usize::from(board.cell_at(usize::from(cell))) << (CELL_BITS * j))
            })
    }
}

/// Splits a key back into the ranks it was packed from.
#[must_use]
pub fn unpack_key(key: usize, len: usize) -> ArrayVec<Tile, MAX_TUPLE_LEN> {
    (0..len.min(MAX_TUPLE_LEN))
        .map(|j| ((key >> (CELL_BITS * j)) & 0xf) as Tile)
        .collect()
}

/// Whether a network reads its shapes from one board or from all eight
/// symmetric boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryExpansion {
    None,
    Full,
}

impl SymmetryExpansion {
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::None => 1,
            Self::Full => SYMMETRY_COUNT,
        }
    }
}

/// A set of tuple shapes and the tables their features index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NTupleNetwork {
    shapes: Vec<TupleShape>,
    expansion: SymmetryExpansion,
}

impl NTupleNetwork {
    pub fn new(
        shapes: Vec<TupleShape>,
        expansion: SymmetryExpansion,
    ) -> Result<Self, ConfigurationError> {
        let features = shapes.len() * expansion.count();
        if features == 0 || features > MAX_FEATURES {
            return Err(ConfigurationError::FeatureCount(features));
        }
        Ok(Self { shapes, expansion })
    }

    /// Every row and every column as a 4-tuple, without symmetry expansion.
    ///
    /// Tables 0-3 hold the rows top to bottom, tables 4-7 the columns left to
    /// right, 65536 entries each.
    #[must_use]
    pub fn four_tuple() -> Self {
        let rows = (0..4).map(|r| TupleShape::row(r * 4, 1));
        let columns = (0..4).map(|c| TupleShape::row(c, 4));
        Self {
            shapes: rows.chain(columns).collect(),
            expansion: SymmetryExpansion::None,
        }
    }

    /// Four 6-cell shapes read from all eight symmetries: 32 tables of
    /// 16,777,216 entries.
    ///
    /// ```text
    /// {0,1,2,3,4,5}   top row plus the next two cells
    /// {4,5,6,7,8,9}   second row plus the next two cells
    /// {0,1,2,4,5,6}   3×2 block in the top-left corner
    /// {4,5,6,8,9,10}  3×2 block one row lower
    /// ```
    #[must_use]
    pub fn six_tuple() -> Self {
        Self {
            shapes: vec![
                TupleShape::preset([0, 1, 2, 3, 4, 5]),
                TupleShape::preset([4, 5, 6, 7, 8, 9]),
                TupleShape::preset([0, 1, 2, 4, 5, 6]),
                TupleShape::preset([4, 5, 6, 8, 9, 10]),
            ],
            expansion: SymmetryExpansion::Full,
        }
    }

    #[must_use]
    pub fn shapes(&self) -> &[TupleShape] {
        &self.shapes
    }

    #[must_use]
    pub fn expansion(&self) -> SymmetryExpansion {
        self.expansion
    }

    #[must_use]
    pub fn table_count(&self) -> usize {
        self.shapes.len() * self.expansion.count()
    }

    /// Entry counts of every table, in table order.
    #[must_use]
    pub fn table_sizes(&self) -> Vec<usize> {
        let sizes = self.shapes.iter().map(TupleShape::table_size);
        sizes.cycle().take(self.table_count()).collect()
    }

    /// Checks that `weights` has exactly the tables this network indexes.
    pub fn check_layout(&self, weights: &WeightStore) -> Result<(), ConfigurationError> {
        let expected = self.table_sizes();
        let actual = weights.table_sizes();
        if expected.len() != actual.len() {
            return Err(ConfigurationError::TableCount {
                expected: expected.len(),
                actual: actual.len(),
            });
        }
        for (table, (&expected, &actual)) in expected.iter().zip(&actual).enumerate() {
            if expected != actual {
                return Err(ConfigurationError::TableSize {
                    table,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Extracts the features of `board`, symmetry-major then shape order.
    #[must_use]
    pub fn features<B>(&self, board: &B) -> ArrayVec<Feature, MAX_FEATURES>
    where
        B: GameBoard,
    {
        let mut features = ArrayVec::new();
        let mut transformed = *board;
        for symmetry in 0..self.expansion.count() {
            if symmetry == 4 {
                transformed = board.reflect_horizontal();
            }
            let base = symmetry * self.shapes.len();
            for (i, shape) in self.shapes.iter().enumerate() {
                features.push(Feature {
                    table: base + i,
                    key: shape.key(&transformed),
                });
            }
            transformed = transformed.rotate_clockwise();
        }
        features
    }

    /// Sums the weights of every feature of `board`, in feature order.
    ///
    /// # Panics
    ///
    /// Panics if `weights` does not pass [`NTupleNetwork::check_layout`].
    #[must_use]
    pub fn evaluate<B>(&self, weights: &WeightStore, board: &B) -> f32
    where
        B: GameBoard,
    {
        self.features(board)
            .into_iter()
            .map(|feature| weights.weight(feature))
            .sum()
    }

    /// Adds `delta` to the weight of every feature of `board`.
    ///
    /// # Panics
    ///
    /// Panics if `weights` does not pass [`NTupleNetwork::check_layout`].
    pub fn update<B>(&self, weights: &WeightStore, board: &B, delta: f32)
    where
        B: GameBoard,
    {
        for feature in self.features(board) {
            weights.add(feature, delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use threes_engine::Board;

    use super::*;

    fn numbered_board() -> Board {
        Board::from_cells([
            1, 2, 3, 4, //
            5, 6, 7, 8, //
            9, 10, 11, 12, //
            13, 14, 15, 0, //
        ])
    }

    #[test]
    fn test_key_packing() {
        let board = numbered_board();
        let shape = TupleShape::new(&[0, 1, 2]).unwrap();
        assert_eq!(shape.key(&board), 0x321);
        assert_eq!(unpack_key(shape.key(&board), 3).as_slice(), &[1, 2, 3]);

        let shape = TupleShape::new(&[15, 14]).unwrap();
        assert_eq!(shape.key(&board), 0xf0);
    }

    #[test]
    fn test_key_round_trip_for_every_rank() {
        let shape = TupleShape::new(&[0, 1, 2, 3, 4, 5]).unwrap();
        for rank in 0..16 {
            let cells: [Tile; CELL_COUNT] = std::array::from_fn(|i| ((rank + i) % 16) as Tile);
            let key = shape.key(&Board::from_cells(cells));
            assert_eq!(unpack_key(key, 6).as_slice(), &cells[..6], "rank {rank}");
            for (j, &cell) in cells[..6].iter().enumerate() {
                assert_eq!((key >> (4 * j)) & 0xf, usize::from(cell));
            }
        }
    }

    #[test]
    fn test_shape_validation() {
        assert!(TupleShape::new(&[]).is_err());
        assert!(TupleShape::new(&[0, 16]).is_err());
        assert!(TupleShape::new(&[3, 3]).is_err());
        assert!(TupleShape::new(&[0, 1, 2, 3, 4, 5, 6]).is_err());
        assert_eq!(TupleShape::new(&[0, 1]).unwrap().table_size(), 256);
    }

    #[test]
    fn test_four_tuple_layout() {
        let network = NTupleNetwork::four_tuple();
        assert_eq!(network.table_count(), 8);
        assert_eq!(network.table_sizes(), vec![65536; 8]);
        assert_eq!(network.shapes()[1].cells(), &[4, 5, 6, 7]);
        assert_eq!(network.shapes()[6].cells(), &[2, 6, 10, 14]);

        let features = network.features(&numbered_board());
        assert_eq!(features.len(), 8);
        assert_eq!(features[0], Feature { table: 0, key: 0x4321 });
        assert_eq!(features[4], Feature { table: 4, key: 0xd951 });
    }

    #[test]
    fn test_six_tuple_layout() {
        let network = NTupleNetwork::six_tuple();
        assert_eq!(network.table_count(), 32);
        assert_eq!(network.table_sizes(), vec![1 << 24; 32]);
        assert_eq!(network.shapes()[3].cells(), &[4, 5, 6, 8, 9, 10]);
    }

    #[test]
    fn test_six_tuple_features() {
        let network = NTupleNetwork::six_tuple();
        let features = network.features(&numbered_board());
        assert_eq!(features.len(), 32);
        let tables: Vec<usize> = features.iter().map(|f| f.table).collect();
        assert_eq!(tables, (0..32).collect::<Vec<_>>());

        let keys: Vec<usize> = features.iter().map(|f| f.key).collect();
        // Identity board.
        assert_eq!(keys[..4], [0x65_4321, 0xa9_8765, 0x76_5321, 0xba_9765]);
        // Reflected board: rows read 4 3 2 1 / 8 7 6 5 / 12 11 10 9.
        assert_eq!(keys[16..20], [0x78_1234, 0xbc_5678, 0x67_8234, 0xab_c678]);
    }

    #[test]
    fn test_symmetry_order() {
        let corner = TupleShape::new(&[0]).unwrap();
        let network = NTupleNetwork::new(vec![corner], SymmetryExpansion::Full).unwrap();
        let keys: Vec<usize> = network
            .features(&numbered_board())
            .iter()
            .map(|f| f.key)
            .collect();
        // Identity, three clockwise rotations, then the reflection and its
        // rotations: the top-left corner visits all four corners twice.
        assert_eq!(keys, [1, 13, 0, 4, 4, 0, 13, 1]);

        let tables: Vec<usize> = network
            .features(&numbered_board())
            .iter()
            .map(|f| f.table)
            .collect();
        assert_eq!(tables, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_reflected_board_reuses_keys() {
        let network = NTupleNetwork::new(
            vec![
                TupleShape::new(&[0, 1]).unwrap(),
                TupleShape::new(&[5, 6]).unwrap(),
            ],
            SymmetryExpansion::Full,
        )
        .unwrap();
        let shape_keys = |board: &Board| {
            let mut keys: Vec<(usize, usize)> = network
                .features(board)
                .iter()
                .map(|f| (f.table % 2, f.key))
                .collect();
            keys.sort_unstable();
            keys
        };
        let board = numbered_board();
        assert_eq!(shape_keys(&board.reflect_horizontal()), shape_keys(&board));
        assert_eq!(shape_keys(&board.rotate_clockwise()), shape_keys(&board));
    }

    #[test]
    fn test_update_touches_every_feature() {
        let network = NTupleNetwork::four_tuple();
        let weights = WeightStore::with_sizes(&network.table_sizes()).unwrap();
        let board = numbered_board();
        network.update(&weights, &board, 0.5);
        assert_eq!(network.evaluate(&weights, &board), 8.0 * 0.5);
        assert_eq!(weights.read(0, 0x4321), Ok(0.5));
        assert_eq!(network.evaluate(&weights, &Board::new()), 0.0);
    }

    #[test]
    fn test_constant_weights() {
        let network = NTupleNetwork::new(
            vec![
                TupleShape::new(&[0, 1]).unwrap(),
                TupleShape::new(&[4, 5]).unwrap(),
                TupleShape::new(&[0, 4]).unwrap(),
                TupleShape::new(&[5, 9]).unwrap(),
            ],
            SymmetryExpansion::Full,
        )
        .unwrap();
        let weights = WeightStore::with_sizes(&network.table_sizes()).unwrap();
        for (table, &size) in network.table_sizes().iter().enumerate() {
            for key in 0..size {
                weights.accumulate(table, key, 0.25).unwrap();
            }
        }
        assert_eq!(network.evaluate(&weights, &numbered_board()), 32.0 * 0.25);
        assert_eq!(network.evaluate(&weights, &Board::new()), 32.0 * 0.25);
    }

    #[test]
    fn test_check_layout() {
        let network = NTupleNetwork::four_tuple();
        let weights = WeightStore::with_sizes(&[65536; 8]).unwrap();
        assert_eq!(network.check_layout(&weights), Ok(()));

        let weights = WeightStore::with_sizes(&[65536; 7]).unwrap();
        assert_eq!(
            network.check_layout(&weights),
            Err(ConfigurationError::TableCount {
                expected: 8,
                actual: 7
            })
        );

        let mut sizes = vec![65536; 8];
        sizes[5] = 16;
        let weights = WeightStore::with_sizes(&sizes).unwrap();
        assert_eq!(
            network.check_layout(&weights),
            Err(ConfigurationError::TableSize {
                table: 5,
                expected: 65536,
                actual: 16
            })
        );
    }

    #[test]
    fn test_network_feature_limit() {
        let shapes = vec![TupleShape::new(&[0]).unwrap(); 5];
        assert_eq!(
            NTupleNetwork::new(shapes, SymmetryExpansion::Full),
            Err(ConfigurationError::FeatureCount(40))
        );
        assert!(NTupleNetwork::new(Vec::new(), SymmetryExpansion::None).is_err());
    }
}
